//! Example-map validation, uniqueness assignment, and adjacency extraction
//!
//! Ingest runs once per build, before any training: it checks the example
//! set, assigns every distinct layered tile a small index, converts each map
//! into an index grid, and records every observed adjacency and border
//! occupancy into the connectivity table.

use log::debug;
use ndarray::Array2;

use crate::analysis::connectivity::ConnectivityTable;
use crate::io::error::{EngineError, Result};
use crate::spatial::geometry::{BorderFlags, BorderSide, ConnectivityKind};
use crate::spatial::region::Region;
use crate::spatial::tiles::{LayeredTile, TileGrid, TileHandle, UniqueTileMap};

/// One example map: per-layer handle grids plus a sampling weight
#[derive(Clone, Debug)]
pub struct TrainingMap {
    layers: Vec<Array2<Option<TileHandle>>>,
    commonality: f64,
}

impl TrainingMap {
    /// Create an example from per-layer grids, all of identical shape
    pub fn new(layers: Vec<Array2<Option<TileHandle>>>, commonality: f64) -> Self {
        Self {
            layers,
            commonality,
        }
    }

    /// Snapshot a region of a host grid as an example
    pub fn from_grid(grid: &impl TileGrid, region: Region, commonality: f64) -> Self {
        let layers = (0..grid.layer_count())
            .map(|layer| grid.read_block(layer, region))
            .collect();
        Self {
            layers,
            commonality,
        }
    }

    /// Relative sampling weight during training
    pub const fn commonality(&self) -> f64 {
        self.commonality
    }

    /// Number of layers
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Width in cells
    pub fn width(&self) -> usize {
        self.layers.first().map_or(0, |l| l.ncols())
    }

    /// Height in cells
    pub fn height(&self) -> usize {
        self.layers.first().map_or(0, |l| l.nrows())
    }

    /// The layered tuple at local coordinates
    pub fn tile_at(&self, x: usize, y: usize) -> LayeredTile {
        let handles = self
            .layers
            .iter()
            .map(|layer| layer.get([y, x]).copied().flatten())
            .collect();
        LayeredTile::new(handles)
    }
}

/// Learned state carried over when continuing to train an existing generator
#[derive(Clone, Debug)]
pub struct ExistingState {
    /// Previously assigned tile table, indices preserved
    pub tiles: Vec<LayeredTile>,
    /// Previously observed adjacencies
    pub connectivity: ConnectivityTable,
    /// Previously assigned empty-sentinel index, if any
    pub empty_index: Option<usize>,
}

/// Everything ingest produces for the trainer
#[derive(Clone, Debug)]
pub struct IngestResult {
    /// Distinct layered tiles in index order
    pub tiles: Vec<LayeredTile>,
    /// Per example, the tile index at each cell (`None` = hole)
    pub index_grids: Vec<Array2<Option<usize>>>,
    /// Observed adjacency and border tables
    pub connectivity: ConnectivityTable,
    /// Index of the empty sentinel when empty cells are a tile
    pub empty_index: Option<usize>,
    /// Shared layer count of all examples
    pub layer_count: usize,
}

/// Validate an example set, returning its shared layer count
///
/// # Errors
///
/// Returns an error if:
/// - The set is empty
/// - Any example has no layers
/// - Examples disagree on layer count
/// - Any commonality is negative, or the total is not positive
pub fn validate_examples(maps: &[TrainingMap]) -> Result<usize> {
    let first = maps.first().ok_or(EngineError::ZeroMaps)?;
    let layer_count = first.layer_count();
    if layer_count == 0 {
        return Err(EngineError::NullMaps);
    }

    for map in maps {
        if map.layer_count() == 0 {
            return Err(EngineError::NullMaps);
        }
        if map.layer_count() != layer_count {
            return Err(EngineError::MismatchedLayers {
                expected: layer_count,
                found: map.layer_count(),
            });
        }
    }

    let mut total = 0.0;
    for map in maps {
        if map.commonality() < 0.0 {
            return Err(EngineError::InvalidCommonality {
                reason: "negative commonality".to_string(),
            });
        }
        total += map.commonality();
    }
    if total <= 0.0 {
        return Err(EngineError::InvalidCommonality {
            reason: "total commonality must be positive".to_string(),
        });
    }

    Ok(layer_count)
}

/// Run the full ingest pass over a validated example set
///
/// Two sweeps: the first assigns tile indices and builds the index grids so
/// the final unique count is known, the second populates the connectivity
/// table. With `empty_as_tile`, holes and out-of-bounds neighbors both map to
/// the empty sentinel; otherwise they are skipped, never recorded as false.
///
/// # Errors
///
/// Propagates validation failures from [`validate_examples`].
pub fn ingest(
    maps: &[TrainingMap],
    kind: ConnectivityKind,
    borders: BorderFlags,
    empty_as_tile: bool,
    existing: Option<ExistingState>,
) -> Result<IngestResult> {
    let layer_count = validate_examples(maps)?;

    let (mut unique, prior_connectivity, mut empty_index) = match existing {
        Some(state) => (
            UniqueTileMap::from_tiles(state.tiles),
            Some(state.connectivity),
            state.empty_index,
        ),
        None => (UniqueTileMap::new(), None, None),
    };

    if empty_as_tile && empty_index.is_none() {
        empty_index = Some(unique.get_or_assign(&LayeredTile::empty(layer_count)));
    }

    let index_grids: Vec<Array2<Option<usize>>> = maps
        .iter()
        .map(|map| index_grid_for(map, &mut unique, empty_index))
        .collect();

    let unique_count = unique.len();
    let mut connectivity = match prior_connectivity {
        Some(prior) => prior.grown(unique_count),
        None => ConnectivityTable::new(kind, unique_count),
    };

    for (map, grid) in maps.iter().zip(&index_grids) {
        record_adjacencies(map, grid, kind, borders, empty_index, &mut connectivity);
    }

    debug!(
        "ingest: {} maps, {} unique tiles, {} layers",
        maps.len(),
        unique_count,
        layer_count
    );

    Ok(IngestResult {
        tiles: unique.into_tiles(),
        index_grids,
        connectivity,
        empty_index,
        layer_count,
    })
}

/// Assign indices for one example, producing its index grid
fn index_grid_for(
    map: &TrainingMap,
    unique: &mut UniqueTileMap,
    empty_index: Option<usize>,
) -> Array2<Option<usize>> {
    let mut grid = Array2::from_elem((map.height(), map.width()), None);
    for y in 0..map.height() {
        for x in 0..map.width() {
            let tile = map.tile_at(x, y);
            let index = if tile.is_empty() {
                empty_index
            } else {
                Some(unique.get_or_assign(&tile))
            };
            if let Some(cell) = grid.get_mut([y, x]) {
                *cell = index;
            }
        }
    }
    grid
}

/// Record every observed pair and border occupancy for one example
fn record_adjacencies(
    map: &TrainingMap,
    grid: &Array2<Option<usize>>,
    kind: ConnectivityKind,
    borders: BorderFlags,
    empty_index: Option<usize>,
    connectivity: &mut ConnectivityTable,
) {
    let region = Region::new([0, 0], [map.width(), map.height()]);
    for y in 0..map.height() {
        for x in 0..map.width() {
            let Some(a) = grid.get([y, x]).copied().flatten() else {
                continue;
            };

            for &direction in kind.directions() {
                let offset = direction.offset(kind, y as i32);
                let nx = x as i32 + offset[0];
                let ny = y as i32 + offset[1];
                let b = if region.contains_local(nx, ny) {
                    grid.get([ny as usize, nx as usize]).copied().flatten()
                } else {
                    empty_index
                };
                if let Some(b) = b {
                    connectivity.observe(direction, a, b);
                }
            }

            for side in BorderSide::all() {
                if borders.side(side) && side.holds(&region, x, y) {
                    connectivity.observe_border(side, a);
                }
            }
        }
    }
}
