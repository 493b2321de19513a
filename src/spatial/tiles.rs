//! Tile handles, layered tiles, and the host tilemap adapter
//!
//! The engine never sees the host's tile assets. A host adapter assigns each
//! distinct per-layer asset a small opaque [`TileHandle`]; the engine relies
//! on handle equality and hashing only.

use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::spatial::region::Region;

/// Opaque identifier for one per-layer tile asset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileHandle(pub u32);

/// The full content of one cell: one optional handle per layer
///
/// Equality and hashing are element-wise; a tuple whose entries are all
/// absent is the empty sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayeredTile {
    layers: Vec<Option<TileHandle>>,
}

impl LayeredTile {
    /// Create a layered tile from per-layer handles
    pub fn new(layers: Vec<Option<TileHandle>>) -> Self {
        Self { layers }
    }

    /// The empty sentinel for a given layer count
    pub fn empty(layer_count: usize) -> Self {
        Self {
            layers: vec![None; layer_count],
        }
    }

    /// Test whether every layer is absent
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Option::is_none)
    }

    /// Handle on one layer
    pub fn layer(&self, layer: usize) -> Option<TileHandle> {
        self.layers.get(layer).copied().flatten()
    }

    /// Number of layers in the tuple
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

/// Assigns each distinct layered tile a stable small index during ingest
#[derive(Clone, Debug, Default)]
pub struct UniqueTileMap {
    lookup: HashMap<LayeredTile, usize>,
    tiles: Vec<LayeredTile>,
}

impl UniqueTileMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the lookup from an existing tile table, preserving indices
    pub fn from_tiles(tiles: Vec<LayeredTile>) -> Self {
        let lookup = tiles
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, tile)| (tile, index))
            .collect();
        Self { lookup, tiles }
    }

    /// Index already assigned to a tuple, if any
    pub fn index_of(&self, tile: &LayeredTile) -> Option<usize> {
        self.lookup.get(tile).copied()
    }

    /// Index for a tuple, assigning the next free one on first sight
    pub fn get_or_assign(&mut self, tile: &LayeredTile) -> usize {
        if let Some(index) = self.lookup.get(tile) {
            return *index;
        }
        let index = self.tiles.len();
        self.tiles.push(tile.clone());
        self.lookup.insert(tile.clone(), index);
        index
    }

    /// Number of distinct tuples seen so far
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Test whether no tuples were assigned yet
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// The index table in assignment order
    pub fn tiles(&self) -> &[LayeredTile] {
        &self.tiles
    }

    /// Consume the map, keeping only the index table
    pub fn into_tiles(self) -> Vec<LayeredTile> {
        self.tiles
    }
}

/// Host tilemap surface consumed by the engine
///
/// The four operations the engine needs from a layered tile grid: block
/// reads, single-cell writes, and occupied-bounds enumeration for automatic
/// region inference. Handle comparison is plain `Eq`.
pub trait TileGrid {
    /// Number of layers the grid carries
    fn layer_count(&self) -> usize;

    /// Read a rectangular block of handles on one layer
    ///
    /// The result is indexed `[local_y, local_x]`; cells the host has no
    /// tile for read as `None`.
    fn read_block(&self, layer: usize, region: Region) -> Array2<Option<TileHandle>>;

    /// Write one handle (or clear the cell) at absolute coordinates
    fn write(&mut self, layer: usize, x: i32, y: i32, tile: Option<TileHandle>);

    /// Bounding region of the occupied cells on one layer, if any
    fn occupied_bounds(&self, layer: usize) -> Option<Region>;
}

/// In-memory reference implementation of [`TileGrid`]
///
/// Sparse per-layer storage over unbounded signed coordinates; used by the
/// tests, the PNG adapter, and as a scratch target for generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapBuffer {
    layers: Vec<HashMap<[i32; 2], TileHandle>>,
}

impl MapBuffer {
    /// Create an empty buffer with the given layer count
    pub fn new(layer_count: usize) -> Self {
        Self {
            layers: vec![HashMap::new(); layer_count],
        }
    }

    /// Handle at absolute coordinates on one layer
    pub fn get(&self, layer: usize, x: i32, y: i32) -> Option<TileHandle> {
        self.layers.get(layer).and_then(|l| l.get(&[x, y]).copied())
    }

    /// Set or clear one cell
    pub fn set(&mut self, layer: usize, x: i32, y: i32, tile: Option<TileHandle>) {
        if let Some(cells) = self.layers.get_mut(layer) {
            match tile {
                Some(handle) => {
                    cells.insert([x, y], handle);
                }
                None => {
                    cells.remove(&[x, y]);
                }
            }
        }
    }

    /// Number of occupied cells on one layer
    pub fn occupied_count(&self, layer: usize) -> usize {
        self.layers.get(layer).map_or(0, HashMap::len)
    }
}

impl TileGrid for MapBuffer {
    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn read_block(&self, layer: usize, region: Region) -> Array2<Option<TileHandle>> {
        let mut block = Array2::from_elem((region.height(), region.width()), None);
        for y in 0..region.height() {
            for x in 0..region.width() {
                let (abs_x, abs_y) = region.absolute(x, y);
                if let Some(cell) = block.get_mut([y, x]) {
                    *cell = self.get(layer, abs_x, abs_y);
                }
            }
        }
        block
    }

    fn write(&mut self, layer: usize, x: i32, y: i32, tile: Option<TileHandle>) {
        self.set(layer, x, y, tile);
    }

    fn occupied_bounds(&self, layer: usize) -> Option<Region> {
        let cells = self.layers.get(layer)?;
        let mut min = [i32::MAX, i32::MAX];
        let mut max = [i32::MIN, i32::MIN];
        for position in cells.keys() {
            min[0] = min[0].min(position[0]);
            min[1] = min[1].min(position[1]);
            max[0] = max[0].max(position[0]);
            max[1] = max[1].max(position[1]);
        }
        if cells.is_empty() {
            return None;
        }
        Some(Region::new(
            min,
            [
                (max[0] - min[0] + 1) as usize,
                (max[1] - min[1] + 1) as usize,
            ],
        ))
    }
}
