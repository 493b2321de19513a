//! Trained-generator facade
//!
//! A [`Generator`] owns everything learned at build time: the unique-tile
//! table, the connectivity tables, and the classifier weights. A generation
//! run owns its own domains, high-priority list, and search stack; nothing
//! here mutates the learned state, so a generator can serve any number of
//! sequential runs.

use std::collections::HashMap;

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::algorithm::predictor::PredictorEngine;
use crate::algorithm::revision::{RevisionContext, UndoTrail};
use crate::algorithm::solver::{self, HighPriorityCell, SearchState};
use crate::algorithm::weights::GeneratorWeights;
use crate::analysis::connectivity::ConnectivityTable;
use crate::io::configuration::DEFAULT_SEED;
use crate::io::error::{EngineError, Result, invalid_parameter};
use crate::math::IndexSet;
use crate::math::sampling::temperature_scale;
use crate::spatial::geometry::{BorderFlags, ConnectivityKind};
use crate::spatial::region::Region;
use crate::spatial::tiles::{LayeredTile, TileGrid, TileHandle};

/// Per-run generation settings
#[derive(Clone, Copy, Debug)]
pub struct GenerateOptions {
    /// Collapse randomness: negative is near-deterministic, positive noisy
    pub temperature: f64,
    /// Discard conflicting preexisting tiles instead of failing
    pub forceful: bool,
    /// Seed for every stochastic choice in the run
    pub seed: u64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            forceful: false,
            seed: DEFAULT_SEED,
        }
    }
}

/// A trained tilemap generator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Generator {
    layer_count: usize,
    tiles: Vec<LayeredTile>,
    enforce_borders: BorderFlags,
    weights: GeneratorWeights,
    connectivity: ConnectivityTable,
    empty_index: Option<usize>,
}

impl Generator {
    /// Assemble a generator from trained parts
    pub(crate) fn from_parts(
        layer_count: usize,
        tiles: Vec<LayeredTile>,
        enforce_borders: BorderFlags,
        weights: GeneratorWeights,
        connectivity: ConnectivityTable,
        empty_index: Option<usize>,
    ) -> Self {
        Self {
            layer_count,
            tiles,
            enforce_borders,
            weights,
            connectivity,
            empty_index,
        }
    }

    /// Number of layers this generator was trained on
    pub const fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// The unique-tile table in index order
    pub fn tiles(&self) -> &[LayeredTile] {
        &self.tiles
    }

    /// Number of distinct layered tiles
    pub fn unique_count(&self) -> usize {
        self.tiles.len()
    }

    /// Neighborhood radius of the classifier
    pub const fn radius(&self) -> usize {
        self.weights.radius()
    }

    /// Grid connectivity the generator was trained for
    pub const fn connectivity_kind(&self) -> ConnectivityKind {
        self.connectivity.kind()
    }

    /// Observed adjacency tables
    pub const fn connectivity(&self) -> &ConnectivityTable {
        &self.connectivity
    }

    /// Classifier weights
    pub const fn weights(&self) -> &GeneratorWeights {
        &self.weights
    }

    /// Border sides enforced against the observed border tables
    pub const fn enforce_borders(&self) -> BorderFlags {
        self.enforce_borders
    }

    /// Index of the empty sentinel tile, when empty cells are a tile
    pub const fn empty_index(&self) -> Option<usize> {
        self.empty_index
    }

    /// Cumulative training epochs
    pub const fn epochs_trained(&self) -> u64 {
        self.weights.epochs_trained()
    }

    /// Fill a region of the host grid
    ///
    /// Preexisting tiles inside the region constrain the result; with
    /// `forceful` they are discarded (but still favored) when they make the
    /// problem infeasible.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The generator's tile table is empty
    /// - The grid's layer count differs from the trained layer count
    /// - The region is degenerate
    /// - No consistent assignment exists (`Unsatisfiable`), or none exists
    ///   even after forceful repair (`BorderImpossible`)
    pub fn generate(
        &self,
        grid: &mut impl TileGrid,
        region: Region,
        options: &GenerateOptions,
    ) -> Result<()> {
        if self.tiles.is_empty() {
            return Err(EngineError::EmptyUniqueTileSet);
        }
        if grid.layer_count() != self.layer_count {
            return Err(EngineError::LayerCountMismatch {
                expected: self.layer_count,
                found: grid.layer_count(),
            });
        }
        if region.width() == 0 || region.height() == 0 {
            return Err(invalid_parameter(
                "region",
                &format!("{}x{}", region.width(), region.height()),
                &"region must be at least 1x1",
            ));
        }

        let mut rng = StdRng::seed_from_u64(options.seed);
        let noise_scale = temperature_scale(options.temperature);
        let unique = self.unique_count();
        let area = region.area();

        let (mut domains, mut committed, high_priority) = self.prepare(grid, region);
        let prep_consistent = domains.iter().all(|domain| !domain.is_empty());

        // Eagerly honor cells the preexisting tiles fully determine.
        for cell in 0..area {
            if let Some(value) = committed.get(cell).copied().flatten() {
                self.write_cell(grid, region, cell, value);
            }
        }

        let ctx = RevisionContext {
            connectivity: &self.connectivity,
            region,
            enforce_borders: self.enforce_borders,
        };

        let mut trail = UndoTrail::new();
        let established =
            prep_consistent && ctx.establish(&mut domains, &committed, &mut trail);

        let mut state = if established {
            let preferred = self.preview(&domains, &committed, region, noise_scale, &mut rng);
            SearchState {
                domains,
                committed,
                preferred,
                noise: (0..area).map(|_| rng.random::<f64>()).collect(),
                hp_active: vec![true; high_priority.len()],
                high_priority,
                trail,
            }
        } else {
            if !options.forceful {
                return Err(EngineError::Unsatisfiable);
            }
            debug!("preexisting tiles are unsatisfiable; retrying forcefully");

            // Forceful repair: drop the hard constraints, keep the original
            // high-priority candidates as a soft preference.
            let mut domains: Vec<IndexSet> = (0..area).map(|_| IndexSet::full(unique)).collect();
            committed.fill(None);
            let mut trail = UndoTrail::new();
            if !ctx.establish(&mut domains, &committed, &mut trail) {
                return Err(EngineError::BorderImpossible);
            }
            let preferred = self.preview(&domains, &committed, region, noise_scale, &mut rng);
            SearchState {
                domains,
                committed,
                preferred,
                noise: (0..area).map(|_| rng.random::<f64>()).collect(),
                hp_active: vec![true; high_priority.len()],
                high_priority,
                trail,
            }
        };

        if !solver::search(&ctx, &mut state) {
            return Err(EngineError::Unsatisfiable);
        }

        for cell in 0..area {
            if let Some(value) = state.committed.get(cell).copied().flatten() {
                self.write_cell(grid, region, cell, value);
            }
        }
        Ok(())
    }

    /// Initial domains, eager commitments, and the high-priority list
    ///
    /// Each cell's domain is the intersection, across layers, of the
    /// candidates matching its preexisting handle on that layer; cells with
    /// no preexisting handle on any layer keep the full set.
    fn prepare(
        &self,
        grid: &impl TileGrid,
        region: Region,
    ) -> (Vec<IndexSet>, Vec<Option<usize>>, Vec<HighPriorityCell>) {
        let unique = self.unique_count();
        let candidates_by_layer = self.candidate_lookup();

        let blocks: Vec<_> = (0..self.layer_count)
            .map(|layer| grid.read_block(layer, region))
            .collect();

        let mut domains = Vec::with_capacity(region.area());
        let mut committed = vec![None; region.area()];
        let mut high_priority = Vec::new();

        for y in 0..region.height() {
            for x in 0..region.width() {
                let mut domain = IndexSet::full(unique);
                let mut constrained = false;

                for (layer, block) in blocks.iter().enumerate() {
                    let Some(handle) = block.get([y, x]).copied().flatten() else {
                        continue;
                    };
                    constrained = true;
                    let matching = candidates_by_layer
                        .get(layer)
                        .and_then(|lookup| lookup.get(&handle));
                    match matching {
                        Some(matching) => domain.intersect_with(matching),
                        None => domain = IndexSet::new(unique),
                    }
                }

                let cell = region.index(x, y);
                if constrained {
                    if domain.count() == 1 {
                        if let Some(slot) = committed.get_mut(cell) {
                            *slot = domain.get_dense(0);
                        }
                    }
                    // Committed cells keep their entry too: it lies dormant
                    // while the commitment stands and becomes the user's
                    // preference once forceful repair discards it.
                    if !domain.is_empty() && domain.count() < unique && region.on_border(x, y) {
                        high_priority.push(HighPriorityCell {
                            cell,
                            candidates: domain.clone(),
                        });
                    }
                }
                domains.push(domain);
            }
        }

        (domains, committed, high_priority)
    }

    /// Per-layer map from a preexisting handle to the candidate indices
    /// carrying that handle on that layer
    fn candidate_lookup(&self) -> Vec<HashMap<TileHandle, IndexSet>> {
        let unique = self.unique_count();
        let mut lookup: Vec<HashMap<TileHandle, IndexSet>> = vec![HashMap::new(); self.layer_count];
        for (index, tile) in self.tiles.iter().enumerate() {
            for (layer, table) in lookup.iter_mut().enumerate() {
                if let Some(handle) = tile.layer(layer) {
                    table
                        .entry(handle)
                        .or_insert_with(|| IndexSet::new(unique))
                        .add(index);
                }
            }
        }
        lookup
    }

    /// Run the engine once over the region for non-binding preferences
    ///
    /// Collapses are restricted to the current domains; already-committed
    /// cells are fed in as collapsed so their neighborhoods see them.
    fn preview(
        &self,
        domains: &[IndexSet],
        committed: &[Option<usize>],
        region: Region,
        noise_scale: f64,
        rng: &mut StdRng,
    ) -> Vec<Option<usize>> {
        let mut engine = PredictorEngine::new(region, self.radius(), self.weights.acknowledge());
        engine.reset(rng);

        for cell in 0..region.area() {
            if let Some(value) = committed.get(cell).copied().flatten() {
                let (x, y) = region.position(cell);
                engine.mark_collapsed(x, y, value);
            }
        }

        let mut preferred = vec![None; region.area()];
        while let Some((x, y)) = engine.next_pos() {
            let cell = region.index(x, y);
            let collapse =
                engine.collapse(&self.weights, x, y, domains.get(cell), noise_scale, rng);
            match collapse {
                Some(value) => {
                    if let Some(slot) = preferred.get_mut(cell) {
                        *slot = Some(value);
                    }
                    engine.mark_collapsed(x, y, value);
                }
                None => engine.mark_skipped(x, y),
            }
        }
        preferred
    }

    /// Write one committed cell back through the adapter, layer by layer
    fn write_cell(&self, grid: &mut impl TileGrid, region: Region, cell: usize, value: usize) {
        let Some(tile) = self.tiles.get(value) else {
            return;
        };
        let (x, y) = region.position(cell);
        let (abs_x, abs_y) = region.absolute(x, y);
        for layer in 0..self.layer_count {
            grid.write(layer, abs_x, abs_y, tile.layer(layer));
        }
    }
}
