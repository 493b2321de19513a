//! Stateful driver over a region that simulates the generation order
//!
//! The same engine runs in two modes: during training it visits cells in the
//! order it would choose at inference and applies gradient steps toward the
//! true tiles; during generation it produces a per-cell preferred collapse
//! that the solver uses for its ordering heuristics.

use rand::{Rng, rngs::StdRng};

use crate::algorithm::weights::GeneratorWeights;
use crate::math::IndexSet;
use crate::math::sampling::{gumbel_noise, softmax_in_place};
use crate::spatial::geometry::{BorderFlags, BorderSide};
use crate::spatial::region::Region;

/// Floor added to the target probability before the loss logarithm
const LOSS_EPSILON: f64 = 1.0e-12;

/// Generation-order engine bound to one rectangular region
///
/// Cell priority is the number of already-collapsed cells inside the
/// Chebyshev radius-`r` neighborhood, with per-cell noise drawn at reset
/// breaking ties. The engine is done once every cell is collapsed or skipped.
pub struct PredictorEngine {
    region: Region,
    radius: usize,
    acknowledge: BorderFlags,
    collapsed: Vec<Option<usize>>,
    skipped: Vec<bool>,
    collapsed_neighbors: Vec<u32>,
    tie_noise: Vec<f64>,
    remaining: usize,
}

impl PredictorEngine {
    /// Create an engine over a region; call [`reset`](Self::reset) before use
    pub fn new(region: Region, radius: usize, acknowledge: BorderFlags) -> Self {
        let area = region.area();
        Self {
            region,
            radius,
            acknowledge,
            collapsed: vec![None; area],
            skipped: vec![false; area],
            collapsed_neighbors: vec![0; area],
            tie_noise: vec![0.0; area],
            remaining: area,
        }
    }

    /// The region this engine drives
    pub const fn region(&self) -> Region {
        self.region
    }

    /// Clear all collapse state and draw fresh tie-breaking noise
    pub fn reset(&mut self, rng: &mut StdRng) {
        for cell in &mut self.collapsed {
            *cell = None;
        }
        self.skipped.fill(false);
        self.collapsed_neighbors.fill(0);
        for noise in &mut self.tie_noise {
            *noise = rng.random::<f64>();
        }
        self.remaining = self.region.area();
    }

    /// Test whether every cell has been collapsed or skipped
    pub const fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Test whether a cell still awaits a collapse or skip
    fn is_pending(&self, index: usize) -> bool {
        self.collapsed.get(index).is_some_and(Option::is_none)
            && !self.skipped.get(index).copied().unwrap_or(true)
    }

    /// The pending cell with the most collapsed neighbors, noise-tied
    pub fn next_pos(&self) -> Option<(usize, usize)> {
        let mut best: Option<(f64, usize)> = None;
        for index in 0..self.region.area() {
            if !self.is_pending(index) {
                continue;
            }
            let count = self.collapsed_neighbors.get(index).copied().unwrap_or(0);
            let noise = self.tie_noise.get(index).copied().unwrap_or(0.0);
            let priority = f64::from(count) + noise;
            if best.is_none_or(|(best_priority, _)| priority > best_priority) {
                best = Some((priority, index));
            }
        }
        best.map(|(_, index)| self.region.position(index))
    }

    /// Tile index a cell was collapsed to, if any
    pub fn collapsed_at(&self, x: usize, y: usize) -> Option<usize> {
        self.collapsed.get(self.region.index(x, y)).copied().flatten()
    }

    /// Commit a cell to a tile index and raise its neighbors' priorities
    pub fn mark_collapsed(&mut self, x: usize, y: usize, tile_index: usize) {
        let index = self.region.index(x, y);
        let was_pending = self.is_pending(index);
        if let Some(cell) = self.collapsed.get_mut(index) {
            *cell = Some(tile_index);
        }
        if was_pending {
            self.remaining -= 1;
        }

        let r = self.radius as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if self.region.contains_local(nx, ny) {
                    let neighbor = self.region.index(nx as usize, ny as usize);
                    if let Some(count) = self.collapsed_neighbors.get_mut(neighbor) {
                        *count += 1;
                    }
                }
            }
        }
    }

    /// Advance past a cell without collapsing it
    ///
    /// Skipped cells stay "uncollapsed" in every neighborhood feature.
    pub fn mark_skipped(&mut self, x: usize, y: usize) {
        let index = self.region.index(x, y);
        let was_pending = self.is_pending(index);
        if let Some(cell) = self.skipped.get_mut(index) {
            *cell = true;
        }
        if was_pending {
            self.remaining -= 1;
        }
    }

    /// Active feature index per neighborhood cell, row-major over the block
    ///
    /// The center is always the uncollapsed slot. Cells beyond the region
    /// produce a border feature when that side is acknowledged (vertical
    /// sides win at corners) and fall back to the uncollapsed slot otherwise.
    pub fn features(&self, weights: &GeneratorWeights, x: usize, y: usize) -> Vec<usize> {
        let r = self.radius as i32;
        let side = weights.side();
        let mut features = Vec::with_capacity(side * side);

        for dy in -r..=r {
            for dx in -r..=r {
                if dx == 0 && dy == 0 {
                    features.push(weights.uncollapsed_feature());
                    continue;
                }
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                let feature = if self.region.contains_local(nx, ny) {
                    let index = self.region.index(nx as usize, ny as usize);
                    self.collapsed
                        .get(index)
                        .copied()
                        .flatten()
                        .unwrap_or_else(|| weights.uncollapsed_feature())
                } else {
                    self.out_of_region_feature(weights, nx, ny)
                };
                features.push(feature);
            }
        }
        features
    }

    fn out_of_region_feature(&self, weights: &GeneratorWeights, nx: i32, ny: i32) -> usize {
        if ny < 0 && self.acknowledge.bottom {
            return weights.border_feature(BorderSide::Bottom);
        }
        if ny >= self.region.height() as i32 && self.acknowledge.top {
            return weights.border_feature(BorderSide::Top);
        }
        if nx < 0 && self.acknowledge.left {
            return weights.border_feature(BorderSide::Left);
        }
        if nx >= self.region.width() as i32 && self.acknowledge.right {
            return weights.border_feature(BorderSide::Right);
        }
        weights.uncollapsed_feature()
    }

    /// Class probabilities at a cell: `softmax(logits + scaled Gumbel)`
    pub fn probabilities(
        &self,
        weights: &GeneratorWeights,
        x: usize,
        y: usize,
        noise_scale: f64,
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let features = self.features(weights, x, y);
        let mut logits = weights.logits(&features);
        let noise = gumbel_noise(rng, logits.len(), noise_scale);
        for (logit, g) in logits.iter_mut().zip(&noise) {
            *logit += g;
        }
        softmax_in_place(&mut logits);
        logits
    }

    /// Sample a collapse: the most probable class the domain permits
    ///
    /// With no domain (pure preview) the argmax runs over all classes.
    pub fn collapse(
        &self,
        weights: &GeneratorWeights,
        x: usize,
        y: usize,
        domain: Option<&IndexSet>,
        noise_scale: f64,
        rng: &mut StdRng,
    ) -> Option<usize> {
        let probabilities = self.probabilities(weights, x, y, noise_scale, rng);
        let mut best: Option<(f64, usize)> = None;
        for (class, &probability) in probabilities.iter().enumerate() {
            if domain.is_some_and(|d| !d.contains(class)) {
                continue;
            }
            if best.is_none_or(|(best_probability, _)| probability > best_probability) {
                best = Some((probability, class));
            }
        }
        best.map(|(_, class)| class)
    }

    /// One training step toward the true tile at a cell
    ///
    /// Returns the cross-entropy loss, or `None` when the target probability
    /// came out non-finite or fully underflowed; the caller treats that as a
    /// numeric fault and stops.
    pub fn train_step(
        &self,
        weights: &mut GeneratorWeights,
        x: usize,
        y: usize,
        target: usize,
        learning_rate: f64,
        rng: &mut StdRng,
    ) -> Option<f64> {
        let features = self.features(weights, x, y);
        let mut logits = weights.logits(&features);
        let noise = gumbel_noise(rng, logits.len(), 1.0);
        for (logit, g) in logits.iter_mut().zip(&noise) {
            *logit += g;
        }
        softmax_in_place(&mut logits);
        let probabilities = logits;

        let target_probability = probabilities.get(target).copied()?;
        if !target_probability.is_finite() || target_probability == 0.0 {
            return None;
        }

        weights.apply_gradient(&features, &probabilities, target, learning_rate);

        let loss = -(target_probability + LOSS_EPSILON).ln();
        loss.is_finite().then_some(loss)
    }
}
