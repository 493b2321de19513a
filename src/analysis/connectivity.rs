use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math::IndexSet;
use crate::spatial::geometry::{BORDER_COUNT, BorderSide, ConnectivityKind, DIRECTION_COUNT, Direction};

/// Dense record of every tile adjacency observed in the examples
///
/// One `U x U` boolean table per direction plus one length-`U` table per
/// border side. Population happens during ingest; generation only queries.
/// Observing a pair records it in both directions at once, so the relation
/// is symmetric by construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectivityTable {
    kind: ConnectivityKind,
    unique_count: usize,
    pairs: Vec<BitVec>,
    borders: Vec<BitVec>,
}

impl ConnectivityTable {
    /// Create an all-false table for `unique_count` tile indices
    pub fn new(kind: ConnectivityKind, unique_count: usize) -> Self {
        Self {
            kind,
            unique_count,
            pairs: vec![bitvec![0; unique_count * unique_count]; DIRECTION_COUNT],
            borders: vec![bitvec![0; unique_count]; BORDER_COUNT],
        }
    }

    /// Copy this table into one sized for more tile indices
    ///
    /// Existing observations keep their bit positions under the new row
    /// stride; new indices start with nothing observed.
    #[must_use]
    pub fn grown(&self, unique_count: usize) -> Self {
        let mut next = Self::new(self.kind, unique_count);
        for a in 0..self.unique_count {
            for b in 0..self.unique_count {
                for slot in 0..DIRECTION_COUNT {
                    let seen = self
                        .pairs
                        .get(slot)
                        .and_then(|table| table.get(a * self.unique_count + b).as_deref().copied())
                        .unwrap_or(false);
                    if seen {
                        if let Some(table) = next.pairs.get_mut(slot) {
                            table.set(a * unique_count + b, true);
                        }
                    }
                }
            }
        }
        for (slot, border) in self.borders.iter().enumerate() {
            for a in border.iter_ones() {
                if let Some(table) = next.borders.get_mut(slot) {
                    table.set(a, true);
                }
            }
        }
        next
    }

    /// Connectivity this table was built for
    pub const fn kind(&self) -> ConnectivityKind {
        self.kind
    }

    /// Number of tile indices covered
    pub const fn unique_count(&self) -> usize {
        self.unique_count
    }

    /// Record that tile `a` was seen with tile `b` in `direction`
    ///
    /// The mirrored fact (`b` with `a` in the opposite direction) is recorded
    /// in the same call.
    pub fn observe(&mut self, direction: Direction, a: usize, b: usize) {
        if a >= self.unique_count || b >= self.unique_count {
            return;
        }
        if let Some(table) = self.pairs.get_mut(direction.index()) {
            table.set(a * self.unique_count + b, true);
        }
        if let Some(table) = self.pairs.get_mut(direction.opposite().index()) {
            table.set(b * self.unique_count + a, true);
        }
    }

    /// Test whether tile `a` was ever observed with tile `b` in `direction`
    pub fn get(&self, direction: Direction, a: usize, b: usize) -> bool {
        if a >= self.unique_count || b >= self.unique_count {
            return false;
        }
        self.pairs
            .get(direction.index())
            .and_then(|table| table.get(a * self.unique_count + b).as_deref().copied())
            .unwrap_or(false)
    }

    /// Record that tile `a` was observed on border `side`
    pub fn observe_border(&mut self, side: BorderSide, a: usize) {
        if a >= self.unique_count {
            return;
        }
        if let Some(table) = self.borders.get_mut(side.index()) {
            table.set(a, true);
        }
    }

    /// Test whether tile `a` was ever observed on border `side`
    pub fn get_border(&self, side: BorderSide, a: usize) -> bool {
        self.borders
            .get(side.index())
            .and_then(|table| table.get(a).as_deref().copied())
            .unwrap_or(false)
    }

    /// Test whether `a` at the observer keeps at least one candidate alive in
    /// the neighbor's domain along `direction`
    pub fn supported(&self, direction: Direction, a: usize, neighbor: &IndexSet) -> bool {
        neighbor.iter().any(|b| self.get(direction, a, b))
    }

    /// Count the neighbor-domain candidates that placing `value` at the
    /// observer would rule out along `direction`
    ///
    /// The sum of these counts over all directions is the least-constraining
    /// value score; smaller is better.
    pub fn eliminated(&self, direction: Direction, value: usize, neighbor: &IndexSet) -> usize {
        neighbor
            .iter()
            .filter(|&b| !self.get(direction, value, b))
            .count()
    }
}
