//! Arc-consistency revision with trail-based undo
//!
//! Domains are index-addressed [`IndexSet`]s, one per region cell; the
//! constraint graph is cyclic, so nothing here holds references between
//! cells. Every value removal is appended to an undo trail, and replaying a
//! trail suffix in reverse restores the predecessor state exactly.

use std::collections::VecDeque;

use crate::analysis::connectivity::ConnectivityTable;
use crate::math::IndexSet;
use crate::spatial::geometry::{BorderFlags, BorderSide, Direction, border_for_missing_neighbor};
use crate::spatial::region::Region;

/// Append-only record of `(cell, removed value)` pairs
#[derive(Debug, Default)]
pub struct UndoTrail {
    records: Vec<(usize, usize)>,
}

impl UndoTrail {
    /// Create an empty trail
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Current length, used as a revert mark
    pub fn mark(&self) -> usize {
        self.records.len()
    }

    /// Record one removal
    pub fn record(&mut self, cell: usize, value: usize) {
        self.records.push((cell, value));
    }

    /// Undo every removal after `mark`, most recent first
    pub fn revert_to(&mut self, mark: usize, domains: &mut [IndexSet]) {
        while self.records.len() > mark {
            if let Some((cell, value)) = self.records.pop() {
                if let Some(domain) = domains.get_mut(cell) {
                    domain.add(value);
                }
            }
        }
    }
}

/// Read-only context shared by every revision of one generation run
pub struct RevisionContext<'a> {
    /// Observed adjacency and border tables
    pub connectivity: &'a ConnectivityTable,
    /// The generation region
    pub region: Region,
    /// Border sides whose observed-occupancy constraint is enforced
    pub enforce_borders: BorderFlags,
}

impl RevisionContext<'_> {
    /// Establish arc consistency over every cell from scratch
    ///
    /// Seeds the queue with every `(cell, direction)` pair. On a wipeout the
    /// entire trail is reverted before reporting infeasibility, leaving the
    /// domains untouched.
    pub fn establish(
        &self,
        domains: &mut [IndexSet],
        committed: &[Option<usize>],
        trail: &mut UndoTrail,
    ) -> bool {
        let start = trail.mark();
        let mut queue: VecDeque<(usize, Direction)> = VecDeque::new();
        for cell in 0..self.region.area() {
            for &direction in self.connectivity.kind().directions() {
                queue.push_back((cell, direction));
            }
        }
        if self.propagate(&mut queue, domains, committed, trail) {
            true
        } else {
            trail.revert_to(start, domains);
            false
        }
    }

    /// Re-establish consistency after committing a value at `cell`
    ///
    /// Seeds the queue with every in-region neighbor's arc back toward the
    /// committed cell. Returns false on a wipeout; the caller owns the revert
    /// mark for the trial.
    pub fn propagate_from(
        &self,
        cell: usize,
        domains: &mut [IndexSet],
        committed: &[Option<usize>],
        trail: &mut UndoTrail,
    ) -> bool {
        let mut queue = VecDeque::new();
        self.enqueue_neighbors(cell, &mut queue);
        self.propagate(&mut queue, domains, committed, trail)
    }

    /// Arcs from every in-region neighbor of `cell` back toward it
    fn enqueue_neighbors(&self, cell: usize, queue: &mut VecDeque<(usize, Direction)>) {
        let (x, y) = self.region.position(cell);
        for &direction in self.connectivity.kind().directions() {
            let offset = direction.offset(self.connectivity.kind(), y as i32);
            let nx = x as i32 + offset[0];
            let ny = y as i32 + offset[1];
            if self.region.contains_local(nx, ny) {
                let neighbor = self.region.index(nx as usize, ny as usize);
                queue.push_back((neighbor, direction.opposite()));
            }
        }
    }

    /// Drain the work queue; false when some domain emptied
    fn propagate(
        &self,
        queue: &mut VecDeque<(usize, Direction)>,
        domains: &mut [IndexSet],
        committed: &[Option<usize>],
        trail: &mut UndoTrail,
    ) -> bool {
        while let Some((cell, direction)) = queue.pop_front() {
            match self.revise(cell, direction, domains, committed, trail) {
                Revision::Wipeout => return false,
                Revision::Unchanged => {}
                Revision::Changed => self.enqueue_neighbors(cell, queue),
            }
        }
        true
    }

    /// Remove from `cell`'s domain every value without a supporter along
    /// `direction`
    fn revise(
        &self,
        cell: usize,
        direction: Direction,
        domains: &mut [IndexSet],
        committed: &[Option<usize>],
        trail: &mut UndoTrail,
    ) -> Revision {
        let (x, y) = self.region.position(cell);
        let kind = self.connectivity.kind();
        let offset = direction.offset(kind, y as i32);
        let nx = x as i32 + offset[0];
        let ny = y as i32 + offset[1];

        let support = if self.region.contains_local(nx, ny) {
            let neighbor = self.region.index(nx as usize, ny as usize);
            match committed.get(neighbor).copied().flatten() {
                Some(b) => Support::Committed(b),
                None => Support::Domain(neighbor),
            }
        } else {
            match border_for_missing_neighbor(direction, kind, &self.region, y) {
                Some(side) if self.enforce_borders.side(side) => Support::Border(side),
                _ => return Revision::Unchanged,
            }
        };

        // A committed cell contributes no pruning, but its value must still
        // be supported; preexisting tiles can conflict with each other.
        if let Some(a) = committed.get(cell).copied().flatten() {
            let supported = match support {
                Support::Committed(b) => self.connectivity.get(direction, a, b),
                Support::Domain(neighbor) => domains
                    .get(neighbor)
                    .is_some_and(|d| self.connectivity.supported(direction, a, d)),
                Support::Border(side) => self.connectivity.get_border(side, a),
            };
            return if supported {
                Revision::Unchanged
            } else {
                Revision::Wipeout
            };
        }

        let mut changed = false;
        let mut position = 0;
        loop {
            let Some(domain) = domains.get(cell) else {
                return Revision::Unchanged;
            };
            if position >= domain.count() {
                break;
            }
            let Some(value) = domain.get_dense(position) else {
                break;
            };

            let supported = match support {
                Support::Committed(b) => self.connectivity.get(direction, value, b),
                Support::Domain(neighbor) => domains
                    .get(neighbor)
                    .is_some_and(|d| self.connectivity.supported(direction, value, d)),
                Support::Border(side) => self.connectivity.get_border(side, value),
            };

            if supported {
                position += 1;
            } else {
                if let Some(domain) = domains.get_mut(cell) {
                    domain.remove_at(position);
                }
                trail.record(cell, value);
                changed = true;
            }
        }

        let emptied = domains.get(cell).is_some_and(IndexSet::is_empty);
        if emptied {
            Revision::Wipeout
        } else if changed {
            Revision::Changed
        } else {
            Revision::Unchanged
        }
    }
}

enum Support {
    Committed(usize),
    Domain(usize),
    Border(BorderSide),
}

enum Revision {
    Unchanged,
    Changed,
    Wipeout,
}
