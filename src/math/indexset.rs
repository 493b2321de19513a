use std::fmt;

/// Fixed-capacity set of integers in `[0, capacity)`
///
/// Backed by a densely packed member list and a sparse value-to-position map,
/// giving constant-time membership tests, insertion, and positional removal.
/// Every candidate domain in the solver is one of these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSet {
    dense: Vec<usize>,
    sparse: Vec<usize>,
}

/// Sparse-slot marker for values not currently in the set
const ABSENT: usize = usize::MAX;

impl IndexSet {
    /// Create an empty set able to hold values in `[0, capacity)`
    pub fn new(capacity: usize) -> Self {
        Self {
            dense: Vec::with_capacity(capacity),
            sparse: vec![ABSENT; capacity],
        }
    }

    /// Create a set containing every value `0..capacity` in order
    pub fn full(capacity: usize) -> Self {
        Self {
            dense: (0..capacity).collect(),
            sparse: (0..capacity).collect(),
        }
    }

    /// Maximum value count this set was sized for
    pub fn capacity(&self) -> usize {
        self.sparse.len()
    }

    /// Number of values currently in the set
    pub fn count(&self) -> usize {
        self.dense.len()
    }

    /// Test if no values are present
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Test value membership
    pub fn contains(&self, value: usize) -> bool {
        self.sparse.get(value).is_some_and(|&slot| slot != ABSENT)
    }

    /// Insert a value; out-of-range or already-present values are ignored
    pub fn add(&mut self, value: usize) {
        if value >= self.sparse.len() || self.contains(value) {
            return;
        }
        if let Some(slot) = self.sparse.get_mut(value) {
            *slot = self.dense.len();
            self.dense.push(value);
        }
    }

    /// Remove and return the value at dense position `index`
    ///
    /// The last member is swapped into the vacated position, so removal is
    /// constant-time at the cost of perturbing dense order.
    pub fn remove_at(&mut self, index: usize) -> Option<usize> {
        if index >= self.dense.len() {
            return None;
        }
        let removed = self.dense.swap_remove(index);
        if let Some(slot) = self.sparse.get_mut(removed) {
            *slot = ABSENT;
        }
        if let Some(&moved) = self.dense.get(index) {
            if let Some(slot) = self.sparse.get_mut(moved) {
                *slot = index;
            }
        }
        Some(removed)
    }

    /// Remove a value by content if present, returning whether it was removed
    pub fn remove(&mut self, value: usize) -> bool {
        match self.sparse.get(value).copied() {
            Some(slot) if slot != ABSENT => self.remove_at(slot).is_some(),
            _ => false,
        }
    }

    /// Read the value at dense position `index`
    pub fn get_dense(&self, index: usize) -> Option<usize> {
        self.dense.get(index).copied()
    }

    /// Keep only values also present in `other`
    pub fn intersect_with(&mut self, other: &Self) {
        for index in (0..self.dense.len()).rev() {
            let keep = self
                .dense
                .get(index)
                .is_some_and(|&value| other.contains(value));
            if !keep {
                self.remove_at(index);
            }
        }
    }

    /// Create a new set containing the intersection
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    /// Iterate members in dense order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.dense.iter().copied()
    }

    /// Members in dense order as a slice
    pub fn as_slice(&self) -> &[usize] {
        &self.dense
    }
}

impl fmt::Display for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexSet({} values: {:?})", self.count(), self.dense)
    }
}
