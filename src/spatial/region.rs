use serde::{Deserialize, Serialize};

/// Rectangular block of cells with an absolute origin
///
/// Coordinates inside a region are 0-indexed local; `origin` maps local
/// `(0, 0)` onto the host tilemap. Cells are addressed row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Absolute coordinates of the local origin (x, y)
    pub origin: [i32; 2],
    /// Extent in cells (width, height), both at least 1
    pub size: [usize; 2],
}

impl Region {
    /// Create a region from an absolute origin and a size
    pub const fn new(origin: [i32; 2], size: [usize; 2]) -> Self {
        Self { origin, size }
    }

    /// Width in cells
    pub const fn width(&self) -> usize {
        self.size[0]
    }

    /// Height in cells
    pub const fn height(&self) -> usize {
        self.size[1]
    }

    /// Total cell count
    pub const fn area(&self) -> usize {
        self.size[0] * self.size[1]
    }

    /// Test whether local coordinates fall inside the region
    pub const fn contains_local(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size[0] && (y as usize) < self.size[1]
    }

    /// Row-major cell index for local coordinates
    pub const fn index(&self, x: usize, y: usize) -> usize {
        y * self.size[0] + x
    }

    /// Local coordinates for a row-major cell index
    pub const fn position(&self, index: usize) -> (usize, usize) {
        (index % self.size[0], index / self.size[0])
    }

    /// Absolute coordinates for local coordinates
    pub const fn absolute(&self, x: usize, y: usize) -> (i32, i32) {
        (self.origin[0] + x as i32, self.origin[1] + y as i32)
    }

    /// Test whether a cell lies on the region's outer ring
    pub const fn on_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.size[0] || y + 1 == self.size[1]
    }
}
