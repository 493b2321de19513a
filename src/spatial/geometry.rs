//! Neighbor geometry for the supported grid connectivities
//!
//! Hexagonal grids are stored rectangularly with odd rows shifted half a cell
//! to the right; the four diagonal directions therefore resolve to different
//! offsets depending on row parity. The same parity convention is applied at
//! ingest, during revision, and in the value-ordering heuristic.

use serde::{Deserialize, Serialize};

use crate::spatial::region::Region;

/// Number of direction slots; tables are sized for the full set even when a
/// connectivity kind uses a subset
pub const DIRECTION_COUNT: usize = 8;

/// Number of border sides
pub const BORDER_COUNT: usize = 4;

/// Grid connectivity supported by a trained generator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityKind {
    /// Orthogonal neighbors only
    Four,
    /// Orthogonal plus diagonal neighbors
    Eight,
    /// Six hexagonal neighbors with row-parity diagonals
    Hex,
}

/// One neighbor direction; `y` grows upward, the bottom row is `y = 0`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

const FOUR: [Direction; 4] = [
    Direction::Top,
    Direction::Bottom,
    Direction::Left,
    Direction::Right,
];

const EIGHT: [Direction; 8] = [
    Direction::Top,
    Direction::Bottom,
    Direction::Left,
    Direction::Right,
    Direction::TopLeft,
    Direction::TopRight,
    Direction::BottomLeft,
    Direction::BottomRight,
];

const HEX: [Direction; 6] = [
    Direction::Left,
    Direction::Right,
    Direction::TopLeft,
    Direction::TopRight,
    Direction::BottomLeft,
    Direction::BottomRight,
];

impl ConnectivityKind {
    /// Directions scanned for this connectivity
    pub const fn directions(self) -> &'static [Direction] {
        match self {
            Self::Four => &FOUR,
            Self::Eight => &EIGHT,
            Self::Hex => &HEX,
        }
    }
}

impl Direction {
    /// Stable slot index used by the connectivity tables
    pub const fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Bottom => 1,
            Self::Left => 2,
            Self::Right => 3,
            Self::TopLeft => 4,
            Self::TopRight => 5,
            Self::BottomLeft => 6,
            Self::BottomRight => 7,
        }
    }

    /// The direction pointing back at the observer
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomLeft => Self::TopRight,
            Self::BottomRight => Self::TopLeft,
        }
    }

    /// Coordinate offset of the neighbor in this direction
    ///
    /// `row` is the observer's local row, needed for hexagonal diagonals:
    /// even rows reach one column left of odd rows on every diagonal.
    pub const fn offset(self, kind: ConnectivityKind, row: i32) -> [i32; 2] {
        match kind {
            ConnectivityKind::Four | ConnectivityKind::Eight => match self {
                Self::Top => [0, 1],
                Self::Bottom => [0, -1],
                Self::Left => [-1, 0],
                Self::Right => [1, 0],
                Self::TopLeft => [-1, 1],
                Self::TopRight => [1, 1],
                Self::BottomLeft => [-1, -1],
                Self::BottomRight => [1, -1],
            },
            ConnectivityKind::Hex => {
                let odd = row.rem_euclid(2);
                match self {
                    Self::Left => [-1, 0],
                    Self::Right => [1, 0],
                    Self::TopLeft => [odd - 1, 1],
                    Self::TopRight => [odd, 1],
                    Self::BottomLeft => [odd - 1, -1],
                    Self::BottomRight => [odd, -1],
                    // Top/Bottom do not exist on hex grids; treat as vertical
                    Self::Top => [0, 1],
                    Self::Bottom => [0, -1],
                }
            }
        }
    }
}

/// One of the four region borders
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl BorderSide {
    /// Stable slot index used by the border tables
    pub const fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Bottom => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }

    /// All four sides in slot order
    pub const fn all() -> [Self; BORDER_COUNT] {
        [Self::Top, Self::Bottom, Self::Left, Self::Right]
    }

    /// Test whether a local cell lies on this border of the region
    pub const fn holds(self, region: &Region, x: usize, y: usize) -> bool {
        match self {
            Self::Top => y + 1 == region.height(),
            Self::Bottom => y == 0,
            Self::Left => x == 0,
            Self::Right => x + 1 == region.width(),
        }
    }
}

/// Per-side boolean flags, used both for border enforcement and for the
/// out-of-bounds features the classifier may acknowledge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderFlags {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl BorderFlags {
    /// All four sides enabled
    pub const fn all() -> Self {
        Self {
            top: true,
            bottom: true,
            left: true,
            right: true,
        }
    }

    /// Flag for one side
    pub const fn side(self, side: BorderSide) -> bool {
        match side {
            BorderSide::Top => self.top,
            BorderSide::Bottom => self.bottom,
            BorderSide::Left => self.left,
            BorderSide::Right => self.right,
        }
    }

    /// Test whether any side is enabled
    pub const fn any(self) -> bool {
        self.top || self.bottom || self.left || self.right
    }
}

/// Border side enforced when the neighbor in `direction` falls outside the
/// region, or `None` when that arc carries no border constraint
///
/// Cardinal directions map to their own side. Hexagonal diagonals only
/// enforce the bottom border from the bottom row and the top border from the
/// top row; eight-way diagonals never enforce a border.
pub fn border_for_missing_neighbor(
    direction: Direction,
    kind: ConnectivityKind,
    region: &Region,
    y: usize,
) -> Option<BorderSide> {
    match kind {
        ConnectivityKind::Four | ConnectivityKind::Eight => match direction {
            Direction::Top => Some(BorderSide::Top),
            Direction::Bottom => Some(BorderSide::Bottom),
            Direction::Left => Some(BorderSide::Left),
            Direction::Right => Some(BorderSide::Right),
            _ => None,
        },
        ConnectivityKind::Hex => match direction {
            Direction::Left => Some(BorderSide::Left),
            Direction::Right => Some(BorderSide::Right),
            Direction::BottomLeft | Direction::BottomRight if y == 0 => Some(BorderSide::Bottom),
            Direction::TopLeft | Direction::TopRight if y + 1 == region.height() => {
                Some(BorderSide::Top)
            }
            _ => None,
        },
    }
}
