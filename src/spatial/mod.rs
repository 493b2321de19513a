//! Spatial data structures and grid geometry
//!
//! This module contains spatial-related functionality including:
//! - Generation and training regions with local/absolute coordinate mapping
//! - Direction sets for four-way, eight-way, and hexagonal connectivity
//! - Tile handles, layered tiles, and the host tilemap adapter

/// Connectivity kinds, directions, and neighbor geometry
pub mod geometry;
/// Rectangular regions and cell indexing
pub mod region;
/// Tile data structures and the host grid adapter
pub mod tiles;

pub use geometry::{BorderFlags, BorderSide, ConnectivityKind, Direction};
pub use region::Region;
pub use tiles::{LayeredTile, MapBuffer, TileGrid, TileHandle};
