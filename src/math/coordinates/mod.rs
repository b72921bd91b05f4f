//! Coordinate system transformations for the level grids.
//!
//! This module converts between the two coordinate systems used by the game:
//! - Grid Coordinates: integer `(x, z)` cells used by maze generation and tile lookup
//! - World Coordinates: continuous 3D space where the cube rolls (x, y, z)
//!
//! It also provides the axis [`Direction`]s the cube can roll or slide in and
//! helpers for neighbouring cells and grid distances.

mod positions;
mod transformations;

pub use positions::*;
pub use transformations::*;
