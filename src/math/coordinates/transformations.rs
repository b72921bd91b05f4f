//! Conversion between grid cells and world coordinates.
//!
//! Cells are laid out on the world `x`/`z` plane, `tile_scale + gap` world
//! units apart, with cell `(0, 0)` at the world origin. Each level sits at its
//! own height, so the mapper also carries the level's vertical offset.

use super::positions::Direction;
use crate::math::Vec3;
use crate::maze::generator::Cell;

/// Bidirectional mapping between grid cells and world positions.
///
/// # Coordinate System
/// - Cell `(x, z)` is centred at world `(x * spacing, y_offset, z * spacing)`
/// - `spacing` is `tile_scale + gap`
/// - The vertical coordinate is fixed to the level's `y_offset`
///
/// For the round trip `world_to_grid(grid_to_world(c)) == c` to hold for every
/// cell the spacing must be a whole number of world units; configuration
/// validation enforces that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCoordinateMapper {
    tile_scale: f32,
    gap: f32,
    y_offset: f32,
}

impl GridCoordinateMapper {
    pub fn new(tile_scale: f32, gap: f32, y_offset: f32) -> Self {
        Self {
            tile_scale,
            gap,
            y_offset,
        }
    }

    /// Distance in world units between the centres of adjacent cells.
    pub fn spacing(&self) -> f32 {
        self.tile_scale + self.gap
    }

    pub fn y_offset(&self) -> f32 {
        self.y_offset
    }

    /// Converts world coordinates to the grid cell they fall into.
    ///
    /// Each horizontal coordinate is rounded to the nearest integer, divided by
    /// the spacing and floored. The `y` coordinate is ignored.
    pub fn world_to_grid(&self, position: Vec3) -> Cell {
        let spacing = self.spacing();
        let x = (position.x().round() / spacing).floor() as i32;
        let z = (position.z().round() / spacing).floor() as i32;
        Cell::new(x, z)
    }

    /// Converts a grid cell to the world position of its centre at level height.
    pub fn grid_to_world(&self, cell: Cell) -> Vec3 {
        let spacing = self.spacing();
        Vec3::new(
            cell.x as f32 * spacing,
            self.y_offset,
            cell.z as f32 * spacing,
        )
    }

    /// World-space offset of one grid step in `direction`.
    pub fn cell_delta(&self, direction: Direction) -> Vec3 {
        let (dx, dz) = direction.offset();
        let spacing = self.spacing();
        Vec3::new(dx as f32 * spacing, 0.0, dz as f32 * spacing)
    }
}
