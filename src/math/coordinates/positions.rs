//! Axis directions and cell neighbourhood utilities.

use crate::maze::generator::Cell;
use serde::{Deserialize, Serialize};

/// One of the four axis directions on the grid plane.
///
/// North is `+z`, East is `+x`, matching the world axes of
/// [`GridCoordinateMapper`](super::GridCoordinateMapper).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// `+z`
    North,
    /// `+x`
    East,
    /// `-z`
    South,
    /// `-x`
    West,
}

impl Direction {
    /// All four directions in clockwise order starting at North.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit offset `(dx, dz)` of this direction.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }
}

/// Gets the cell adjacent to `cell` in `direction`.
///
/// The result is not bounds-checked: slides and steps may legitimately leave
/// the grid, and lookups outside it simply find no tile.
pub fn adjacent_cell(cell: Cell, direction: Direction) -> Cell {
    let (dx, dz) = direction.offset();
    Cell::new(cell.x + dx, cell.z + dz)
}

/// Euclidean distance between two cells, in cells.
pub fn grid_distance(a: Cell, b: Cell) -> f32 {
    let dx = (a.x - b.x) as f32;
    let dz = (a.z - b.z) as f32;
    (dx * dx + dz * dz).sqrt()
}
