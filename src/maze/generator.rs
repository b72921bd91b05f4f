//! Maze generation using randomized recursive backtracking.
//!
//! The generator carves corridors over a `width × height` grid of cells. It
//! jumps two cells at a time and carves the midpoint, so corridors are always
//! separated by one-cell-wide walls. Every carved cell is reachable from the
//! start cell through 4-connected path steps.
//!
//! # Examples
//!
//! ```rust
//! use rand::{SeedableRng, rngs::SmallRng};
//! use rolling_cube::maze::generator::{Cell, MazeGenerator};
//!
//! let mut rng = SmallRng::seed_from_u64(7);
//! let mut generator = MazeGenerator::new(9, 9, Cell::new(1, 1)).unwrap();
//!
//! // Generate the maze step by step
//! while !generator.is_complete() {
//!     generator.step(&mut rng);
//! }
//!
//! let maze = generator.into_maze();
//! assert!(maze.is_path(Cell::new(1, 1)));
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Represents a cell in the level grid.
///
/// Coordinates are signed: movement can carry the cube past the grid edge,
/// and lookups there simply find nothing.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Cell {
    /// Column, along world `x`.
    pub x: i32,
    /// Row, along world `z`.
    pub z: i32,
}

impl Cell {
    /// Creates a new Cell with the given coordinates
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Whether the cell lies inside a `width × height` grid anchored at the origin.
    pub fn in_bounds(self, width: usize, height: usize) -> bool {
        self.x >= 0 && self.z >= 0 && (self.x as usize) < width && (self.z as usize) < height
    }
}

/// Errors raised when a maze cannot be generated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    /// The grid has no cells.
    #[error("maze dimensions must be non-zero, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
    /// The start cell is outside the grid.
    #[error("start cell {start:?} lies outside a {width}x{height} grid")]
    StartOutOfBounds {
        start: Cell,
        width: usize,
        height: usize,
    },
}

/// A generated maze: `true` marks a path cell, `false` a wall cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    /// Width of the maze in cells
    width: usize,
    /// Height of the maze in cells
    height: usize,
    /// Row-major path flags, indexed `z * width + x`
    paths: Vec<bool>,
}

impl Maze {
    /// Creates a maze with every cell walled.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            paths: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        cell.in_bounds(self.width, self.height)
            .then(|| cell.z as usize * self.width + cell.x as usize)
    }

    /// Whether `cell` is a path cell. Cells outside the grid are walls.
    pub fn is_path(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|idx| self.paths[idx])
    }

    pub(crate) fn carve(&mut self, cell: Cell) {
        if let Some(idx) = self.index(cell) {
            self.paths[idx] = true;
        }
    }

    /// Every path cell, column by column (`x` outer, `z` inner).
    pub fn path_cells(&self) -> Vec<Cell> {
        self.cells().filter(|cell| self.is_path(*cell)).collect()
    }

    /// Every wall cell, in the same order as [`Maze::path_cells`].
    pub fn wall_cells(&self) -> Vec<Cell> {
        self.cells().filter(|cell| !self.is_path(*cell)).collect()
    }

    /// Number of path cells.
    pub fn path_count(&self) -> usize {
        self.paths.iter().filter(|&&path| path).count()
    }

    fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.width as i32)
            .flat_map(move |x| (0..self.height as i32).map(move |z| Cell::new(x, z)))
    }

    /// Renders the maze as text, one row per `z`: `#` for walls, `.` for paths.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for z in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                out.push(if self.is_path(Cell::new(x, z)) { '.' } else { '#' });
            }
            out.push('\n');
        }
        out
    }
}

/// Incremental recursive-backtracking maze generator.
///
/// Each call to [`MazeGenerator::step`] either carves one new corridor
/// segment or backtracks one cell, so hosts can spread generation over
/// several frames. [`generate`] runs it to completion.
pub struct MazeGenerator {
    maze: Maze,
    stack: Vec<Cell>,
    carved: usize,
}

impl MazeGenerator {
    /// Jump distance between corridor cells.
    const STRIDE: i32 = 2;

    /// Creates a generator with `start` already carved.
    pub fn new(width: usize, height: usize, start: Cell) -> Result<Self, MazeError> {
        if width == 0 || height == 0 {
            return Err(MazeError::EmptyGrid { width, height });
        }
        if !start.in_bounds(width, height) {
            return Err(MazeError::StartOutOfBounds {
                start,
                width,
                height,
            });
        }

        let mut maze = Maze::new(width, height);
        maze.carve(start);

        Ok(Self {
            maze,
            stack: vec![start],
            carved: 1,
        })
    }

    /// Performs one step of maze generation.
    ///
    /// Returns `true` if a new cell was carved, `false` if the step
    /// backtracked or generation is already complete.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let Some(&current) = self.stack.last() else {
            return false;
        };

        let neighbours = self.unvisited_neighbours(current);
        if neighbours.is_empty() {
            self.stack.pop();
            return false;
        }

        let chosen = neighbours[rng.gen_range(0..neighbours.len())];
        let middle = Cell::new(
            current.x + (chosen.x - current.x) / 2,
            current.z + (chosen.z - current.z) / 2,
        );
        self.maze.carve(chosen);
        self.maze.carve(middle);
        self.carved += 2;
        self.stack.push(chosen);
        true
    }

    /// Unmarked in-bounds cells two steps away along each axis.
    fn unvisited_neighbours(&self, cell: Cell) -> Vec<Cell> {
        [
            Cell::new(cell.x - Self::STRIDE, cell.z),
            Cell::new(cell.x + Self::STRIDE, cell.z),
            Cell::new(cell.x, cell.z - Self::STRIDE),
            Cell::new(cell.x, cell.z + Self::STRIDE),
        ]
        .into_iter()
        .filter(|candidate| {
            candidate.in_bounds(self.maze.width, self.maze.height) && !self.maze.is_path(*candidate)
        })
        .collect()
    }

    /// Checks if maze generation is complete
    pub fn is_complete(&self) -> bool {
        self.stack.is_empty()
    }

    /// Number of cells carved so far, including corridor midpoints.
    pub fn carved(&self) -> usize {
        self.carved
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn into_maze(self) -> Maze {
        self.maze
    }
}

/// Generates a complete maze over a `width × height` grid from `start`.
pub fn generate<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    start: Cell,
    rng: &mut R,
) -> Result<Maze, MazeError> {
    let mut generator = MazeGenerator::new(width, height, start)?;
    while !generator.is_complete() {
        generator.step(rng);
    }
    let maze = generator.into_maze();
    debug!(
        width,
        height,
        start_x = start.x,
        start_z = start.z,
        paths = maze.path_count(),
        "maze generated"
    );
    Ok(maze)
}
