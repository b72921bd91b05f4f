//! Maze generation and hazard placement.
//!
//! - [`generator`] carves a connected maze over a square grid with randomized
//!   recursive backtracking.
//! - [`traps`] chooses which path cells become spikes and where special tiles
//!   (slippery runs, teleports, crumbling tiles) go.
//!
//! Both take an injected random source so that levels are reproducible from a
//! seed.

pub mod generator;
pub mod traps;

pub use generator::{Cell, Maze, MazeError, MazeGenerator, generate};
