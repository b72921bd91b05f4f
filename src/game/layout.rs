//! Plain-text level layouts.
//!
//! One line per grid row `z`, one glyph per column `x`:
//!
//! | glyph | meaning |
//! |-------|---------|
//! | `#` | wall |
//! | `.` | regular tile |
//! | `S` | regular tile the actor starts on |
//! | `G` | goal (a regular tile) |
//! | `C` | crumbling |
//! | `^` | spike |
//! | `T` | teleport |
//! | `>` `<` `A` `V` | slippery towards `+x`, `-x`, `+z`, `-z` |
//!
//! Without an `S` the start is the first path cell in `(x, z)` order.

use crate::game::level::{LevelBlueprint, LevelGrid};
use crate::game::tiles::TileKind;
use crate::maze::generator::Cell;
use chrono::Local;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const WALL: char = '#';
const GOAL: char = 'G';
const START: char = 'S';

/// Errors raised while parsing a layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("layout must be square, got {width} columns and {height} rows")]
    NotSquare { width: usize, height: usize },
    #[error("unknown glyph {glyph:?} at ({x}, {z})")]
    UnknownGlyph { glyph: char, x: usize, z: usize },
    #[error("layout has no goal")]
    MissingGoal,
    #[error("layout has more than one goal")]
    DuplicateGoal,
    #[error("layout has more than one start")]
    DuplicateStart,
    #[error("layout is {layout} cells wide but levels are {grid_size}")]
    SizeMismatch { layout: usize, grid_size: usize },
}

impl LevelBlueprint {
    /// Parses a layout.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        let rows: &[&str] = match rows.iter().rposition(|row| !row.is_empty()) {
            Some(last) => &rows[..=last],
            None => return Err(LayoutError::Empty),
        };

        let width = rows[0].chars().count();
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(LayoutError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
        }
        if width != rows.len() {
            return Err(LayoutError::NotSquare {
                width,
                height: rows.len(),
            });
        }

        let mut paths = BTreeMap::new();
        let mut walls = BTreeSet::new();
        let mut goal = None;
        let mut start = None;
        for (z, line) in rows.iter().enumerate() {
            for (x, glyph) in line.chars().enumerate() {
                let cell = Cell::new(x as i32, z as i32);
                let kind = match glyph {
                    WALL => {
                        walls.insert(cell);
                        continue;
                    }
                    GOAL => {
                        if goal.replace(cell).is_some() {
                            return Err(LayoutError::DuplicateGoal);
                        }
                        TileKind::Regular
                    }
                    START => {
                        if start.replace(cell).is_some() {
                            return Err(LayoutError::DuplicateStart);
                        }
                        TileKind::Regular
                    }
                    other => TileKind::from_glyph(other)
                        .ok_or(LayoutError::UnknownGlyph { glyph, x, z })?,
                };
                paths.insert(cell, kind);
            }
        }

        let goal = goal.ok_or(LayoutError::MissingGoal)?;
        let start = start
            .or_else(|| paths.keys().next().copied())
            .unwrap_or(goal);
        Ok(Self {
            size: width,
            start,
            paths,
            walls,
            goal,
        })
    }

    /// Renders the layout. The start is only marked when it is a plain tile.
    pub fn to_text(&self) -> String {
        render(self.size, |cell| {
            let kind = self.paths.get(&cell).copied();
            glyph_for(cell, kind, self.start, self.goal)
        })
    }
}

impl LevelGrid {
    /// Renders the live level in the same format as [`LevelBlueprint::to_text`].
    ///
    /// Wall-fill tiles are shown as walls.
    pub fn to_text(&self) -> String {
        render(self.size(), |cell| {
            let kind = self
                .tile(cell)
                .filter(|tile| tile.on_path)
                .map(|tile| tile.kind);
            glyph_for(cell, kind, self.start_cell(), self.goal_cell())
        })
    }
}

fn glyph_for(cell: Cell, kind: Option<TileKind>, start: Cell, goal: Cell) -> char {
    match kind {
        None => WALL,
        Some(_) if cell == goal => GOAL,
        Some(TileKind::Regular) if cell == start => START,
        Some(kind) => kind.glyph(),
    }
}

fn render(size: usize, glyph: impl Fn(Cell) -> char) -> String {
    let mut out = String::with_capacity((size + 1) * size);
    for z in 0..size as i32 {
        for x in 0..size as i32 {
            out.push(glyph(Cell::new(x, z)));
        }
        out.push('\n');
    }
    out
}

/// Writes a layout into `dir` as `Level<N>_<MM-DD-YY_HH-MM-SS>.lvl`.
pub fn save_layout(dir: &Path, level: u32, text: &str) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let timestamp = Local::now().format("%m-%d-%y_%H-%M-%S");
    let path = dir.join(format!("Level{level}_{timestamp}.lvl"));
    let mut file = fs::File::create(&path)?;
    file.write_all(text.as_bytes())?;
    Ok(path)
}
