//! Hazard and special-tile placement over a maze's path cells.
//!
//! Placement works on plain cell lists so it stays independent of how tiles
//! are represented; the level builder decides what the chosen cells become.

use crate::math::coordinates::{Direction, adjacent_cell};
use crate::maze::generator::Cell;
use rand::Rng;

/// Shuffles `cells` in place: every index is swapped with a uniformly random
/// index anywhere in the slice.
pub fn shuffle_cells<R: Rng + ?Sized>(cells: &mut [Cell], rng: &mut R) {
    let len = cells.len();
    for i in 0..len {
        let j = rng.gen_range(0..len);
        cells.swap(i, j);
    }
}

/// Number of traps for a level: one per level, capped by the path-cell count.
pub fn trap_count(level: u32, path_cells: usize) -> usize {
    (level as usize).min(path_cells)
}

/// Picks the cells that become spike traps on `level`.
///
/// The path cells are shuffled and the first [`trap_count`] taken, so hazard
/// density grows with the level until every path cell is a trap.
pub fn place_traps<R: Rng + ?Sized>(path_cells: &[Cell], level: u32, rng: &mut R) -> Vec<Cell> {
    pick_cells(path_cells, trap_count(level, path_cells.len()), rng)
}

/// Shuffle-then-take-prefix selection of up to `count` cells.
pub fn pick_cells<R: Rng + ?Sized>(cells: &[Cell], count: usize, rng: &mut R) -> Vec<Cell> {
    let mut shuffled = cells.to_vec();
    shuffle_cells(&mut shuffled, rng);
    shuffled.truncate(count);
    shuffled
}

/// A straight run of slippery tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlipperyLine {
    pub origin: Cell,
    pub direction: Direction,
    pub length: usize,
}

impl SlipperyLine {
    /// The cells covered by the run, starting at the origin.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.length);
        let mut cell = self.origin;
        for _ in 0..self.length {
            cells.push(cell);
            cell = adjacent_cell(cell, self.direction);
        }
        cells
    }
}

/// Rolls a slippery line starting on one of `origins`.
///
/// Length is uniform in `[min_length, max_length]`. Returns `None` when there
/// is no origin to start from.
pub fn roll_slippery_line<R: Rng + ?Sized>(
    origins: &[Cell],
    min_length: usize,
    max_length: usize,
    rng: &mut R,
) -> Option<SlipperyLine> {
    if origins.is_empty() {
        return None;
    }
    let origin = origins[rng.gen_range(0..origins.len())];
    let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
    let length = rng.gen_range(min_length..=max_length.max(min_length));
    Some(SlipperyLine {
        origin,
        direction,
        length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::generator::generate;
    use rand::{SeedableRng, rngs::SmallRng};
    use std::collections::HashSet;

    #[test]
    fn trap_count_follows_level() {
        assert_eq!(trap_count(5, 200), 5);
        assert_eq!(trap_count(25, 200), 25);
        assert_eq!(trap_count(25, 10), 10);
        assert_eq!(trap_count(0, 10), 0);
    }

    #[test]
    fn traps_are_distinct_path_cells() {
        let mut rng = SmallRng::seed_from_u64(42);
        let maze = generate(20, 20, Cell::new(1, 1), &mut rng).unwrap();
        let paths = maze.path_cells();
        for level in [1, 5, 25, 1_000] {
            let traps = place_traps(&paths, level, &mut rng);
            assert_eq!(traps.len(), trap_count(level, paths.len()));
            let unique: HashSet<Cell> = traps.iter().copied().collect();
            assert_eq!(unique.len(), traps.len());
            assert!(traps.iter().all(|cell| maze.is_path(*cell)));
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = SmallRng::seed_from_u64(8);
        let before: Vec<Cell> = (0..30).map(|i| Cell::new(i, -i)).collect();
        let mut shuffled = before.clone();
        shuffle_cells(&mut shuffled, &mut rng);
        let mut sorted = shuffled.clone();
        sorted.sort();
        let mut expected = before;
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn empty_inputs_are_harmless() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(place_traps(&[], 3, &mut rng).is_empty());
        assert!(roll_slippery_line(&[], 3, 5, &mut rng).is_none());
    }

    #[test]
    fn slippery_line_respects_length_bounds() {
        let mut rng = SmallRng::seed_from_u64(17);
        let origins = [Cell::new(4, 4), Cell::new(9, 2)];
        for _ in 0..100 {
            let line = roll_slippery_line(&origins, 3, 5, &mut rng).unwrap();
            assert!((3..=5).contains(&line.length));
            assert!(origins.contains(&line.origin));
            let cells = line.cells();
            assert_eq!(cells.len(), line.length);
            assert_eq!(cells[0], line.origin);
        }
    }
}
