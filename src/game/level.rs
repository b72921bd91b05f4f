//! Level construction and the live level grid.
//!
//! Building a level is split in two. [`LevelBlueprint::generate`] decides
//! what goes where (maze, traps, special tiles, goal) without touching the
//! engine, and [`LevelGrid::materialize`] spawns the tiles through the
//! [`EngineHost`] and keeps the per-cell state the movement core queries.
//! Blueprints can also be parsed from text, which is how hand-made levels and
//! most tests skip the generator.

use crate::config::{GameConfig, SpecialTiles, WallFill};
use crate::game::engine::{EngineHost, EntityId};
use crate::game::tiles::{SpikeClock, Tile, TileKind, TileLookup};
use crate::math::Vec3;
use crate::math::coordinates::{GridCoordinateMapper, grid_distance};
use crate::maze::generator::{self, Cell, MazeError};
use crate::maze::traps::{pick_cells, place_traps, roll_slippery_line};
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Level number and height of the level being played.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelState {
    /// Starts at 1.
    pub current_level: u32,
    /// World height of this level's tiles.
    pub grid_y_offset: f32,
}

impl Default for LevelState {
    fn default() -> Self {
        Self {
            current_level: 1,
            grid_y_offset: 0.0,
        }
    }
}

impl LevelState {
    /// State of the level stacked on top of this one.
    pub fn advanced(self) -> Self {
        Self {
            current_level: self.current_level + 1,
            grid_y_offset: self.grid_y_offset + 1.0,
        }
    }
}

/// Layout of one level: which cells hold which tiles and where the goal is.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelBlueprint {
    pub(crate) size: usize,
    pub(crate) start: Cell,
    pub(crate) paths: BTreeMap<Cell, TileKind>,
    pub(crate) walls: BTreeSet<Cell>,
    pub(crate) goal: Cell,
}

impl LevelBlueprint {
    /// Generates the layout of `level` with the actor starting on `start`.
    ///
    /// Order matters: maze, regular floor, spike traps, special tiles, then
    /// the goal, so the goal is always a regular path cell.
    pub fn generate<R: Rng + ?Sized>(
        config: &GameConfig,
        level: u32,
        start: Cell,
        rng: &mut R,
    ) -> Result<Self, MazeError> {
        let size = config.grid_size;
        let maze = generator::generate(size, size, start, rng)?;
        let path_cells = maze.path_cells();

        let mut paths: BTreeMap<Cell, TileKind> = path_cells
            .iter()
            .map(|cell| (*cell, TileKind::Regular))
            .collect();

        let traps = place_traps(&path_cells, level, rng);
        for cell in &traps {
            paths.insert(*cell, TileKind::Spike);
        }

        scatter_specials(&mut paths, start, &config.specials, rng);

        let goal = choose_goal(
            &mut paths,
            start,
            size,
            config.goal_min_distance,
            config.goal_max_attempts,
            rng,
        );

        let walls: BTreeSet<Cell> = maze.wall_cells().into_iter().collect();
        debug!(
            level,
            paths = paths.len(),
            walls = walls.len(),
            traps = traps.len(),
            goal_x = goal.x,
            goal_z = goal.z,
            "level blueprint generated"
        );

        Ok(Self {
            size,
            start,
            paths,
            walls,
            goal,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn goal(&self) -> Cell {
        self.goal
    }

    /// Path tiles in `(x, z)` order.
    pub fn paths(&self) -> impl Iterator<Item = (Cell, TileKind)> + '_ {
        self.paths.iter().map(|(cell, kind)| (*cell, *kind))
    }

    pub fn walls(&self) -> impl Iterator<Item = Cell> + '_ {
        self.walls.iter().copied()
    }

    /// Number of path tiles of `kind`.
    pub fn count(&self, kind: TileKind) -> usize {
        self.paths.values().filter(|k| **k == kind).count()
    }
}

/// Path tiles only; wall fill is decided when the level is materialized.
impl TileLookup for LevelBlueprint {
    fn tile_at(&self, cell: Cell) -> Option<TileKind> {
        self.paths.get(&cell).copied()
    }
}

/// Regular path cells other than `start`.
fn special_candidates(paths: &BTreeMap<Cell, TileKind>, start: Cell) -> Vec<Cell> {
    paths
        .iter()
        .filter(|(cell, kind)| **kind == TileKind::Regular && **cell != start)
        .map(|(cell, _)| *cell)
        .collect()
}

/// Places slippery runs, teleports and crumbling tiles on regular path cells.
fn scatter_specials<R: Rng + ?Sized>(
    paths: &mut BTreeMap<Cell, TileKind>,
    start: Cell,
    specials: &SpecialTiles,
    rng: &mut R,
) {
    let mut slippery = 0;
    for _ in 0..specials.slippery_lines {
        let origins = special_candidates(paths, start);
        let Some(line) = roll_slippery_line(
            &origins,
            specials.slippery_min_length,
            specials.slippery_max_length,
            rng,
        ) else {
            break;
        };
        for cell in line.cells() {
            if cell == start {
                continue;
            }
            if let Some(kind) = paths.get_mut(&cell) {
                if *kind == TileKind::Regular {
                    *kind = TileKind::Slippery(line.direction);
                    slippery += 1;
                }
            }
        }
    }

    let teleports = pick_cells(&special_candidates(paths, start), specials.teleports, rng);
    for cell in &teleports {
        paths.insert(*cell, TileKind::Teleport);
    }

    let crumbling = pick_cells(&special_candidates(paths, start), specials.crumbling, rng);
    for cell in &crumbling {
        paths.insert(*cell, TileKind::Crumbling);
    }

    debug!(
        slippery,
        teleports = teleports.len(),
        crumbling = crumbling.len(),
        "special tiles scattered"
    );
}

/// Farther first; equal distances prefer the smaller `(x, z)`.
fn farther(from: Cell, a: Cell, b: Cell) -> Ordering {
    grid_distance(from, a)
        .total_cmp(&grid_distance(from, b))
        .then_with(|| b.cmp(&a))
}

/// Chooses the goal cell.
///
/// Samples uniformly random cells of the grid up to `max_attempts` times and
/// takes the first regular path cell at least `min_distance` away from
/// `from`. If sampling fails the farthest regular path cell is used instead,
/// and if no regular cell exists at all the farthest path cell is turned back
/// into a regular tile. `paths` must not be empty.
pub fn choose_goal<R: Rng + ?Sized>(
    paths: &mut BTreeMap<Cell, TileKind>,
    from: Cell,
    grid_size: usize,
    min_distance: f32,
    max_attempts: u32,
    rng: &mut R,
) -> Cell {
    let size = grid_size.max(1) as i32;
    for _ in 0..max_attempts {
        let candidate = Cell::new(rng.gen_range(0..size), rng.gen_range(0..size));
        if grid_distance(candidate, from) < min_distance {
            continue;
        }
        if paths.get(&candidate) == Some(&TileKind::Regular) {
            return candidate;
        }
    }

    let farthest_regular = paths
        .iter()
        .filter(|(_, kind)| **kind == TileKind::Regular)
        .map(|(cell, _)| *cell)
        .max_by(|a, b| farther(from, *a, *b));
    if let Some(goal) = farthest_regular {
        warn!(
            goal_x = goal.x,
            goal_z = goal.z,
            distance = grid_distance(goal, from),
            "no goal far enough away, using farthest regular tile"
        );
        return goal;
    }

    let goal = paths
        .keys()
        .copied()
        .max_by(|a, b| farther(from, *a, *b))
        .unwrap_or(from);
    warn!(
        goal_x = goal.x,
        goal_z = goal.z,
        "no regular tile left, clearing one for the goal"
    );
    paths.insert(goal, TileKind::Regular);
    goal
}

/// The tiles of the level being played.
#[derive(Debug, Clone)]
pub struct LevelGrid {
    state: LevelState,
    size: usize,
    start: Cell,
    goal: Cell,
    tiles: HashMap<Cell, Tile>,
    mapper: GridCoordinateMapper,
}

impl LevelGrid {
    /// Generates and materializes a level.
    pub fn build<R, H>(
        config: &GameConfig,
        state: LevelState,
        start: Cell,
        rng: &mut R,
        host: &mut H,
    ) -> Result<Self, MazeError>
    where
        R: Rng + ?Sized,
        H: EngineHost + ?Sized,
    {
        let blueprint = LevelBlueprint::generate(config, state.current_level, start, rng)?;
        Ok(Self::materialize(&blueprint, state, config, host))
    }

    /// Spawns every tile of `blueprint` through `host`.
    ///
    /// Tiles start hidden one unit below the level, ready to be revealed.
    /// Spike clocks start now.
    pub fn materialize<H: EngineHost + ?Sized>(
        blueprint: &LevelBlueprint,
        state: LevelState,
        config: &GameConfig,
        host: &mut H,
    ) -> Self {
        let mapper = config.mapper(state.grid_y_offset);
        let level = state.current_level;
        let mut tiles = HashMap::with_capacity(blueprint.paths.len() + blueprint.walls.len());

        let wall_tiles = match config.wall_fill {
            WallFill::Empty => Vec::new(),
            WallFill::Crumbling => blueprint.walls().collect(),
        };
        let placements = blueprint
            .paths()
            .map(|(cell, kind)| (cell, kind, true))
            .chain(
                wall_tiles
                    .into_iter()
                    .map(|cell| (cell, TileKind::Crumbling, false)),
            );

        for (cell, kind, on_path) in placements {
            let position = mapper.grid_to_world(cell);
            let entity = host.spawn_tile(kind, position, level);
            if let Some(entity) = entity {
                host.update_tile(entity, position - Vec3::UP, 0.0);
            }
            let spike = (kind == TileKind::Spike).then(|| SpikeClock::new(config.spike_period));
            tiles.insert(
                cell,
                Tile {
                    kind,
                    entity,
                    on_path,
                    spike,
                },
            );
        }

        if let Some(entity) = tiles.get(&blueprint.goal).and_then(|tile| tile.entity) {
            host.mark_goal(entity);
        }

        Self {
            state,
            size: blueprint.size,
            start: blueprint.start,
            goal: blueprint.goal,
            tiles,
            mapper,
        }
    }

    /// Builds the next level on top of this one, starting from this level's goal.
    pub fn advance<R, H>(
        &self,
        config: &GameConfig,
        rng: &mut R,
        host: &mut H,
    ) -> Result<Self, MazeError>
    where
        R: Rng + ?Sized,
        H: EngineHost + ?Sized,
    {
        Self::build(config, self.state.advanced(), self.goal, rng, host)
    }

    pub fn tile(&self, cell: Cell) -> Option<&Tile> {
        self.tiles.get(&cell)
    }

    /// Whether the tile at `cell` is a spike that is currently armed.
    pub fn spike_armed(&self, cell: Cell) -> bool {
        self.tiles.get(&cell).is_some_and(Tile::is_armed)
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn level(&self) -> u32 {
        self.state.current_level
    }

    pub fn y_offset(&self) -> f32 {
        self.state.grid_y_offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start_cell(&self) -> Cell {
        self.start
    }

    pub fn goal_cell(&self) -> Cell {
        self.goal
    }

    pub fn mapper(&self) -> &GridCoordinateMapper {
        &self.mapper
    }

    /// Path cells in `(x, z)` order.
    pub fn path_cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .tiles
            .iter()
            .filter(|(_, tile)| tile.on_path)
            .map(|(cell, _)| *cell)
            .collect();
        cells.sort();
        cells
    }

    /// Tiles with an engine object, nearest to the start cell first.
    pub fn reveal_order(&self) -> Vec<(Cell, EntityId)> {
        let mut order: Vec<(Cell, EntityId)> = self
            .tiles
            .iter()
            .filter_map(|(cell, tile)| tile.entity.map(|entity| (*cell, entity)))
            .collect();
        order.sort_by(|(a, _), (b, _)| {
            grid_distance(self.start, *a)
                .total_cmp(&grid_distance(self.start, *b))
                .then_with(|| a.cmp(b))
        });
        order
    }

    /// Engine objects with their resting world positions.
    pub fn entity_positions(&self) -> Vec<(EntityId, Vec3)> {
        self.tiles
            .iter()
            .filter_map(|(cell, tile)| {
                tile.entity
                    .map(|entity| (entity, self.mapper.grid_to_world(*cell)))
            })
            .collect()
    }

    /// Advances every spike clock and returns the spikes whose state changed.
    pub fn advance_spikes(&mut self, dt: f32) -> Vec<(Cell, Option<EntityId>, bool)> {
        let mut changed = Vec::new();
        for (cell, tile) in self.tiles.iter_mut() {
            let Some(clock) = tile.spike.as_mut() else {
                continue;
            };
            if clock.advance(dt) > 0 {
                changed.push((*cell, tile.entity, clock.is_armed()));
            }
        }
        changed
    }
}

impl TileLookup for LevelGrid {
    fn tile_at(&self, cell: Cell) -> Option<TileKind> {
        self.tiles.get(&cell).map(|tile| tile.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::HeadlessHost;
    use crate::maze::traps::trap_count;
    use rand::{SeedableRng, rngs::SmallRng};

    fn plain_config(grid_size: usize) -> GameConfig {
        GameConfig {
            grid_size,
            specials: SpecialTiles::none(),
            ..GameConfig::default()
        }
    }

    #[test]
    fn level_state_advances_by_one() {
        let next = LevelState::default().advanced();
        assert_eq!(next.current_level, 2);
        assert_eq!(next.grid_y_offset, 1.0);
    }

    #[test]
    fn trap_count_matches_level() {
        let config = plain_config(20);
        for level in [5u32, 25] {
            let mut rng = SmallRng::seed_from_u64(u64::from(level));
            let blueprint = LevelBlueprint::generate(&config, level, Cell::new(1, 1), &mut rng)
                .unwrap();
            let spikes = blueprint.count(TileKind::Spike);
            assert_eq!(spikes, trap_count(level, blueprint.paths.len()));
            assert_eq!(spikes, level as usize);
        }
    }

    #[test]
    fn goal_is_regular_and_far_enough() {
        let config = GameConfig::default();
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let blueprint = LevelBlueprint::generate(&config, 3, Cell::new(1, 1), &mut rng)
                .unwrap();
            assert_eq!(blueprint.tile_at(blueprint.goal()), Some(TileKind::Regular));
            assert!(grid_distance(blueprint.goal(), Cell::new(1, 1)) >= config.goal_min_distance);
        }
    }

    #[test]
    fn specials_avoid_the_start_cell() {
        let config = GameConfig {
            specials: SpecialTiles {
                slippery_lines: 10,
                teleports: 10,
                crumbling: 10,
                ..SpecialTiles::default()
            },
            ..GameConfig::default()
        };
        for seed in 0..10 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let blueprint = LevelBlueprint::generate(&config, 1, Cell::new(1, 1), &mut rng)
                .unwrap();
            let start_kind = blueprint.tile_at(Cell::new(1, 1));
            assert!(matches!(
                start_kind,
                Some(TileKind::Regular) | Some(TileKind::Spike)
            ));
            assert!(blueprint.count(TileKind::Teleport) <= 10);
            assert!(blueprint.count(TileKind::Crumbling) <= 10);
        }
    }

    #[test]
    fn single_cell_grid_falls_back_to_the_start() {
        let config = GameConfig {
            grid_size: 1,
            start_cell: Cell::new(0, 0),
            ..GameConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let blueprint = LevelBlueprint::generate(&config, 1, Cell::new(0, 0), &mut rng).unwrap();
        assert_eq!(blueprint.goal(), Cell::new(0, 0));
        // The only cell was a trap; the fallback turned it back into floor.
        assert_eq!(blueprint.tile_at(Cell::new(0, 0)), Some(TileKind::Regular));
    }

    #[test]
    fn fallback_prefers_farthest_regular_with_smallest_cell_on_ties() {
        let mut paths = BTreeMap::from([
            (Cell::new(0, 0), TileKind::Regular),
            (Cell::new(2, 0), TileKind::Regular),
            (Cell::new(0, 2), TileKind::Regular),
            (Cell::new(3, 3), TileKind::Spike),
        ]);
        let mut rng = SmallRng::seed_from_u64(4);
        let goal = choose_goal(&mut paths, Cell::new(0, 0), 4, 100.0, 50, &mut rng);
        assert_eq!(goal, Cell::new(0, 2));
        assert_eq!(paths[&Cell::new(3, 3)], TileKind::Spike);
    }

    #[test]
    fn materialize_spawns_hidden_tiles_and_marks_goal() {
        let config = plain_config(9);
        let mut rng = SmallRng::seed_from_u64(12);
        let mut host = HeadlessHost::new();
        let grid = LevelGrid::build(
            &config,
            LevelState::default(),
            Cell::new(1, 1),
            &mut rng,
            &mut host,
        )
        .unwrap();

        assert_eq!(host.entity_count(), grid.path_cells().len());
        assert!(host.level_entities(1).all(|tile| tile.alpha == 0.0));
        assert_eq!(host.level_entities(1).filter(|tile| tile.goal).count(), 1);
        let goal_entity = grid.tile(grid.goal_cell()).and_then(|tile| tile.entity).unwrap();
        assert!(host.entity(goal_entity).unwrap().goal);
        assert_eq!(
            host.entity(goal_entity).unwrap().position,
            grid.mapper().grid_to_world(grid.goal_cell()) - Vec3::UP
        );
    }

    #[test]
    fn crumbling_wall_fill_covers_every_cell() {
        let config = GameConfig {
            wall_fill: WallFill::Crumbling,
            ..plain_config(9)
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let mut host = HeadlessHost::new();
        let grid = LevelGrid::build(
            &config,
            LevelState::default(),
            Cell::new(1, 1),
            &mut rng,
            &mut host,
        )
        .unwrap();
        assert_eq!(host.entity_count(), 81);
        for x in 0..9 {
            for z in 0..9 {
                let cell = Cell::new(x, z);
                let tile = grid.tile(cell).unwrap();
                if !tile.on_path {
                    assert_eq!(tile.kind, TileKind::Crumbling);
                }
            }
        }
        assert_eq!(grid.tile_at(Cell::new(-1, 0)), None);
    }

    #[test]
    fn advance_starts_on_the_previous_goal() {
        let config = plain_config(20);
        let mut rng = SmallRng::seed_from_u64(31);
        let mut host = HeadlessHost::new();
        let first = LevelGrid::build(
            &config,
            LevelState::default(),
            Cell::new(1, 1),
            &mut rng,
            &mut host,
        )
        .unwrap();
        let second = first.advance(&config, &mut rng, &mut host).unwrap();
        assert_eq!(second.level(), first.level() + 1);
        assert_eq!(second.y_offset(), first.y_offset() + 1.0);
        assert_eq!(second.start_cell(), first.goal_cell());
        assert!(second.tile_at(second.start_cell()).is_some());
    }

    #[test]
    fn reveal_order_starts_near_the_start_cell() {
        let config = plain_config(15);
        let mut rng = SmallRng::seed_from_u64(8);
        let mut host = HeadlessHost::new();
        let grid = LevelGrid::build(
            &config,
            LevelState::default(),
            Cell::new(1, 1),
            &mut rng,
            &mut host,
        )
        .unwrap();
        let order = grid.reveal_order();
        assert_eq!(order[0].0, Cell::new(1, 1));
        let distances: Vec<f32> = order
            .iter()
            .map(|(cell, _)| grid_distance(Cell::new(1, 1), *cell))
            .collect();
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn spike_changes_are_reported() {
        let config = GameConfig {
            spike_period: 0.5,
            ..plain_config(20)
        };
        let mut rng = SmallRng::seed_from_u64(5);
        let mut host = HeadlessHost::new();
        let state = LevelState {
            current_level: 4,
            grid_y_offset: 3.0,
        };
        let mut grid = LevelGrid::build(&config, state, Cell::new(1, 1), &mut rng, &mut host)
            .unwrap();
        assert!(grid.advance_spikes(0.25).is_empty());
        let changed = grid.advance_spikes(0.25);
        assert_eq!(changed.len(), 4);
        assert!(changed.iter().all(|(_, _, armed)| !armed));
        assert!(changed.iter().all(|(cell, _, _)| !grid.spike_armed(*cell)));
    }
}
