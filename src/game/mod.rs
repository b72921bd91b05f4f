//! Game state and the movement core.
//!
//! [`Game`] owns the level being played, the levels still visible beneath it,
//! the actor and every pending transition. The host drives it with two calls:
//! [`Game::request_step`] when the player asks to roll, and [`Game::tick`] once
//! per frame. Everything timed (rolls, slides, crumbles, reveals, fades) moves
//! forward only inside `tick`, so tests can replay a session deterministically
//! from a seed and a list of frame deltas.
//!
//! Effect resolution runs only after a move has fully played out. It follows
//! teleports immediately, starts slides as a chain of timed legs and checks the
//! goal last.

pub mod effects;
pub mod engine;
pub mod layout;
pub mod level;
pub mod player;
pub mod tiles;
pub mod transitions;

use self::effects::{Effect, TileEffectResolver};
use self::engine::{EngineHost, EntityId, HeadlessHost};
use self::layout::LayoutError;
use self::level::{LevelBlueprint, LevelGrid, LevelState};
use self::player::{Actor, ActorPhase};
use self::tiles::TileKind;
use self::transitions::{
    CancelToken, DelayedAction, MovePurpose, Transition, TransitionId, Transitions,
};
use crate::config::{ConfigError, GameConfig};
use crate::math::{Vec3, lerp};
use crate::math::coordinates::Direction;
use crate::maze::generator::{Cell, MazeError};
use rand::rngs::SmallRng;
use std::mem;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by the game core.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Maze(#[from] MazeError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Something that happened during a tick or a step request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    StepStarted {
        from: Cell,
        to: Cell,
        direction: Direction,
    },
    StepCompleted {
        cell: Cell,
    },
    CrumbleArmed {
        cell: Cell,
    },
    /// A crumble was already pending for the actor.
    CrumbleIgnored {
        cell: Cell,
    },
    CrumbleLifted,
    CrumbleReset,
    Teleported {
        from: Cell,
        to: Cell,
    },
    TeleportChainCapped {
        cell: Cell,
    },
    SlideStarted {
        cell: Cell,
        direction: Direction,
    },
    SlideStopped {
        cell: Cell,
    },
    /// Too many slides chained without the actor stopping.
    SlideChainCapped {
        cell: Cell,
    },
    HazardHit {
        cell: Cell,
    },
    Restarted,
    GoalReached {
        level: u32,
    },
    /// The actor finished climbing and can move again.
    AscendCompleted {
        level: u32,
    },
    LevelBuilt {
        level: u32,
        start: Cell,
        goal: Cell,
    },
    LevelFading {
        level: u32,
    },
    LevelDeactivated {
        level: u32,
    },
}

/// A level below the current one that is still on screen.
#[derive(Debug, Clone)]
struct RetiredLevel {
    level: u32,
    tiles: Vec<(EntityId, Vec3)>,
}

/// The puzzle game: level stack, actor and pending transitions.
pub struct Game<H: EngineHost = HeadlessHost> {
    config: GameConfig,
    rng: SmallRng,
    host: H,
    level: LevelGrid,
    retired: Vec<RetiredLevel>,
    actor: Actor,
    transitions: Transitions,
    actor_move: Option<TransitionId>,
    crumble_pending: bool,
    /// Slides started since the last step request.
    slides: u32,
    resolver: TileEffectResolver,
    reveal_token: Option<CancelToken>,
    epoch: u64,
    elapsed: f32,
    events: Vec<GameEvent>,
}

impl<H: EngineHost> Game<H> {
    /// Validates `config` and builds level 1.
    pub fn new(config: GameConfig, host: H) -> Result<Self, GameError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let mut host = host;
        let level = LevelGrid::build(
            &config,
            LevelState::default(),
            config.start_cell,
            &mut rng,
            &mut host,
        )?;
        Ok(Self::assemble(config, rng, host, level))
    }

    /// Starts on a prepared level 1 instead of a generated one.
    ///
    /// Later levels are generated as usual, so the layout must be exactly
    /// `config.grid_size` cells wide.
    pub fn with_blueprint(
        config: GameConfig,
        host: H,
        blueprint: &LevelBlueprint,
    ) -> Result<Self, GameError> {
        config.validate()?;
        if blueprint.size() != config.grid_size {
            return Err(LayoutError::SizeMismatch {
                layout: blueprint.size(),
                grid_size: config.grid_size,
            }
            .into());
        }
        let rng = config.seeded_rng();
        let mut host = host;
        let level = LevelGrid::materialize(blueprint, LevelState::default(), &config, &mut host);
        Ok(Self::assemble(config, rng, host, level))
    }

    fn assemble(config: GameConfig, rng: SmallRng, host: H, level: LevelGrid) -> Self {
        let actor = Actor::spawn(Self::standing_position(&config, &level, level.start_cell()));
        let resolver = TileEffectResolver::new(config.max_teleport_chain);
        let mut game = Self {
            config,
            rng,
            host,
            level,
            retired: Vec::new(),
            actor,
            transitions: Transitions::new(),
            actor_move: None,
            crumble_pending: false,
            slides: 0,
            resolver,
            reveal_token: None,
            epoch: 0,
            elapsed: 0.0,
            events: Vec::new(),
        };
        game.host.move_actor(game.actor.position);
        game.level_ready();
        game
    }

    /// Where the actor rests on `cell` of `level`.
    fn standing_position(config: &GameConfig, level: &LevelGrid, cell: Cell) -> Vec3 {
        let ground = level.mapper().grid_to_world(cell);
        ground.with_y(ground.y() + config.actor_elevation)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn level(&self) -> &LevelGrid {
        &self.level
    }

    pub fn current_level(&self) -> u32 {
        self.level.level()
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Grid cell under the actor.
    pub fn actor_cell(&self) -> Cell {
        self.actor.cell(self.level.mapper())
    }

    /// Kind of the tile under the actor.
    pub fn tile_under_actor(&self) -> Option<TileKind> {
        self.level.tile(self.actor_cell()).map(|tile| tile.kind)
    }

    /// Whether the actor accepts a step.
    pub fn is_idle(&self) -> bool {
        !self.actor.is_moving()
    }

    /// Game time accumulated through [`Game::tick`].
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn pending_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// Returns and forgets every event since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        mem::take(&mut self.events)
    }

    /// Asks the actor to roll one cell in `direction`.
    ///
    /// Returns `false` and does nothing unless the actor is idle.
    pub fn request_step(&mut self, direction: Direction) -> bool {
        if self.actor.is_moving() {
            debug!(?direction, phase = ?self.actor.phase, "step ignored while moving");
            return false;
        }
        let from_cell = self.actor_cell();
        let from = self.actor.position;
        let to = from + self.level.mapper().cell_delta(direction);
        self.actor.phase = ActorPhase::Stepping;
        self.slides = 0;
        self.move_actor(from, to, MovePurpose::Roll, self.config.roll_duration);
        self.events.push(GameEvent::StepStarted {
            from: from_cell,
            to: self.level.mapper().world_to_grid(to),
            direction,
        });
        true
    }

    /// Advances game time by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> Result<(), GameError> {
        let dt = dt.max(0.0);
        self.elapsed += dt;

        for (_, entity, armed) in self.level.advance_spikes(dt) {
            if let Some(entity) = entity {
                self.host.set_spike_armed(entity, armed);
            }
        }

        let advance = self.transitions.advance(dt);
        for (_, transition, t) in &advance.progress {
            self.apply_progress(*transition, *t);
        }

        let epoch = self.epoch;
        for (id, transition) in advance.finished {
            if self.epoch != epoch {
                break;
            }
            self.complete(id, transition)?;
        }
        Ok(())
    }

    /// Resolves the tile under the actor after it arrived on `cell`.
    ///
    /// Called by the core whenever a step or slide ends; hosts may call it
    /// directly when they detect the overlap themselves.
    pub fn on_cell_overlap(&mut self, cell: Cell) -> Result<(), GameError> {
        let mut cell = cell;
        let mut teleports = 0;
        loop {
            let kind = self.level.tile(cell).map(|tile| tile.kind);
            let armed = self.level.spike_armed(cell);
            match TileEffectResolver::classify(kind, armed) {
                Effect::None => break,
                Effect::Crumble => {
                    self.trigger_crumble(cell);
                    return Ok(());
                }
                Effect::Hazard => {
                    info!(x = cell.x, z = cell.z, level = self.current_level(), "spike hit");
                    self.events.push(GameEvent::HazardHit { cell });
                    return self.restart();
                }
                Effect::Teleport => {
                    if teleports >= self.resolver.max_teleport_chain() {
                        warn!(x = cell.x, z = cell.z, teleports, "teleport chain capped");
                        self.events.push(GameEvent::TeleportChainCapped { cell });
                        break;
                    }
                    teleports += 1;
                    let destination = self
                        .resolver
                        .teleport_destination(self.level.size(), &mut self.rng);
                    let ground = self.level.mapper().grid_to_world(destination);
                    self.actor.position = ground.with_y(self.actor.position.y());
                    self.host.move_actor(self.actor.position);
                    debug!(
                        from_x = cell.x,
                        from_z = cell.z,
                        to_x = destination.x,
                        to_z = destination.z,
                        "teleported"
                    );
                    self.events.push(GameEvent::Teleported {
                        from: cell,
                        to: destination,
                    });
                    cell = destination;
                }
                Effect::Slide(_) if self.slides >= self.config.max_slide_chain => {
                    warn!(x = cell.x, z = cell.z, slides = self.slides, "slide chain capped");
                    self.events.push(GameEvent::SlideChainCapped { cell });
                    break;
                }
                Effect::Slide(direction) => {
                    self.slides += 1;
                    self.actor.phase = ActorPhase::Sliding;
                    self.events.push(GameEvent::SlideStarted { cell, direction });
                    self.start_glide(cell, direction);
                    return Ok(());
                }
            }
        }

        if cell == self.level.goal_cell() {
            if let Err(error) = self.reach_goal() {
                self.settle();
                return Err(error);
            }
            return Ok(());
        }
        self.settle();
        Ok(())
    }

    /// Ends a step or slide that triggered nothing lasting.
    fn settle(&mut self) {
        if matches!(self.actor.phase, ActorPhase::Stepping | ActorPhase::Sliding) {
            self.actor.phase = ActorPhase::Idle;
        }
    }

    /// Throws the scene away and starts over from level 1.
    pub fn restart(&mut self) -> Result<(), GameError> {
        self.host.reload_scene();
        self.transitions.clear();
        self.actor_move = None;
        self.crumble_pending = false;
        self.slides = 0;
        self.reveal_token = None;
        self.retired.clear();
        self.epoch += 1;

        self.level = LevelGrid::build(
            &self.config,
            LevelState::default(),
            self.config.start_cell,
            &mut self.rng,
            &mut self.host,
        )?;
        self.actor = Actor::spawn(Self::standing_position(
            &self.config,
            &self.level,
            self.level.start_cell(),
        ));
        self.host.move_actor(self.actor.position);
        info!("game restarted from level 1");
        self.events.push(GameEvent::Restarted);
        self.level_ready();
        Ok(())
    }

    /// Starts a move of the actor, replacing any move still in flight.
    fn move_actor(&mut self, from: Vec3, to: Vec3, purpose: MovePurpose, duration: f32) {
        if let Some(previous) = self.actor_move.take() {
            self.transitions.remove(previous);
        }
        let id = self
            .transitions
            .start(Transition::ActorMove { from, to, purpose }, duration, None);
        self.actor_move = Some(id);
    }

    fn apply_progress(&mut self, transition: Transition, t: f32) {
        match transition {
            Transition::ActorMove { from, to, .. } => {
                self.actor.position = from.lerp(to, t);
                self.host.move_actor(self.actor.position);
            }
            Transition::TileReveal { entity, from, to } => {
                self.host.update_tile(entity, from.lerp(to, t), lerp(0.0, 1.0, t));
            }
            Transition::LevelFade { level } => {
                let alpha = lerp(1.0, 0.0, t);
                if let Some(retired) = self.retired.iter().find(|retired| retired.level == level) {
                    for (entity, position) in &retired.tiles {
                        self.host.update_tile(*entity, *position, alpha);
                    }
                }
            }
            Transition::Delay(_) => {}
        }
    }

    fn complete(&mut self, id: TransitionId, transition: Transition) -> Result<(), GameError> {
        match transition {
            Transition::ActorMove { purpose, .. } => {
                if self.actor_move != Some(id) {
                    return Ok(());
                }
                self.actor_move = None;
                self.finish_move(purpose)
            }
            Transition::TileReveal { .. } => Ok(()),
            Transition::LevelFade { level } => {
                self.host.deactivate_level(level);
                self.retired.retain(|retired| retired.level != level);
                info!(level, "level deactivated");
                self.events.push(GameEvent::LevelDeactivated { level });
                Ok(())
            }
            Transition::Delay(DelayedAction::CrumbleLift) => {
                let from = self.actor.position;
                let to = from + Vec3::UP * self.config.crumble.rise_height;
                self.move_actor(
                    from,
                    to,
                    MovePurpose::CrumbleLift,
                    self.config.crumble.rise_duration,
                );
                self.transitions.start(
                    Transition::Delay(DelayedAction::CrumbleReturn),
                    self.config.crumble.reset_delay,
                    None,
                );
                self.events.push(GameEvent::CrumbleLifted);
                Ok(())
            }
            Transition::Delay(DelayedAction::CrumbleReturn) => {
                let from = self.actor.position;
                let to = self.actor.rest_position;
                self.move_actor(
                    from,
                    to,
                    MovePurpose::CrumbleReturn,
                    self.config.crumble.reset_duration,
                );
                Ok(())
            }
        }
    }

    fn finish_move(&mut self, purpose: MovePurpose) -> Result<(), GameError> {
        match purpose {
            MovePurpose::Roll => {
                let cell = self.actor_cell();
                self.events.push(GameEvent::StepCompleted { cell });
                self.on_cell_overlap(cell)
            }
            MovePurpose::Glide { direction, last } => {
                let cell = self.actor_cell();
                if last {
                    self.events.push(GameEvent::SlideStopped { cell });
                    self.on_cell_overlap(cell)
                } else {
                    self.start_glide(cell, direction);
                    Ok(())
                }
            }
            MovePurpose::CrumbleLift => Ok(()),
            MovePurpose::CrumbleReturn => {
                self.crumble_pending = false;
                self.actor.phase = ActorPhase::Idle;
                debug!("crumble reset");
                self.events.push(GameEvent::CrumbleReset);
                Ok(())
            }
            MovePurpose::Ascend => {
                self.actor.snapshot_rest();
                self.actor.phase = ActorPhase::Idle;
                let level = self.current_level();
                self.events.push(GameEvent::AscendCompleted { level });
                Ok(())
            }
        }
    }

    fn start_glide(&mut self, cell: Cell, direction: Direction) {
        let leg = TileEffectResolver::next_slide_leg(&self.level, cell, direction);
        let from = self.actor.position;
        let to = from + self.level.mapper().cell_delta(direction);
        self.move_actor(
            from,
            to,
            MovePurpose::Glide {
                direction,
                last: leg.last,
            },
            self.config.slide_step_duration,
        );
    }

    fn trigger_crumble(&mut self, cell: Cell) {
        if self.crumble_pending {
            debug!(x = cell.x, z = cell.z, "crumble already pending");
            self.events.push(GameEvent::CrumbleIgnored { cell });
            return;
        }
        self.crumble_pending = true;
        self.actor.phase = ActorPhase::Crumbling;
        self.transitions.start(
            Transition::Delay(DelayedAction::CrumbleLift),
            self.config.crumble.delay,
            None,
        );
        debug!(x = cell.x, z = cell.z, "crumble armed");
        self.events.push(GameEvent::CrumbleArmed { cell });
    }

    /// Builds the next level on top of this one and lifts the actor onto it.
    ///
    /// Nothing about the actor or the current level changes when the build
    /// fails.
    fn reach_goal(&mut self) -> Result<(), GameError> {
        let next = self
            .level
            .advance(&self.config, &mut self.rng, &mut self.host)?;
        let level = self.current_level();
        info!(level, "goal reached");
        self.events.push(GameEvent::GoalReached { level });

        self.actor.phase = ActorPhase::Ascending;
        let from = self.actor.position;
        let to = from + Vec3::UP * self.config.ascend_height;
        self.move_actor(from, to, MovePurpose::Ascend, self.config.ascend_duration);

        self.stack_level(next);
        Ok(())
    }

    fn stack_level(&mut self, next: LevelGrid) {
        self.finish_reveal();
        let previous = mem::replace(&mut self.level, next);
        self.retired.push(RetiredLevel {
            level: previous.level(),
            tiles: previous.entity_positions(),
        });
        self.level_ready();

        let built = self.current_level();
        if built > self.config.visible_levels {
            let fading = built - self.config.visible_levels;
            if self.retired.iter().any(|retired| retired.level == fading) {
                self.transitions.start(
                    Transition::LevelFade { level: fading },
                    self.config.fade_duration,
                    None,
                );
                info!(level = fading, "level fading out");
                self.events.push(GameEvent::LevelFading { level: fading });
            }
        }
    }

    /// Announces the current level and starts revealing its tiles.
    fn level_ready(&mut self) {
        let level = self.current_level();
        let start = self.level.start_cell();
        let goal = self.level.goal_cell();
        info!(
            level,
            start_x = start.x,
            start_z = start.z,
            goal_x = goal.x,
            goal_z = goal.z,
            "level built"
        );
        self.events.push(GameEvent::LevelBuilt { level, start, goal });

        let token = self.transitions.new_token();
        let mapper = *self.level.mapper();
        for (index, (cell, entity)) in self.level.reveal_order().into_iter().enumerate() {
            let to = mapper.grid_to_world(cell);
            self.transitions.start_delayed(
                Transition::TileReveal {
                    entity,
                    from: to - Vec3::UP,
                    to,
                },
                index as f32 * self.config.reveal_stagger,
                self.config.reveal_duration,
                Some(token),
            );
        }
        self.reveal_token = Some(token);
    }

    /// Cancels the current reveal, snapping unfinished tiles into place.
    fn finish_reveal(&mut self) {
        let Some(token) = self.reveal_token.take() else {
            return;
        };
        for transition in self.transitions.cancel(token) {
            if let Transition::TileReveal { entity, to, .. } = transition {
                self.host.update_tile(entity, to, 1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpecialTiles;

    const CORRIDOR: &str = "\
#####
S...G
#####
#####
#####
";

    fn corridor_game() -> Game {
        let config = GameConfig {
            grid_size: 5,
            start_cell: Cell::new(0, 1),
            goal_min_distance: 0.0,
            specials: SpecialTiles::none(),
            rng_seed: Some(3),
            ..GameConfig::default()
        };
        let blueprint = LevelBlueprint::parse(CORRIDOR).unwrap();
        Game::with_blueprint(config, HeadlessHost::new(), &blueprint).unwrap()
    }

    #[test]
    fn new_game_reports_level_one() {
        let config = GameConfig {
            rng_seed: Some(9),
            ..GameConfig::default()
        };
        let mut game = Game::new(config, HeadlessHost::new()).unwrap();
        assert_eq!(game.current_level(), 1);
        assert_eq!(game.actor_cell(), Cell::new(1, 1));
        assert!(game.is_idle());
        let events = game.drain_events();
        assert!(matches!(events[0], GameEvent::LevelBuilt { level: 1, .. }));
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GameConfig {
            grid_size: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            Game::new(config, HeadlessHost::new()),
            Err(GameError::Config(_))
        ));
    }

    #[test]
    fn step_rolls_one_cell() {
        let mut game = corridor_game();
        assert!(game.request_step(Direction::East));
        assert!(!game.is_idle());
        game.tick(0.1).unwrap();
        assert_eq!(game.actor().phase, ActorPhase::Stepping);
        game.tick(0.1).unwrap();
        assert!(game.is_idle());
        assert_eq!(game.actor_cell(), Cell::new(1, 1));
        assert_eq!(game.host().actor_position(), Some(game.actor().position));
    }

    #[test]
    fn input_during_a_step_is_dropped() {
        let mut game = corridor_game();
        assert!(game.request_step(Direction::East));
        assert!(!game.request_step(Direction::East));
        game.tick(0.2).unwrap();
        assert_eq!(game.actor_cell(), Cell::new(1, 1));
    }

    #[test]
    fn reveal_brings_tiles_up_to_full_opacity() {
        let mut game = corridor_game();
        game.tick(0.5).unwrap();
        assert!(game
            .host()
            .level_entities(1)
            .all(|tile| (tile.alpha - 0.5).abs() < 1e-6));
        game.tick(0.6).unwrap();
        assert!(game.host().level_entities(1).all(|tile| tile.alpha == 1.0));
        let start = game.level().mapper().grid_to_world(Cell::new(0, 1));
        let start_entity = game.level().tile(Cell::new(0, 1)).and_then(|tile| tile.entity).unwrap();
        assert_eq!(game.host().entity(start_entity).unwrap().position, start);
    }

    #[test]
    fn failed_level_build_leaves_the_actor_on_the_goal() {
        const WIDE: &str = "\
#######
S.....G
#######
#######
#######
#######
#######
";
        let config = GameConfig {
            grid_size: 5,
            start_cell: Cell::new(0, 1),
            goal_min_distance: 0.0,
            specials: SpecialTiles::none(),
            rng_seed: Some(3),
            ..GameConfig::default()
        };
        let blueprint = LevelBlueprint::parse(WIDE).unwrap();
        let rng = config.seeded_rng();
        let mut host = HeadlessHost::new();
        let level = LevelGrid::materialize(&blueprint, LevelState::default(), &config, &mut host);
        let mut game = Game::assemble(config, rng, host, level);

        for _ in 0..5 {
            assert!(game.request_step(Direction::East));
            game.tick(0.2).unwrap();
        }
        assert!(game.request_step(Direction::East));
        assert!(matches!(game.tick(0.2), Err(GameError::Maze(_))));

        assert_eq!(game.current_level(), 1);
        assert_eq!(game.actor_cell(), Cell::new(6, 1));
        assert_eq!(game.actor().position.y(), 1.0);
        assert!(game.is_idle());
        assert!(!game
            .drain_events()
            .iter()
            .any(|event| matches!(event, GameEvent::GoalReached { .. })));
    }

    #[test]
    fn stepping_off_the_maze_lands_on_nothing() {
        let mut game = corridor_game();
        assert!(game.request_step(Direction::North));
        game.tick(0.2).unwrap();
        assert!(game.is_idle());
        assert_eq!(game.tile_under_actor(), None);
    }
}
