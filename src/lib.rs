//! Rolling Cube - procedural maze levels for a grid-stepping cube
//!
//! The crate is the engine-independent core of a rolling-cube puzzle: a cube
//! rolls one cell at a time across stacked maze levels, and the tile it lands
//! on may crumble, spike, teleport or send it sliding. Rendering, input and
//! audio belong to the host, which talks to the core through
//! [`game::engine::EngineHost`].
//!
//! # Architecture
//! - `config`: tunables, validation and the seeded random source
//! - `math/`: world-space vectors and the grid-to-world mapping
//! - `maze/`: recursive-backtracking generation and trap placement
//! - `game/`: level grids, tile effects, the actor and the tick-driven game loop
//!
//! # Example
//! ```
//! use rolling_cube::{Game, GameConfig, HeadlessHost};
//! use rolling_cube::math::coordinates::Direction;
//!
//! let config = GameConfig { rng_seed: Some(7), ..GameConfig::default() };
//! let mut game = Game::new(config, HeadlessHost::new()).unwrap();
//! game.request_step(Direction::East);
//! for _ in 0..60 {
//!     game.tick(1.0 / 60.0).unwrap();
//! }
//! assert!(game.current_level() >= 1);
//! ```

pub mod config;
pub mod game;
pub mod math;
pub mod maze;

pub use config::{ConfigError, GameConfig, SpecialTiles, WallFill};
pub use game::engine::{EngineHost, EntityId, HeadlessHost};
pub use game::level::{LevelBlueprint, LevelGrid, LevelState};
pub use game::tiles::TileKind;
pub use game::{Game, GameError, GameEvent};
