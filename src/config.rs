//! Static game configuration.
//!
//! [`GameConfig`] carries every tunable of the level builder and the movement
//! core. It deserializes from JSON with missing fields falling back to the
//! defaults, and [`GameConfig::validate`] rejects values that would break the
//! grid mapping or the timed transitions.

use crate::math::coordinates::GridCoordinateMapper;
use crate::maze::generator::Cell;
use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when validating a configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// The level-1 start cell is outside the grid.
    #[error("start cell {start:?} lies outside the {grid_size}x{grid_size} grid")]
    StartOutOfBounds { start: Cell, grid_size: usize },
}

/// What occupies the wall cells of a generated maze.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum WallFill {
    /// Wall cells hold no tile.
    #[default]
    Empty,
    /// Every wall cell holds a crumbling tile.
    Crumbling,
}

/// Timing of the two-phase crumble sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrumbleTiming {
    /// Seconds between stepping on the tile and the actor being lifted.
    pub delay: f32,
    /// Seconds between the lift starting and the return to the rest position.
    pub reset_delay: f32,
    /// How far the actor is lifted.
    pub rise_height: f32,
    pub rise_duration: f32,
    pub reset_duration: f32,
}

impl Default for CrumbleTiming {
    fn default() -> Self {
        Self {
            delay: 1.0,
            reset_delay: 0.5,
            rise_height: 0.5,
            rise_duration: 0.5,
            reset_duration: 0.5,
        }
    }
}

/// Special tiles scattered over the path after traps are placed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SpecialTiles {
    /// Number of straight slippery runs per level.
    pub slippery_lines: usize,
    pub slippery_min_length: usize,
    pub slippery_max_length: usize,
    /// Number of teleport tiles per level.
    pub teleports: usize,
    /// Number of crumbling tiles on the path per level.
    pub crumbling: usize,
}

impl Default for SpecialTiles {
    fn default() -> Self {
        Self {
            slippery_lines: 3,
            slippery_min_length: 3,
            slippery_max_length: 5,
            teleports: 2,
            crumbling: 3,
        }
    }
}

impl SpecialTiles {
    /// No special tiles at all: only regular path, spikes and the goal.
    pub fn none() -> Self {
        Self {
            slippery_lines: 0,
            teleports: 0,
            crumbling: 0,
            ..Self::default()
        }
    }
}

/// Static configuration for a game session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Side length of the square level grid, in cells.
    pub grid_size: usize,
    /// Edge length of one tile in world units.
    pub tile_scale: f32,
    /// Empty space between neighbouring tiles in world units.
    pub gap: f32,
    /// Where the actor starts on level 1.
    pub start_cell: Cell,
    /// Minimum grid distance between the actor and the goal.
    pub goal_min_distance: f32,
    /// Random goal samples before falling back to the farthest regular cell.
    pub goal_max_attempts: u32,
    /// Height of the actor's centre above its level's tiles.
    pub actor_elevation: f32,
    /// Seconds one grid step takes.
    pub roll_duration: f32,
    /// Seconds per cell while sliding on slippery tiles.
    pub slide_step_duration: f32,
    pub crumble: CrumbleTiming,
    /// Seconds between spike tiles switching between armed and safe.
    pub spike_period: f32,
    /// How far the actor rises when it reaches the goal.
    pub ascend_height: f32,
    pub ascend_duration: f32,
    /// Seconds for one tile to rise into place when a level appears.
    pub reveal_duration: f32,
    /// Seconds between consecutive tiles starting their reveal.
    pub reveal_stagger: f32,
    /// Seconds an old level takes to fade out.
    pub fade_duration: f32,
    /// Level generations kept visible before the oldest fades out.
    pub visible_levels: u32,
    /// Consecutive teleports allowed inside one effect resolution.
    pub max_teleport_chain: u32,
    /// Slides that may chain into each other before the actor is stopped.
    pub max_slide_chain: u32,
    pub wall_fill: WallFill,
    pub specials: SpecialTiles,
    /// Optional RNG seed for reproducible sessions.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            tile_scale: 1.0,
            gap: 1.0,
            start_cell: Cell::new(1, 1),
            goal_min_distance: 16.0,
            goal_max_attempts: 1_024,
            actor_elevation: 1.0,
            roll_duration: 0.18,
            slide_step_duration: 0.3,
            crumble: CrumbleTiming::default(),
            spike_period: 1.0,
            ascend_height: 1.0,
            ascend_duration: 0.5,
            reveal_duration: 1.0,
            reveal_stagger: 0.0,
            fade_duration: 1.0,
            visible_levels: 3,
            max_teleport_chain: 8,
            max_slide_chain: 16,
            wall_fill: WallFill::Empty,
            specials: SpecialTiles::default(),
            rng_seed: None,
        }
    }
}

fn positive(value: f32, message: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidConfig(message))
    }
}

fn non_negative(value: f32, message: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidConfig(message))
    }
}

impl GameConfig {
    /// Checks every value the level builder and movement core rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::InvalidConfig("grid_size must be positive"));
        }
        if self.grid_size > i32::MAX as usize {
            return Err(ConfigError::InvalidConfig("grid_size is too large"));
        }
        positive(self.tile_scale, "tile_scale must be positive")?;
        non_negative(self.gap, "gap must be non-negative")?;
        let spacing = self.tile_scale + self.gap;
        if spacing < 1.0 || (spacing - spacing.round()).abs() > 1e-4 {
            return Err(ConfigError::InvalidConfig(
                "tile_scale + gap must be a whole number of world units",
            ));
        }
        if !self.start_cell.in_bounds(self.grid_size, self.grid_size) {
            return Err(ConfigError::StartOutOfBounds {
                start: self.start_cell,
                grid_size: self.grid_size,
            });
        }
        non_negative(
            self.goal_min_distance,
            "goal_min_distance must be non-negative",
        )?;
        non_negative(self.actor_elevation, "actor_elevation must be non-negative")?;
        positive(self.roll_duration, "roll_duration must be positive")?;
        positive(self.slide_step_duration, "slide_step_duration must be positive")?;
        non_negative(self.crumble.delay, "crumble.delay must be non-negative")?;
        non_negative(
            self.crumble.reset_delay,
            "crumble.reset_delay must be non-negative",
        )?;
        non_negative(
            self.crumble.rise_height,
            "crumble.rise_height must be non-negative",
        )?;
        positive(
            self.crumble.rise_duration,
            "crumble.rise_duration must be positive",
        )?;
        positive(
            self.crumble.reset_duration,
            "crumble.reset_duration must be positive",
        )?;
        positive(self.spike_period, "spike_period must be positive")?;
        non_negative(self.ascend_height, "ascend_height must be non-negative")?;
        positive(self.ascend_duration, "ascend_duration must be positive")?;
        positive(self.reveal_duration, "reveal_duration must be positive")?;
        non_negative(self.reveal_stagger, "reveal_stagger must be non-negative")?;
        positive(self.fade_duration, "fade_duration must be positive")?;
        if self.visible_levels == 0 {
            return Err(ConfigError::InvalidConfig(
                "visible_levels must be at least 1",
            ));
        }
        if self.specials.slippery_min_length == 0 {
            return Err(ConfigError::InvalidConfig(
                "specials.slippery_min_length must be at least 1",
            ));
        }
        if self.specials.slippery_min_length > self.specials.slippery_max_length {
            return Err(ConfigError::InvalidConfig(
                "specials.slippery_min_length exceeds slippery_max_length",
            ));
        }
        Ok(())
    }

    /// Grid mapping for a level at `y_offset`.
    pub fn mapper(&self, y_offset: f32) -> GridCoordinateMapper {
        GridCoordinateMapper::new(self.tile_scale, self.gap, y_offset)
    }

    /// Returns the configured RNG, generating a seed from entropy if absent.
    pub fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_fractional_spacing() {
        let config = GameConfig {
            tile_scale: 1.0,
            gap: 0.25,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_start_outside_grid() {
        let config = GameConfig {
            grid_size: 1,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::StartOutOfBounds {
                start: Cell::new(1, 1),
                grid_size: 1,
            })
        );
    }

    #[test]
    fn rejects_inverted_slippery_bounds() {
        let config = GameConfig {
            specials: SpecialTiles {
                slippery_min_length: 6,
                slippery_max_length: 2,
                ..SpecialTiles::default()
            },
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "grid_size": 11, "crumble": { "delay": 2.0 } }"#).unwrap();
        assert_eq!(config.grid_size, 11);
        assert_eq!(config.crumble.delay, 2.0);
        assert_eq!(config.crumble.reset_delay, 0.5);
        assert_eq!(config.spike_period, 1.0);
        assert_eq!(config.wall_fill, WallFill::Empty);
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        use rand::Rng;
        let config = GameConfig {
            rng_seed: Some(1234),
            ..GameConfig::default()
        };
        let a: u64 = config.seeded_rng().gen_range(0..u64::MAX);
        let b: u64 = config.seeded_rng().gen_range(0..u64::MAX);
        assert_eq!(a, b);
    }
}
