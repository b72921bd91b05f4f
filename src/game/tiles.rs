//! Tile kinds and per-tile state.

use crate::game::engine::EntityId;
use crate::math::coordinates::Direction;
use crate::maze::generator::Cell;
use serde::{Deserialize, Serialize};

/// Behavioural category of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Plain floor. The goal is always a regular tile.
    Regular,
    /// Lifts the actor away and returns it to its rest position.
    Crumbling,
    /// Restarts the game when stepped on while armed.
    Spike,
    /// Sends the actor to a random cell of the grid.
    Teleport,
    /// Keeps the actor sliding in the stored direction.
    Slippery(Direction),
}

impl TileKind {
    /// Layout glyph for this kind.
    pub fn glyph(self) -> char {
        match self {
            TileKind::Regular => '.',
            TileKind::Crumbling => 'C',
            TileKind::Spike => '^',
            TileKind::Teleport => 'T',
            TileKind::Slippery(Direction::East) => '>',
            TileKind::Slippery(Direction::West) => '<',
            TileKind::Slippery(Direction::North) => 'A',
            TileKind::Slippery(Direction::South) => 'V',
        }
    }

    /// Parses a layout glyph. Walls, goal and start markers are not tile kinds.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        Some(match glyph {
            '.' => TileKind::Regular,
            'C' => TileKind::Crumbling,
            '^' => TileKind::Spike,
            'T' => TileKind::Teleport,
            '>' => TileKind::Slippery(Direction::East),
            '<' => TileKind::Slippery(Direction::West),
            'A' => TileKind::Slippery(Direction::North),
            'V' => TileKind::Slippery(Direction::South),
            _ => return None,
        })
    }
}

/// Phase clock of a spike tile.
///
/// Starts armed and flips every `period` seconds of game time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeClock {
    period: f32,
    elapsed: f32,
    armed: bool,
}

impl SpikeClock {
    pub fn new(period: f32) -> Self {
        Self {
            period,
            elapsed: 0.0,
            armed: true,
        }
    }

    /// Advances the clock and returns how many times it toggled.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if self.period <= 0.0 {
            return 0;
        }
        self.elapsed += dt;
        let mut toggles = 0;
        while self.elapsed >= self.period {
            self.elapsed -= self.period;
            self.armed = !self.armed;
            toggles += 1;
        }
        toggles
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// A materialized tile of the active level.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub kind: TileKind,
    /// Engine handle, if the host spawned an object for the tile.
    pub entity: Option<EntityId>,
    /// `false` for wall-fill tiles.
    pub on_path: bool,
    pub spike: Option<SpikeClock>,
}

impl Tile {
    /// Whether stepping here now would hit an armed spike.
    pub fn is_armed(&self) -> bool {
        self.spike.is_some_and(|clock| clock.is_armed())
    }
}

/// Read access to tile kinds by cell.
pub trait TileLookup {
    /// Kind of the tile at `cell`, or `None` for walls and cells off the grid.
    fn tile_at(&self, cell: Cell) -> Option<TileKind>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyphs_parse_back() {
        let kinds = [
            TileKind::Regular,
            TileKind::Crumbling,
            TileKind::Spike,
            TileKind::Teleport,
            TileKind::Slippery(Direction::North),
            TileKind::Slippery(Direction::East),
            TileKind::Slippery(Direction::South),
            TileKind::Slippery(Direction::West),
        ];
        for kind in kinds {
            assert_eq!(TileKind::from_glyph(kind.glyph()), Some(kind));
        }
        assert_eq!(TileKind::from_glyph('#'), None);
        assert_eq!(TileKind::from_glyph('G'), None);
    }

    #[test]
    fn spike_clock_starts_armed_and_toggles_each_period() {
        let mut clock = SpikeClock::new(1.0);
        assert!(clock.is_armed());
        assert_eq!(clock.advance(0.75), 0);
        assert!(clock.is_armed());
        assert_eq!(clock.advance(0.5), 1);
        assert!(!clock.is_armed());
        assert_eq!(clock.advance(2.0), 2);
        assert!(!clock.is_armed());
    }
}
