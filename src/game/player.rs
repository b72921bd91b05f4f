//! The rolling cube controlled by the player.
//!
//! # Phases
//!
//! The actor accepts a step only while [`ActorPhase::Idle`]. A step puts it in
//! `Stepping`; effect resolution may then move it to `Sliding`, `Crumbling` or
//! `Ascending`, and it returns to `Idle` once every effect has played out.
//! Input arriving in any other phase is dropped, not queued.
//!
//! # Rest position
//!
//! The actor remembers a rest position: where it spawned, or where it came to
//! a stop after climbing to a new level. A crumbling tile sends it back there.

use crate::math::Vec3;
use crate::math::coordinates::GridCoordinateMapper;
use crate::maze::generator::Cell;

/// What the actor is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActorPhase {
    #[default]
    Idle,
    Stepping,
    Sliding,
    Crumbling,
    Ascending,
}

/// Position and movement state of the actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// World position of the cube's centre.
    pub position: Vec3,
    /// Where a crumble returns the actor to.
    pub rest_position: Vec3,
    pub phase: ActorPhase,
}

impl Actor {
    /// Creates an idle actor at `position`, which also becomes its rest position.
    pub fn spawn(position: Vec3) -> Self {
        Self {
            position,
            rest_position: position,
            phase: ActorPhase::Idle,
        }
    }

    /// Whether a step or effect is still playing out.
    pub fn is_moving(&self) -> bool {
        self.phase != ActorPhase::Idle
    }

    /// Grid cell under the actor.
    pub fn cell(&self, mapper: &GridCoordinateMapper) -> Cell {
        mapper.world_to_grid(self.position)
    }

    /// Makes the current position the new rest position.
    pub fn snapshot_rest(&mut self) {
        self.rest_position = self.position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_is_idle_at_rest() {
        let actor = Actor::spawn(Vec3::new(2.0, 1.0, 2.0));
        assert!(!actor.is_moving());
        assert_eq!(actor.rest_position, actor.position);
    }

    #[test]
    fn cell_ignores_height() {
        let mapper = GridCoordinateMapper::new(1.0, 1.0, 0.0);
        let mut actor = Actor::spawn(Vec3::new(6.0, 1.0, 4.0));
        assert_eq!(actor.cell(&mapper), Cell::new(3, 2));
        actor.position = actor.position + Vec3::UP * 3.0;
        assert_eq!(actor.cell(&mapper), Cell::new(3, 2));
    }

    #[test]
    fn snapshot_moves_rest_position() {
        let mut actor = Actor::spawn(Vec3::ZERO);
        actor.position = Vec3::new(4.0, 2.0, 0.0);
        actor.snapshot_rest();
        assert_eq!(actor.rest_position, Vec3::new(4.0, 2.0, 0.0));
    }
}
