//! The boundary between the puzzle core and whatever draws it.
//!
//! The core never owns scene objects. It asks an [`EngineHost`] to spawn a
//! tile, reports interpolated transforms while transitions run, and asks for
//! levels to be deactivated or the scene to be reloaded. Every call tolerates
//! handles the host no longer knows about.

use crate::game::tiles::TileKind;
use crate::math::Vec3;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Opaque handle to a tile object owned by the engine host.
    pub struct EntityId;
}

/// Engine collaborator driven by the game core.
pub trait EngineHost {
    /// Spawns a tile object for `level` at `position`.
    ///
    /// Returning `None` means the host has nothing to show for the tile; the
    /// tile still exists for gameplay.
    fn spawn_tile(&mut self, kind: TileKind, position: Vec3, level: u32) -> Option<EntityId>;

    /// Moves a tile and sets its opacity.
    fn update_tile(&mut self, entity: EntityId, position: Vec3, alpha: f32);

    /// A spike tile switched between armed and safe.
    fn set_spike_armed(&mut self, _entity: EntityId, _armed: bool) {}

    /// Highlights the goal tile of the current level.
    fn mark_goal(&mut self, _entity: EntityId) {}

    /// The actor moved.
    fn move_actor(&mut self, _position: Vec3) {}

    /// Hides every tile of `level`.
    fn deactivate_level(&mut self, level: u32);

    /// Throws away the whole scene before the game restarts from level 1.
    fn reload_scene(&mut self);
}

/// What the headless host remembers about one spawned tile.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessEntity {
    pub kind: TileKind,
    pub level: u32,
    pub position: Vec3,
    pub alpha: f32,
    pub active: bool,
    pub armed: Option<bool>,
    pub goal: bool,
}

/// In-memory host used by the demo binary and by tests.
///
/// It records the effect of every collaborator call so tests can assert on
/// what the core asked for.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    entities: SlotMap<EntityId, HeadlessEntity>,
    actor_position: Option<Vec3>,
    deactivated: Vec<u32>,
    reloads: u32,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, id: EntityId) -> Option<&HeadlessEntity> {
        self.entities.get(id)
    }

    /// Tiles spawned for `level` since the last scene reload.
    pub fn level_entities(&self, level: u32) -> impl Iterator<Item = &HeadlessEntity> + '_ {
        self.entities
            .values()
            .filter(move |entity| entity.level == level)
    }

    /// Number of tiles spawned since the last scene reload.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn active_count(&self) -> usize {
        self.entities.values().filter(|entity| entity.active).count()
    }

    pub fn actor_position(&self) -> Option<Vec3> {
        self.actor_position
    }

    /// Levels deactivated since the last scene reload, in call order.
    pub fn deactivated_levels(&self) -> &[u32] {
        &self.deactivated
    }

    pub fn reload_count(&self) -> u32 {
        self.reloads
    }
}

impl EngineHost for HeadlessHost {
    fn spawn_tile(&mut self, kind: TileKind, position: Vec3, level: u32) -> Option<EntityId> {
        let armed = (kind == TileKind::Spike).then_some(true);
        Some(self.entities.insert(HeadlessEntity {
            kind,
            level,
            position,
            alpha: 1.0,
            active: true,
            armed,
            goal: false,
        }))
    }

    fn update_tile(&mut self, entity: EntityId, position: Vec3, alpha: f32) {
        if let Some(tile) = self.entities.get_mut(entity) {
            tile.position = position;
            tile.alpha = alpha;
        }
    }

    fn set_spike_armed(&mut self, entity: EntityId, armed: bool) {
        if let Some(tile) = self.entities.get_mut(entity) {
            tile.armed = Some(armed);
        }
    }

    fn mark_goal(&mut self, entity: EntityId) {
        if let Some(tile) = self.entities.get_mut(entity) {
            tile.goal = true;
        }
    }

    fn move_actor(&mut self, position: Vec3) {
        self.actor_position = Some(position);
    }

    fn deactivate_level(&mut self, level: u32) {
        for tile in self.entities.values_mut().filter(|tile| tile.level == level) {
            tile.active = false;
        }
        self.deactivated.push(level);
    }

    fn reload_scene(&mut self) {
        self.entities.clear();
        self.deactivated.clear();
        self.actor_position = None;
        self.reloads += 1;
    }
}
