//! What a tile does to the actor standing on it.
//!
//! [`TileEffectResolver`] turns the tile under the actor into an [`Effect`]
//! and answers the two geometric questions the movement core needs: where a
//! teleport lands and how far the next slide leg goes. It never mutates game
//! state; the game loop applies the effects.

use crate::game::tiles::{TileKind, TileLookup};
use crate::math::coordinates::{Direction, adjacent_cell};
use crate::maze::generator::Cell;
use rand::Rng;

/// Effect of the tile the actor just arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Start the crumble countdown.
    Crumble,
    /// Armed spike: restart the game.
    Hazard,
    /// Relocate the actor and resolve again.
    Teleport,
    Slide(Direction),
}

/// One leg of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideLeg {
    pub to: Cell,
    /// The leg leaves the slippery run; the slide ends on `to`.
    pub last: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileEffectResolver {
    max_teleport_chain: u32,
}

impl TileEffectResolver {
    pub fn new(max_teleport_chain: u32) -> Self {
        Self { max_teleport_chain }
    }

    /// Teleports allowed back to back inside one resolution.
    pub fn max_teleport_chain(&self) -> u32 {
        self.max_teleport_chain
    }

    /// Maps a tile to its effect. Spikes only hurt while armed.
    pub fn classify(kind: Option<TileKind>, spike_armed: bool) -> Effect {
        match kind {
            None | Some(TileKind::Regular) => Effect::None,
            Some(TileKind::Crumbling) => Effect::Crumble,
            Some(TileKind::Spike) if spike_armed => Effect::Hazard,
            Some(TileKind::Spike) => Effect::None,
            Some(TileKind::Teleport) => Effect::Teleport,
            Some(TileKind::Slippery(direction)) => Effect::Slide(direction),
        }
    }

    /// Uniformly random cell of a `grid_size × grid_size` grid.
    pub fn teleport_destination<R: Rng + ?Sized>(&self, grid_size: usize, rng: &mut R) -> Cell {
        let size = grid_size.max(1) as i32;
        Cell::new(rng.gen_range(0..size), rng.gen_range(0..size))
    }

    /// The slide leg starting at `from`.
    ///
    /// The actor always moves one cell. The leg is the last one when the cell
    /// it lands on is not slippery in the same direction.
    pub fn next_slide_leg(lookup: &impl TileLookup, from: Cell, direction: Direction) -> SlideLeg {
        let to = adjacent_cell(from, direction);
        let last = lookup.tile_at(to) != Some(TileKind::Slippery(direction));
        SlideLeg { to, last }
    }

    /// Cell where a slide in `direction` that starts on `entry` comes to rest.
    ///
    /// Follows legs until the last one, so a run of `n` slippery cells starting
    /// at `entry` ends `n` cells past it. Straight runs over a finite layout
    /// always terminate.
    pub fn slide_destination(lookup: &impl TileLookup, entry: Cell, direction: Direction) -> Cell {
        let mut cell = entry;
        loop {
            let leg = Self::next_slide_leg(lookup, cell, direction);
            cell = leg.to;
            if leg.last {
                return cell;
            }
        }
    }
}
