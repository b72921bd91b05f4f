//! Timed transitions driven by the game tick.
//!
//! Every timed sequence of the game (a roll, a slide leg, a crumble countdown,
//! a tile rising into place, a level fading out) is a [`Transition`] record in
//! one arena. [`Transitions::advance`] moves them forward by a frame delta and
//! reports interpolation progress and completions; the caller applies them.
//! Nothing here reads a clock.

use crate::game::engine::EntityId;
use crate::math::Vec3;
use crate::math::coordinates::Direction;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle to a pending transition.
    pub struct TransitionId;
}

/// Groups transitions that can be cancelled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelToken(u64);

/// Why the actor is being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePurpose {
    /// A single grid step requested by input.
    Roll,
    /// One leg of a slide. `last` marks the leg that leaves the slippery run.
    Glide { direction: Direction, last: bool },
    /// Lifted off a crumbling tile.
    CrumbleLift,
    /// Carried back to the rest position after a crumble.
    CrumbleReturn,
    /// Rising to the next level after reaching the goal.
    Ascend,
}

/// Something that happens when a delay runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayedAction {
    /// Start lifting the actor off a crumbling tile.
    CrumbleLift,
    /// Start returning the actor to its rest position.
    CrumbleReturn,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Linear move of the actor between two world positions.
    ActorMove {
        from: Vec3,
        to: Vec3,
        purpose: MovePurpose,
    },
    /// A tile rising into place while fading in.
    TileReveal { entity: EntityId, from: Vec3, to: Vec3 },
    /// Every tile of a retired level fading out.
    LevelFade { level: u32 },
    /// A plain wait.
    Delay(DelayedAction),
}

#[derive(Debug)]
struct Pending {
    transition: Transition,
    seq: u64,
    /// Negative while a start delay is still running.
    elapsed: f32,
    duration: f32,
    token: Option<CancelToken>,
}

impl Pending {
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Outcome of one [`Transitions::advance`] call.
#[derive(Debug, Default)]
pub struct Advance {
    /// Running transitions with their progress in `[0, 1]`, oldest first.
    pub progress: Vec<(TransitionId, Transition, f32)>,
    /// Transitions that reached the end this frame, oldest first. They are
    /// already removed from the arena and also appear in `progress` at `1.0`.
    pub finished: Vec<(TransitionId, Transition)>,
}

/// Arena of pending transitions.
#[derive(Debug, Default)]
pub struct Transitions {
    entries: SlotMap<TransitionId, Pending>,
    next_seq: u64,
    next_token: u64,
}

impl Transitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a fresh cancellation token.
    pub fn new_token(&mut self) -> CancelToken {
        self.next_token += 1;
        CancelToken(self.next_token)
    }

    /// Starts `transition` now; it completes after `duration` seconds.
    pub fn start(
        &mut self,
        transition: Transition,
        duration: f32,
        token: Option<CancelToken>,
    ) -> TransitionId {
        self.start_delayed(transition, 0.0, duration, token)
    }

    /// Starts `transition` after `delay` seconds.
    pub fn start_delayed(
        &mut self,
        transition: Transition,
        delay: f32,
        duration: f32,
        token: Option<CancelToken>,
    ) -> TransitionId {
        self.next_seq += 1;
        self.entries.insert(Pending {
            transition,
            seq: self.next_seq,
            elapsed: -delay.max(0.0),
            duration,
            token,
        })
    }

    /// Removes one transition without completing it.
    pub fn remove(&mut self, id: TransitionId) -> Option<Transition> {
        self.entries.remove(id).map(|pending| pending.transition)
    }

    pub fn contains(&self, id: TransitionId) -> bool {
        self.entries.contains_key(id)
    }

    /// Removes every transition started with `token` and returns them oldest first.
    pub fn cancel(&mut self, token: CancelToken) -> Vec<Transition> {
        let mut cancelled: Vec<(u64, Transition)> = Vec::new();
        self.entries.retain(|_, pending| {
            if pending.token == Some(token) {
                cancelled.push((pending.seq, pending.transition));
                false
            } else {
                true
            }
        });
        cancelled.sort_by_key(|(seq, _)| *seq);
        cancelled
            .into_iter()
            .map(|(_, transition)| transition)
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves every transition forward by `dt` seconds.
    ///
    /// Transitions still inside their start delay report nothing.
    pub fn advance(&mut self, dt: f32) -> Advance {
        let mut running: Vec<(u64, TransitionId)> = Vec::with_capacity(self.entries.len());
        for (id, pending) in self.entries.iter_mut() {
            pending.elapsed += dt;
            if pending.elapsed < 0.0 {
                continue;
            }
            running.push((pending.seq, id));
        }
        running.sort_by_key(|(seq, _)| *seq);

        let mut advance = Advance::default();
        for (_, id) in running {
            let Some(pending) = self.entries.get(id) else {
                continue;
            };
            let t = pending.progress();
            let transition = pending.transition;
            advance.progress.push((id, transition, t));
            if t >= 1.0 {
                self.entries.remove(id);
                advance.finished.push((id, transition));
            }
        }
        advance
    }
}
