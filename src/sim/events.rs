//! Game events
//!
//! Everything the simulation wants the outside world to know about is
//! queued as a `GameEvent` during a tick. The host drains the queue after
//! the tick and forwards each event to its audio and HUD collaborators.

use serde::Serialize;

use super::entity::{AlienTier, EntityId, PickupKind};
use super::state::GamePhase;
use crate::audio::SoundEffect;
use crate::hud::Hud;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    /// Play a sound cue
    Sound(SoundEffect),
    /// Score changed (new total)
    Score(u64),
    /// Lives changed (new total)
    Lives(u32),
    /// Level changed (new level)
    Level(u32),
    /// Legend text changed (empty clears it)
    Legend(&'static str),
    /// Session moved to a new phase
    PhaseChanged { from: GamePhase, to: GamePhase },
    /// Asteroid destroyed; `children` fragments spawned in its place
    AsteroidDestroyed { id: EntityId, tier: u8, children: u8 },
    AlienSpawned { id: EntityId, tier: AlienTier },
    AlienDestroyed { id: EntityId, tier: AlienTier },
    ShipDestroyed { id: EntityId },
    PickupCollected { kind: PickupKind },
    /// Score threshold crossed
    BonusLife,
    /// Best score improved at game over
    HighScore(u64),
}

impl GameEvent {
    /// Forward HUD-relevant events to a `Hud`. Returns false for events the
    /// HUD doesn't care about.
    pub fn apply_to_hud<H: Hud + ?Sized>(&self, hud: &mut H) -> bool {
        match self {
            GameEvent::Score(score) => hud.set_score(*score),
            GameEvent::Lives(lives) => hud.set_lives(*lives),
            GameEvent::Level(level) => hud.set_level(*level),
            GameEvent::Legend(text) => hud.set_legend(text),
            _ => return false,
        }
        true
    }
}
