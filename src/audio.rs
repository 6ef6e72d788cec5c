//! Sound cues
//!
//! The simulation never plays audio. It emits `SoundEffect` cues and a host
//! hands them to an `AudioSink`; loading, mixing and looping belong to the
//! sink, and a sink that fails to load a clip must degrade to silence.

use serde::{Deserialize, Serialize};

/// Sound effect cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player projectile fired
    Fire,
    /// Ship thrusting (sent every tick thrust is held)
    Thrust,
    /// Ship destroyed
    ShipExplosion,
    /// Asteroid destroyed, by size
    AsteroidExplosionLarge,
    AsteroidExplosionMedium,
    AsteroidExplosionSmall,
    /// Hostile craft destroyed
    AlienExplosion,
    /// Start looping the engine hum of a weak / strong hostile craft
    SaucerLoopWeak,
    SaucerLoopStrong,
    /// Stop any hostile craft loop
    SaucerLoopStop,
    /// Ambient two-tone beat
    Beat1,
    Beat2,
    /// Pickup collected
    PickupCollect,
}

impl SoundEffect {
    /// Stable cue name (what an asset loader would key clips by)
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::Fire => "fire",
            SoundEffect::Thrust => "thrust",
            SoundEffect::ShipExplosion => "explosion-ship",
            SoundEffect::AsteroidExplosionLarge => "explosion-large",
            SoundEffect::AsteroidExplosionMedium => "explosion-medium",
            SoundEffect::AsteroidExplosionSmall => "explosion-small",
            SoundEffect::AlienExplosion => "explosion-alien",
            SoundEffect::SaucerLoopWeak => "ambient-loop-start-weak",
            SoundEffect::SaucerLoopStrong => "ambient-loop-start-strong",
            SoundEffect::SaucerLoopStop => "ambient-loop-stop",
            SoundEffect::Beat1 => "beat-1",
            SoundEffect::Beat2 => "beat-2",
            SoundEffect::PickupCollect => "pickup",
        }
    }

    /// Cue for an asteroid of the given tier breaking up
    pub fn asteroid_explosion(tier: u8) -> Self {
        match tier {
            0 => SoundEffect::AsteroidExplosionSmall,
            1 => SoundEffect::AsteroidExplosionMedium,
            _ => SoundEffect::AsteroidExplosionLarge,
        }
    }
}

/// Audio collaborator
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Sink that discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Sink that logs cues at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        log::debug!("audio cue: {}", effect.as_str());
    }
}

/// Any closure taking a cue is a sink
impl<F: FnMut(SoundEffect)> AudioSink for F {
    fn play(&mut self, effect: SoundEffect) {
        self(effect)
    }
}
