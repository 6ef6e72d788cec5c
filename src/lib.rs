//! Asteroids Sim - fixed-tick simulation core for an arcade space shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, collisions, timers, game session)
//! - `audio`: Sound cue vocabulary and the audio collaborator trait
//! - `hud`: Score/lives/level/legend collaborator trait
//! - `settings`: Data-driven game configuration

pub mod audio;
pub mod error;
pub mod hud;
pub mod settings;
pub mod sim;

pub use audio::{AudioSink, SilentAudio, SoundEffect};
pub use error::ConfigError;
pub use hud::{Hud, HudState};
pub use settings::{GameVariant, Settings};

/// Game configuration constants
pub mod consts {
    use std::f32::consts::PI;

    /// Default world dimensions (toroidal)
    pub const WORLD_SIZE: f32 = 750.0;
    /// Default sim clock advance per tick (ms)
    pub const FRAME_INTERVAL_MS: u64 = 33;
    /// Distance from the corners at which asteroids are seeded
    pub const EDGE_OFFSET: f32 = 100.0;
    /// Delay before a scheduled phase transition fires (ms)
    pub const END_DELAY_MS: u64 = 2500;

    pub const STARTING_LIVES: u32 = 3;
    pub const BONUS_LIFE_EVERY: u64 = 5000;

    /// Ship handling
    pub const SHIP_FRICTION: f32 = 0.995;
    pub const SHIP_ACCELERATION: f32 = 0.4;
    pub const SHIP_SPEED_LIMIT: f32 = 15.0;
    pub const SHIP_TURN: f32 = PI / 16.0;
    /// Nose of the ship in local space (projectiles spawn here)
    pub const SHIP_NOSE: (f32, f32) = (20.0, 0.0);

    /// Player projectiles
    pub const BULLET_LIMIT: u32 = 8;
    pub const BULLET_SPEED: f32 = 15.0;
    pub const BULLET_DURATION_MS: u64 = 1000;

    /// Asteroids, indexed by tier (0 = smallest)
    pub const ASTEROID_TIERS: usize = 3;
    pub const ASTEROID_SCALE: [f32; ASTEROID_TIERS] = [0.5, 1.0, 2.0];
    pub const ASTEROID_SPEED: [f32; ASTEROID_TIERS] = [5.0, 3.0, 2.0];
    pub const ASTEROID_SCORE: [u64; ASTEROID_TIERS] = [100, 50, 20];
    pub const INTRO_ASTEROIDS: u32 = 4;

    /// Hostile craft
    pub const ALIEN_SPEED: f32 = 2.0;
    /// Score for destroying a hostile craft, [weak, strong]
    pub const ALIEN_SCORE: [u64; 2] = [200, 1000];
    /// Outline scale of a hostile craft, [weak, strong]
    pub const ALIEN_SCALE: [f32; 2] = [1.0, 0.5];
    pub const ALIEN_SPAWN_MIN_MS: u64 = 5000;
    pub const ALIEN_SPAWN_MAX_MS: u64 = 10_000;
    pub const ALIEN_TURN_MS: u64 = 1500;
    pub const ALIEN_FIRST_SHOT_MS: u64 = 1250;
    pub const ALIEN_SHOT_MS: u64 = 1500;
    pub const ALIEN_PURSUE_MS: u64 = 6000;
    pub const ALIEN_SPEED_UP_MS: u64 = 12_000;
    /// Aim error of a classic strong craft (degrees, either side)
    pub const ALIEN_AIM_ERROR_DEG: i32 = 5;

    /// Debris pieces
    pub const DEBRIS_DURATION_MS: u64 = 2000;
    pub const DEBRIS_MAX_SPEED: f32 = 2.0;
    pub const SHIP_DEBRIS: [f32; 3] = [21.0, 21.0, 8.0];
    pub const ALIEN_DEBRIS: [f32; 6] = [17.0, 17.0, 12.0, 12.0, 6.0, 6.0];

    /// Pickups and the modifiers they grant
    pub const PICKUP_SPAWN_MIN_MS: u64 = 7000;
    pub const PICKUP_SPAWN_MAX_MS: u64 = 12_000;
    pub const PICKUP_DURATION_MS: u64 = 5000;
    pub const BULLET_TIME_MS: u64 = 3000;
    pub const FORCE_FIELD_MS: u64 = 3000;
    pub const DOUBLE_SCORE_MS: u64 = 5000;

    /// Ambient beat cadence
    pub const BEAT_START_MS: u64 = 1000;
    pub const BEAT_MIN_MS: u64 = 250;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector for a heading angle
#[inline]
pub fn heading_vector(angle: f32) -> glam::Vec2 {
    glam::Vec2::new(angle.cos(), angle.sin())
}
