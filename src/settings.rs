//! Game settings
//!
//! Everything a host may tune without touching the simulation code. The
//! remaining balance numbers live in `crate::consts`.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Rule set variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameVariant {
    /// Original arcade rules: no pickups, hostile craft never pursue
    Classic,
    /// Pickups, pursuing hostile craft, high-score tracking
    #[default]
    Enhanced,
}

impl GameVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameVariant::Classic => "Classic",
            GameVariant::Enhanced => "Enhanced",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(GameVariant::Classic),
            "enhanced" => Some(GameVariant::Enhanced),
            _ => None,
        }
    }
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rule set
    pub variant: GameVariant,
    /// Seed for the session RNG
    pub seed: u64,

    // === World ===
    pub world_width: f32,
    pub world_height: f32,
    /// Sim clock advance per tick (ms)
    pub frame_interval_ms: u64,

    // === Rules ===
    pub starting_lives: u32,
    /// Maximum standard projectiles in flight
    pub bullet_limit: u32,
    /// Score needed for each bonus life
    pub bonus_life_every: u64,
    /// Delay before ship respawn / level advance / game over (ms)
    pub transition_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: GameVariant::Enhanced,
            seed: 0x5EED_A57E,

            world_width: WORLD_SIZE,
            world_height: WORLD_SIZE,
            frame_interval_ms: FRAME_INTERVAL_MS,

            starting_lives: STARTING_LIVES,
            bullet_limit: BULLET_LIMIT,
            bonus_life_every: BONUS_LIFE_EVERY,
            transition_delay_ms: END_DELAY_MS,
        }
    }
}

impl Settings {
    /// Default settings for a variant
    pub fn for_variant(variant: GameVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Parse settings from JSON (missing fields take defaults) and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world_width > 0.0 && self.world_height > 0.0) {
            return Err(ConfigError::WorldSize {
                width: self.world_width,
                height: self.world_height,
            });
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::FrameInterval);
        }
        if self.bullet_limit == 0 {
            return Err(ConfigError::BulletLimit);
        }
        if self.bonus_life_every == 0 {
            return Err(ConfigError::BonusLifeThreshold);
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::StartingLives);
        }
        Ok(())
    }

    /// Returns these settings if valid, defaults (same variant and seed) otherwise
    pub fn sanitized(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(err) => {
                log::warn!("Rejected settings ({err}), using defaults");
                Self {
                    variant: self.variant,
                    seed: self.seed,
                    ..Self::default()
                }
            }
        }
    }
}
