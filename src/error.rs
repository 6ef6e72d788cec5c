//! Configuration errors
//!
//! The simulation itself never fails; only loading and validating
//! `Settings` can.

use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    WorldSize { width: f32, height: f32 },
    FrameInterval,
    BulletLimit,
    BonusLifeThreshold,
    StartingLives,
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorldSize { width, height } => {
                write!(f, "world size must be positive: got {width}x{height}")
            }
            Self::FrameInterval => write!(f, "frame interval must be at least 1 ms"),
            Self::BulletLimit => write!(f, "bullet limit must be at least 1"),
            Self::BonusLifeThreshold => write!(f, "bonus life threshold must be positive"),
            Self::StartingLives => write!(f, "starting lives must be at least 1"),
            Self::Parse(err) => write!(f, "invalid settings json: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}
