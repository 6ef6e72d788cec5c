//! HUD collaborator
//!
//! The simulation reports score/lives/level/legend changes; formatting and
//! layout are the collaborator's problem.

use serde::{Deserialize, Serialize};

pub trait Hud {
    fn set_score(&mut self, score: u64);
    fn set_lives(&mut self, lives: u32);
    fn set_level(&mut self, level: u32);
    fn set_legend(&mut self, legend: &str);
}

/// Hud that just remembers the latest values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudState {
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub legend: String,
}

impl Hud for HudState {
    fn set_score(&mut self, score: u64) {
        self.score = score;
    }

    fn set_lives(&mut self, lives: u32) {
        self.lives = lives;
    }

    fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    fn set_legend(&mut self, legend: &str) {
        self.legend.clear();
        self.legend.push_str(legend);
    }
}
