//! Session difficulty director.
//!
//! Difficulty creeps up with session time and reacts to how the player is
//! doing: sinking or capturing enemies pushes it up, taking damage eases it
//! off. The level is always clamped to the configured band.

use serde::{Deserialize, Serialize};

use crate::config::DifficultyConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyDirector {
    pub level: f32,
    pub elapsed: f32,
}

impl DifficultyDirector {
    pub fn new(config: &DifficultyConfig) -> Self {
        Self {
            level: config.initial.clamp(config.min_level, config.max_level),
            elapsed: 0.0,
        }
    }

    fn nudge(&mut self, delta: f32, config: &DifficultyConfig) {
        self.level = (self.level + delta).clamp(config.min_level, config.max_level);
    }

    pub fn tick(&mut self, dt: f32, config: &DifficultyConfig) {
        self.elapsed += dt;
        self.nudge(config.ramp_per_minute * dt / 60.0, config);
    }

    pub fn on_enemy_destroyed(&mut self, config: &DifficultyConfig) {
        self.nudge(config.kill_bonus, config);
    }

    pub fn on_enemy_captured(&mut self, config: &DifficultyConfig) {
        self.nudge(config.capture_bonus, config);
    }

    pub fn on_player_damaged(&mut self, amount: f32, config: &DifficultyConfig) {
        self.nudge(-amount.max(0.0) * config.damage_taken_penalty, config);
    }
}
