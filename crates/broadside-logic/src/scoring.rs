//! Per-session counters. Nothing here outlives the session.

use serde::{Deserialize, Serialize};

use crate::constants::points;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub score: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub weak_point_hits: u32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub enemies_destroyed: u32,
    pub enemies_captured: u32,
    pub vessels_boarded: u32,
}

impl SessionStats {
    pub fn record_shot(&mut self) {
        self.shots_fired += 1;
    }

    pub fn record_hit(&mut self, damage: f32, weak_point: bool) {
        self.shots_hit += 1;
        self.damage_dealt += damage;
        if weak_point {
            self.weak_point_hits += 1;
            self.score += points::WEAK_POINT_HIT;
        }
    }

    pub fn record_damage_taken(&mut self, damage: f32) {
        self.damage_taken += damage;
    }

    pub fn record_destroyed(&mut self) {
        self.enemies_destroyed += 1;
        self.score += points::ENEMY_DESTROYED;
    }

    pub fn record_captured(&mut self) {
        self.enemies_captured += 1;
        self.score += points::ENEMY_CAPTURED;
    }

    pub fn record_boarded(&mut self) {
        self.vessels_boarded += 1;
        self.score += points::VESSEL_BOARDED;
    }

    /// Hits over shots, zero before the first shot.
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f32 / self.shots_fired as f32
        }
    }
}
