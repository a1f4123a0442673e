//! Enemy archetypes and weighted selection for the spawner.

use std::f32::consts::PI;

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyArchetype {
    Skiff,
    Gunboat,
    Frigate,
}

impl EnemyArchetype {
    pub const ALL: [EnemyArchetype; 3] = [EnemyArchetype::Skiff, EnemyArchetype::Gunboat, EnemyArchetype::Frigate];

    pub fn name(self) -> &'static str {
        match self {
            EnemyArchetype::Skiff => "Skiff",
            EnemyArchetype::Gunboat => "Gunboat",
            EnemyArchetype::Frigate => "Frigate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeWeights {
    pub skiff: f32,
    pub gunboat: f32,
    pub frigate: f32,
}

impl Default for ArchetypeWeights {
    fn default() -> Self {
        Self {
            skiff: 0.5,
            gunboat: 0.35,
            frigate: 0.15,
        }
    }
}

impl ArchetypeWeights {
    fn as_array(&self) -> [f32; 3] {
        [self.skiff, self.gunboat, self.frigate]
    }

    pub fn total(&self) -> f32 {
        self.as_array().iter().map(|w| w.max(0.0)).sum()
    }

    /// Pick an archetype from a uniform roll in [0, 1).
    pub fn pick(&self, roll: f32) -> Option<EnemyArchetype> {
        pick_weighted(&self.as_array(), roll).map(|i| EnemyArchetype::ALL[i])
    }
}

/// Index chosen by a uniform roll over non-negative weights. Negative weights
/// count as zero; `None` when every weight is zero.
pub fn pick_weighted(weights: &[f32], roll: f32) -> Option<usize> {
    let total: f32 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut remaining = roll.clamp(0.0, 1.0) * total;
    let mut last = None;
    for (i, w) in weights.iter().enumerate() {
        let w = w.max(0.0);
        if w <= 0.0 {
            continue;
        }
        if remaining < w {
            return Some(i);
        }
        remaining -= w;
        last = Some(i);
    }
    last
}

/// Point on the water plane in the ring `[min_radius, max_radius]` around
/// `center`.
pub fn ring_position(center: Vec3, min_radius: f32, max_radius: f32, angle_roll: f32, distance_roll: f32) -> Vec3 {
    let angle = angle_roll * 2.0 * PI;
    let r = min_radius + (max_radius - min_radius).max(0.0) * distance_roll.clamp(0.0, 1.0);
    Vec3::new(center.x + angle.sin() * r, 0.0, center.z + angle.cos() * r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_by_cumulative_weight() {
        let w = ArchetypeWeights::default();
        assert_eq!(w.pick(0.0), Some(EnemyArchetype::Skiff));
        assert_eq!(w.pick(0.49), Some(EnemyArchetype::Skiff));
        assert_eq!(w.pick(0.5), Some(EnemyArchetype::Gunboat));
        assert_eq!(w.pick(0.86), Some(EnemyArchetype::Frigate));
        assert_eq!(w.pick(1.0), Some(EnemyArchetype::Frigate));
    }

    #[test]
    fn test_zero_weights_skipped() {
        assert_eq!(pick_weighted(&[0.0, 1.0, 0.0], 0.99), Some(1));
        assert_eq!(pick_weighted(&[0.0, 0.0], 0.5), None);
        assert_eq!(pick_weighted(&[-1.0, 2.0], 0.0), Some(1));
    }

    #[test]
    fn test_ring_position_in_band() {
        let c = Vec3::new(10.0, 3.0, -5.0);
        for i in 0..30 {
            let p = ring_position(c, 60.0, 90.0, i as f32 / 30.0, (i as f32 * 0.17) % 1.0);
            let d = Vec3::new(p.x - c.x, 0.0, p.z - c.z).length();
            assert!((60.0 - 1e-3..=90.0 + 1e-3).contains(&d));
            assert_eq!(p.y, 0.0);
        }
    }
}
