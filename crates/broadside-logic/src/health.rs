//! Hull health: mitigation, healing, regeneration and the death transition.
//!
//! Health always stays in `[0, max]`. Death happens once; a dead hull
//! ignores damage and healing alike and cannot be restored.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::HealthConfig;

/// One hit, packaged for delivery to a damage receiver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageInfo {
    pub amount: f32,
    pub point: Vec3,
    pub direction: Vec3,
    pub weak_point: bool,
    /// Entity bits of the attacker, if known.
    pub source: Option<u64>,
}

impl DamageInfo {
    pub fn new(amount: f32) -> Self {
        Self {
            amount,
            point: Vec3::ZERO,
            direction: Vec3::ZERO,
            weak_point: false,
            source: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Dead or invulnerable; nothing changed.
    Ignored,
    Damaged { applied: f32 },
    /// This hit took health to zero. Reported exactly once per hull.
    Killed { applied: f32 },
}

impl DamageOutcome {
    pub fn applied(&self) -> f32 {
        match *self {
            DamageOutcome::Ignored => 0.0,
            DamageOutcome::Damaged { applied } | DamageOutcome::Killed { applied } => applied,
        }
    }
}

/// Anything that can be hit.
pub trait DamageReceiver {
    fn take_damage(&mut self, info: &DamageInfo) -> DamageOutcome;
    fn is_alive(&self) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    pub dead: bool,
    pub invulnerable: bool,
    /// Seconds since the last damage that actually landed.
    pub since_damage: f32,
    pub config: HealthConfig,
}

impl Health {
    pub fn new(config: HealthConfig) -> Self {
        let max = config.max_health.max(f32::EPSILON);
        Self {
            current: max,
            max,
            dead: false,
            invulnerable: false,
            since_damage: f32::INFINITY,
            config,
        }
    }

    /// Damage after the multiplier and armor.
    pub fn mitigate(&self, amount: f32) -> f32 {
        let armor = if self.config.armored {
            1.0 - self.config.armor_reduction
        } else {
            1.0
        };
        (amount * self.config.damage_multiplier * armor).max(0.0)
    }

    pub fn fraction(&self) -> f32 {
        (self.current / self.max).clamp(0.0, 1.0)
    }

    /// Health as a percentage for display.
    pub fn percentage(&self) -> f32 {
        self.fraction() * 100.0
    }

    /// Heal up to `max`. Returns the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.dead || amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    pub fn restore_full(&mut self) -> f32 {
        self.heal(self.max)
    }

    /// Advance the quiet-period clock and regenerate when allowed.
    pub fn regenerate(&mut self, dt: f32) -> f32 {
        self.since_damage += dt;
        if !self.config.regen_enabled || self.since_damage < self.config.regen_delay {
            return 0.0;
        }
        self.heal(self.config.regen_rate * dt)
    }
}

impl DamageReceiver for Health {
    fn take_damage(&mut self, info: &DamageInfo) -> DamageOutcome {
        if self.dead || self.invulnerable {
            return DamageOutcome::Ignored;
        }
        let amount = self.mitigate(info.amount);
        let before = self.current;
        self.current = (self.current - amount).clamp(0.0, self.max);
        self.since_damage = 0.0;
        let applied = before - self.current;
        if self.current <= 0.0 {
            self.dead = true;
            DamageOutcome::Killed { applied }
        } else {
            DamageOutcome::Damaged { applied }
        }
    }

    fn is_alive(&self) -> bool {
        !self.dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hull() -> Health {
        Health::new(HealthConfig::default())
    }

    #[test]
    fn test_damage_never_below_zero() {
        let mut h = hull();
        let out = h.take_damage(&DamageInfo::new(1_000.0));
        assert_eq!(out, DamageOutcome::Killed { applied: 100.0 });
        assert_eq!(h.current, 0.0);
        assert!(h.dead);
    }

    #[test]
    fn test_death_reported_once() {
        let mut h = hull();
        assert!(matches!(h.take_damage(&DamageInfo::new(100.0)), DamageOutcome::Killed { .. }));
        assert_eq!(h.take_damage(&DamageInfo::new(10.0)), DamageOutcome::Ignored);
        assert_eq!(h.heal(50.0), 0.0, "no resurrection");
        assert_eq!(h.restore_full(), 0.0);
    }

    #[test]
    fn test_heal_clamped_to_max() {
        let mut h = hull();
        h.take_damage(&DamageInfo::new(30.0));
        assert_eq!(h.heal(500.0), 30.0);
        assert_eq!(h.current, h.max);
    }

    #[test]
    fn test_armor_and_multiplier() {
        let mut h = Health::new(HealthConfig {
            armored: true,
            armor_reduction: 0.25,
            damage_multiplier: 2.0,
            ..HealthConfig::default()
        });
        let out = h.take_damage(&DamageInfo::new(10.0));
        assert_eq!(out.applied(), 15.0);
    }

    #[test]
    fn test_negative_damage_does_not_heal() {
        let mut h = hull();
        h.take_damage(&DamageInfo::new(20.0));
        h.take_damage(&DamageInfo::new(-50.0));
        assert_eq!(h.current, 80.0);
    }

    #[test]
    fn test_invulnerable_ignores_damage() {
        let mut h = hull();
        h.invulnerable = true;
        assert_eq!(h.take_damage(&DamageInfo::new(50.0)), DamageOutcome::Ignored);
        assert_eq!(h.current, 100.0);
    }

    #[test]
    fn test_regen_waits_for_quiet_period() {
        let mut h = Health::new(HealthConfig {
            regen_enabled: true,
            regen_delay: 5.0,
            regen_rate: 2.0,
            ..HealthConfig::default()
        });
        h.take_damage(&DamageInfo::new(50.0));
        assert_eq!(h.regenerate(4.0), 0.0);
        assert_eq!(h.current, 50.0);
        let healed = h.regenerate(1.0);
        assert!((healed - 2.0).abs() < 1e-5);
        h.take_damage(&DamageInfo::new(1.0));
        assert_eq!(h.regenerate(1.0), 0.0, "damage resets the quiet period");
    }
}
