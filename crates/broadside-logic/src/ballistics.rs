//! Projectile flight and hit resolution.
//!
//! Projectiles integrate under gravity with semi-implicit Euler and face
//! along their velocity. Hit tests sweep the segment covered this tick
//! against sphere colliders so fast shells cannot tunnel through thin hulls.
//!
//! A projectile resolves at most one hit. [`ProjectileBody::claim_hit`] flips
//! the `resolved` flag exactly once; every later contact is ignored.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::ProjectileConfig;
use crate::constants::HIT_IMPULSE_FACTOR;
use crate::timer::Timer;

/// Bit set of collider layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);

    pub fn from_layers(layers: &[u8]) -> Self {
        LayerMask(layers.iter().fold(0, |acc, &l| acc | (1 << l)))
    }

    pub fn contains(self, layer: u8) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    pub radius: f32,
    pub damage: f32,
    pub weak_point_multiplier: f32,
    pub weak_point_mask: LayerMask,
    pub gravity_scale: f32,
    pub lifetime: Timer,
    pub resolved: bool,
}

impl ProjectileBody {
    /// Launch from `origin` along `direction` at the configured speed.
    pub fn launch(origin: Vec3, direction: Vec3, config: &ProjectileConfig) -> Self {
        let dir = direction.normalize_or_zero();
        let dir = if dir == Vec3::ZERO { Vec3::Z } else { dir };
        Self {
            position: origin,
            velocity: dir * config.speed,
            mass: config.mass,
            radius: config.radius,
            damage: config.damage,
            weak_point_multiplier: config.weak_point_multiplier,
            weak_point_mask: LayerMask(config.weak_point_mask),
            gravity_scale: config.gravity_scale,
            lifetime: Timer::new(config.lifetime),
            resolved: false,
        }
    }

    /// Integrate one tick. Returns the swept segment `(from, to)`.
    pub fn step(&mut self, dt: f32, gravity: f32) -> (Vec3, Vec3) {
        let from = self.position;
        self.velocity.y -= gravity * self.gravity_scale * dt;
        self.position += self.velocity * dt;
        self.lifetime.tick(dt);
        (from, self.position)
    }

    pub fn expired(&self) -> bool {
        self.lifetime.finished()
    }

    /// Facing derived from the velocity direction.
    pub fn orientation(&self) -> Quat {
        let dir = self.velocity.normalize_or_zero();
        if dir == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(Vec3::Z, dir)
        }
    }

    /// First-hit-wins gate. True only the first time it is called.
    pub fn claim_hit(&mut self) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        true
    }

    /// Damage delivered against a collider on `layer`, and whether it was a
    /// weak-point hit.
    pub fn damage_against(&self, layer: u8) -> (f32, bool) {
        resolve_damage(self.damage, layer, self.weak_point_mask, self.weak_point_multiplier)
    }

    /// Impulse transferred to the struck body.
    pub fn impulse(&self) -> Vec3 {
        hit_impulse(self.velocity, self.mass)
    }
}

pub fn resolve_damage(base: f32, layer: u8, mask: LayerMask, multiplier: f32) -> (f32, bool) {
    if mask.contains(layer) {
        (base * multiplier, true)
    } else {
        (base, false)
    }
}

/// `direction * mass * speed * 0.5`.
pub fn hit_impulse(velocity: Vec3, mass: f32) -> Vec3 {
    velocity.normalize_or_zero() * mass * velocity.length() * HIT_IMPULSE_FACTOR
}

/// Earliest parameter `t` in [0, 1] where segment `from..to` enters the
/// sphere. A segment starting inside the sphere hits at `t = 0`.
pub fn segment_sphere(from: Vec3, to: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let d = to - from;
    let m = from - center;
    let c = m.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let a = d.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let b = m.dot(d);
    if b > 0.0 {
        return None;
    }
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / a;
    (0.0..=1.0).contains(&t).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{layers, GRAVITY};

    #[test]
    fn test_weak_point_damage() {
        let config = ProjectileConfig {
            damage: 25.0,
            weak_point_multiplier: 2.5,
            ..ProjectileConfig::default()
        };
        let p = ProjectileBody::launch(Vec3::ZERO, Vec3::Z, &config);
        assert_eq!(p.damage_against(layers::WEAK_POINT), (62.5, true));
        assert_eq!(p.damage_against(layers::HULL), (25.0, false));
    }

    #[test]
    fn test_first_hit_wins() {
        let mut p = ProjectileBody::launch(Vec3::ZERO, Vec3::Z, &ProjectileConfig::default());
        assert!(p.claim_hit());
        assert!(!p.claim_hit());
        assert!(!p.claim_hit());
    }

    #[test]
    fn test_projectile_falls_and_expires() {
        let config = ProjectileConfig {
            lifetime: 1.0,
            ..ProjectileConfig::default()
        };
        let mut p = ProjectileBody::launch(Vec3::new(0.0, 10.0, 0.0), Vec3::Z, &config);
        for _ in 0..55 {
            p.step(0.02, GRAVITY);
        }
        assert!(p.position.y < 10.0);
        assert!(p.position.z > 0.0);
        assert!(p.expired());
        let facing = p.orientation() * Vec3::Z;
        assert!(facing.y < 0.0, "nose tips down as it falls");
    }

    #[test]
    fn test_hit_impulse_magnitude() {
        let i = hit_impulse(Vec3::new(0.0, 0.0, 60.0), 2.0);
        assert!((i - Vec3::new(0.0, 0.0, 60.0)).length() < 1e-4);
    }

    #[test]
    fn test_segment_sphere() {
        let c = Vec3::new(0.0, 0.0, 5.0);
        let t = segment_sphere(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), c, 1.0);
        assert!((t.unwrap_or(-1.0) - 0.4).abs() < 1e-5);
        assert!(segment_sphere(Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0), c, 1.0).is_none());
        assert!(segment_sphere(Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 10.0), c, 1.0).is_none());
        assert_eq!(segment_sphere(c, c + Vec3::X, c, 1.0), Some(0.0));
    }

    #[test]
    fn test_layer_mask() {
        let mask = LayerMask::from_layers(&[layers::WEAK_POINT]);
        assert!(mask.contains(layers::WEAK_POINT));
        assert!(!mask.contains(layers::HULL));
        assert!(!LayerMask::NONE.contains(layers::WATER));
    }
}
