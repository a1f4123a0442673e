//! Weapons, projectiles and pooled effects.

use broadside_logic::ballistics::ProjectileBody;
use broadside_logic::config::WeaponConfig;
use broadside_logic::timer::Timer;
use broadside_logic::weapon::WeaponState;
use glam::{Quat, Vec3};
use hecs::Entity;

use crate::pool::PoolHandle;

/// A mounted gun.
#[derive(Debug, Clone)]
pub struct Weapon {
    pub state: WeaponState,
    pub config: WeaponConfig,
    /// Fire point in hull-local space.
    pub mount: Vec3,
    /// World-space mount rotation. `None` follows the hull heading.
    pub aim: Option<Quat>,
    /// Trigger pulled for the coming tick.
    pub fire_requested: bool,
    pub enabled: bool,
    /// Cleared (once, with an error log) if the vessel has no rigid body.
    pub recoil_enabled: bool,
}

impl Weapon {
    pub fn new(config: WeaponConfig, mount: Vec3) -> Self {
        Self {
            state: WeaponState::new(&config),
            config,
            mount,
            aim: None,
            fire_requested: false,
            enabled: true,
            recoil_enabled: true,
        }
    }

    /// Firing direction given the hull rotation.
    pub fn direction(&self, hull: Quat) -> Vec3 {
        self.aim.unwrap_or(hull) * Vec3::Z
    }
}

/// A shell in flight.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub body: ProjectileBody,
    pub owner: Entity,
    pub handle: PoolHandle,
}

/// A pooled visual effect, alive until its timer runs out.
#[derive(Debug, Clone)]
pub struct Effect {
    pub name: &'static str,
    pub position: Vec3,
    pub life: Timer,
    pub handle: PoolHandle,
}
