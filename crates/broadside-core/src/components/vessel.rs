//! Vessel components: identity, faction, hull geometry and helm.

use broadside_logic::config::MovementConfig;
use broadside_logic::movement::{ControlInput, TiltState};
use broadside_logic::spawn::EnemyArchetype;
use broadside_logic::timer::Timer;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::pool::PoolHandle;

/// Identity of a vessel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vessel {
    pub name: String,
    /// Set for spawner-built enemies.
    pub archetype: Option<EnemyArchetype>,
}

/// Team tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
    Friendly,
}

impl Faction {
    /// Enemies fight everyone else; players and friendlies fight enemies.
    pub fn is_hostile_to(self, other: Faction) -> bool {
        matches!(
            (self, other),
            (Faction::Enemy, Faction::Player)
                | (Faction::Enemy, Faction::Friendly)
                | (Faction::Player, Faction::Enemy)
                | (Faction::Friendly, Faction::Enemy)
        )
    }

    /// On the player's side.
    pub fn is_allied(self) -> bool {
        matches!(self, Faction::Player | Faction::Friendly)
    }
}

/// Buoyancy sample points in hull-local space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuoyancyPoints {
    pub points: Vec<Vec3>,
}

impl BuoyancyPoints {
    /// Four corners of a hull at the waterline.
    pub fn corners(half_width: f32, half_length: f32, keel: f32) -> Self {
        Self {
            points: vec![
                Vec3::new(-half_width, -keel, half_length),
                Vec3::new(half_width, -keel, half_length),
                Vec3::new(-half_width, -keel, -half_length),
                Vec3::new(half_width, -keel, -half_length),
            ],
        }
    }
}

/// Control input and cosmetic tilt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Helm {
    pub input: ControlInput,
    pub tilt: TiltState,
    pub config: MovementConfig,
}

impl Helm {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            input: ControlInput::idle(),
            tilt: TiltState::default(),
            config,
        }
    }

    /// Hull rotation with the cosmetic tilt layered on, for rendering.
    pub fn visual_rotation(&self, hull: Quat) -> Quat {
        hull * self.tilt.offset()
    }
}

/// Present on vessels a human can steer. Only the boarded one is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerControl {
    pub enabled: bool,
}

/// Hull sphere on the `HULL` layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f32,
}

/// Weak-point sphere in hull-local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeakPoint {
    pub offset: Vec3,
    pub radius: f32,
}

/// Weak-point colliders on the `WEAK_POINT` layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeakPoints {
    pub spheres: Vec<WeakPoint>,
}

/// Marks a dead vessel awaiting removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wreck {
    /// `None` keeps the wreck indefinitely.
    pub despawn: Option<Timer>,
}

/// Pool slot held by an entity; returned when the entity is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pooled(pub PoolHandle);
