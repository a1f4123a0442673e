//! Explicit vessel assembly.
//!
//! Every collaborator a vessel needs is wired here rather than discovered at
//! runtime. Missing optional pieces are logged and the feature that needs
//! them is left off; the vessel itself always spawns.

use broadside_logic::ai::Personality;
use broadside_logic::config::{
    AiConfig, CaptureConfig, GameConfig, GrappleConfig, HealthConfig, MovementConfig, WeaponConfig,
};
use broadside_logic::health::Health;
use broadside_logic::rigid_body::RigidBody;
use broadside_logic::spawn::EnemyArchetype;
use glam::{Quat, Vec3};
use hecs::{Entity, EntityBuilder, World};

use crate::components::*;

#[derive(Debug, Clone)]
pub struct VesselBuilder {
    name: String,
    faction: Faction,
    archetype: Option<EnemyArchetype>,
    position: Vec3,
    rotation: Quat,
    mass: f32,
    half_extents: Vec3,
    drag: f32,
    angular_drag: f32,
    rigid_body: bool,
    buoyancy_points: Vec<Vec3>,
    hull_radius: f32,
    weak_points: Vec<WeakPoint>,
    movement: MovementConfig,
    health: HealthConfig,
    weapon: Option<(WeaponConfig, Option<Vec3>)>,
    ai: Option<(Personality, AiConfig)>,
    capture: Option<CaptureConfig>,
    grapple: Option<GrappleConfig>,
    player_control: Option<bool>,
}

impl VesselBuilder {
    pub fn new(name: impl Into<String>, faction: Faction) -> Self {
        let half_extents = Vec3::new(1.5, 0.8, 4.0);
        Self {
            name: name.into(),
            faction,
            archetype: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            mass: 1000.0,
            half_extents,
            drag: 0.05,
            angular_drag: 2.0,
            rigid_body: true,
            buoyancy_points: BuoyancyPoints::corners(half_extents.x, half_extents.z * 0.8, 0.0).points,
            hull_radius: half_extents.z,
            weak_points: Vec::new(),
            movement: MovementConfig::default(),
            health: HealthConfig::default(),
            weapon: None,
            ai: None,
            capture: None,
            grapple: None,
            player_control: None,
        }
    }

    /// Small, quick, fragile.
    pub fn sloop(name: impl Into<String>, faction: Faction, config: &GameConfig) -> Self {
        Self::new(name, faction)
            .hull(800.0, Vec3::new(1.2, 0.7, 3.5))
            .movement(config.movement.clone())
            .health(config.health.clone())
            .weapon(config.weapon.clone(), Vec3::new(0.0, 1.0, 3.0))
            .weak_point(Vec3::new(0.0, 0.2, -3.0), 0.6)
    }

    /// Balanced patrol boat.
    pub fn gunboat(name: impl Into<String>, faction: Faction, config: &GameConfig) -> Self {
        Self::new(name, faction)
            .hull(1000.0, Vec3::new(1.5, 0.8, 4.0))
            .movement(config.movement.clone())
            .health(config.health.clone())
            .weapon(config.weapon.clone(), Vec3::new(0.0, 1.2, 3.5))
            .weak_point(Vec3::new(0.0, 0.3, -3.5), 0.7)
            .weak_point(Vec3::new(0.0, 1.5, 0.0), 0.5)
    }

    /// Heavy, slow, armored.
    pub fn frigate(name: impl Into<String>, faction: Faction, config: &GameConfig) -> Self {
        let movement = MovementConfig {
            max_speed: config.movement.max_speed * 0.7,
            acceleration: config.movement.acceleration * 0.6,
            ..config.movement.clone()
        };
        let health = HealthConfig {
            max_health: config.health.max_health * 2.0,
            armored: true,
            ..config.health.clone()
        };
        Self::new(name, faction)
            .hull(2500.0, Vec3::new(2.5, 1.2, 7.0))
            .movement(movement)
            .health(health)
            .weapon(config.weapon.clone(), Vec3::new(0.0, 2.0, 6.0))
            .weak_point(Vec3::new(0.0, 0.5, -6.5), 0.9)
    }

    /// Spawner preset: an AI-driven, capturable enemy of the given archetype.
    pub fn enemy(archetype: EnemyArchetype, personality: Personality, config: &GameConfig) -> Self {
        let name = archetype.name();
        let builder = match archetype {
            EnemyArchetype::Skiff => {
                let movement = MovementConfig {
                    max_speed: config.movement.max_speed * 1.2,
                    ..config.movement.clone()
                };
                let health = HealthConfig {
                    max_health: config.health.max_health * 0.6,
                    ..config.health.clone()
                };
                Self::sloop(name, Faction::Enemy, config).movement(movement).health(health)
            }
            EnemyArchetype::Gunboat => Self::gunboat(name, Faction::Enemy, config),
            EnemyArchetype::Frigate => Self::frigate(name, Faction::Enemy, config),
        };
        builder
            .archetype(archetype)
            .ai(personality, config.ai.clone())
            .capturable(config.capture.clone())
    }

    pub fn pose(mut self, position: Vec3, rotation: Quat) -> Self {
        self.position = position;
        self.rotation = rotation;
        self
    }

    pub fn at(self, position: Vec3) -> Self {
        let rotation = self.rotation;
        self.pose(position, rotation)
    }

    /// Mass and box half-extents. Resets buoyancy points and hull radius to
    /// match the new hull.
    pub fn hull(mut self, mass: f32, half_extents: Vec3) -> Self {
        self.mass = mass;
        self.half_extents = half_extents;
        self.buoyancy_points = BuoyancyPoints::corners(half_extents.x, half_extents.z * 0.8, 0.0).points;
        self.hull_radius = half_extents.z;
        self
    }

    pub fn drag(mut self, drag: f32, angular_drag: f32) -> Self {
        self.drag = drag;
        self.angular_drag = angular_drag;
        self
    }

    pub fn archetype(mut self, archetype: EnemyArchetype) -> Self {
        self.archetype = Some(archetype);
        self
    }

    pub fn buoyancy_points(mut self, points: Vec<Vec3>) -> Self {
        self.buoyancy_points = points;
        self
    }

    pub fn hull_radius(mut self, radius: f32) -> Self {
        self.hull_radius = radius;
        self
    }

    pub fn weak_point(mut self, offset: Vec3, radius: f32) -> Self {
        self.weak_points.push(WeakPoint { offset, radius });
        self
    }

    pub fn movement(mut self, config: MovementConfig) -> Self {
        self.movement = config;
        self
    }

    pub fn health(mut self, config: HealthConfig) -> Self {
        self.health = config;
        self
    }

    pub fn weapon(mut self, config: WeaponConfig, fire_point: Vec3) -> Self {
        self.weapon = Some((config, Some(fire_point)));
        self
    }

    /// A weapon with no fire point; it will be logged and left off.
    pub fn weapon_without_fire_point(mut self, config: WeaponConfig) -> Self {
        self.weapon = Some((config, None));
        self
    }

    pub fn ai(mut self, personality: Personality, config: AiConfig) -> Self {
        self.ai = Some((personality, config));
        self
    }

    pub fn capturable(mut self, config: CaptureConfig) -> Self {
        self.capture = Some(config);
        self
    }

    pub fn grapple(mut self, config: GrappleConfig) -> Self {
        self.grapple = Some(config);
        self
    }

    /// Steerable by the player; `enabled` marks the vessel currently boarded.
    pub fn player_control(mut self, enabled: bool) -> Self {
        self.player_control = Some(enabled);
        self
    }

    /// Leave the rigid body off. The vessel exists but cannot move.
    pub fn without_rigid_body(mut self) -> Self {
        self.rigid_body = false;
        self
    }

    pub fn build(self, world: &mut World) -> Entity {
        let mut b = EntityBuilder::new();
        b.add(Vessel {
            name: self.name.clone(),
            archetype: self.archetype,
        });
        b.add(self.faction);
        b.add(Health::new(self.health));
        b.add(Helm::new(self.movement));
        b.add(Collider {
            radius: self.hull_radius,
        });
        if !self.weak_points.is_empty() {
            b.add(WeakPoints {
                spheres: self.weak_points,
            });
        }

        if self.rigid_body {
            b.add(
                RigidBody::new(self.mass, self.half_extents)
                    .with_pose(self.position, self.rotation)
                    .with_drag(self.drag, self.angular_drag),
            );
        } else {
            log::error!("{}: no rigid body; movement, buoyancy and recoil are disabled", self.name);
        }

        if self.buoyancy_points.is_empty() {
            log::warn!("{}: no buoyancy points; vessel will not float", self.name);
        } else {
            b.add(BuoyancyPoints {
                points: self.buoyancy_points,
            });
        }

        match self.weapon {
            Some((config, Some(mount))) => {
                b.add(Weapon::new(config, mount));
            }
            Some((_, None)) => log::warn!("{}: weapon has no fire point; weapon disabled", self.name),
            None => {}
        }

        if let Some((personality, config)) = self.ai {
            b.add(AiController::new(personality, config, self.position));
        }
        if let Some(config) = self.capture {
            b.add(Capturable::new(config));
        }
        if let Some(config) = self.grapple {
            b.add(GrappleLauncher::new(config));
        }
        if let Some(enabled) = self.player_control {
            b.add(PlayerControl { enabled });
        }

        let entity = world.spawn(b.build());
        log::debug!("spawned {} as {:?}", self.name, entity);
        entity
    }
}
