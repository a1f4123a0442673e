//! Physics systems - buoyancy, helm, grapple springs and integration.
//!
//! Run in this order each tick: forces first (buoyancy, gravity, helm,
//! springs), then one integration pass over every rigid body.

use broadside_logic::buoyancy;
use broadside_logic::config::BuoyancyConfig;
use broadside_logic::movement::apply_helm;
use glam::Vec3;
use hecs::{Entity, World};

use super::Ocean;
use crate::components::{BuoyancyPoints, GrappleLauncher, Health, Helm, RigidBody};

/// Manual gravity on every body, plus per-point buoyancy where points exist.
pub fn buoyancy_system(world: &mut World, ocean: &mut Ocean, config: &BuoyancyConfig) {
    for (_, (body, points)) in world.query_mut::<(&mut RigidBody, Option<&BuoyancyPoints>)>() {
        let gravity = buoyancy::gravity_force(body.mass, config);
        body.add_force(gravity);

        let Some(points) = points else { continue };
        for local in &points.points {
            let point = body.world_point(*local);
            let wave = ocean.height(point.x, point.z);
            let force = buoyancy::point_force(point.y, body.point_velocity(point), wave, config);
            if force != Vec3::ZERO {
                body.add_force_at_position(force, point);
            }
        }
    }
}

/// Thrust, steering torque, lateral damping and drift for living vessels.
pub fn movement_system(world: &mut World, dt: f32) {
    for (_, (body, helm, health)) in world.query_mut::<(&mut RigidBody, &Helm, &Health)>() {
        if health.dead {
            continue;
        }
        apply_helm(body, helm.input, dt, &helm.config);
    }
}

/// Spring-damper forces for every attached grapple.
pub fn grapple_constraint_system(world: &mut World) {
    // Collect links first; both ends are rigid bodies in the same world.
    let links: Vec<(Entity, Entity, Vec3, Vec3)> = world
        .query::<&GrappleLauncher>()
        .iter()
        .filter_map(|(e, l)| {
            let target = l.target?;
            l.grapple.is_attached().then_some((e, target, l.config.launch_offset, l.anchor))
        })
        .collect();

    for (launcher, target, offset, anchor) in links {
        let (a, va) = match world.get::<&RigidBody>(launcher) {
            Ok(body) => {
                let p = body.world_point(offset);
                (p, body.point_velocity(p))
            }
            Err(_) => continue,
        };
        let (b, vb) = match world.get::<&RigidBody>(target) {
            Ok(body) => {
                let p = body.world_point(anchor);
                (p, body.point_velocity(p))
            }
            Err(_) => continue,
        };
        let force = match world.get::<&GrappleLauncher>(launcher) {
            Ok(l) => l.grapple.constraint_force(a, va, b, vb),
            Err(_) => continue,
        };
        if force == Vec3::ZERO {
            continue;
        }
        if let Ok(mut body) = world.get::<&mut RigidBody>(launcher) {
            body.add_force_at_position(force, a);
        }
        if let Ok(mut body) = world.get::<&mut RigidBody>(target) {
            body.add_force_at_position(-force, b);
        }
    }
}

/// Semi-implicit Euler step for every body.
pub fn integration_system(world: &mut World, dt: f32) {
    for (_, body) in world.query_mut::<&mut RigidBody>() {
        body.integrate(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::VesselBuilder;
    use crate::components::Faction;
    use broadside_logic::config::{GameConfig, WaveConfig};
    use broadside_logic::movement::ControlInput;

    fn calm_ocean() -> Ocean {
        Ocean::new(WaveConfig {
            base_height: 0.0,
            ..WaveConfig::default()
        })
    }

    #[test]
    fn test_hull_settles_near_equilibrium() {
        let mut world = World::new();
        let config = GameConfig::default();
        let e = VesselBuilder::new("Float", Faction::Player)
            .at(Vec3::new(0.0, 1.0, 0.0))
            .build(&mut world);
        let mut ocean = calm_ocean();
        for _ in 0..1500 {
            ocean.begin_tick(0.02);
            buoyancy_system(&mut world, &mut ocean, &config.buoyancy);
            integration_system(&mut world, 0.02);
        }
        let body = world.get::<&RigidBody>(e).unwrap();
        let expected = -buoyancy::equilibrium_depth(body.mass, 4, &config.buoyancy);
        assert!((body.position.y - expected).abs() < 0.05, "y = {}", body.position.y);
        assert!(body.velocity.y.abs() < 0.05);
    }

    #[test]
    fn test_vessel_without_points_sinks() {
        let mut world = World::new();
        let config = GameConfig::default();
        let e = VesselBuilder::new("Brick", Faction::Player)
            .buoyancy_points(Vec::new())
            .build(&mut world);
        let mut ocean = calm_ocean();
        for _ in 0..50 {
            buoyancy_system(&mut world, &mut ocean, &config.buoyancy);
            integration_system(&mut world, 0.02);
        }
        assert!(world.get::<&RigidBody>(e).unwrap().position.y < -1.0);
    }

    #[test]
    fn test_throttle_moves_forward() {
        let mut world = World::new();
        let e = VesselBuilder::new("Runner", Faction::Player).build(&mut world);
        world.get::<&mut Helm>(e).unwrap().input = ControlInput::new(0.0, 1.0);
        for _ in 0..100 {
            movement_system(&mut world, 0.02);
            integration_system(&mut world, 0.02);
        }
        let body = world.get::<&RigidBody>(e).unwrap();
        assert!(body.velocity.z > 1.0);
        assert!(body.position.z > 0.0);
    }
}
