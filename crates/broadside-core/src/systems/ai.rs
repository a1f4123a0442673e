//! Enemy AI system.
//!
//! Target acquisition and state transitions run on the detection cadence.
//! Steering, aiming and the trigger run every tick from the current state.

use broadside_logic::ai::{
    aim_rotation, effective_detection_range, lead_target, patrol_waypoint, steer_toward, steering_goal, AiState,
    SteeringContext, TriggerPull,
};
use broadside_logic::movement::ControlInput;
use glam::Vec3;
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::Rng;

use crate::components::*;
use crate::events::{EventQueue, GameEvent};

#[derive(Debug, Clone, Copy)]
struct Contact {
    entity: Entity,
    faction: Faction,
    position: Vec3,
    velocity: Vec3,
}

fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    Vec3::new(a.x - b.x, 0.0, a.z - b.z).length()
}

pub struct AiFrame {
    /// Director level this tick.
    pub difficulty: f32,
    /// True on ticks where detection and transitions run.
    pub evaluate: bool,
    pub dt: f32,
}

pub fn ai_system(world: &mut World, rng: &mut StdRng, events: &mut EventQueue, frame: &AiFrame) {
    let contacts: Vec<Contact> = world
        .query::<(&Faction, &RigidBody, &Health)>()
        .iter()
        .filter(|(_, (_, _, health))| !health.dead)
        .map(|(entity, (faction, body, _))| Contact {
            entity,
            faction: *faction,
            position: body.position,
            velocity: body.velocity,
        })
        .collect();

    for (entity, (ai, helm, body, health, faction, weapon)) in world.query_mut::<(
        &mut AiController,
        &mut Helm,
        &RigidBody,
        &Health,
        &Faction,
        Option<&mut Weapon>,
    )>() {
        if !ai.enabled || health.dead {
            continue;
        }
        ai.brain.difficulty = frame.difficulty;
        ai.brain.tick(frame.dt);

        // A despawned or dead target reads as no target.
        let mut target = ai
            .target
            .and_then(|t| contacts.iter().find(|c| c.entity == t).copied());
        if target.is_none() {
            ai.target = None;
        }

        if frame.evaluate {
            if ai.brain.state == AiState::Patrol {
                let range = effective_detection_range(frame.difficulty, &ai.config);
                target = contacts
                    .iter()
                    .filter(|c| c.entity != entity && faction.is_hostile_to(c.faction))
                    .map(|c| (horizontal_distance(c.position, body.position), c))
                    .filter(|(d, _)| *d <= range)
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map(|(_, c)| *c);
                ai.target = target.map(|c| c.entity);
            }

            let distance = target.map(|c| horizontal_distance(c.position, body.position));
            let flank_roll = rng.gen::<f32>();
            let evade_roll = rng.gen::<f32>();
            if let Some(t) = ai
                .brain
                .evaluate(distance, health.fraction(), flank_roll, evade_roll, &ai.config)
            {
                log::debug!("{:?}: {} -> {}", entity, t.from.label(), t.to.label());
                events.push(GameEvent::AiStateChanged {
                    entity,
                    from: t.from,
                    to: t.to,
                });
                if t.to == AiState::Patrol {
                    ai.target = None;
                    target = None;
                    ai.waypoint = patrol_waypoint(ai.home, ai.config.patrol_radius, rng.gen(), rng.gen());
                }
            }
        }

        if ai.brain.state == AiState::Patrol
            && horizontal_distance(ai.waypoint, body.position) <= ai.config.waypoint_tolerance
        {
            ai.waypoint = patrol_waypoint(ai.home, ai.config.patrol_radius, rng.gen(), rng.gen());
        }

        let ctx = SteeringContext {
            position: body.position,
            target: target.map(|c| c.position),
            waypoint: ai.waypoint,
            evade_elapsed: ai.brain.evade.map_or(0.0, |t| t.elapsed),
        };
        let (goal, throttle) = steering_goal(ai.brain.state, &ctx, &ai.config);
        let steer = steer_toward(body.forward(), goal - body.position);
        helm.input = ControlInput::new(steer, throttle);

        let (Some(weapon), Some(target)) = (weapon, target) else {
            continue;
        };
        if !ai.brain.state.is_engaged() {
            continue;
        }
        let mount = body.world_point(weapon.mount);
        let aim_point = lead_target(mount, target.position, target.velocity, weapon.config.projectile.speed);
        let current = weapon.aim.unwrap_or(body.rotation);
        weapon.aim = Some(aim_rotation(current, mount, aim_point, ai.config.aim_speed, frame.dt));

        if ai.brain.pull_trigger(rng.gen(), &ai.config) == TriggerPull::Fire {
            weapon.fire_requested = true;
        }
    }
}
