//! Grapple hooks: flight, attach or miss, and link supervision.

use broadside_logic::constants::effects;
use broadside_logic::grapple::{Grapple, GrapplePhase};
use glam::{Quat, Vec3};
use hecs::{Entity, World};

use crate::components::*;
use crate::events::{EventQueue, GameEvent, ReleaseReason};

#[derive(Debug, Clone, Copy)]
struct Hull {
    entity: Entity,
    position: Vec3,
    rotation: Quat,
    radius: f32,
}

fn anchor_world(hull: &Hull, anchor: Vec3) -> Vec3 {
    hull.position + hull.rotation * anchor
}

/// Advance every launcher. Returns launchers whose link ended this tick.
pub fn grapple_system(world: &mut World, events: &mut EventQueue, dt: f32) -> Vec<Entity> {
    let hulls: Vec<Hull> = world
        .query::<(&RigidBody, &Collider, &Health)>()
        .iter()
        .filter(|(_, (_, _, health))| !health.dead)
        .map(|(entity, (body, collider, _))| Hull {
            entity,
            position: body.position,
            rotation: body.rotation,
            radius: collider.radius,
        })
        .collect();

    let mut released = Vec::new();
    for (entity, (launcher, body, health)) in
        world.query_mut::<(&mut GrappleLauncher, Option<&RigidBody>, &Health)>()
    {
        let origin = body.map(|b| b.world_point(launcher.config.launch_offset));

        if health.dead {
            if launcher.release() {
                events.push(GameEvent::GrappleReleased {
                    launcher: entity,
                    reason: ReleaseReason::Detached,
                });
                released.push(entity);
            }
            continue;
        }

        if let Some(arrival) = launcher.grapple.tick(dt) {
            let reach = launcher.config.hit_radius;
            let hit = hulls
                .iter()
                .filter(|h| h.entity != entity)
                .map(|h| (h.position.distance(arrival), h))
                .filter(|(d, h)| *d <= h.radius + reach)
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, h)| *h);
            match hit {
                Some(hull) => {
                    let from = origin.unwrap_or(arrival);
                    launcher.grapple.attach(from.distance(arrival), &launcher.config);
                    launcher.target = Some(hull.entity);
                    launcher.anchor = hull.rotation.inverse() * (arrival - hull.position);
                    launcher
                        .rope
                        .set_straight(from, arrival, launcher.config.rope_segments);
                    events.push(GameEvent::GrappleAttached {
                        launcher: entity,
                        target: hull.entity,
                    });
                    events.effect(effects::GRAPPLE_IMPACT, arrival);
                    log::debug!("{:?}: grapple attached to {:?}", entity, hull.entity);
                }
                None => {
                    launcher.grapple.miss(&launcher.config);
                    events.push(GameEvent::GrappleMissed { launcher: entity });
                }
            }
            continue;
        }

        if launcher.grapple.phase() != GrapplePhase::Attached {
            continue;
        }
        let hull = launcher
            .target
            .and_then(|t| hulls.iter().find(|h| h.entity == t));
        let reason = match (hull, origin) {
            (None, _) => Some(ReleaseReason::TargetLost),
            (Some(hull), Some(origin)) => {
                let distance = origin.distance(anchor_world(hull, launcher.anchor));
                Grapple::should_break(distance, &launcher.config).then_some(ReleaseReason::Snapped)
            }
            (Some(_), None) => None,
        };
        if let Some(reason) = reason {
            launcher.release();
            events.push(GameEvent::GrappleReleased {
                launcher: entity,
                reason,
            });
            released.push(entity);
        }
    }
    released
}

/// World-space ends of an attached rope: launcher offset and target anchor.
pub fn rope_ends(world: &World, launcher: Entity) -> Option<(Vec3, Vec3)> {
    let gear = world.get::<&GrappleLauncher>(launcher).ok()?;
    let target = gear.target?;
    let start = world
        .get::<&RigidBody>(launcher)
        .ok()?
        .world_point(gear.config.launch_offset);
    let end = world.get::<&RigidBody>(target).ok()?.world_point(gear.anchor);
    Some((start, end))
}
