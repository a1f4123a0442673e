//! Weapon and projectile systems.
//!
//! Weapons consume trigger requests, spawn pooled projectiles and kick the
//! firing hull with recoil. Projectiles sweep their path each tick against
//! hull and weak-point spheres; the earliest contact wins and becomes a
//! damage request for the damage pass. Shells that drop under the waves
//! splash and are retired.

use broadside_logic::ballistics::{segment_sphere, ProjectileBody};
use broadside_logic::config::ProjectileConfig;
use broadside_logic::constants::{effects, layers};
use broadside_logic::health::DamageInfo;
use broadside_logic::scoring::SessionStats;
use glam::{Quat, Vec3};
use hecs::{Entity, World};

use super::{DamageRequest, Ocean};
use crate::components::*;
use crate::events::{EventQueue, GameEvent};
use crate::pool::{ObjectPool, PoolHandle, PoolTag};

struct Shot {
    owner: Entity,
    origin: Vec3,
    direction: Vec3,
    config: ProjectileConfig,
    by_player: bool,
}

/// Advance reloads and resolve trigger pulls.
pub fn weapon_system(
    world: &mut World,
    pool: &mut ObjectPool,
    events: &mut EventQueue,
    stats: &mut SessionStats,
    now: f64,
    dt: f32,
) {
    let mut headroom = pool.headroom(PoolTag::Projectile);
    let mut shots = Vec::new();

    for (entity, (weapon, body, health, faction)) in
        world.query_mut::<(&mut Weapon, Option<&mut RigidBody>, &Health, &Faction)>()
    {
        if weapon.state.tick(dt, &weapon.config) {
            events.push(GameEvent::ReloadFinished { entity });
        }
        if !std::mem::take(&mut weapon.fire_requested) {
            continue;
        }
        if health.dead || !weapon.enabled {
            continue;
        }
        if headroom == 0 {
            log::debug!("{:?}: projectile pool exhausted, shot skipped", entity);
            continue;
        }

        let was_reloading = weapon.state.is_reloading();
        let outcome = weapon.state.try_fire(now, &weapon.config);
        if !was_reloading && weapon.state.is_reloading() {
            events.push(GameEvent::ReloadStarted { entity });
        }
        if !outcome.fired() {
            log::debug!("{:?}: did not fire ({:?})", entity, outcome);
            continue;
        }
        headroom = headroom.saturating_sub(1);

        let (origin, direction) = match body.as_deref() {
            Some(b) => (b.world_point(weapon.mount), weapon.direction(b.rotation)),
            None => (weapon.mount, weapon.direction(Quat::IDENTITY)),
        };
        match body {
            Some(b) => b.add_impulse_at_position(-direction * weapon.config.recoil_impulse, origin),
            None if weapon.recoil_enabled => {
                log::error!("{:?}: weapon on a vessel with no rigid body; recoil disabled", entity);
                weapon.recoil_enabled = false;
            }
            None => {}
        }

        shots.push(Shot {
            owner: entity,
            origin,
            direction,
            config: weapon.config.projectile.clone(),
            by_player: *faction == Faction::Player,
        });
    }

    for shot in shots {
        let handle = match pool.acquire(PoolTag::Projectile) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("{:?}: {}", shot.owner, e);
                continue;
            }
        };
        world.spawn((Projectile {
            body: ProjectileBody::launch(shot.origin, shot.direction, &shot.config),
            owner: shot.owner,
            handle,
        },));
        events.push(GameEvent::Fired {
            shooter: shot.owner,
            position: shot.origin,
        });
        events.effect(effects::MUZZLE_FLASH, shot.origin);
        if shot.by_player {
            stats.record_shot();
        }
    }
}

struct Target {
    entity: Entity,
    center: Vec3,
    radius: f32,
    weak: Vec<(Vec3, f32)>,
}

/// Earliest contact along `from..to`, skipping the shooter.
fn first_contact(targets: &[Target], owner: Entity, from: Vec3, to: Vec3, padding: f32) -> Option<(Entity, f32, u8)> {
    let mut best: Option<(Entity, f32, u8)> = None;
    let mut consider = |entity: Entity, t: f32, layer: u8| {
        let better = match best {
            None => true,
            Some((_, bt, bl)) => t < bt || (t == bt && layer == layers::WEAK_POINT && bl != layers::WEAK_POINT),
        };
        if better {
            best = Some((entity, t, layer));
        }
    };
    for target in targets.iter().filter(|t| t.entity != owner) {
        for (center, radius) in &target.weak {
            if let Some(t) = segment_sphere(from, to, *center, radius + padding) {
                consider(target.entity, t, layers::WEAK_POINT);
            }
        }
        if let Some(t) = segment_sphere(from, to, target.center, target.radius + padding) {
            consider(target.entity, t, layers::HULL);
        }
    }
    best
}

/// Fly projectiles, resolve first hits, retire spent shells.
///
/// Returns the damage requests raised this tick.
pub fn projectile_system(
    world: &mut World,
    ocean: &mut Ocean,
    pool: &mut ObjectPool,
    events: &mut EventQueue,
    gravity: f32,
    dt: f32,
) -> Vec<DamageRequest> {
    let targets: Vec<Target> = world
        .query::<(&RigidBody, &Collider, Option<&WeakPoints>)>()
        .iter()
        .map(|(entity, (body, collider, weak))| Target {
            entity,
            center: body.position,
            radius: collider.radius,
            weak: weak
                .map(|w| {
                    w.spheres
                        .iter()
                        .map(|s| (body.world_point(s.offset), s.radius))
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();

    let mut requests = Vec::new();
    let mut impulses = Vec::new();
    let mut retired: Vec<(Entity, PoolHandle)> = Vec::new();

    for (entity, projectile) in world.query_mut::<&mut Projectile>() {
        if projectile.body.resolved {
            retired.push((entity, projectile.handle));
            continue;
        }
        let (from, to) = projectile.body.step(dt, gravity);

        if let Some((target, t, layer)) = first_contact(&targets, projectile.owner, from, to, projectile.body.radius) {
            if projectile.body.claim_hit() {
                let point = from.lerp(to, t);
                let (amount, weak_point) = projectile.body.damage_against(layer);
                requests.push(DamageRequest {
                    target,
                    source: Some(projectile.owner),
                    info: DamageInfo {
                        amount,
                        point,
                        direction: projectile.body.velocity.normalize_or_zero(),
                        weak_point,
                        source: Some(projectile.owner.to_bits().get()),
                    },
                });
                impulses.push((target, projectile.body.impulse(), point));
                events.effect(
                    if weak_point {
                        effects::WEAK_POINT_BURST
                    } else {
                        effects::HIT_SPARKS
                    },
                    point,
                );
            }
            retired.push((entity, projectile.handle));
        } else if to.y < ocean.height(to.x, to.z) {
            events.effect(effects::SPLASH, to);
            retired.push((entity, projectile.handle));
        } else if projectile.body.expired() {
            retired.push((entity, projectile.handle));
        }
    }

    for (target, impulse, point) in impulses {
        if let Ok(mut body) = world.get::<&mut RigidBody>(target) {
            body.add_impulse_at_position(impulse, point);
        }
    }

    for (entity, handle) in retired {
        let _ = world.despawn(entity);
        if let Err(e) = pool.release(handle) {
            log::warn!("retiring projectile {:?}: {}", entity, e);
        }
    }

    requests
}
