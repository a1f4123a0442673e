//! Wreck removal, pooled effects and the enemy spawner.

use broadside_logic::ai::Personality;
use broadside_logic::config::{GameConfig, PoolConfig};
use broadside_logic::spawn::ring_position;
use broadside_logic::timer::Timer;
use glam::{Quat, Vec3};
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::Rng;

use crate::builder::VesselBuilder;
use crate::components::*;
use crate::events::{EventQueue, GameEvent};
use crate::pool::{ObjectPool, PoolHandle, PoolTag};

fn release_logged(pool: &mut ObjectPool, entity: Entity, handle: PoolHandle) {
    if let Err(e) = pool.release(handle) {
        log::warn!("{:?}: {}", entity, e);
    }
}

/// Count down wreck timers and remove sunk vessels.
pub fn wreck_system(world: &mut World, pool: &mut ObjectPool, dt: f32) -> Vec<Entity> {
    let sunk: Vec<(Entity, Option<Pooled>)> = world
        .query_mut::<(&mut Wreck, Option<&Pooled>)>()
        .into_iter()
        .filter_map(|(entity, (wreck, pooled))| {
            let timer = wreck.despawn.as_mut()?;
            timer.tick(dt).then_some((entity, pooled.copied()))
        })
        .collect();

    for (entity, pooled) in &sunk {
        let _ = world.despawn(*entity);
        if let Some(Pooled(handle)) = pooled {
            release_logged(pool, *entity, *handle);
        }
    }
    sunk.into_iter().map(|(e, _)| e).collect()
}

/// Start one pooled effect that lives for `lifetime` seconds. `None` when
/// the effect pool is exhausted.
pub fn spawn_effect(
    world: &mut World,
    pool: &mut ObjectPool,
    events: &mut EventQueue,
    name: &'static str,
    position: Vec3,
    lifetime: f32,
) -> Option<Entity> {
    let handle = match pool.acquire(PoolTag::Effect) {
        Ok(h) => h,
        Err(_) => {
            log::debug!("effect pool exhausted, dropping {}", name);
            return None;
        }
    };
    let entity = world.spawn((Effect {
        name,
        position,
        life: Timer::new(lifetime),
        handle,
    },));
    events.push(GameEvent::Effect { name, position });
    Some(entity)
}

/// Stop a live effect and return its slot. False if it is already gone.
pub fn stop_effect(world: &mut World, pool: &mut ObjectPool, events: &mut EventQueue, entity: Entity) -> bool {
    let (name, handle) = match world.get::<&Effect>(entity) {
        Ok(effect) => (effect.name, effect.handle),
        Err(_) => return false,
    };
    if world.despawn(entity).is_err() {
        return false;
    }
    release_logged(pool, entity, handle);
    events.push(GameEvent::EffectStopped { name });
    true
}

/// Expire finished effects.
pub fn effect_system(world: &mut World, pool: &mut ObjectPool, events: &mut EventQueue, dt: f32) {
    let done: Vec<Entity> = world
        .query_mut::<&mut Effect>()
        .into_iter()
        .filter_map(|(entity, effect)| effect.life.tick(dt).then_some(entity))
        .collect();
    for entity in done {
        stop_effect(world, pool, events, entity);
    }
}

/// Turn this tick's effect requests into pooled effect entities. Requests
/// beyond the pool's capacity are dropped.
pub fn flush_effects(world: &mut World, pool: &mut ObjectPool, events: &mut EventQueue, config: &PoolConfig) {
    for request in events.take_effects() {
        spawn_effect(world, pool, events, request.name, request.position, config.effect_lifetime);
    }
}

/// Periodic enemy spawner.
pub struct Spawner {
    pub timer: Timer,
}

impl Spawner {
    pub fn new(interval: f32) -> Self {
        Self {
            timer: Timer::new(interval),
        }
    }

    pub fn tick(
        &mut self,
        world: &mut World,
        pool: &mut ObjectPool,
        rng: &mut StdRng,
        events: &mut EventQueue,
        around: Option<Vec3>,
        config: &GameConfig,
        dt: f32,
    ) -> Option<Entity> {
        let settings = &config.spawner;
        if !settings.enabled || !self.timer.tick(dt) {
            return None;
        }
        self.timer.reset();

        let alive = world
            .query::<(&Faction, &Health, &Vessel)>()
            .iter()
            .filter(|(_, (faction, health, _))| **faction == Faction::Enemy && !health.dead)
            .count();
        if alive >= settings.max_alive {
            return None;
        }
        let handle = match pool.acquire(PoolTag::Enemy) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("spawner: {}", e);
                return None;
            }
        };

        let Some(archetype) = settings.weights.pick(rng.gen()) else {
            log::warn!("spawner: archetype weights sum to zero");
            if let Err(e) = pool.release(handle) {
                log::warn!("spawner: {}", e);
            }
            return None;
        };
        let center = around.unwrap_or(Vec3::ZERO);
        let position = ring_position(center, settings.min_radius, settings.max_radius, rng.gen(), rng.gen());
        let facing = Vec3::new(center.x - position.x, 0.0, center.z - position.z).normalize_or_zero();
        let rotation = if facing == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(Vec3::Z, facing)
        };
        let personality = Personality::ALL[rng.gen_range(0..Personality::ALL.len())];

        let entity = VesselBuilder::enemy(archetype, personality, config)
            .pose(position, rotation)
            .build(world);
        if let Err(e) = world.insert_one(entity, Pooled(handle)) {
            log::warn!("spawner: {:?} lost before tagging: {}", entity, e);
            release_logged(pool, entity, handle);
            return None;
        }
        events.push(GameEvent::EnemySpawned { entity, archetype });
        log::info!("spawned {} ({:?}) at {:.0},{:.0}", archetype.name(), personality, position.x, position.z);
        Some(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_logic::constants::effects;
    use rand::SeedableRng;

    #[test]
    fn test_wreck_despawns_after_delay() {
        let mut world = World::new();
        let mut pool = ObjectPool::new(&PoolConfig::default());
        let handle = pool.acquire(PoolTag::Enemy).unwrap();
        let e = world.spawn((
            Wreck {
                despawn: Some(Timer::new(1.0)),
            },
            Pooled(handle),
        ));
        let kept = world.spawn((Wreck { despawn: None },));
        assert!(wreck_system(&mut world, &mut pool, 0.5).is_empty());
        assert_eq!(wreck_system(&mut world, &mut pool, 0.6), vec![e]);
        assert!(!world.contains(e));
        assert!(world.contains(kept));
        assert_eq!(pool.in_use(PoolTag::Enemy), 0);
    }

    #[test]
    fn test_effects_pooled_and_expire() {
        let mut world = World::new();
        let config = PoolConfig {
            effect_capacity: 1,
            ..PoolConfig::default()
        };
        let mut pool = ObjectPool::new(&config);
        let mut events = EventQueue::new();
        events.effect(effects::SPLASH, Vec3::ZERO);
        events.effect(effects::EXPLOSION, Vec3::ZERO);
        flush_effects(&mut world, &mut pool, &mut events, &config);
        assert_eq!(world.query::<&Effect>().iter().count(), 1);

        effect_system(&mut world, &mut pool, &mut events, config.effect_lifetime + 0.1);
        assert_eq!(world.query::<&Effect>().iter().count(), 0);
        assert_eq!(pool.in_use(PoolTag::Effect), 0);
    }

    #[test]
    fn test_stop_effect_returns_slot_once() {
        let mut world = World::new();
        let config = PoolConfig::default();
        let mut pool = ObjectPool::new(&config);
        let mut events = EventQueue::new();
        let e = spawn_effect(&mut world, &mut pool, &mut events, effects::SPLASH, Vec3::ZERO, 10.0).unwrap();
        assert_eq!(pool.in_use(PoolTag::Effect), 1);

        assert!(stop_effect(&mut world, &mut pool, &mut events, e));
        assert!(!stop_effect(&mut world, &mut pool, &mut events, e));
        assert_eq!(pool.in_use(PoolTag::Effect), 0);
        let stopped = events
            .iter()
            .filter(|ev| matches!(ev, GameEvent::EffectStopped { name } if *name == effects::SPLASH))
            .count();
        assert_eq!(stopped, 1);

        // Already expired: nothing left to stop.
        let e = spawn_effect(&mut world, &mut pool, &mut events, effects::SPLASH, Vec3::ZERO, 0.1).unwrap();
        effect_system(&mut world, &mut pool, &mut events, 0.2);
        assert!(!stop_effect(&mut world, &mut pool, &mut events, e));
        assert_eq!(pool.in_use(PoolTag::Effect), 0);
    }

    #[test]
    fn test_spawner_zero_weights_returns_slot() {
        let mut config = GameConfig::default();
        config.spawner.enabled = true;
        config.spawner.interval = 1.0;
        config.spawner.weights = broadside_logic::spawn::ArchetypeWeights {
            skiff: 0.0,
            gunboat: 0.0,
            frigate: 0.0,
        };
        let mut world = World::new();
        let mut pool = ObjectPool::new(&config.pools);
        let mut rng = StdRng::seed_from_u64(7);
        let mut events = EventQueue::new();
        let mut spawner = Spawner::new(config.spawner.interval);
        assert!(spawner
            .tick(&mut world, &mut pool, &mut rng, &mut events, None, &config, 1.0)
            .is_none());
        assert_eq!(pool.in_use(PoolTag::Enemy), 0);
    }

    #[test]
    fn test_spawner_respects_cap() {
        let mut config = GameConfig::default();
        config.spawner.enabled = true;
        config.spawner.interval = 1.0;
        config.spawner.max_alive = 2;
        let mut world = World::new();
        let mut pool = ObjectPool::new(&config.pools);
        let mut rng = StdRng::seed_from_u64(7);
        let mut events = EventQueue::new();
        let mut spawner = Spawner::new(config.spawner.interval);

        let mut spawned = Vec::new();
        for _ in 0..10 {
            spawned.extend(spawner.tick(&mut world, &mut pool, &mut rng, &mut events, None, &config, 1.0));
        }
        assert_eq!(spawned.len(), 2);
        for e in spawned {
            let pos = world.get::<&RigidBody>(e).unwrap().position;
            let r = Vec3::new(pos.x, 0.0, pos.z).length();
            assert!(r >= config.spawner.min_radius - 1e-3 && r <= config.spawner.max_radius + 1e-3);
            assert!(world.get::<&AiController>(e).is_ok());
        }
    }
}
