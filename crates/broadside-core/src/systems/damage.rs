//! Damage delivery, death handling and regeneration.

use broadside_logic::config::DifficultyConfig;
use broadside_logic::constants::effects;
use broadside_logic::difficulty::DifficultyDirector;
use broadside_logic::health::{DamageInfo, DamageOutcome, DamageReceiver};
use broadside_logic::movement::ControlInput;
use broadside_logic::scoring::SessionStats;
use broadside_logic::timer::Timer;
use hecs::{Entity, World};

use crate::components::*;
use crate::events::{EventQueue, GameEvent};

/// One hit waiting to be applied to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageRequest {
    pub target: Entity,
    pub info: DamageInfo,
    pub source: Option<Entity>,
}

/// Bookkeeping shared by the damage and death passes.
pub struct DamageContext<'a> {
    pub events: &'a mut EventQueue,
    pub stats: &'a mut SessionStats,
    pub director: &'a mut DifficultyDirector,
    pub difficulty: &'a DifficultyConfig,
}

fn faction_of(world: &World, entity: Option<Entity>) -> Option<Faction> {
    entity.and_then(|e| world.get::<&Faction>(e).ok().map(|f| *f))
}

/// Apply queued hits in order. Returns the entities that died.
pub fn damage_system(world: &mut World, requests: Vec<DamageRequest>, ctx: &mut DamageContext<'_>) -> Vec<Entity> {
    let mut deaths = Vec::new();
    for request in requests {
        if let Some(DamageOutcome::Killed { .. }) = apply_damage(world, &request, ctx) {
            deaths.push(request.target);
        }
    }
    deaths
}

/// Apply a single hit. `None` if the target has no health.
pub fn apply_damage(world: &mut World, request: &DamageRequest, ctx: &mut DamageContext<'_>) -> Option<DamageOutcome> {
    let outcome = {
        let mut health = world.get::<&mut Health>(request.target).ok()?;
        health.take_damage(&request.info)
    };
    let applied = match outcome {
        DamageOutcome::Ignored => return Some(outcome),
        DamageOutcome::Damaged { applied } | DamageOutcome::Killed { applied } => applied,
    };

    ctx.events.push(GameEvent::Damaged {
        entity: request.target,
        amount: applied,
        weak_point: request.info.weak_point,
        source: request.source,
    });

    if let Ok(mut capturable) = world.get::<&mut Capturable>(request.target) {
        let c = &mut *capturable;
        if c.enabled && c.tracker.apply_damage_penalty(&c.config) {
            log::debug!("{:?}: capture progress knocked back to {:.2}", request.target, c.tracker.progress);
        }
    }

    if faction_of(world, request.source) == Some(Faction::Player) {
        ctx.stats.record_hit(applied, request.info.weak_point);
    }
    if faction_of(world, Some(request.target)) == Some(Faction::Player) {
        ctx.stats.record_damage_taken(applied);
        ctx.director.on_player_damaged(applied, ctx.difficulty);
    }

    if let DamageOutcome::Killed { .. } = outcome {
        handle_death(world, request.target, request.source, ctx);
    }
    Some(outcome)
}

/// Everything that happens once, at the moment a vessel dies.
pub fn handle_death(world: &mut World, entity: Entity, killer: Option<Entity>, ctx: &mut DamageContext<'_>) {
    let faction = faction_of(world, Some(entity)).unwrap_or(Faction::Enemy);
    let name = world
        .get::<&Vessel>(entity)
        .map(|v| v.name.clone())
        .unwrap_or_else(|_| format!("{:?}", entity));

    if let Ok(mut ai) = world.get::<&mut AiController>(entity) {
        ai.enabled = false;
        ai.target = None;
        ai.brain.reset();
    }
    if let Ok(mut weapon) = world.get::<&mut Weapon>(entity) {
        weapon.enabled = false;
        weapon.fire_requested = false;
        weapon.state.cancel_reload();
    }
    if let Ok(mut capturable) = world.get::<&mut Capturable>(entity) {
        if capturable.tracker.fail() {
            ctx.events.push(GameEvent::CaptureFailed { entity });
        }
        capturable.enabled = false;
    }
    if let Ok(mut helm) = world.get::<&mut Helm>(entity) {
        helm.input = ControlInput::idle();
    }
    if let Ok(mut control) = world.get::<&mut PlayerControl>(entity) {
        if control.enabled {
            log::info!("{} lost with the player aboard", name);
        }
        control.enabled = false;
    }

    let position = match world.get::<&mut RigidBody>(entity) {
        Ok(mut body) => {
            body.stop();
            Some(body.position)
        }
        Err(_) => None,
    };

    let delay = world
        .get::<&Health>(entity)
        .ok()
        .and_then(|h| h.config.destroy_delay);
    if world
        .insert_one(entity, Wreck {
            despawn: delay.map(Timer::new),
        })
        .is_err()
    {
        return;
    }

    ctx.events.push(GameEvent::Died { entity, faction });
    if let Some(position) = position {
        ctx.events.effect(effects::EXPLOSION, position);
    }
    if faction == Faction::Enemy {
        ctx.events.push(GameEvent::EnemyDestroyed { entity, by: killer });
        ctx.stats.record_destroyed();
        ctx.director.on_enemy_destroyed(ctx.difficulty);
    }
    log::info!("{} destroyed", name);
}

/// Passive regeneration.
pub fn regen_system(world: &mut World, events: &mut EventQueue, dt: f32) {
    for (entity, health) in world.query_mut::<&mut Health>() {
        let healed = health.regenerate(dt);
        if healed > 0.0 {
            events.push(GameEvent::Healed { entity, amount: healed });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::VesselBuilder;
    use broadside_logic::config::GameConfig;

    struct Harness {
        world: World,
        events: EventQueue,
        stats: SessionStats,
        director: DifficultyDirector,
        config: GameConfig,
    }

    impl Harness {
        fn new() -> Self {
            let config = GameConfig::default();
            Self {
                world: World::new(),
                events: EventQueue::new(),
                stats: SessionStats::default(),
                director: DifficultyDirector::new(&config.difficulty),
                config,
            }
        }

        fn hit(&mut self, target: Entity, amount: f32, source: Option<Entity>) -> Vec<Entity> {
            let mut ctx = DamageContext {
                events: &mut self.events,
                stats: &mut self.stats,
                director: &mut self.director,
                difficulty: &self.config.difficulty,
            };
            let request = DamageRequest {
                target,
                info: DamageInfo::new(amount),
                source,
            };
            damage_system(&mut self.world, vec![request], &mut ctx)
        }
    }

    #[test]
    fn test_kill_disables_enemy_and_scores() {
        let mut h = Harness::new();
        let player = VesselBuilder::sloop("Player", Faction::Player, &h.config).build(&mut h.world);
        let enemy = VesselBuilder::enemy(
            broadside_logic::spawn::EnemyArchetype::Gunboat,
            broadside_logic::ai::Personality::Balanced,
            &h.config,
        )
        .build(&mut h.world);

        assert!(h.hit(enemy, 60.0, Some(player)).is_empty());
        let deaths = h.hit(enemy, 60.0, Some(player));
        assert_eq!(deaths, vec![enemy]);

        assert!(!h.world.get::<&AiController>(enemy).unwrap().enabled);
        assert!(!h.world.get::<&Weapon>(enemy).unwrap().enabled);
        assert!(h.world.get::<&Wreck>(enemy).is_ok());
        assert_eq!(h.stats.enemies_destroyed, 1);
        assert_eq!(h.stats.shots_hit, 2);
        assert!(h.events.iter().any(|e| matches!(e, GameEvent::EnemyDestroyed { .. })));

        // Dead stays dead, and a second kill does nothing.
        assert!(h.hit(enemy, 60.0, Some(player)).is_empty());
        assert_eq!(h.stats.enemies_destroyed, 1);
    }

    #[test]
    fn test_player_damage_feeds_director() {
        let mut h = Harness::new();
        let player = VesselBuilder::sloop("Player", Faction::Player, &h.config).build(&mut h.world);
        let before = h.director.level;
        h.hit(player, 20.0, None);
        assert_eq!(h.stats.damage_taken, 20.0);
        assert!(h.director.level <= before);
    }

    #[test]
    fn test_regen_emits_heal() {
        let mut h = Harness::new();
        let mut config = h.config.health.clone();
        config.regen_enabled = true;
        config.regen_delay = 0.0;
        let e = VesselBuilder::new("Regen", Faction::Player)
            .health(config)
            .build(&mut h.world);
        h.hit(e, 10.0, None);
        regen_system(&mut h.world, &mut h.events, 1.0);
        assert!(h.events.iter().any(|ev| matches!(ev, GameEvent::Healed { .. })));
    }
}
