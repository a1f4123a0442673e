//! Capture system - converts a beaten enemy into a friendly vessel.

use broadside_logic::capture::{CaptureConditions, CaptureEvent};
use broadside_logic::config::DifficultyConfig;
use broadside_logic::constants::effects;
use broadside_logic::difficulty::DifficultyDirector;
use broadside_logic::movement::ControlInput;
use broadside_logic::scoring::SessionStats;
use glam::Vec3;
use hecs::{Entity, World};

use crate::components::*;
use crate::events::{EventQueue, GameEvent};

fn to_game_event(entity: Entity, event: CaptureEvent) -> GameEvent {
    match event {
        CaptureEvent::Started => GameEvent::CaptureStarted { entity },
        CaptureEvent::Progressed(progress) => GameEvent::CaptureProgressed { entity, progress },
        CaptureEvent::Paused => GameEvent::CapturePaused { entity },
        CaptureEvent::Resumed => GameEvent::CaptureResumed { entity },
        CaptureEvent::Abandoned => GameEvent::CaptureAbandoned { entity },
        CaptureEvent::Completed => GameEvent::CaptureCompleted { entity },
        CaptureEvent::Failed => GameEvent::CaptureFailed { entity },
    }
}

pub fn capture_system(
    world: &mut World,
    events: &mut EventQueue,
    stats: &mut SessionStats,
    director: &mut DifficultyDirector,
    difficulty: &DifficultyConfig,
    dt: f32,
) {
    let players: Vec<Vec3> = world
        .query::<(&Faction, &RigidBody, &Health)>()
        .iter()
        .filter(|(_, (faction, _, health))| **faction == Faction::Player && !health.dead)
        .map(|(_, (_, body, _))| body.position)
        .collect();

    let mut completed = Vec::new();
    for (entity, (capturable, body, health, faction)) in
        world.query_mut::<(&mut Capturable, &RigidBody, &Health, &Faction)>()
    {
        if !capturable.enabled || health.dead || *faction != Faction::Enemy {
            continue;
        }
        let range = capturable.config.capture_range;
        let conditions = CaptureConditions {
            in_range: players.iter().any(|p| p.distance(body.position) <= range),
            health_fraction: health.fraction(),
        };
        for event in capturable.tracker.update(&conditions, dt, &capturable.config) {
            if event == CaptureEvent::Completed {
                completed.push(entity);
            }
            events.push(to_game_event(entity, event));
        }
    }

    for entity in completed {
        complete_capture(world, entity, events);
        stats.record_captured();
        director.on_enemy_captured(difficulty);
    }
}

/// Hand a captured vessel to the player's side.
fn complete_capture(world: &mut World, entity: Entity, events: &mut EventQueue) {
    if let Ok(mut capturable) = world.get::<&mut Capturable>(entity) {
        capturable.enabled = false;
    }
    if let Ok(mut ai) = world.get::<&mut AiController>(entity) {
        ai.enabled = false;
        ai.target = None;
        ai.brain.reset();
    }
    if let Ok(mut weapon) = world.get::<&mut Weapon>(entity) {
        weapon.fire_requested = false;
        weapon.aim = None;
    }
    if let Ok(mut helm) = world.get::<&mut Helm>(entity) {
        helm.input = ControlInput::idle();
    }
    if let Ok(mut faction) = world.get::<&mut Faction>(entity) {
        *faction = Faction::Friendly;
    }
    if let Ok(mut health) = world.get::<&mut Health>(entity) {
        health.restore_full();
    }
    if world.get::<&PlayerControl>(entity).is_err() {
        if let Err(e) = world.insert_one(entity, PlayerControl { enabled: false }) {
            log::warn!("{:?}: captured vessel cannot be commanded: {}", entity, e);
        }
    }

    let position = world.get::<&RigidBody>(entity).map(|b| b.position).unwrap_or(Vec3::ZERO);
    events.effect(effects::CAPTURE_FLAG, position);

    let name = world
        .get::<&Vessel>(entity)
        .map(|v| v.name.clone())
        .unwrap_or_default();
    log::info!("{} captured", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::VesselBuilder;
    use broadside_logic::ai::Personality;
    use broadside_logic::capture::CaptureState;
    use broadside_logic::config::GameConfig;
    use broadside_logic::health::{DamageInfo, DamageReceiver};
    use broadside_logic::spawn::EnemyArchetype;

    struct Harness {
        world: World,
        events: EventQueue,
        stats: SessionStats,
        director: DifficultyDirector,
        config: GameConfig,
        enemy: Entity,
        player: Entity,
    }

    impl Harness {
        fn new(distance: f32, health_left: f32) -> Self {
            let config = GameConfig::default();
            let mut world = World::new();
            let player = VesselBuilder::sloop("Player", Faction::Player, &config).build(&mut world);
            let enemy = VesselBuilder::enemy(EnemyArchetype::Gunboat, Personality::Balanced, &config)
                .at(Vec3::new(0.0, 0.0, distance))
                .build(&mut world);
            {
                let mut health = world.get::<&mut Health>(enemy).unwrap();
                let max = health.max;
                health.take_damage(&DamageInfo::new(max - health_left));
            }
            Self {
                world,
                events: EventQueue::new(),
                stats: SessionStats::default(),
                director: DifficultyDirector::new(&config.difficulty),
                enemy,
                player,
                config,
            }
        }

        fn tick(&mut self, dt: f32) {
            capture_system(
                &mut self.world,
                &mut self.events,
                &mut self.stats,
                &mut self.director,
                &self.config.difficulty,
                dt,
            );
        }

        fn state(&self) -> CaptureState {
            self.world.get::<&Capturable>(self.enemy).unwrap().tracker.state
        }
    }

    #[test]
    fn test_capture_completes_and_flips_faction() {
        let mut h = Harness::new(10.0, 20.0);
        for _ in 0..11 {
            h.tick(1.0);
        }
        assert_eq!(h.state(), CaptureState::Completed);
        assert_eq!(*h.world.get::<&Faction>(h.enemy).unwrap(), Faction::Friendly);
        assert!(!h.world.get::<&AiController>(h.enemy).unwrap().enabled);
        assert_eq!(h.world.get::<&PlayerControl>(h.enemy).unwrap().enabled, false);
        let health = h.world.get::<&Health>(h.enemy).unwrap();
        assert_eq!(health.current, health.max);
        assert_eq!(h.stats.enemies_captured, 1);
        let completions = h
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::CaptureCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_healthy_enemy_not_capturable() {
        let mut h = Harness::new(10.0, 90.0);
        h.tick(1.0);
        assert_eq!(h.state(), CaptureState::Idle);
    }

    #[test]
    fn test_progress_decays_when_player_leaves() {
        let mut h = Harness::new(10.0, 20.0);
        for _ in 0..5 {
            h.tick(1.0);
        }
        assert_eq!(h.state(), CaptureState::InProgress);
        h.world.get::<&mut RigidBody>(h.player).unwrap().position = Vec3::new(0.0, 0.0, 500.0);
        h.tick(0.2);
        assert_eq!(h.state(), CaptureState::Paused);
        for _ in 0..4 {
            h.tick(1.0);
        }
        assert_eq!(h.state(), CaptureState::Idle);
        assert!(h.events.iter().any(|e| matches!(e, GameEvent::CaptureAbandoned { .. })));
    }
}
