//! Integration tests for the engine, driven through its public API.
//!
//! Exercises: weapons → projectiles → damage → AI → capture → grapple
//! → zipline boarding, on a flat sea so outcomes are exact.

use broadside_core::pool::{ObjectPool, PoolError, PoolTag};
use broadside_core::prelude::*;
use broadside_logic::ai::{AiState, Personality};
use broadside_logic::capture::CaptureState;
use broadside_logic::config::{PoolConfig, ProjectileConfig, WeaponConfig};
use broadside_logic::constants::effects;
use broadside_logic::grapple::GrapplePhase;
use broadside_logic::health::{DamageInfo, DamageOutcome};
use glam::Vec3;
use hecs::Entity;

// ── Helpers ────────────────────────────────────────────────────────────

fn calm_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.wave.base_height = 0.0;
    config.ai.evasion_chance = 0.0;
    config
}

fn engine_with(config: GameConfig) -> SimulationEngine {
    SimulationEngine::new(config).unwrap()
}

fn run(engine: &mut SimulationEngine, ticks: usize) {
    for _ in 0..ticks {
        engine.step();
    }
}

fn position(engine: &SimulationEngine, e: Entity) -> Vec3 {
    engine.world.get::<&RigidBody>(e).unwrap().position
}

fn damaged_events(events: &[GameEvent], target: Entity) -> Vec<(f32, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Damaged {
                entity,
                amount,
                weak_point,
                ..
            } if *entity == target => Some((*amount, *weak_point)),
            _ => None,
        })
        .collect()
}

// ── Weapons ────────────────────────────────────────────────────────────

#[test]
fn ten_shots_then_reload_refills() {
    let config = calm_config();
    let mut engine = engine_with(config.clone());
    let weapon = WeaponConfig {
        fire_rate: 2.0,
        max_ammo: 10,
        reload_time: 3.0,
        ..config.weapon.clone()
    };
    let gun = engine.spawn_vessel(
        VesselBuilder::new("Gun", Faction::Player).weapon(weapon, Vec3::new(0.0, 1.0, 3.0)),
    );

    // Attempts spaced just over 0.5s apart.
    for shot in 1..=10 {
        engine.request_fire(gun).unwrap();
        run(&mut engine, 26);
        assert_eq!(engine.stats().shots_fired, shot);
    }
    let status = engine.vessel_status(gun).unwrap();
    assert_eq!(status.ammo, Some(0));
    assert!(status.reloading);

    // Eleventh attempt is blocked by the reload.
    engine.request_fire(gun).unwrap();
    run(&mut engine, 1);
    assert_eq!(engine.stats().shots_fired, 10);

    run(&mut engine, 160);
    let status = engine.vessel_status(gun).unwrap();
    assert!(!status.reloading);
    assert_eq!(status.ammo, Some(10));
    assert!(engine
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::ReloadFinished { entity } if *entity == gun)));
}

#[test]
fn weak_point_hit_deals_62_5_once() {
    let config = calm_config();
    let mut engine = engine_with(config.clone());
    let weapon = WeaponConfig {
        projectile: ProjectileConfig {
            damage: 25.0,
            weak_point_multiplier: 2.5,
            gravity_scale: 0.0,
            ..ProjectileConfig::default()
        },
        ..config.weapon.clone()
    };
    let shooter = engine.spawn_vessel(
        VesselBuilder::new("Shooter", Faction::Player).weapon(weapon, Vec3::new(0.0, 1.0, 3.0)),
    );
    let target = engine.spawn_vessel(
        VesselBuilder::new("Target", Faction::Enemy)
            .at(Vec3::new(0.0, 0.0, 30.0))
            .hull_radius(0.5)
            .weak_point(Vec3::new(0.0, 1.0, 0.0), 2.5),
    );

    engine.request_fire(shooter).unwrap();
    run(&mut engine, 100);

    let events = engine.drain_events();
    assert_eq!(damaged_events(&events, target), vec![(62.5, true)]);
    assert_eq!(engine.vessel_status(target).unwrap().health_percentage, 37.5);
    assert_eq!(engine.stats().weak_point_hits, 1);
    assert_eq!(engine.projectile_count(), 0);
}

// ── AI ─────────────────────────────────────────────────────────────────

#[test]
fn enemy_detects_at_35_and_attacks_inside_30() {
    let config = calm_config();
    let mut engine = engine_with(config.clone());
    let player = engine.spawn_vessel(
        VesselBuilder::sloop("Player", Faction::Player, &config).at(Vec3::new(0.0, 0.0, 35.0)),
    );
    let enemy = engine.spawn_vessel(
        VesselBuilder::gunboat("Raider", Faction::Enemy, &config).ai(Personality::Aggressive, config.ai.clone()),
    );
    engine.set_player(player).unwrap();

    engine.step();
    assert_eq!(engine.vessel_status(enemy).unwrap().ai_state, Some(AiState::Pursue));

    let mut attacked_at = None;
    for _ in 0..500 {
        engine.step();
        if engine.vessel_status(enemy).unwrap().ai_state == Some(AiState::Attack) {
            attacked_at = Some(position(&engine, enemy).distance(position(&engine, player)));
            break;
        }
    }
    let distance = attacked_at.expect("enemy never attacked");
    assert!(distance <= 30.0 + 1.0, "attacked from {}", distance);

    let changes: Vec<_> = engine
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::AiStateChanged { entity, from, to } if entity == enemy => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(changes[0], (AiState::Patrol, AiState::Pursue));
    assert_eq!(changes[1], (AiState::Pursue, AiState::Attack));
}

#[test]
fn same_seed_same_outcome() {
    let trace = || {
        let mut config = GameConfig::default();
        config.spawner.enabled = true;
        config.spawner.interval = 1.0;
        let mut engine = engine_with(config.clone());
        let player = engine.spawn_vessel(VesselBuilder::sloop("Player", Faction::Player, &config));
        engine.set_player(player).unwrap();
        run(&mut engine, 500);
        engine
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::EnemySpawned { .. } | GameEvent::AiStateChanged { .. }))
            .collect::<Vec<_>>()
    };
    let a = trace();
    assert!(!a.is_empty());
    assert_eq!(a, trace());
}

// ── Capture ────────────────────────────────────────────────────────────

#[test]
fn capture_decays_back_to_idle() {
    let config = calm_config();
    let mut engine = engine_with(config.clone());
    let player = engine.spawn_vessel(VesselBuilder::sloop("Player", Faction::Player, &config));
    let prize = engine.spawn_vessel(
        VesselBuilder::new("Prize", Faction::Enemy)
            .at(Vec3::new(0.0, 0.0, 10.0))
            .capturable(config.capture.clone()),
    );
    engine.apply_damage(prize, DamageInfo::new(80.0), None).unwrap();

    let mut last = 0.0;
    for _ in 0..200 {
        engine.step();
        let status = engine.vessel_status(prize).unwrap();
        assert_eq!(status.capture_state, Some(CaptureState::InProgress));
        assert!(status.capture_progress >= last);
        last = status.capture_progress;
    }
    assert!((last - 0.4).abs() < 0.01, "progress {}", last);

    engine.world.get::<&mut RigidBody>(player).unwrap().position.x = 500.0;
    for _ in 0..150 {
        engine.step();
        let status = engine.vessel_status(prize).unwrap();
        if status.capture_state == Some(CaptureState::Paused) {
            assert!(status.capture_progress <= last);
        }
        last = status.capture_progress;
    }
    let status = engine.vessel_status(prize).unwrap();
    assert_eq!(status.capture_state, Some(CaptureState::Idle));
    assert_eq!(status.capture_progress, 0.0);
}

#[test]
fn capture_completes_into_friendly() {
    let config = calm_config();
    let mut engine = engine_with(config.clone());
    let player = engine.spawn_vessel(VesselBuilder::sloop("Player", Faction::Player, &config));
    let prize = engine.spawn_vessel(
        VesselBuilder::new("Prize", Faction::Enemy)
            .at(Vec3::new(0.0, 0.0, 10.0))
            .capturable(config.capture.clone()),
    );
    engine.set_player(player).unwrap();
    engine.apply_damage(prize, DamageInfo::new(80.0), None).unwrap();
    run(&mut engine, 520);

    let status = engine.vessel_status(prize).unwrap();
    assert_eq!(status.capture_state, Some(CaptureState::Completed));
    assert_eq!(status.faction, Faction::Friendly);
    assert_eq!(status.health_percentage, 100.0);
    assert_eq!(engine.stats().enemies_captured, 1);
    assert_eq!(engine.enemy_count(), 0);
}

#[test]
fn death_fails_capture_in_progress() {
    let config = calm_config();
    let mut engine = engine_with(config.clone());
    engine.spawn_vessel(VesselBuilder::sloop("Player", Faction::Player, &config));
    let prize = engine.spawn_vessel(
        VesselBuilder::new("Prize", Faction::Enemy)
            .at(Vec3::new(0.0, 0.0, 10.0))
            .capturable(config.capture.clone()),
    );
    engine.apply_damage(prize, DamageInfo::new(80.0), None).unwrap();
    run(&mut engine, 50);
    let outcome = engine.apply_damage(prize, DamageInfo::new(50.0), None).unwrap();
    assert!(matches!(outcome, DamageOutcome::Killed { .. }));

    let status = engine.vessel_status(prize).unwrap();
    assert_eq!(status.capture_state, Some(CaptureState::Failed));
    assert!(!status.alive);
    assert_eq!(engine.stats().enemies_destroyed, 1);
}

// ── Health ─────────────────────────────────────────────────────────────

#[test]
fn health_stays_in_bounds() {
    let config = calm_config();
    let mut engine = engine_with(config.clone());
    let hull = engine.spawn_vessel(VesselBuilder::new("Hull", Faction::Player));

    engine.apply_damage(hull, DamageInfo::new(30.0), None).unwrap();
    assert_eq!(engine.heal(hull, 500.0).unwrap(), 30.0);
    assert_eq!(engine.vessel_status(hull).unwrap().health_percentage, 100.0);

    let outcome = engine.apply_damage(hull, DamageInfo::new(1_000.0), None).unwrap();
    assert_eq!(outcome, DamageOutcome::Killed { applied: 100.0 });
    assert_eq!(engine.heal(hull, 50.0).unwrap(), 0.0);
    assert_eq!(
        engine.apply_damage(hull, DamageInfo::new(10.0), None).unwrap(),
        DamageOutcome::Ignored
    );
    let deaths = engine
        .drain_events()
        .iter()
        .filter(|e| matches!(e, GameEvent::Died { .. }))
        .count();
    assert_eq!(deaths, 1);
}

#[test]
fn wreck_sinks_after_delay() {
    let config = calm_config();
    let mut engine = engine_with(config.clone());
    let hull = engine.spawn_vessel(VesselBuilder::new("Hull", Faction::Enemy));
    engine.apply_damage(hull, DamageInfo::new(1_000.0), None).unwrap();
    run(&mut engine, 160);
    assert!(!engine.world.contains(hull));
    assert_eq!(engine.vessel_count(), 0);
}

// ── Movement ───────────────────────────────────────────────────────────

#[test]
fn momentum_decays_without_throttle() {
    let config = calm_config();
    let mut engine = engine_with(config.clone());
    let boat = engine.spawn_vessel(VesselBuilder::sloop("Boat", Faction::Player, &config));
    engine.set_player(boat).unwrap();
    run(&mut engine, 250);

    engine.set_control(ControlInput::new(0.0, 1.0)).unwrap();
    run(&mut engine, 100);
    engine.set_control(ControlInput::idle()).unwrap();

    let mut last = engine.world.get::<&RigidBody>(boat).unwrap().horizontal_speed();
    assert!(last > 1.0);
    for _ in 0..200 {
        engine.step();
        let speed = engine.world.get::<&RigidBody>(boat).unwrap().horizontal_speed();
        assert!(speed <= last + 1e-4, "{} > {}", speed, last);
        last = speed;
    }
    assert!(last < 0.5);
}

// ── Grapple and boarding ───────────────────────────────────────────────

fn grappled() -> (SimulationEngine, Entity, Entity) {
    let config = calm_config();
    let mut engine = engine_with(config.clone());
    let player = engine.spawn_vessel(
        VesselBuilder::sloop("Player", Faction::Player, &config).grapple(config.grapple.clone()),
    );
    let prize = engine.spawn_vessel(VesselBuilder::new("Prize", Faction::Enemy).at(Vec3::new(0.0, 0.0, 20.0)));
    engine.set_player(player).unwrap();
    let aim = position(&engine, prize) + Vec3::new(0.0, 1.0, -2.0);
    engine.launch_grapple(player, aim).unwrap();
    run(&mut engine, 50);
    assert_eq!(engine.vessel_status(player).unwrap().grapple, Some(GrapplePhase::Attached));
    (engine, player, prize)
}

#[test]
fn grapple_attach_detach_round_trip() {
    let (mut engine, player, _) = grappled();
    assert!(engine.release_grapple(player).unwrap());
    assert!(!engine.release_grapple(player).unwrap());

    let gear = engine.world.get::<&GrappleLauncher>(player).unwrap();
    assert_eq!(gear.grapple.phase(), GrapplePhase::Idle);
    assert!(gear.grapple.link().is_none());
    assert_eq!(
        gear.grapple.constraint_force(Vec3::ZERO, Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO),
        Vec3::ZERO
    );
}

#[test]
fn zipline_boards_prize() {
    let (mut engine, player, prize) = grappled();
    engine.start_zipline().unwrap();
    assert!(matches!(
        engine.start_zipline(),
        Err(EngineError::Zipline(_))
    ));
    run(&mut engine, 300);

    assert_eq!(engine.player(), Some(prize));
    assert_eq!(engine.vessel_status(prize).unwrap().faction, Faction::Player);
    assert_eq!(engine.vessel_status(player).unwrap().grapple, Some(GrapplePhase::Idle));
    assert_eq!(engine.stats().vessels_boarded, 1);
    assert_eq!(transit_effects_alive(&engine), 0);
    let events = engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::ControlTransferred { from, to } if *from == player && *to == prize)));
    assert_eq!(stopped(&events, effects::ZIPLINE_WIND), 1);
    assert_eq!(stopped(&events, effects::ZIPLINE_SPARKS), 1);
}

fn transit_effects_alive(engine: &SimulationEngine) -> usize {
    engine
        .world
        .query::<&Effect>()
        .iter()
        .filter(|(_, e)| e.name == effects::ZIPLINE_WIND || e.name == effects::ZIPLINE_SPARKS)
        .count()
}

fn stopped(events: &[GameEvent], effect: &str) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, GameEvent::EffectStopped { name } if *name == effect))
        .count()
}

#[test]
fn zipline_cancel_restores_control() {
    let (mut engine, player, _) = grappled();
    engine.drain_events();
    engine.start_zipline().unwrap();
    run(&mut engine, 10);
    assert_eq!(transit_effects_alive(&engine), 2);
    assert!(engine.cancel_zipline());
    assert!(!engine.cancel_zipline());
    assert_eq!(engine.player(), Some(player));
    assert!(engine.world.get::<&PlayerControl>(player).unwrap().enabled);
    assert!(engine.set_control(ControlInput::new(0.5, 0.5)).is_ok());

    // The ride's wind and sparks end with it and are not stopped again later.
    assert_eq!(transit_effects_alive(&engine), 0);
    run(&mut engine, 200);
    let events = engine.drain_events();
    assert_eq!(stopped(&events, effects::ZIPLINE_WIND), 1);
    assert_eq!(stopped(&events, effects::ZIPLINE_SPARKS), 1);
}

// ── Pool ───────────────────────────────────────────────────────────────

#[test]
fn pool_double_return_is_diagnosed() {
    let mut pool = ObjectPool::new(&PoolConfig::default());
    let handle = pool.acquire(PoolTag::Projectile).unwrap();
    let before = pool.available(PoolTag::Projectile);
    pool.release(handle).unwrap();
    assert_eq!(pool.release(handle), Err(PoolError::AlreadyReturned(handle)));
    assert_eq!(pool.available(PoolTag::Projectile), before + 1);
}
