//! Broadside Headless Simulation Harness
//!
//! Runs combat scenarios against the real engine, in-process, with no
//! renderer or input devices attached.
//!
//! Usage:
//!   cargo run -p broadside-simtest
//!   cargo run -p broadside-simtest -- --verbose --seed 42 --seconds 300
//!   RUST_LOG=debug cargo run -p broadside-simtest -- --config tuning.json

use std::path::PathBuf;

use broadside_core::config::load_config_file;
use broadside_core::pool::{ObjectPool, PoolError, PoolTag};
use broadside_core::prelude::*;
use broadside_logic::ai::{AiState, Personality};
use broadside_logic::capture::CaptureState;
use broadside_logic::config::{ProjectileConfig, WeaponConfig};
use broadside_logic::grapple::GrapplePhase;
use broadside_logic::health::DamageInfo;
use clap::Parser;
use glam::{Quat, Vec3};
use hecs::Entity;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "broadside-simtest")]
#[command(about = "Headless combat scenario harness", long_about = None)]
struct Args {
    /// Print every result, not only failures
    #[arg(long)]
    verbose: bool,

    /// Override the session seed
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// JSON config file; missing fields use defaults
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Length of the skirmish (simulated seconds)
    #[arg(long, value_name = "SECONDS", default_value = "120")]
    seconds: f32,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .try_init();
    let args = Args::parse();
    println!("=== Broadside Simulation Harness ===\n");

    let mut base = match &args.config {
        Some(path) => match load_config_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("failed to load {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        base.sim.seed = seed;
    }
    println!("seed {:#x}, skirmish {}s\n", base.sim.seed, args.seconds);

    let mut results = Vec::new();

    // 1. Weapon cadence and reload
    results.extend(validate_weapon_cadence(&base));

    // 2. Weak-point damage
    results.extend(validate_weak_point(&base));

    // 3. AI detection and engagement
    results.extend(validate_ai_detection(&base));

    // 4. Capture progress and decay
    results.extend(validate_capture_decay(&base));

    // 5. Grapple round trip
    results.extend(validate_grapple(&base));

    // 6. Pool double return
    results.extend(validate_pool());

    // 7. Full skirmish
    results.extend(run_skirmish(&base, args.seconds));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Scenario config: the caller's tuning on a flat, predictable sea.
fn calm(base: &GameConfig) -> GameConfig {
    let mut config = base.clone();
    config.wave.base_height = 0.0;
    config.ai.evasion_chance = 0.0;
    config.spawner.enabled = false;
    config
}

fn engine(config: GameConfig) -> Option<SimulationEngine> {
    match SimulationEngine::new(config) {
        Ok(e) => Some(e),
        Err(e) => {
            eprintln!("engine rejected config: {}", e);
            None
        }
    }
}

/// One fixed tick. Events nobody inspects are dropped so the queue stays flat.
fn tick(engine: &mut SimulationEngine) {
    engine.step();
    engine.drain_events();
}

/// Run `ticks` fixed ticks, returning everything they emitted.
fn run(engine: &mut SimulationEngine, ticks: usize) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        engine.step();
        events.extend(engine.drain_events());
    }
    events
}

fn ticks_for(engine: &SimulationEngine, seconds: f32) -> usize {
    (seconds / engine.config.sim.fixed_timestep).ceil() as usize
}

fn run_for(engine: &mut SimulationEngine, seconds: f32) -> Vec<GameEvent> {
    let ticks = ticks_for(engine, seconds);
    run(engine, ticks)
}

fn position(engine: &SimulationEngine, e: Entity) -> Option<Vec3> {
    engine.world.get::<&RigidBody>(e).ok().map(|b| b.position)
}

// ── 1. Weapon ───────────────────────────────────────────────────────────

fn validate_weapon_cadence(base: &GameConfig) -> Vec<TestResult> {
    println!("--- Weapon Cadence ---");
    let mut results = Vec::new();
    let config = calm(base);
    let Some(mut engine) = engine(config.clone()) else {
        return vec![TestResult::new("weapon_engine", false, "engine rejected config")];
    };
    let weapon = WeaponConfig {
        fire_rate: 2.0,
        max_ammo: 10,
        reload_time: 3.0,
        infinite_ammo: false,
        ..config.weapon.clone()
    };
    let gun = engine.spawn_vessel(VesselBuilder::new("Gun", Faction::Player).weapon(weapon, Vec3::new(0.0, 1.0, 3.0)));
    let spacing = ticks_for(&engine, 0.5) + 1;

    let mut consecutive = 0;
    for _ in 0..10 {
        let before = engine.stats().shots_fired;
        let _ = engine.request_fire(gun);
        run(&mut engine, spacing);
        if engine.stats().shots_fired == before + 1 {
            consecutive += 1;
        }
    }
    results.push(TestResult::new(
        "weapon_ten_shots",
        consecutive == 10,
        format!("{}/10 spaced attempts fired", consecutive),
    ));

    let _ = engine.request_fire(gun);
    run(&mut engine, 1);
    let status = engine.vessel_status(gun);
    let blocked = engine.stats().shots_fired == 10 && status.as_ref().map_or(false, |s| s.reloading);
    results.push(TestResult::new("weapon_eleventh_blocked", blocked, "reload blocks the 11th attempt"));

    run_for(&mut engine, 3.2);
    let ammo = engine.vessel_status(gun).and_then(|s| s.ammo);
    results.push(TestResult::new(
        "weapon_reload_refills",
        ammo == Some(10),
        format!("ammo after reload: {:?}", ammo),
    ));
    results
}

// ── 2. Weak points ──────────────────────────────────────────────────────

fn validate_weak_point(base: &GameConfig) -> Vec<TestResult> {
    println!("--- Weak-Point Damage ---");
    let config = calm(base);
    let Some(mut engine) = engine(config.clone()) else {
        return vec![TestResult::new("weak_point_engine", false, "engine rejected config")];
    };
    let weapon = WeaponConfig {
        projectile: ProjectileConfig {
            damage: 25.0,
            weak_point_multiplier: 2.5,
            gravity_scale: 0.0,
            ..config.weapon.projectile.clone()
        },
        ..config.weapon.clone()
    };
    let shooter = engine.spawn_vessel(VesselBuilder::new("Shooter", Faction::Player).weapon(weapon, Vec3::new(0.0, 1.0, 3.0)));
    let target = engine.spawn_vessel(
        VesselBuilder::new("Target", Faction::Enemy)
            .at(Vec3::new(0.0, 0.0, 30.0))
            .hull_radius(0.5)
            .weak_point(Vec3::new(0.0, 1.0, 0.0), 2.5),
    );
    let _ = engine.request_fire(shooter);
    let hits: Vec<(f32, bool)> = run_for(&mut engine, 2.0)
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::Damaged {
                entity,
                amount,
                weak_point,
                ..
            } if entity == target => Some((amount, weak_point)),
            _ => None,
        })
        .collect();
    vec![TestResult::new(
        "weak_point_62_5_once",
        hits == [(62.5, true)],
        format!("hits: {:?}", hits),
    )]
}

// ── 3. AI ───────────────────────────────────────────────────────────────

fn validate_ai_detection(base: &GameConfig) -> Vec<TestResult> {
    println!("--- AI Detection ---");
    let mut results = Vec::new();
    let config = calm(base);
    let Some(mut engine) = engine(config.clone()) else {
        return vec![TestResult::new("ai_engine", false, "engine rejected config")];
    };
    let player = engine.spawn_vessel(VesselBuilder::sloop("Player", Faction::Player, &config).at(Vec3::new(0.0, 0.0, 35.0)));
    let enemy = engine.spawn_vessel(
        VesselBuilder::gunboat("Raider", Faction::Enemy, &config).ai(Personality::Aggressive, config.ai.clone()),
    );
    let _ = engine.set_player(player);

    tick(&mut engine);
    let first = engine.vessel_status(enemy).and_then(|s| s.ai_state);
    results.push(TestResult::new(
        "ai_detects_at_35",
        first == Some(AiState::Pursue),
        format!("state after first evaluation: {:?}", first),
    ));

    let mut attack_distance = None;
    for _ in 0..ticks_for(&engine, 15.0) {
        tick(&mut engine);
        if engine.vessel_status(enemy).and_then(|s| s.ai_state) == Some(AiState::Attack) {
            attack_distance = position(&engine, enemy)
                .zip(position(&engine, player))
                .map(|(a, b)| a.distance(b));
            break;
        }
    }
    results.push(TestResult::new(
        "ai_attacks_in_range",
        attack_distance.map_or(false, |d| d <= config.ai.attack_range + 1.0),
        format!("attack began at {:?}m", attack_distance),
    ));
    results
}

// ── 4. Capture ──────────────────────────────────────────────────────────

fn validate_capture_decay(base: &GameConfig) -> Vec<TestResult> {
    println!("--- Capture Decay ---");
    let mut results = Vec::new();
    let mut config = calm(base);
    config.capture.capture_time = 10.0;
    config.capture.decay_rate = 0.5;
    let Some(mut engine) = engine(config.clone()) else {
        return vec![TestResult::new("capture_engine", false, "engine rejected config")];
    };
    let player = engine.spawn_vessel(VesselBuilder::sloop("Player", Faction::Player, &config));
    let prize = engine.spawn_vessel(
        VesselBuilder::new("Prize", Faction::Enemy)
            .at(Vec3::new(0.0, 0.0, 8.0))
            .capturable(config.capture.clone()),
    );
    let _ = engine.apply_damage(prize, DamageInfo::new(80.0), None);

    let mut monotonic = true;
    let mut last = 0.0;
    for _ in 0..ticks_for(&engine, 4.0) {
        tick(&mut engine);
        let p = engine.vessel_status(prize).map_or(0.0, |s| s.capture_progress);
        monotonic &= p >= last;
        last = p;
    }
    results.push(TestResult::new(
        "capture_progress_after_4s",
        (last - 0.4).abs() < 0.01 && monotonic,
        format!("progress {:.3}, monotonic {}", last, monotonic),
    ));

    if let Ok(mut body) = engine.world.get::<&mut RigidBody>(player) {
        body.position.x = 500.0;
    }
    for _ in 0..ticks_for(&engine, 3.0) {
        tick(&mut engine);
        if let Some(s) = engine.vessel_status(prize) {
            if s.capture_state == Some(CaptureState::Paused) {
                monotonic &= s.capture_progress <= last;
            }
            last = s.capture_progress;
        }
    }
    let status = engine.vessel_status(prize);
    let state = status.as_ref().and_then(|s| s.capture_state);
    results.push(TestResult::new(
        "capture_decays_to_idle",
        state == Some(CaptureState::Idle) && last == 0.0 && monotonic,
        format!("state {:?}, progress {:.3}", state, last),
    ));
    results
}

// ── 5. Grapple ──────────────────────────────────────────────────────────

fn validate_grapple(base: &GameConfig) -> Vec<TestResult> {
    println!("--- Grapple Round Trip ---");
    let mut results = Vec::new();
    let config = calm(base);
    let Some(mut engine) = engine(config.clone()) else {
        return vec![TestResult::new("grapple_engine", false, "engine rejected config")];
    };
    let player = engine.spawn_vessel(VesselBuilder::sloop("Player", Faction::Player, &config).grapple(config.grapple.clone()));
    let prize = engine.spawn_vessel(VesselBuilder::new("Prize", Faction::Enemy).at(Vec3::new(0.0, 0.0, 20.0)));
    let _ = engine.set_player(player);

    let aim = position(&engine, prize).unwrap_or(Vec3::ZERO) + Vec3::new(0.0, 1.0, -2.0);
    let launched = engine.launch_grapple(player, aim).is_ok();
    run_for(&mut engine, 1.0);
    let phase = engine.vessel_status(player).and_then(|s| s.grapple);
    results.push(TestResult::new(
        "grapple_attaches",
        launched && phase == Some(GrapplePhase::Attached),
        format!("phase {:?}", phase),
    ));

    let released = engine.release_grapple(player).unwrap_or(false);
    let residual = engine
        .world
        .get::<&GrappleLauncher>(player)
        .ok()
        .map(|g| {
            g.grapple
                .constraint_force(Vec3::ZERO, Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO)
                .length()
        });
    results.push(TestResult::new(
        "grapple_release_clears_link",
        released && residual == Some(0.0),
        format!("residual force {:?}", residual),
    ));

    // Re-attach once the cooldown is over, then ride the rope across.
    run_for(&mut engine, config.grapple.cooldown + 0.1);
    let _ = engine.launch_grapple(player, aim);
    run_for(&mut engine, 1.0);
    let rode = engine.start_zipline().is_ok();
    run_for(&mut engine, 6.0);
    results.push(TestResult::new(
        "zipline_boards",
        rode && engine.player() == Some(prize),
        format!("player vessel {:?}", engine.player()),
    ));
    results
}

// ── 6. Pool ─────────────────────────────────────────────────────────────

fn validate_pool() -> Vec<TestResult> {
    println!("--- Object Pool ---");
    let mut pool = ObjectPool::new(&Default::default());
    let Ok(handle) = pool.acquire(PoolTag::Projectile) else {
        return vec![TestResult::new("pool_acquire", false, "could not acquire")];
    };
    let before = pool.available(PoolTag::Projectile);
    let first = pool.release(handle);
    let second = pool.release(handle);
    let after = pool.available(PoolTag::Projectile);
    vec![TestResult::new(
        "pool_double_return",
        first.is_ok() && second == Err(PoolError::AlreadyReturned(handle)) && after == before + 1,
        format!("second return: {:?}, available {} -> {}", second, before, after),
    )]
}

// ── 7. Skirmish ─────────────────────────────────────────────────────────

/// Nearest living enemy to `from`.
fn nearest_enemy(engine: &SimulationEngine, from: Vec3) -> Option<Vec3> {
    engine
        .world
        .query::<(&RigidBody, &Faction, &Health)>()
        .iter()
        .filter(|(_, (_, f, h))| **f == Faction::Enemy && !h.dead)
        .map(|(_, (b, _, _))| b.position)
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
}

fn run_skirmish(base: &GameConfig, seconds: f32) -> Vec<TestResult> {
    println!("--- Skirmish ---");
    let mut results = Vec::new();
    let mut config = base.clone();
    config.spawner.enabled = true;
    let Some(mut engine) = engine(config.clone()) else {
        return vec![TestResult::new("skirmish_engine", false, "engine rejected config")];
    };
    let player = engine.spawn_vessel(VesselBuilder::sloop("Player", Faction::Player, &config).grapple(config.grapple.clone()));
    let _ = engine.set_player(player);

    let frame = 1.0 / 90.0;
    let frames = (seconds / frame) as usize;
    let mut spawned = 0;
    let mut peak_projectiles = 0;
    for i in 0..frames {
        if let Some(me) = engine.player().filter(|&p| engine.vessel_status(p).map_or(false, |s| s.alive)) {
            let here = engine.player_position().unwrap_or(Vec3::ZERO);
            match nearest_enemy(&engine, here) {
                Some(there) => {
                    let to = there - here;
                    let flat = Vec3::new(to.x, 0.0, to.z).normalize_or_zero();
                    let steer = Vec3::Z.cross(flat).y.signum() * 0.3;
                    let _ = engine.set_control(ControlInput::new(steer, 0.6));
                    if flat != Vec3::ZERO && to.length() < 60.0 {
                        let _ = engine.set_aim(me, Some(Quat::from_rotation_arc(Vec3::Z, to.normalize())));
                        let _ = engine.request_fire(me);
                    }
                }
                None => {
                    let _ = engine.set_control(ControlInput::new(0.2, 0.3));
                }
            }
        }
        engine.update(frame);
        for event in engine.drain_events() {
            if matches!(event, GameEvent::EnemySpawned { .. }) {
                spawned += 1;
            }
        }
        peak_projectiles = peak_projectiles.max(engine.projectile_count());
        if i % (90 * 30) == 0 {
            log::info!(
                "t={:.0}s enemies={} difficulty={:.2}",
                engine.sim_time(),
                engine.enemy_count(),
                engine.difficulty()
            );
        }
    }

    results.push(TestResult::new(
        "skirmish_enemies_spawned",
        spawned > 0,
        format!("{} enemies spawned", spawned),
    ));
    results.push(TestResult::new(
        "skirmish_projectiles_bounded",
        config.pools.expandable || peak_projectiles <= config.pools.projectile_capacity,
        format!("peak {} / capacity {}", peak_projectiles, config.pools.projectile_capacity),
    ));
    results.push(TestResult::new(
        "skirmish_enemy_cap",
        engine.enemy_count() <= config.spawner.max_alive,
        format!("{} alive / cap {}", engine.enemy_count(), config.spawner.max_alive),
    ));
    let difficulty = engine.difficulty();
    results.push(TestResult::new(
        "skirmish_difficulty_bounded",
        (config.difficulty.min_level..=config.difficulty.max_level).contains(&difficulty),
        format!("difficulty {:.2}", difficulty),
    ));

    match serde_json::to_string_pretty(engine.stats()) {
        Ok(json) => println!("session stats:\n{}", json),
        Err(e) => eprintln!("could not serialize stats: {}", e),
    }
    engine.shutdown();
    results.push(TestResult::new(
        "skirmish_shutdown_clean",
        engine.vessel_count() == 0 && engine.projectile_count() == 0,
        "world cleared",
    ));
    results
}
