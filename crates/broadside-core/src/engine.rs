//! Simulation engine - main entry point for running the simulation

use broadside_logic::ai::AiState;
use broadside_logic::capture::CaptureState;
use broadside_logic::config::GameConfig;
use broadside_logic::difficulty::DifficultyDirector;
use broadside_logic::grapple::{rope_sag, GrapplePhase};
use broadside_logic::health::{DamageInfo, DamageOutcome};
use broadside_logic::movement::ControlInput;
use broadside_logic::scoring::SessionStats;
use glam::{Quat, Vec3};
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::builder::VesselBuilder;
use crate::components::*;
use crate::error::EngineError;
use crate::events::{EventQueue, GameEvent, ReleaseReason};
use crate::pool::ObjectPool;
use crate::systems::*;

/// Snapshot of one vessel for a HUD.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselStatus {
    pub name: String,
    pub faction: Faction,
    pub alive: bool,
    pub speed: f32,
    pub health_percentage: f32,
    pub ammo: Option<u32>,
    pub reloading: bool,
    pub ai_state: Option<AiState>,
    pub capture_state: Option<CaptureState>,
    pub capture_progress: f32,
    pub grapple: Option<GrapplePhase>,
}

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world containing all entities
    pub world: World,
    pub config: GameConfig,
    pub ocean: Ocean,
    /// Shared allocator for projectiles, effects and spawned enemies
    pub pool: ObjectPool,
    /// Player presence: commanded vessel and viewpoint
    pub rig: PlayerRig,
    events: EventQueue,
    stats: SessionStats,
    director: DifficultyDirector,
    spawner: Spawner,
    rng: StdRng,

    // Update timing
    sim_time: f64,
    accumulator: f32,
    last_detection: Option<f64>,
    tick_count: u64,

    // Configuration
    time_scale: f32,
}

impl SimulationEngine {
    /// Create an empty simulation. Fails if the configuration is invalid.
    pub fn new(config: GameConfig) -> Result<Self, EngineError> {
        let errors = config.validate();
        if !errors.is_empty() {
            for e in &errors {
                log::error!("config: {}", e);
            }
            return Err(EngineError::InvalidConfig(errors));
        }
        log::info!(
            "simulation ready: {:.0} Hz physics, seed {}",
            1.0 / config.sim.fixed_timestep,
            config.sim.seed
        );
        Ok(Self {
            world: World::new(),
            ocean: Ocean::new(config.wave.clone()),
            pool: ObjectPool::new(&config.pools),
            rig: PlayerRig::default(),
            events: EventQueue::new(),
            stats: SessionStats::default(),
            director: DifficultyDirector::new(&config.difficulty),
            spawner: Spawner::new(config.spawner.interval),
            rng: StdRng::seed_from_u64(config.sim.seed),
            sim_time: 0.0,
            accumulator: 0.0,
            last_detection: None,
            tick_count: 0,
            time_scale: 1.0,
            config,
        })
    }

    /// Advance by one rendered frame: fixed physics steps, then visuals.
    pub fn update(&mut self, frame_seconds: f32) {
        let scaled = frame_seconds.max(0.0) * self.time_scale;
        let dt = self.config.sim.fixed_timestep;
        self.accumulator += scaled;

        let mut steps = 0;
        while self.accumulator >= dt && steps < self.config.sim.max_steps_per_frame {
            self.step();
            self.accumulator -= dt;
            steps += 1;
        }
        if self.accumulator >= dt {
            log::debug!("dropping {:.3}s of physics backlog", self.accumulator);
            self.accumulator %= dt;
        }

        self.visual_pass(scaled);
    }

    /// One fixed physics tick.
    pub fn step(&mut self) {
        let dt = self.config.sim.fixed_timestep;
        self.sim_time += dt as f64;
        self.tick_count += 1;

        // T0: Physics
        self.ocean.begin_tick(dt);
        buoyancy_system(&mut self.world, &mut self.ocean, &self.config.buoyancy);
        movement_system(&mut self.world, dt);
        grapple_constraint_system(&mut self.world);
        integration_system(&mut self.world, dt);

        // T1: AI (detection throttled to the configured cadence)
        let interval = self.config.sim.detection_interval as f64;
        let evaluate = self
            .last_detection
            .map_or(true, |last| self.sim_time - last >= interval - 1e-9);
        if evaluate {
            self.last_detection = Some(self.sim_time);
        }
        ai_system(
            &mut self.world,
            &mut self.rng,
            &mut self.events,
            &AiFrame {
                difficulty: self.director.level,
                evaluate,
                dt,
            },
        );

        // T2: Combat
        weapon_system(
            &mut self.world,
            &mut self.pool,
            &mut self.events,
            &mut self.stats,
            self.sim_time,
            dt,
        );
        let hits = projectile_system(
            &mut self.world,
            &mut self.ocean,
            &mut self.pool,
            &mut self.events,
            self.config.buoyancy.gravity,
            dt,
        );
        let mut ctx = DamageContext {
            events: &mut self.events,
            stats: &mut self.stats,
            director: &mut self.director,
            difficulty: &self.config.difficulty,
        };
        damage_system(&mut self.world, hits, &mut ctx);
        regen_system(&mut self.world, &mut self.events, dt);

        // T3: Capture and boarding
        capture_system(
            &mut self.world,
            &mut self.events,
            &mut self.stats,
            &mut self.director,
            &self.config.difficulty,
            dt,
        );
        let released = grapple_system(&mut self.world, &mut self.events, dt);
        if let Some(transit) = self.rig.transit {
            if released.contains(&transit.from) {
                self.cancel_ride();
            }
        }
        let mut ride = RideContext {
            pool: &mut self.pool,
            events: &mut self.events,
            zipline: &self.config.zipline,
            pools: &self.config.pools,
        };
        zipline_system(&mut self.world, &mut self.rig, &mut self.stats, &mut ride, dt);

        // T4: Lifecycle
        let removed = wreck_system(&mut self.world, &mut self.pool, dt);
        if let Some(vessel) = self.rig.vessel.filter(|v| removed.contains(v)) {
            log::warn!("commanded vessel {:?} sank; player has no vessel", vessel);
            self.rig.vessel = None;
        }
        effect_system(&mut self.world, &mut self.pool, &mut self.events, dt);
        let around = self.player_position();
        self.spawner.tick(
            &mut self.world,
            &mut self.pool,
            &mut self.rng,
            &mut self.events,
            around,
            &self.config,
            dt,
        );
        flush_effects(&mut self.world, &mut self.pool, &mut self.events, &self.config.pools);
        self.director.tick(dt, &self.config.difficulty);
    }

    /// Variable-rate cosmetic state: tilt, ropes, viewpoint.
    fn visual_pass(&mut self, dt: f32) {
        for (_, helm) in self.world.query_mut::<&mut Helm>() {
            let input = helm.input;
            let config = &helm.config;
            helm.tilt.update(input, dt, config);
        }

        let ropes: Vec<(Entity, Vec3, Vec3, Option<f32>)> = self
            .world
            .query::<(&GrappleLauncher, &RigidBody)>()
            .iter()
            .filter_map(|(entity, (launcher, body))| match launcher.grapple.phase() {
                GrapplePhase::Launching => {
                    let start = body.world_point(launcher.config.launch_offset);
                    Some((entity, start, launcher.grapple.hook_position()?, None))
                }
                GrapplePhase::Attached => {
                    let max_length = launcher.grapple.link()?.max_length;
                    Some((entity, Vec3::ZERO, Vec3::ZERO, Some(max_length)))
                }
                GrapplePhase::Idle => None,
            })
            .collect();
        for (entity, start, end, attached) in ropes {
            let ends = match attached {
                Some(_) => rope_ends(&self.world, entity),
                None => Some((start, end)),
            };
            let Ok(mut launcher) = self.world.get::<&mut GrappleLauncher>(entity) else {
                continue;
            };
            let launcher = &mut *launcher;
            let Some((start, end)) = ends else {
                continue;
            };
            let segments = launcher.config.rope_segments;
            match attached {
                Some(max_length) => {
                    let sag = rope_sag(start.distance(end), max_length, &launcher.config);
                    let smoothing = launcher.config.rope_smoothing;
                    launcher.rope.relax(start, end, sag, segments, smoothing, dt);
                }
                None => launcher.rope.set_straight(start, end, segments),
            }
        }

        self.rig.ease(&self.config.zipline, dt);
    }

    // ---- commands ----

    pub fn spawn_vessel(&mut self, builder: VesselBuilder) -> Entity {
        builder.build(&mut self.world)
    }

    /// Put the player aboard `vessel`.
    pub fn set_player(&mut self, vessel: Entity) -> Result<(), EngineError> {
        if !self.world.contains(vessel) {
            return Err(EngineError::NoSuchEntity);
        }
        self.cancel_ride();
        let from = self.rig.vessel.filter(|v| *v != vessel);
        transfer_control(&mut self.world, &mut self.rig, from, vessel, &mut self.events);
        if let Ok(body) = self.world.get::<&RigidBody>(vessel) {
            let eye = body.position + Vec3::Y * self.config.zipline.eye_height;
            self.rig.viewpoint = eye;
            self.rig.target_viewpoint = eye;
        }
        Ok(())
    }

    fn player_vessel(&self) -> Result<Entity, EngineError> {
        self.rig.vessel.ok_or(EngineError::NoPlayerVessel)
    }

    /// Steering and throttle for the commanded vessel. Ignored mid-ride.
    pub fn set_control(&mut self, input: ControlInput) -> Result<(), EngineError> {
        let vessel = self.player_vessel()?;
        let input = if self.rig.is_riding() {
            ControlInput::idle()
        } else {
            input
        };
        let mut helm = self.world.get::<&mut Helm>(vessel)?;
        helm.input = input;
        Ok(())
    }

    /// World-space weapon rotation, or `None` to follow the hull.
    pub fn set_aim(&mut self, vessel: Entity, aim: Option<Quat>) -> Result<(), EngineError> {
        let mut weapon = self.world.get::<&mut Weapon>(vessel)?;
        weapon.aim = aim;
        Ok(())
    }

    /// Pull the trigger for the coming tick.
    pub fn request_fire(&mut self, vessel: Entity) -> Result<(), EngineError> {
        let mut weapon = self.world.get::<&mut Weapon>(vessel)?;
        weapon.fire_requested = true;
        Ok(())
    }

    pub fn cancel_reload(&mut self, vessel: Entity) -> Result<(), EngineError> {
        let mut weapon = self.world.get::<&mut Weapon>(vessel)?;
        weapon.state.cancel_reload();
        Ok(())
    }

    /// Throw the vessel's grapple toward a world point.
    pub fn launch_grapple(&mut self, vessel: Entity, aim: Vec3) -> Result<(), EngineError> {
        let origin = {
            let mut launcher = self.world.get::<&mut GrappleLauncher>(vessel)?;
            let origin = self
                .world
                .get::<&RigidBody>(vessel)
                .map_err(|_| EngineError::MissingComponent("RigidBody"))?
                .world_point(launcher.config.launch_offset);
            let launcher = &mut *launcher;
            launcher.grapple.launch(origin, aim, &launcher.config)?;
            origin
        };
        self.events.push(GameEvent::GrappleLaunched { launcher: vessel });
        log::debug!("{:?}: grapple away from {:?}", vessel, origin);
        Ok(())
    }

    /// Drop the link or recall the hook. Returns false if already idle.
    pub fn release_grapple(&mut self, vessel: Entity) -> Result<bool, EngineError> {
        let released = self.world.get::<&mut GrappleLauncher>(vessel)?.release();
        if released {
            self.events.push(GameEvent::GrappleReleased {
                launcher: vessel,
                reason: ReleaseReason::Detached,
            });
            if self.rig.transit.map_or(false, |t| t.from == vessel) {
                self.cancel_ride();
            }
        }
        Ok(released)
    }

    pub fn start_zipline(&mut self) -> Result<(), EngineError> {
        let mut ride = RideContext {
            pool: &mut self.pool,
            events: &mut self.events,
            zipline: &self.config.zipline,
            pools: &self.config.pools,
        };
        start_zipline(&mut self.world, &mut self.rig, &mut ride)?;
        if let Some(vessel) = self.rig.vessel {
            if let Ok(mut helm) = self.world.get::<&mut Helm>(vessel) {
                helm.input = ControlInput::idle();
            }
        }
        Ok(())
    }

    /// Abort a ride; the viewpoint returns aboard. False if not riding.
    pub fn cancel_zipline(&mut self) -> bool {
        self.cancel_ride()
    }

    fn cancel_ride(&mut self) -> bool {
        let mut ride = RideContext {
            pool: &mut self.pool,
            events: &mut self.events,
            zipline: &self.config.zipline,
            pools: &self.config.pools,
        };
        cancel_zipline(&mut self.world, &mut self.rig, &mut ride)
    }

    pub fn order_retreat(&mut self, vessel: Entity) -> Result<bool, EngineError> {
        let mut ai = self.world.get::<&mut AiController>(vessel)?;
        let ai = &mut *ai;
        let transition = ai.brain.order_retreat(&ai.config);
        if let Some(t) = transition {
            self.events.push(GameEvent::AiStateChanged {
                entity: vessel,
                from: t.from,
                to: t.to,
            });
        }
        Ok(transition.is_some())
    }

    pub fn cancel_evade(&mut self, vessel: Entity) -> Result<bool, EngineError> {
        let mut ai = self.world.get::<&mut AiController>(vessel)?;
        let ai = &mut *ai;
        let transition = ai.brain.cancel_evade(&ai.config);
        if let Some(t) = transition {
            self.events.push(GameEvent::AiStateChanged {
                entity: vessel,
                from: t.from,
                to: t.to,
            });
        }
        Ok(transition.is_some())
    }

    /// Apply damage immediately, outside the projectile path.
    pub fn apply_damage(
        &mut self,
        target: Entity,
        info: DamageInfo,
        source: Option<Entity>,
    ) -> Result<DamageOutcome, EngineError> {
        if !self.world.contains(target) {
            return Err(EngineError::NoSuchEntity);
        }
        let request = DamageRequest { target, info, source };
        let mut ctx = DamageContext {
            events: &mut self.events,
            stats: &mut self.stats,
            director: &mut self.director,
            difficulty: &self.config.difficulty,
        };
        apply_damage(&mut self.world, &request, &mut ctx).ok_or(EngineError::MissingComponent("Health"))
    }

    /// Returns the amount actually restored.
    pub fn heal(&mut self, target: Entity, amount: f32) -> Result<f32, EngineError> {
        let healed = self.world.get::<&mut Health>(target)?.heal(amount);
        if healed > 0.0 {
            self.events.push(GameEvent::Healed {
                entity: target,
                amount: healed,
            });
        }
        Ok(healed)
    }

    /// Despawn everything and return every pool handle. The engine stays
    /// usable with its configuration intact.
    pub fn shutdown(&mut self) {
        let count = self.world.len();
        self.world.clear();
        self.pool.release_all();
        self.events.clear();
        self.rig = PlayerRig::default();
        self.ocean.reset();
        log::info!("simulation shut down, {} entities removed", count);
    }

    // ---- queries ----

    pub fn vessel_status(&self, vessel: Entity) -> Option<VesselStatus> {
        let name = self.world.get::<&Vessel>(vessel).ok()?.name.clone();
        let faction = *self.world.get::<&Faction>(vessel).ok()?;
        let (alive, health_percentage) = self
            .world
            .get::<&Health>(vessel)
            .map(|h| (!h.dead, h.percentage()))
            .unwrap_or((false, 0.0));
        let speed = self.world.get::<&RigidBody>(vessel).map(|b| b.speed()).unwrap_or(0.0);
        let (ammo, reloading) = match self.world.get::<&Weapon>(vessel) {
            Ok(w) => (Some(w.state.ammo), w.state.is_reloading()),
            Err(_) => (None, false),
        };
        let ai_state = self.world.get::<&AiController>(vessel).ok().map(|ai| ai.brain.state);
        let (capture_state, capture_progress) = match self.world.get::<&Capturable>(vessel) {
            Ok(c) => (Some(c.tracker.state), c.tracker.progress),
            Err(_) => (None, 0.0),
        };
        let grapple = self
            .world
            .get::<&GrappleLauncher>(vessel)
            .ok()
            .map(|g| g.grapple.phase());
        Some(VesselStatus {
            name,
            faction,
            alive,
            speed,
            health_percentage,
            ammo,
            reloading,
            ai_state,
            capture_state,
            capture_progress,
            grapple,
        })
    }

    /// Take every event raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Current director level.
    pub fn difficulty(&self) -> f32 {
        self.director.level
    }

    pub fn player(&self) -> Option<Entity> {
        self.rig.vessel
    }

    pub fn player_position(&self) -> Option<Vec3> {
        let vessel = self.rig.vessel?;
        self.world.get::<&RigidBody>(vessel).ok().map(|b| b.position)
    }

    pub fn viewpoint(&self) -> Vec3 {
        self.rig.viewpoint
    }

    /// Uncached wave height at the current simulation time.
    pub fn wave_height(&self, x: f32, z: f32) -> f32 {
        self.ocean.exact_height(x, z)
    }

    /// Count living enemy vessels
    pub fn enemy_count(&self) -> usize {
        self.world
            .query::<(&Vessel, &Faction, &Health)>()
            .iter()
            .filter(|(_, (_, f, h))| **f == Faction::Enemy && !h.dead)
            .count()
    }

    /// Count vessels, wrecks included
    pub fn vessel_count(&self) -> usize {
        self.world.query::<&Vessel>().iter().count()
    }

    pub fn projectile_count(&self) -> usize {
        self.world.query::<&Projectile>().iter().count()
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Get current time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
