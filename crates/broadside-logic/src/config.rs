//! Game tunables with defaults and validation.
//!
//! Every value a designer may want to adjust lives in one of these structs.
//! They all derive `Serialize`/`Deserialize` with `#[serde(default)]`, so a
//! JSON file only needs the fields it overrides. Defaults yield a playable
//! game.
//!
//! ```
//! use broadside_logic::config::GameConfig;
//!
//! let mut config = GameConfig::default();
//! config.weapon.fire_rate = 2.0;
//! config.weapon.max_ammo = 10;
//! assert!(config.validate().is_empty());
//! ```

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{layers, GRAVITY};
use crate::spawn::ArchetypeWeights;

/// Procedural wave field parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Amplitude of the first octave in meters.
    pub base_height: f32,
    /// Global scale applied to world coordinates before sampling noise.
    pub noise_scale: f32,
    /// Base spatial frequency of the first octave.
    pub frequency: f32,
    pub octaves: u32,
    /// Amplitude falloff per octave.
    pub persistence: f32,
    /// Frequency gain per octave.
    pub lacunarity: f32,
    /// Wind direction on the XZ plane (normalized on use).
    pub wind_direction: Vec2,
    /// Drift speed of the noise pattern in noise units per second.
    pub wind_speed: f32,
    pub seed: u32,
    /// Central-difference offset used to estimate the surface normal.
    pub normal_delta: f32,
    pub cache_enabled: bool,
    /// Cache cell edge length in meters.
    pub cache_cell_size: f32,
    /// Ticks a cached sample may be trusted before the cache is flushed.
    pub cache_ticks: u32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            base_height: 1.2,
            noise_scale: 0.05,
            frequency: 1.0,
            octaves: 3,
            persistence: 0.5,
            lacunarity: 2.0,
            wind_direction: Vec2::new(1.0, 0.3),
            wind_speed: 0.08,
            seed: 7,
            normal_delta: 0.1,
            cache_enabled: true,
            cache_cell_size: 0.5,
            cache_ticks: 2,
        }
    }
}

/// Buoyancy and manual gravity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuoyancyConfig {
    pub water_level: f32,
    /// kg/m³
    pub water_density: f32,
    /// Per-point force gain, N per (kg/m³ · m).
    pub buoyancy_coefficient: f32,
    /// Scales the wave height seen by buoyancy points.
    pub wave_height_multiplier: f32,
    /// Point damping gain; the damping force is `-v * damping * depth`.
    pub damping: f32,
    pub gravity: f32,
}

impl Default for BuoyancyConfig {
    fn default() -> Self {
        Self {
            water_level: 0.0,
            water_density: 1000.0,
            buoyancy_coefficient: 5.0,
            wave_height_multiplier: 1.0,
            damping: 2000.0,
            gravity: GRAVITY,
        }
    }
}

/// Helm response: thrust, steering, drag and visual tilt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Forward acceleration at full throttle, m/s².
    pub acceleration: f32,
    /// Thrust is cut while horizontal speed is at or above this.
    pub max_speed: f32,
    /// Angular acceleration (rad/s²) per unit steering when stationary.
    pub low_speed_turn_rate: f32,
    /// Angular acceleration (rad/s²) per unit steering at `max_speed`.
    pub high_speed_turn_rate: f32,
    /// Fraction of sideways velocity removed per second.
    pub lateral_damping: f32,
    /// Multiplier applied to horizontal velocity each tick at zero throttle.
    pub drift_decay: f32,
    /// Radians.
    pub max_roll: f32,
    /// Radians.
    pub max_pitch: f32,
    /// Easing rate of the visual tilt toward its target, per second.
    pub tilt_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            acceleration: 6.0,
            max_speed: 14.0,
            low_speed_turn_rate: 1.6,
            high_speed_turn_rate: 0.5,
            lateral_damping: 3.0,
            drift_decay: 0.98,
            max_roll: 0.26,
            max_pitch: 0.17,
            tilt_speed: 3.0,
        }
    }
}

/// Projectile template fired by a weapon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub damage: f32,
    pub mass: f32,
    /// Seconds before an unresolved projectile is retired.
    pub lifetime: f32,
    pub radius: f32,
    pub weak_point_multiplier: f32,
    /// Bit set of collider layers that count as weak points.
    pub weak_point_mask: u32,
    pub gravity_scale: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 60.0,
            damage: 25.0,
            mass: 2.0,
            lifetime: 5.0,
            radius: 0.1,
            weak_point_multiplier: 2.5,
            weak_point_mask: 1 << layers::WEAK_POINT,
            gravity_scale: 1.0,
        }
    }
}

/// Weapon gating and recoil.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Shots per second.
    pub fire_rate: f32,
    pub max_ammo: u32,
    pub infinite_ammo: bool,
    /// Seconds.
    pub reload_time: f32,
    /// Impulse (N·s) pushed back into the firing vessel.
    pub recoil_impulse: f32,
    pub projectile: ProjectileConfig,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            fire_rate: 2.0,
            max_ammo: 10,
            infinite_ammo: false,
            reload_time: 3.0,
            recoil_impulse: 200.0,
            projectile: ProjectileConfig::default(),
        }
    }
}

/// Damage mitigation, regeneration and removal delay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub max_health: f32,
    pub damage_multiplier: f32,
    pub armored: bool,
    /// Fraction of damage absorbed when armored.
    pub armor_reduction: f32,
    pub regen_enabled: bool,
    /// Seconds without damage before regeneration resumes.
    pub regen_delay: f32,
    /// HP per second.
    pub regen_rate: f32,
    /// Seconds between death and removal. `None` leaves the wreck in place.
    pub destroy_delay: Option<f32>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            damage_multiplier: 1.0,
            armored: false,
            armor_reduction: 0.25,
            regen_enabled: false,
            regen_delay: 5.0,
            regen_rate: 2.0,
            destroy_delay: Some(3.0),
        }
    }
}

/// Enemy AI perception, combat and patrol parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub detection_range: f32,
    pub attack_range: f32,
    /// Beyond this distance an acquired target is dropped.
    pub lose_target_range: f32,
    /// Distance an attacking vessel tries to hold from its target.
    pub preferred_distance: f32,
    /// Lateral offset used when flanking.
    pub flank_distance: f32,
    /// Chance per detection evaluation that a combat state breaks into Evade.
    pub evasion_chance: f32,
    /// Seconds.
    pub evasion_duration: f32,
    /// Health fraction at or below which an ordered retreat is honoured.
    pub retreat_health_fraction: f32,
    /// AI trigger pulls per second.
    pub fire_rate: f32,
    /// Probability in [0, 1] that a trigger pull is taken.
    pub fire_accuracy: f32,
    /// Slerp rate of the weapon mount toward the lead point, per second.
    pub aim_speed: f32,
    /// Upper bound on the difficulty multiplier this AI honours.
    pub difficulty_ceiling: f32,
    pub patrol_radius: f32,
    pub waypoint_tolerance: f32,
    pub patrol_throttle: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            detection_range: 50.0,
            attack_range: 30.0,
            lose_target_range: 80.0,
            preferred_distance: 18.0,
            flank_distance: 20.0,
            evasion_chance: 0.02,
            evasion_duration: 2.0,
            retreat_health_fraction: 0.25,
            fire_rate: 0.8,
            fire_accuracy: 0.7,
            aim_speed: 4.0,
            difficulty_ceiling: 2.0,
            patrol_radius: 40.0,
            waypoint_tolerance: 5.0,
            patrol_throttle: 0.4,
        }
    }
}

/// Capture state machine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub capture_range: f32,
    /// Seconds in range needed to go from 0 to 1.
    pub capture_time: f32,
    /// Progress lost per second while paused.
    pub decay_rate: f32,
    pub require_low_health: bool,
    /// Health fraction at or below which capture may start.
    pub health_threshold: f32,
    pub damage_penalty_enabled: bool,
    /// Progress removed per damage event while capturing.
    pub damage_penalty: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_range: 15.0,
            capture_time: 10.0,
            decay_rate: 0.5,
            require_low_health: true,
            health_threshold: 0.3,
            damage_penalty_enabled: true,
            damage_penalty: 0.1,
        }
    }
}

/// Grapple launcher, spring link and rope visual.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrappleConfig {
    pub max_range: f32,
    /// Hook travel speed, m/s.
    pub launch_speed: f32,
    /// Seconds after a miss or detach before the next launch.
    pub cooldown: f32,
    /// Radius of the overlap test at the hook's arrival point.
    pub hit_radius: f32,
    /// N/m
    pub stiffness: f32,
    /// N·s/m
    pub damping: f32,
    /// Anchor separation at which the link snaps.
    pub break_distance: f32,
    /// Launch point in the launcher vessel's local space.
    pub launch_offset: Vec3,
    pub rope_segments: usize,
    /// Sag in meters at the middle of a slack rope.
    pub rope_sag: f32,
    /// Relaxation rate of rope points toward their target, per second.
    pub rope_smoothing: f32,
}

impl Default for GrappleConfig {
    fn default() -> Self {
        Self {
            max_range: 40.0,
            launch_speed: 50.0,
            cooldown: 1.5,
            hit_radius: 1.0,
            stiffness: 4000.0,
            damping: 400.0,
            break_distance: 60.0,
            launch_offset: Vec3::new(0.0, 1.5, 1.0),
            rope_segments: 16,
            rope_sag: 1.5,
            rope_smoothing: 8.0,
        }
    }
}

/// Zipline transit and viewpoint easing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZiplineConfig {
    /// m/s along the rope.
    pub travel_speed: f32,
    /// Eye height above a vessel's origin when seated.
    pub eye_height: f32,
    /// Viewpoint easing rate in the visual pass, per second.
    pub camera_smoothing: f32,
}

impl Default for ZiplineConfig {
    fn default() -> Self {
        Self {
            travel_speed: 12.0,
            eye_height: 1.8,
            camera_smoothing: 10.0,
        }
    }
}

/// Session difficulty director.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub initial: f32,
    pub min_level: f32,
    pub max_level: f32,
    pub ramp_per_minute: f32,
    pub kill_bonus: f32,
    pub capture_bonus: f32,
    /// Level removed per point of damage the player takes.
    pub damage_taken_penalty: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            initial: 1.0,
            min_level: 0.5,
            max_level: 2.5,
            ramp_per_minute: 0.05,
            kill_bonus: 0.05,
            capture_bonus: 0.08,
            damage_taken_penalty: 0.002,
        }
    }
}

/// Object pool capacities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub projectile_capacity: usize,
    pub effect_capacity: usize,
    pub enemy_capacity: usize,
    /// Grow pools on demand instead of reporting them unavailable.
    pub expandable: bool,
    /// Seconds a pooled effect lives before it is returned.
    pub effect_lifetime: f32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            projectile_capacity: 128,
            effect_capacity: 64,
            enemy_capacity: 12,
            expandable: false,
            effect_lifetime: 1.5,
        }
    }
}

/// Periodic enemy spawner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub enabled: bool,
    /// Seconds between spawn attempts.
    pub interval: f32,
    pub max_alive: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    pub weights: ArchetypeWeights,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: 8.0,
            max_alive: 4,
            min_radius: 60.0,
            max_radius: 90.0,
            weights: ArchetypeWeights::default(),
        }
    }
}

/// Complete game configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub sim: SimConfig,
    pub wave: WaveConfig,
    pub buoyancy: BuoyancyConfig,
    pub movement: MovementConfig,
    pub weapon: WeaponConfig,
    pub health: HealthConfig,
    pub ai: AiConfig,
    pub capture: CaptureConfig,
    pub grapple: GrappleConfig,
    pub zipline: ZiplineConfig,
    pub difficulty: DifficultyConfig,
    pub pools: PoolConfig,
    pub spawner: SpawnerConfig,
}

/// Loop timing and the session seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds per physics tick.
    pub fixed_timestep: f32,
    /// Cap on physics ticks run for one rendered frame.
    pub max_steps_per_frame: u32,
    /// Seconds between AI detection and state evaluations.
    pub detection_interval: f32,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 0.02,
            max_steps_per_frame: 5,
            detection_interval: 0.25,
            seed: 0x5EA_B0A7,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Field must be strictly positive.
    NotPositive { field: &'static str, value: f32 },
    /// Field must lie in the inclusive range.
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    /// Attack range must not exceed detection range.
    AttackBeyondDetection { attack: f32, detection: f32 },
    /// Lose-target range must be at least the detection range.
    LoseTargetInsideDetection { lose: f32, detection: f32 },
    /// Finite ammo with a zero-round magazine can never fire.
    EmptyMagazine,
    /// The wave field needs at least one octave.
    NoOctaves,
    /// Spawner weights must have a positive sum.
    EmptySpawnWeights,
    /// Spawn ring inner radius exceeds the outer radius.
    InvertedSpawnRing { min: f32, max: f32 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotPositive { field, value } => {
                write!(f, "{} must be positive, got {}", field, value)
            }
            ConfigError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{} = {} is outside [{}, {}]", field, value, min, max),
            ConfigError::AttackBeyondDetection { attack, detection } => write!(
                f,
                "attack range {} exceeds detection range {}",
                attack, detection
            ),
            ConfigError::LoseTargetInsideDetection { lose, detection } => write!(
                f,
                "lose-target range {} is inside detection range {}",
                lose, detection
            ),
            ConfigError::EmptyMagazine => write!(f, "max_ammo is 0 without infinite ammo"),
            ConfigError::NoOctaves => write!(f, "wave field needs at least one octave"),
            ConfigError::EmptySpawnWeights => write!(f, "spawner weights sum to zero"),
            ConfigError::InvertedSpawnRing { min, max } => {
                write!(f, "spawn ring min radius {} exceeds max {}", min, max)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn positive(errors: &mut Vec<ConfigError>, field: &'static str, value: f32) {
    if !(value > 0.0) {
        errors.push(ConfigError::NotPositive { field, value });
    }
}

fn in_range(errors: &mut Vec<ConfigError>, field: &'static str, value: f32, min: f32, max: f32) {
    if !(min..=max).contains(&value) {
        errors.push(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
}

impl GameConfig {
    /// Validate every section, returning all errors found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        positive(&mut errors, "sim.fixed_timestep", self.sim.fixed_timestep);
        positive(&mut errors, "sim.detection_interval", self.sim.detection_interval);
        if self.sim.max_steps_per_frame == 0 {
            errors.push(ConfigError::NotPositive {
                field: "sim.max_steps_per_frame",
                value: 0.0,
            });
        }

        let w = &self.wave;
        if w.octaves == 0 {
            errors.push(ConfigError::NoOctaves);
        }
        in_range(&mut errors, "wave.base_height", w.base_height, 0.0, 50.0);
        positive(&mut errors, "wave.noise_scale", w.noise_scale);
        positive(&mut errors, "wave.frequency", w.frequency);
        in_range(&mut errors, "wave.persistence", w.persistence, 0.0, 1.0);
        positive(&mut errors, "wave.lacunarity", w.lacunarity);
        positive(&mut errors, "wave.normal_delta", w.normal_delta);
        if w.cache_enabled {
            positive(&mut errors, "wave.cache_cell_size", w.cache_cell_size);
        }

        let b = &self.buoyancy;
        positive(&mut errors, "buoyancy.water_density", b.water_density);
        positive(&mut errors, "buoyancy.buoyancy_coefficient", b.buoyancy_coefficient);
        in_range(&mut errors, "buoyancy.damping", b.damping, 0.0, f32::MAX);

        let m = &self.movement;
        positive(&mut errors, "movement.max_speed", m.max_speed);
        in_range(&mut errors, "movement.acceleration", m.acceleration, 0.0, f32::MAX);
        in_range(&mut errors, "movement.drift_decay", m.drift_decay, 0.0, 1.0);
        in_range(&mut errors, "movement.lateral_damping", m.lateral_damping, 0.0, f32::MAX);
        in_range(&mut errors, "movement.tilt_speed", m.tilt_speed, 0.0, f32::MAX);

        let wp = &self.weapon;
        positive(&mut errors, "weapon.fire_rate", wp.fire_rate);
        in_range(&mut errors, "weapon.reload_time", wp.reload_time, 0.0, f32::MAX);
        if wp.max_ammo == 0 && !wp.infinite_ammo {
            errors.push(ConfigError::EmptyMagazine);
        }
        positive(&mut errors, "weapon.projectile.speed", wp.projectile.speed);
        positive(&mut errors, "weapon.projectile.lifetime", wp.projectile.lifetime);
        positive(&mut errors, "weapon.projectile.mass", wp.projectile.mass);
        in_range(&mut errors, "weapon.projectile.damage", wp.projectile.damage, 0.0, f32::MAX);
        in_range(
            &mut errors,
            "weapon.projectile.weak_point_multiplier",
            wp.projectile.weak_point_multiplier,
            0.0,
            f32::MAX,
        );

        let h = &self.health;
        positive(&mut errors, "health.max_health", h.max_health);
        in_range(&mut errors, "health.damage_multiplier", h.damage_multiplier, 0.0, f32::MAX);
        in_range(&mut errors, "health.armor_reduction", h.armor_reduction, 0.0, 1.0);
        in_range(&mut errors, "health.regen_rate", h.regen_rate, 0.0, f32::MAX);
        in_range(&mut errors, "health.regen_delay", h.regen_delay, 0.0, f32::MAX);

        let a = &self.ai;
        positive(&mut errors, "ai.detection_range", a.detection_range);
        positive(&mut errors, "ai.attack_range", a.attack_range);
        if a.attack_range > a.detection_range {
            errors.push(ConfigError::AttackBeyondDetection {
                attack: a.attack_range,
                detection: a.detection_range,
            });
        }
        if a.lose_target_range < a.detection_range {
            errors.push(ConfigError::LoseTargetInsideDetection {
                lose: a.lose_target_range,
                detection: a.detection_range,
            });
        }
        in_range(&mut errors, "ai.evasion_chance", a.evasion_chance, 0.0, 1.0);
        in_range(&mut errors, "ai.fire_accuracy", a.fire_accuracy, 0.0, 1.0);
        in_range(&mut errors, "ai.retreat_health_fraction", a.retreat_health_fraction, 0.0, 1.0);
        positive(&mut errors, "ai.fire_rate", a.fire_rate);
        positive(&mut errors, "ai.difficulty_ceiling", a.difficulty_ceiling);

        let c = &self.capture;
        positive(&mut errors, "capture.capture_range", c.capture_range);
        positive(&mut errors, "capture.capture_time", c.capture_time);
        in_range(&mut errors, "capture.decay_rate", c.decay_rate, 0.0, f32::MAX);
        in_range(&mut errors, "capture.health_threshold", c.health_threshold, 0.0, 1.0);
        in_range(&mut errors, "capture.damage_penalty", c.damage_penalty, 0.0, 1.0);

        let g = &self.grapple;
        positive(&mut errors, "grapple.max_range", g.max_range);
        positive(&mut errors, "grapple.launch_speed", g.launch_speed);
        in_range(&mut errors, "grapple.cooldown", g.cooldown, 0.0, f32::MAX);
        in_range(&mut errors, "grapple.stiffness", g.stiffness, 0.0, f32::MAX);
        in_range(&mut errors, "grapple.damping", g.damping, 0.0, f32::MAX);
        positive(&mut errors, "grapple.break_distance", g.break_distance);
        if g.rope_segments < 2 {
            errors.push(ConfigError::OutOfRange {
                field: "grapple.rope_segments",
                value: g.rope_segments as f32,
                min: 2.0,
                max: f32::MAX,
            });
        }

        positive(&mut errors, "zipline.travel_speed", self.zipline.travel_speed);

        let d = &self.difficulty;
        positive(&mut errors, "difficulty.min_level", d.min_level);
        if d.max_level < d.min_level {
            errors.push(ConfigError::OutOfRange {
                field: "difficulty.max_level",
                value: d.max_level,
                min: d.min_level,
                max: f32::MAX,
            });
        }

        positive(&mut errors, "pools.effect_lifetime", self.pools.effect_lifetime);

        let s = &self.spawner;
        if s.enabled {
            positive(&mut errors, "spawner.interval", s.interval);
            if s.weights.total() <= 0.0 {
                errors.push(ConfigError::EmptySpawnWeights);
            }
            if s.min_radius > s.max_radius {
                errors.push(ConfigError::InvertedSpawnRing {
                    min: s.min_radius,
                    max: s.max_radius,
                });
            }
        }

        errors
    }
}
