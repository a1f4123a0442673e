//! Enemy AI: state transitions, fire pacing, lead prediction and steering.
//!
//! [`next_state`] is a total function of the situation and two random rolls,
//! so identical inputs always produce the same state. [`AiBrain`] wraps it
//! with the timers it needs: the evasion clock and the trigger cadence.
//!
//! Transitions (evaluated once per detection interval):
//!
//! | From | To | When |
//! |------|----|------|
//! | Patrol | Pursue | a living target is within detection range |
//! | Pursue | Attack / Flank | distance ≤ attack range (Tactical may Flank) |
//! | Attack, Flank | Pursue | distance > attack range × 1.2 |
//! | any combat | Patrol | target lost (dead, gone, or beyond lose range) |
//! | Pursue, Attack, Flank | Evade | evasion roll succeeds |
//! | Evade | prior state | evasion timer expires |
//! | Retreat | Attack | health above the retreat gate and not Defensive |
//!
//! Difficulty multiplies detection range, fire rate and accuracy, capped at
//! the AI's own ceiling.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::constants::{ATTACK_RANGE_HYSTERESIS, TACTICAL_FLANK_PREFERENCE};
use crate::timer::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    Patrol,
    Pursue,
    Attack,
    Flank,
    Evade,
    Retreat,
}

impl AiState {
    /// States in which the AI aims and fires at its target.
    pub fn is_engaged(self) -> bool {
        matches!(self, AiState::Pursue | AiState::Attack | AiState::Flank | AiState::Evade)
    }

    pub fn label(self) -> &'static str {
        match self {
            AiState::Patrol => "patrol",
            AiState::Pursue => "pursue",
            AiState::Attack => "attack",
            AiState::Flank => "flank",
            AiState::Evade => "evade",
            AiState::Retreat => "retreat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Personality {
    Aggressive,
    Defensive,
    Balanced,
    Tactical,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Aggressive,
        Personality::Defensive,
        Personality::Balanced,
        Personality::Tactical,
    ];
}

/// Everything [`next_state`] looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiSituation {
    pub state: AiState,
    /// State to return to when an evasion ends.
    pub prior: Option<AiState>,
    /// Distance to the current living target, `None` if there is none.
    pub target_distance: Option<f32>,
    pub health_fraction: f32,
    pub personality: Personality,
    pub evade_expired: bool,
    pub difficulty: f32,
    /// Uniform roll in [0, 1) for the Tactical flank preference.
    pub flank_roll: f32,
    /// Uniform roll in [0, 1) for the evasion trigger.
    pub evade_roll: f32,
}

/// Difficulty actually honoured by this AI.
pub fn effective_difficulty(difficulty: f32, config: &AiConfig) -> f32 {
    difficulty.clamp(0.0, config.difficulty_ceiling)
}

pub fn effective_detection_range(difficulty: f32, config: &AiConfig) -> f32 {
    config.detection_range * effective_difficulty(difficulty, config)
}

/// Seconds between trigger pulls.
pub fn fire_interval(difficulty: f32, config: &AiConfig) -> f32 {
    let rate = config.fire_rate * effective_difficulty(difficulty, config);
    if rate > 0.0 {
        1.0 / rate
    } else {
        f32::INFINITY
    }
}

/// Probability that a trigger pull is taken.
pub fn hit_chance(difficulty: f32, config: &AiConfig) -> f32 {
    (config.fire_accuracy * effective_difficulty(difficulty, config)).clamp(0.0, 1.0)
}

fn target_lost(s: &AiSituation, config: &AiConfig) -> bool {
    match s.target_distance {
        None => true,
        Some(d) => d > config.lose_target_range,
    }
}

/// Next state for the given situation.
pub fn next_state(s: &AiSituation, config: &AiConfig) -> AiState {
    if s.state != AiState::Patrol && target_lost(s, config) {
        return AiState::Patrol;
    }

    let evades = || s.evade_roll < config.evasion_chance;

    match s.state {
        AiState::Patrol => match s.target_distance {
            Some(d) if d <= effective_detection_range(s.difficulty, config) => AiState::Pursue,
            _ => AiState::Patrol,
        },
        AiState::Pursue => {
            let d = s.target_distance.unwrap_or(f32::INFINITY);
            if d <= config.attack_range {
                if s.personality == Personality::Tactical && s.flank_roll < TACTICAL_FLANK_PREFERENCE {
                    AiState::Flank
                } else {
                    AiState::Attack
                }
            } else if evades() {
                AiState::Evade
            } else {
                AiState::Pursue
            }
        }
        AiState::Attack | AiState::Flank => {
            let d = s.target_distance.unwrap_or(f32::INFINITY);
            if d > config.attack_range * ATTACK_RANGE_HYSTERESIS {
                AiState::Pursue
            } else if evades() {
                AiState::Evade
            } else {
                s.state
            }
        }
        AiState::Evade => {
            if s.evade_expired {
                s.prior.unwrap_or(AiState::Pursue)
            } else {
                AiState::Evade
            }
        }
        AiState::Retreat => {
            if s.health_fraction <= config.retreat_health_fraction
                || s.personality == Personality::Defensive
            {
                AiState::Retreat
            } else {
                AiState::Attack
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiTransition {
    pub from: AiState,
    pub to: AiState,
}

/// Result of one trigger-cadence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPull {
    /// Cadence not elapsed.
    Hold,
    /// Window elapsed but the accuracy roll failed.
    Skip,
    Fire,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiBrain {
    pub state: AiState,
    pub prior: Option<AiState>,
    pub personality: Personality,
    pub difficulty: f32,
    pub evade: Option<Timer>,
    /// Seconds until the next trigger window.
    pub fire_cooldown: f32,
}

impl AiBrain {
    pub fn new(personality: Personality) -> Self {
        Self {
            state: AiState::Patrol,
            prior: None,
            personality,
            difficulty: 1.0,
            evade: None,
            fire_cooldown: 0.0,
        }
    }

    /// Advance the evasion and trigger clocks.
    pub fn tick(&mut self, dt: f32) {
        if let Some(timer) = self.evade.as_mut() {
            timer.tick(dt);
        }
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
    }

    /// Run one detection-interval evaluation.
    pub fn evaluate(
        &mut self,
        target_distance: Option<f32>,
        health_fraction: f32,
        flank_roll: f32,
        evade_roll: f32,
        config: &AiConfig,
    ) -> Option<AiTransition> {
        let situation = AiSituation {
            state: self.state,
            prior: self.prior,
            target_distance,
            health_fraction,
            personality: self.personality,
            evade_expired: self.evade.map_or(true, |t| t.finished()),
            difficulty: self.difficulty,
            flank_roll,
            evade_roll,
        };
        let next = next_state(&situation, config);
        self.set_state(next, config)
    }

    fn set_state(&mut self, next: AiState, config: &AiConfig) -> Option<AiTransition> {
        let from = self.state;
        if next == from {
            return None;
        }
        if next == AiState::Evade {
            self.prior = Some(from);
            self.evade = Some(Timer::new(config.evasion_duration));
        } else {
            self.prior = None;
            self.evade = None;
        }
        self.state = next;
        Some(AiTransition { from, to: next })
    }

    /// Explicit retreat order. The next evaluation decides whether it holds.
    pub fn order_retreat(&mut self, config: &AiConfig) -> Option<AiTransition> {
        self.set_state(AiState::Retreat, config)
    }

    /// Abort an evasion and return to the state it interrupted.
    pub fn cancel_evade(&mut self, config: &AiConfig) -> Option<AiTransition> {
        if self.state != AiState::Evade {
            return None;
        }
        let back = self.prior.unwrap_or(AiState::Pursue);
        self.set_state(back, config)
    }

    /// Back to a freshly spawned brain.
    pub fn reset(&mut self) {
        self.state = AiState::Patrol;
        self.prior = None;
        self.evade = None;
        self.fire_cooldown = 0.0;
    }

    /// Check the trigger cadence. Each elapsed window is spent whether or not
    /// the accuracy roll succeeds.
    pub fn pull_trigger(&mut self, accuracy_roll: f32, config: &AiConfig) -> TriggerPull {
        if !self.state.is_engaged() || self.fire_cooldown > 0.0 {
            return TriggerPull::Hold;
        }
        self.fire_cooldown = fire_interval(self.difficulty, config);
        if accuracy_roll < hit_chance(self.difficulty, config) {
            TriggerPull::Fire
        } else {
            TriggerPull::Skip
        }
    }
}

/// Predicted aim point: `target + velocity * (distance / projectile_speed)`.
pub fn lead_target(shooter: Vec3, target: Vec3, target_velocity: Vec3, projectile_speed: f32) -> Vec3 {
    if projectile_speed <= 0.0 {
        return target;
    }
    let time = shooter.distance(target) / projectile_speed;
    target + target_velocity * time
}

/// Ease a mount rotation toward facing `aim_point`.
pub fn aim_rotation(current: Quat, mount: Vec3, aim_point: Vec3, rate: f32, dt: f32) -> Quat {
    let dir = (aim_point - mount).normalize_or_zero();
    if dir == Vec3::ZERO {
        return current;
    }
    let desired = Quat::from_rotation_arc(Vec3::Z, dir);
    current.slerp(desired, (rate * dt).clamp(0.0, 1.0)).normalize()
}

/// Signed yaw from `forward` to `desired` on the water plane. Positive means
/// the desired heading is to starboard.
pub fn heading_error(forward: Vec3, desired: Vec3) -> f32 {
    let f = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
    let d = Vec3::new(desired.x, 0.0, desired.z).normalize_or_zero();
    if f == Vec3::ZERO || d == Vec3::ZERO {
        return 0.0;
    }
    (f.z * d.x - f.x * d.z).atan2(f.x * d.x + f.z * d.z)
}

/// Steering scalar in [-1, 1] that turns `forward` toward `desired`.
pub fn steer_toward(forward: Vec3, desired: Vec3) -> f32 {
    (heading_error(forward, desired) / FRAC_PI_2).clamp(-1.0, 1.0)
}

/// Inputs for [`steering_goal`].
#[derive(Debug, Clone, Copy)]
pub struct SteeringContext {
    pub position: Vec3,
    pub target: Option<Vec3>,
    pub waypoint: Vec3,
    /// Seconds spent in the current evasion, drives the zig-zag.
    pub evade_elapsed: f32,
}

/// World-space point to head for and the throttle to use, per state.
pub fn steering_goal(state: AiState, ctx: &SteeringContext, config: &AiConfig) -> (Vec3, f32) {
    let target = match (state, ctx.target) {
        (AiState::Patrol, _) | (_, None) => return (ctx.waypoint, config.patrol_throttle),
        (_, Some(t)) => t,
    };
    let to_target = Vec3::new(target.x - ctx.position.x, 0.0, target.z - ctx.position.z);
    let distance = to_target.length();
    let toward = to_target.normalize_or_zero();
    let away = -toward;

    match state {
        AiState::Patrol => (ctx.waypoint, config.patrol_throttle),
        AiState::Pursue => (target, 1.0),
        AiState::Attack => {
            let throttle = if config.preferred_distance > 0.0 {
                (distance / config.preferred_distance).clamp(0.2, 1.0)
            } else {
                1.0
            };
            (target, throttle)
        }
        AiState::Flank => {
            let side = Vec3::new(-toward.z, 0.0, toward.x);
            let sign = if (ctx.position - target).dot(side) >= 0.0 { 1.0 } else { -1.0 };
            (target + side * sign * config.flank_distance, 1.0)
        }
        AiState::Evade => {
            let swing = (ctx.evade_elapsed * PI).sin() * (PI / 4.0);
            let dir = Quat::from_rotation_y(swing) * away;
            (ctx.position + dir * config.flank_distance, 1.0)
        }
        AiState::Retreat => (ctx.position + away * config.lose_target_range, 1.0),
    }
}

/// Patrol waypoint within `radius` of `home` from two uniform rolls.
pub fn patrol_waypoint(home: Vec3, radius: f32, angle_roll: f32, distance_roll: f32) -> Vec3 {
    let angle = angle_roll * 2.0 * PI;
    let r = radius * distance_roll.clamp(0.0, 1.0).sqrt();
    home + Vec3::new(angle.sin() * r, 0.0, angle.cos() * r)
}
