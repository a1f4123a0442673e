//! Helm response: thrust, speed-dependent steering, lateral damping, drift.
//!
//! Control input is two bounded scalars. Thrust only pushes while the hull
//! is under `max_speed`; the turn rate blends from the low-speed to the
//! high-speed value as speed rises, so fast boats turn wide. Sideways motion
//! is bled off every tick, and at zero throttle horizontal velocity decays
//! geometrically instead of snapping to zero.
//!
//! Tilt is cosmetic. [`TiltState`] eases toward a roll/pitch target derived
//! from the input and is never fed back into the rigid body.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::MovementConfig;
use crate::constants::PITCH_THROTTLE_FACTOR;
use crate::rigid_body::RigidBody;

/// Steering in [-1, 1] (positive turns right), throttle in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlInput {
    pub steering: f32,
    pub throttle: f32,
}

impl ControlInput {
    /// Build an input, clamping both axes into range. NaN becomes zero.
    pub fn new(steering: f32, throttle: f32) -> Self {
        let steering = if steering.is_nan() { 0.0 } else { steering };
        let throttle = if throttle.is_nan() { 0.0 } else { throttle };
        Self {
            steering: steering.clamp(-1.0, 1.0),
            throttle: throttle.clamp(0.0, 1.0),
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }
}

/// Angular acceleration per unit steering at the given speed.
pub fn turn_rate(speed: f32, config: &MovementConfig) -> f32 {
    let t = if config.max_speed > 0.0 {
        (speed / config.max_speed).clamp(0.0, 1.0)
    } else {
        1.0
    };
    config.low_speed_turn_rate + (config.high_speed_turn_rate - config.low_speed_turn_rate) * t
}

/// Forward thrust force, zero at or above `max_speed`.
pub fn thrust_force(input: ControlInput, forward: Vec3, speed: f32, mass: f32, config: &MovementConfig) -> Vec3 {
    if input.throttle <= 0.0 || speed >= config.max_speed {
        return Vec3::ZERO;
    }
    let flat = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
    flat * input.throttle * config.acceleration * mass
}

/// Yaw torque about the body's up axis.
pub fn steering_torque(input: ControlInput, up: Vec3, speed: f32, inertia_y: f32, config: &MovementConfig) -> Vec3 {
    up * input.steering * turn_rate(speed, config) * inertia_y
}

/// Remove part of the sideways velocity. Returns the corrected velocity.
pub fn damp_lateral(velocity: Vec3, right: Vec3, dt: f32, config: &MovementConfig) -> Vec3 {
    let side = Vec3::new(right.x, 0.0, right.z).normalize_or_zero();
    let lateral = side * velocity.dot(side);
    velocity - lateral * (config.lateral_damping * dt).clamp(0.0, 1.0)
}

/// One tick of geometric drift decay on the horizontal components.
pub fn drift(velocity: Vec3, config: &MovementConfig) -> Vec3 {
    Vec3::new(
        velocity.x * config.drift_decay,
        velocity.y,
        velocity.z * config.drift_decay,
    )
}

/// Apply one tick of helm forces and velocity corrections to `body`.
pub fn apply_helm(body: &mut RigidBody, input: ControlInput, dt: f32, config: &MovementConfig) {
    let speed = body.horizontal_speed();
    let thrust = thrust_force(input, body.forward(), speed, body.mass, config);
    body.add_force(thrust);

    let torque = steering_torque(input, body.up(), speed, body.inertia.y, config);
    body.add_torque(torque);

    body.velocity = damp_lateral(body.velocity, body.right(), dt, config);
    if input.throttle <= 0.0 {
        body.velocity = drift(body.velocity, config);
    }
}

/// Cosmetic roll and pitch, eased toward the control input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TiltState {
    pub roll: f32,
    pub pitch: f32,
}

impl TiltState {
    pub fn target(input: ControlInput, config: &MovementConfig) -> (f32, f32) {
        (
            -input.steering * config.max_roll,
            -input.throttle * config.max_pitch * PITCH_THROTTLE_FACTOR,
        )
    }

    pub fn update(&mut self, input: ControlInput, dt: f32, config: &MovementConfig) {
        let (roll, pitch) = Self::target(input, config);
        let k = (config.tilt_speed * dt).clamp(0.0, 1.0);
        self.roll += (roll - self.roll) * k;
        self.pitch += (pitch - self.pitch) * k;
    }

    /// Local-space rotation to layer on top of the hull pose for rendering.
    pub fn offset(&self) -> Quat {
        Quat::from_rotation_z(self.roll) * Quat::from_rotation_x(self.pitch)
    }
}
