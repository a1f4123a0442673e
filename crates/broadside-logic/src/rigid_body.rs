//! Rigid body state and semi-implicit Euler integration.
//!
//! Forces and torques accumulate during a tick and are consumed by
//! [`RigidBody::integrate`]. There is no implicit gravity: the buoyancy pass
//! adds it as an ordinary force so it balances deterministically against the
//! water.
//!
//! Local axes: +Z forward, +X right, +Y up.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody {
    pub mass: f32,
    pub drag: f32,
    pub angular_drag: f32,
    /// Diagonal of the inertia tensor in local space.
    pub inertia: Vec3,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    force: Vec3,
    torque: Vec3,
}

impl RigidBody {
    /// Body with box inertia for the given hull half-extents.
    pub fn new(mass: f32, half_extents: Vec3) -> Self {
        let mass = mass.max(f32::EPSILON);
        let size = half_extents * 2.0;
        let inertia = Vec3::new(
            mass * (size.y * size.y + size.z * size.z) / 12.0,
            mass * (size.x * size.x + size.z * size.z) / 12.0,
            mass * (size.x * size.x + size.y * size.y) / 12.0,
        )
        .max(Vec3::splat(f32::EPSILON));
        Self {
            mass,
            drag: 0.1,
            angular_drag: 0.5,
            inertia,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        }
    }

    pub fn with_pose(mut self, position: Vec3, rotation: Quat) -> Self {
        self.position = position;
        self.rotation = rotation.normalize();
        self
    }

    pub fn with_drag(mut self, drag: f32, angular_drag: f32) -> Self {
        self.drag = drag.max(0.0);
        self.angular_drag = angular_drag.max(0.0);
        self
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Speed on the XZ plane; vertical bobbing does not count.
    pub fn horizontal_speed(&self) -> f32 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z).length()
    }

    /// Transform a local-space offset into world space.
    pub fn world_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Velocity of a world-space point rigidly attached to the body.
    pub fn point_velocity(&self, world_point: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(world_point - self.position)
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    pub fn add_force_at_position(&mut self, force: Vec3, world_point: Vec3) {
        self.force += force;
        self.torque += (world_point - self.position).cross(force);
    }

    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    pub fn add_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse / self.mass;
    }

    pub fn add_impulse_at_position(&mut self, impulse: Vec3, world_point: Vec3) {
        self.velocity += impulse / self.mass;
        let angular = (world_point - self.position).cross(impulse);
        self.angular_velocity += self.world_inverse_inertia(angular);
    }

    /// Accumulated force this tick, before integration.
    pub fn pending_force(&self) -> Vec3 {
        self.force
    }

    /// Zero all motion and pending forces.
    pub fn stop(&mut self) {
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.clear_forces();
    }

    pub fn clear_forces(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    fn world_inverse_inertia(&self, world: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * world;
        self.rotation * (local / self.inertia)
    }

    /// Advance one step: velocities from forces first, then pose from the
    /// new velocities. Accumulators are cleared afterwards.
    pub fn integrate(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.velocity += self.force / self.mass * dt;
        self.velocity /= 1.0 + self.drag * dt;

        self.angular_velocity += self.world_inverse_inertia(self.torque) * dt;
        self.angular_velocity /= 1.0 + self.angular_drag * dt;

        self.position += self.velocity * dt;
        let spin = Quat::from_scaled_axis(self.angular_velocity * dt);
        self.rotation = (spin * self.rotation).normalize();

        self.clear_forces();
    }
}
