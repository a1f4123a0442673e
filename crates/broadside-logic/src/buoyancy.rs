//! Per-point buoyancy and damping.
//!
//! Each buoyancy point is evaluated on its own. A submerged point pushes up
//! with `water_density * depth * coefficient` and resists its own heave
//! velocity in proportion to how deep it sits, which keeps hulls from
//! bouncing forever. Horizontal motion is left to the helm's drag model.

use glam::Vec3;

use crate::config::BuoyancyConfig;

/// Depth of a point below the displaced surface. Positive means submerged.
pub fn submersion_depth(point_y: f32, wave_height: f32, config: &BuoyancyConfig) -> f32 {
    config.water_level + wave_height * config.wave_height_multiplier - point_y
}

/// Upward force magnitude at a point `depth` meters under water.
pub fn buoyant_force(depth: f32, config: &BuoyancyConfig) -> f32 {
    if depth <= 0.0 {
        return 0.0;
    }
    config.water_density * depth * config.buoyancy_coefficient
}

/// Damping force opposing the vertical point velocity, scaled by depth.
pub fn damping_force(point_velocity: Vec3, depth: f32, config: &BuoyancyConfig) -> Vec3 {
    if depth <= 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(0.0, -point_velocity.y * config.damping * depth, 0.0)
}

/// Total force applied at one buoyancy point.
pub fn point_force(point_y: f32, point_velocity: Vec3, wave_height: f32, config: &BuoyancyConfig) -> Vec3 {
    let depth = submersion_depth(point_y, wave_height, config);
    Vec3::Y * buoyant_force(depth, config) + damping_force(point_velocity, depth, config)
}

/// Manual gravity for a body of `mass`.
pub fn gravity_force(mass: f32, config: &BuoyancyConfig) -> Vec3 {
    Vec3::new(0.0, -mass * config.gravity, 0.0)
}

/// Depth at which `points` equal points exactly float a body of `mass`.
pub fn equilibrium_depth(mass: f32, points: usize, config: &BuoyancyConfig) -> f32 {
    if points == 0 {
        return f32::INFINITY;
    }
    mass * config.gravity / (points as f32 * config.water_density * config.buoyancy_coefficient)
}
