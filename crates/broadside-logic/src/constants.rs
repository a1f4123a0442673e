//! Game constants: physics, collider layers, scoring.
//!
//! Plain constants with no runtime dependency. Tunables that designers are
//! expected to adjust live in [`crate::config`] instead.

/// Gravitational acceleration in m/s². Applied manually, never by an engine.
pub const GRAVITY: f32 = 9.81;

/// Factor applied to `attack_range` before an engaged AI falls back to Pursue.
pub const ATTACK_RANGE_HYSTERESIS: f32 = 1.2;

/// Share of the projectile momentum transferred to the struck body.
pub const HIT_IMPULSE_FACTOR: f32 = 0.5;

/// Pitch target uses half of `max_pitch` per unit of throttle.
pub const PITCH_THROTTLE_FACTOR: f32 = 0.5;

/// Probability that a `Tactical` AI picks Flank over Attack on engagement.
pub const TACTICAL_FLANK_PREFERENCE: f32 = 0.6;

/// Collider layers. Each collider lives on exactly one layer; masks are
/// bit sets of layers.
pub mod layers {
    pub const HULL: u8 = 0;
    pub const WEAK_POINT: u8 = 1;
    pub const WATER: u8 = 2;
}

/// Score awarded per session event.
pub mod points {
    pub const ENEMY_DESTROYED: u32 = 100;
    pub const ENEMY_CAPTURED: u32 = 250;
    pub const WEAK_POINT_HIT: u32 = 10;
    pub const VESSEL_BOARDED: u32 = 50;
}

/// Effect names sent to the presentation layer.
pub mod effects {
    pub const MUZZLE_FLASH: &str = "muzzle_flash";
    pub const HIT_SPARKS: &str = "hit_sparks";
    pub const WEAK_POINT_BURST: &str = "weak_point_burst";
    pub const SPLASH: &str = "splash";
    pub const EXPLOSION: &str = "explosion";
    pub const CAPTURE_FLAG: &str = "capture_flag";
    pub const GRAPPLE_IMPACT: &str = "grapple_impact";
    pub const ZIPLINE_WIND: &str = "zipline_wind";
    pub const ZIPLINE_SPARKS: &str = "zipline_sparks";
}
