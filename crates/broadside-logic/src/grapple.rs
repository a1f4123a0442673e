//! Grapple launcher, spring link, rope visual and zipline transit.
//!
//! ```text
//! Idle ──launch──▶ Launching ──hit──▶ Attached ──detach/break──▶ Idle
//!                      └────miss─────────────────────────────────▶ Idle
//! ```
//!
//! While attached, a [`SpringConstraint`] pulls the two hulls together only
//! when the rope is stretched past the length it had at attach time. The
//! rope itself is purely visual: points relax toward a sagging line instead
//! of snapping to it.

use std::f32::consts::PI;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{GrappleConfig, ZiplineConfig};
use crate::timer::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchError {
    OnCooldown,
    /// Already launching or attached.
    Busy,
    OutOfRange,
}

impl std::fmt::Display for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchError::OnCooldown => write!(f, "grapple is on cooldown"),
            LaunchError::Busy => write!(f, "grapple is already in use"),
            LaunchError::OutOfRange => write!(f, "target is beyond grapple range"),
        }
    }
}

impl std::error::Error for LaunchError {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringConstraint {
    pub stiffness: f32,
    pub damping: f32,
    pub max_length: f32,
}

impl SpringConstraint {
    /// Force on the body holding `a`; the body holding `b` gets the negation.
    /// Zero while the rope is slack.
    pub fn force(&self, a: Vec3, velocity_a: Vec3, b: Vec3, velocity_b: Vec3) -> Vec3 {
        let delta = b - a;
        let length = delta.length();
        if length <= self.max_length || length <= f32::EPSILON {
            return Vec3::ZERO;
        }
        let dir = delta / length;
        let stretch = length - self.max_length;
        let stretch_rate = (velocity_b - velocity_a).dot(dir);
        let magnitude = (self.stiffness * stretch + self.damping * stretch_rate).max(0.0);
        dir * magnitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GrappleState {
    Idle,
    Launching { origin: Vec3, aim: Vec3, flight: Timer },
    Attached { link: SpringConstraint },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrapplePhase {
    Idle,
    Launching,
    Attached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grapple {
    pub state: GrappleState,
    /// Seconds until the next launch is allowed.
    pub cooldown: f32,
}

impl Default for Grapple {
    fn default() -> Self {
        Self::new()
    }
}

impl Grapple {
    pub fn new() -> Self {
        Self {
            state: GrappleState::Idle,
            cooldown: 0.0,
        }
    }

    pub fn phase(&self) -> GrapplePhase {
        match self.state {
            GrappleState::Idle => GrapplePhase::Idle,
            GrappleState::Launching { .. } => GrapplePhase::Launching,
            GrappleState::Attached { .. } => GrapplePhase::Attached,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.phase() == GrapplePhase::Attached
    }

    pub fn link(&self) -> Option<&SpringConstraint> {
        match &self.state {
            GrappleState::Attached { link } => Some(link),
            _ => None,
        }
    }

    /// Fire the hook from `origin` toward `aim`.
    pub fn launch(&mut self, origin: Vec3, aim: Vec3, config: &GrappleConfig) -> Result<(), LaunchError> {
        if self.cooldown > 0.0 {
            return Err(LaunchError::OnCooldown);
        }
        if self.phase() != GrapplePhase::Idle {
            return Err(LaunchError::Busy);
        }
        let distance = origin.distance(aim);
        if distance > config.max_range {
            return Err(LaunchError::OutOfRange);
        }
        self.state = GrappleState::Launching {
            origin,
            aim,
            flight: Timer::new(distance / config.launch_speed),
        };
        Ok(())
    }

    /// Advance cooldown and hook flight. Returns the arrival point on the
    /// tick the hook lands; the caller then decides hit or miss.
    pub fn tick(&mut self, dt: f32) -> Option<Vec3> {
        self.cooldown = (self.cooldown - dt).max(0.0);
        match &mut self.state {
            GrappleState::Launching { aim, flight, .. } => flight.tick(dt).then_some(*aim),
            _ => None,
        }
    }

    /// Current hook position while in flight.
    pub fn hook_position(&self) -> Option<Vec3> {
        match &self.state {
            GrappleState::Launching { origin, aim, flight } => Some(origin.lerp(*aim, flight.fraction())),
            _ => None,
        }
    }

    /// Link up. The rest length is the anchor distance at this moment.
    pub fn attach(&mut self, anchor_distance: f32, config: &GrappleConfig) {
        self.state = GrappleState::Attached {
            link: SpringConstraint {
                stiffness: config.stiffness,
                damping: config.damping,
                max_length: anchor_distance.max(0.0),
            },
        };
    }

    pub fn miss(&mut self, config: &GrappleConfig) {
        self.state = GrappleState::Idle;
        self.cooldown = config.cooldown;
    }

    /// Release the link or abort a flight. Returns false if already idle.
    pub fn detach(&mut self, config: &GrappleConfig) -> bool {
        if self.phase() == GrapplePhase::Idle {
            return false;
        }
        self.state = GrappleState::Idle;
        self.cooldown = config.cooldown;
        true
    }

    /// Force on the launcher's anchor, zero unless attached.
    pub fn constraint_force(&self, a: Vec3, velocity_a: Vec3, b: Vec3, velocity_b: Vec3) -> Vec3 {
        self.link()
            .map_or(Vec3::ZERO, |link| link.force(a, velocity_a, b, velocity_b))
    }

    pub fn should_break(anchor_distance: f32, config: &GrappleConfig) -> bool {
        anchor_distance > config.break_distance
    }
}

/// Rope points for rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RopeVisual {
    pub points: Vec<Vec3>,
}

impl RopeVisual {
    fn ensure(&mut self, segments: usize, start: Vec3, end: Vec3) {
        let count = segments.max(1) + 1;
        if self.points.len() != count {
            self.points = (0..count)
                .map(|i| start.lerp(end, i as f32 / (count - 1) as f32))
                .collect();
        }
    }

    /// Snap to a straight line, used while the hook is in flight.
    pub fn set_straight(&mut self, start: Vec3, end: Vec3, segments: usize) {
        self.ensure(segments, start, end);
        let n = (self.points.len() - 1) as f32;
        for (i, p) in self.points.iter_mut().enumerate() {
            *p = start.lerp(end, i as f32 / n);
        }
    }

    /// Relax toward a sagging line between the anchors.
    pub fn relax(&mut self, start: Vec3, end: Vec3, sag: f32, segments: usize, smoothing: f32, dt: f32) {
        self.ensure(segments, start, end);
        let n = (self.points.len() - 1) as f32;
        let k = (smoothing * dt).clamp(0.0, 1.0);
        for (i, p) in self.points.iter_mut().enumerate() {
            let t = i as f32 / n;
            let target = start.lerp(end, t) - Vec3::Y * sag * (PI * t).sin();
            *p += (target - *p) * k;
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// Sag for a rope of rest length `max_length` whose anchors are `distance`
/// apart. A taut rope is straight.
pub fn rope_sag(distance: f32, max_length: f32, config: &GrappleConfig) -> f32 {
    if max_length <= 0.0 {
        return 0.0;
    }
    let slack = 1.0 - (distance / max_length).clamp(0.0, 1.0);
    config.rope_sag * slack.max(0.15)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZiplineError {
    NotAttached,
    AlreadyRiding,
    NoController,
}

impl std::fmt::Display for ZiplineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZiplineError::NotAttached => write!(f, "no attached grapple to ride"),
            ZiplineError::AlreadyRiding => write!(f, "zipline already in transit"),
            ZiplineError::NoController => write!(f, "vessel has no player controls"),
        }
    }
}

impl std::error::Error for ZiplineError {}

/// Transit along the rope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zipline {
    pub travel: Timer,
}

impl Zipline {
    pub fn start(distance: f32, config: &ZiplineConfig) -> Self {
        Self {
            travel: Timer::new(distance.max(0.0) / config.travel_speed),
        }
    }

    /// Returns true on arrival.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.travel.tick(dt)
    }

    /// Smoothstep of raw progress.
    pub fn eased(&self) -> f32 {
        let t = self.travel.fraction();
        t * t * (3.0 - 2.0 * t)
    }

    pub fn position(&self, start: Vec3, end: Vec3) -> Vec3 {
        start.lerp(end, self.eased())
    }
}
