//! AI, capture and grapple components.

use broadside_logic::ai::{AiBrain, Personality};
use broadside_logic::capture::CaptureTracker;
use broadside_logic::config::{AiConfig, CaptureConfig, GrappleConfig};
use broadside_logic::grapple::{Grapple, RopeVisual};
use glam::Vec3;
use hecs::Entity;

/// Enemy brain plus its weak target reference.
#[derive(Debug, Clone)]
pub struct AiController {
    pub brain: AiBrain,
    pub config: AiConfig,
    /// Cleared whenever the target dies, despawns or escapes.
    pub target: Option<Entity>,
    /// Centre of the patrol area.
    pub home: Vec3,
    pub waypoint: Vec3,
    pub enabled: bool,
}

impl AiController {
    pub fn new(personality: Personality, config: AiConfig, home: Vec3) -> Self {
        Self {
            brain: AiBrain::new(personality),
            config,
            target: None,
            home,
            waypoint: home,
            enabled: true,
        }
    }
}

/// Capture state held by a capturable enemy.
#[derive(Debug, Clone)]
pub struct Capturable {
    pub tracker: CaptureTracker,
    pub config: CaptureConfig,
    pub enabled: bool,
}

impl Capturable {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            tracker: CaptureTracker::new(),
            config,
            enabled: true,
        }
    }
}

/// Grapple gear. While attached, `target` and `anchor` describe the link.
#[derive(Debug, Clone)]
pub struct GrappleLauncher {
    pub grapple: Grapple,
    pub config: GrappleConfig,
    pub target: Option<Entity>,
    /// Attach point in the target's local space.
    pub anchor: Vec3,
    pub rope: RopeVisual,
}

impl GrappleLauncher {
    pub fn new(config: GrappleConfig) -> Self {
        Self {
            grapple: Grapple::new(),
            config,
            target: None,
            anchor: Vec3::ZERO,
            rope: RopeVisual::default(),
        }
    }

    /// Drop the link and its visual.
    pub fn release(&mut self) -> bool {
        let released = self.grapple.detach(&self.config);
        self.target = None;
        self.anchor = Vec3::ZERO;
        self.rope.clear();
        released
    }
}
