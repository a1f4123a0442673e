//! Outbound game events and queued effect requests.
//!
//! Systems push events as they happen; the presentation and scoring layers
//! drain them once per frame. Effects are requested by name and position and
//! turned into pooled effect entities at the end of the tick.

use broadside_logic::ai::AiState;
use glam::Vec3;
use hecs::Entity;

use crate::components::Faction;
use broadside_logic::spawn::EnemyArchetype;

/// Why a grapple link ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    Detached,
    TargetLost,
    Snapped,
    Boarded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Fired { shooter: Entity, position: Vec3 },
    ReloadStarted { entity: Entity },
    ReloadFinished { entity: Entity },
    Damaged { entity: Entity, amount: f32, weak_point: bool, source: Option<Entity> },
    Healed { entity: Entity, amount: f32 },
    Died { entity: Entity, faction: Faction },
    EnemyDestroyed { entity: Entity, by: Option<Entity> },
    AiStateChanged { entity: Entity, from: AiState, to: AiState },
    CaptureStarted { entity: Entity },
    CaptureProgressed { entity: Entity, progress: f32 },
    CapturePaused { entity: Entity },
    CaptureResumed { entity: Entity },
    CaptureAbandoned { entity: Entity },
    CaptureCompleted { entity: Entity },
    CaptureFailed { entity: Entity },
    GrappleLaunched { launcher: Entity },
    GrappleAttached { launcher: Entity, target: Entity },
    GrappleMissed { launcher: Entity },
    GrappleReleased { launcher: Entity, reason: ReleaseReason },
    ZiplineStarted { from: Entity, to: Entity },
    ZiplineArrived { from: Entity, to: Entity },
    ZiplineCancelled { from: Entity },
    ControlTransferred { from: Entity, to: Entity },
    EnemySpawned { entity: Entity, archetype: EnemyArchetype },
    Effect { name: &'static str, position: Vec3 },
    EffectStopped { name: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectRequest {
    pub name: &'static str,
    pub position: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
    effects: Vec<EffectRequest>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Ask for a pooled effect at the end of this tick.
    pub fn effect(&mut self, name: &'static str, position: Vec3) {
        self.effects.push(EffectRequest { name, position });
    }

    pub fn take_effects(&mut self) -> Vec<EffectRequest> {
        std::mem::take(&mut self.effects)
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.effects.clear();
    }
}
