//! Capture progress state machine.
//!
//! Progress accrues at `1 / capture_time` per second while the attacker is in
//! range (and, if gated, the target is badly damaged). When the conditions
//! fail mid-capture the tracker pauses and progress decays at `decay_rate`
//! per second; at zero it drops back to `Idle`. Damage during a capture can
//! knock off a fixed penalty on top of the decay.
//!
//! `Completed` and `Failed` are terminal.

use serde::{Deserialize, Serialize};

use crate::config::CaptureConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureState {
    Idle,
    InProgress,
    Paused,
    Completed,
    Failed,
}

impl CaptureState {
    pub fn is_active(self) -> bool {
        matches!(self, CaptureState::InProgress | CaptureState::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CaptureState::Completed | CaptureState::Failed)
    }
}

/// What the tracker sees this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConditions {
    pub in_range: bool,
    pub health_fraction: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CaptureEvent {
    Started,
    /// Crossed another tenth of progress.
    Progressed(f32),
    Paused,
    Resumed,
    /// Progress decayed to zero.
    Abandoned,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureTracker {
    pub state: CaptureState,
    pub progress: f32,
}

impl Default for CaptureTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn decile(p: f32) -> u32 {
    (p * 10.0 + 1e-4).floor() as u32
}

impl CaptureTracker {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            progress: 0.0,
        }
    }

    pub fn conditions_hold(conditions: &CaptureConditions, config: &CaptureConfig) -> bool {
        conditions.in_range
            && (!config.require_low_health || conditions.health_fraction <= config.health_threshold)
    }

    fn accrue(&mut self, dt: f32, config: &CaptureConfig, events: &mut Vec<CaptureEvent>) {
        let before = self.progress;
        self.progress = (self.progress + dt / config.capture_time).min(1.0);
        if self.progress >= 1.0 {
            self.state = CaptureState::Completed;
            events.push(CaptureEvent::Completed);
        } else if decile(self.progress) > decile(before) {
            events.push(CaptureEvent::Progressed(self.progress));
        }
    }

    fn decay(&mut self, dt: f32, config: &CaptureConfig, events: &mut Vec<CaptureEvent>) {
        self.progress = (self.progress - config.decay_rate * dt).max(0.0);
        if self.progress <= 0.0 {
            self.state = CaptureState::Idle;
            events.push(CaptureEvent::Abandoned);
        }
    }

    /// Advance one tick. Returns the events raised, in order.
    pub fn update(&mut self, conditions: &CaptureConditions, dt: f32, config: &CaptureConfig) -> Vec<CaptureEvent> {
        let mut events = Vec::new();
        let hold = Self::conditions_hold(conditions, config);
        match self.state {
            CaptureState::Idle => {
                if hold {
                    self.state = CaptureState::InProgress;
                    events.push(CaptureEvent::Started);
                    self.accrue(dt, config, &mut events);
                }
            }
            CaptureState::InProgress => {
                if hold {
                    self.accrue(dt, config, &mut events);
                } else {
                    self.state = CaptureState::Paused;
                    events.push(CaptureEvent::Paused);
                    self.decay(dt, config, &mut events);
                }
            }
            CaptureState::Paused => {
                if hold {
                    self.state = CaptureState::InProgress;
                    events.push(CaptureEvent::Resumed);
                    self.accrue(dt, config, &mut events);
                } else {
                    self.decay(dt, config, &mut events);
                }
            }
            CaptureState::Completed | CaptureState::Failed => {}
        }
        events
    }

    /// Knock progress back after the target takes damage. Returns true if a
    /// penalty was applied.
    pub fn apply_damage_penalty(&mut self, config: &CaptureConfig) -> bool {
        if !config.damage_penalty_enabled || !self.state.is_active() {
            return false;
        }
        self.progress = (self.progress - config.damage_penalty).max(0.0);
        true
    }

    /// Abort an active capture for good.
    pub fn fail(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.state = CaptureState::Failed;
        true
    }
}
