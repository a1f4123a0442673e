//! Weapon fire gating: cadence, ammunition and reload.
//!
//! A shot is allowed when the cadence interval `1 / fire_rate` has elapsed
//! since the previous shot, no reload is running, and ammo remains (or ammo
//! is infinite). Emptying the magazine starts a reload right away; the reload
//! blocks firing until its timer completes and then refills the magazine.

use serde::{Deserialize, Serialize};

use crate::config::WeaponConfig;
use crate::timer::Timer;

/// Result of a fire attempt. Anything but `Fired` means "did not fire".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireOutcome {
    Fired,
    OnCooldown,
    Reloading,
    Empty,
}

impl FireOutcome {
    pub fn fired(self) -> bool {
        self == FireOutcome::Fired
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponState {
    pub ammo: u32,
    pub last_fire_time: Option<f64>,
    pub reload: Option<Timer>,
}

impl WeaponState {
    pub fn new(config: &WeaponConfig) -> Self {
        Self {
            ammo: config.max_ammo,
            last_fire_time: None,
            reload: None,
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reload.is_some()
    }

    /// Reload progress in [0, 1], or `None` when not reloading.
    pub fn reload_progress(&self) -> Option<f32> {
        self.reload.as_ref().map(Timer::fraction)
    }

    fn cooled_down(&self, now: f64, config: &WeaponConfig) -> bool {
        match self.last_fire_time {
            None => true,
            Some(last) => now - last + 1e-9 >= 1.0 / config.fire_rate as f64,
        }
    }

    /// Evaluate the fire gate without changing state.
    pub fn can_fire(&self, now: f64, config: &WeaponConfig) -> FireOutcome {
        if self.is_reloading() {
            FireOutcome::Reloading
        } else if !config.infinite_ammo && self.ammo == 0 {
            FireOutcome::Empty
        } else if !self.cooled_down(now, config) {
            FireOutcome::OnCooldown
        } else {
            FireOutcome::Fired
        }
    }

    /// Attempt one shot at simulation time `now`.
    pub fn try_fire(&mut self, now: f64, config: &WeaponConfig) -> FireOutcome {
        let outcome = self.can_fire(now, config);
        match outcome {
            FireOutcome::Fired => {
                self.last_fire_time = Some(now);
                if !config.infinite_ammo {
                    self.ammo -= 1;
                    if self.ammo == 0 {
                        self.start_reload(config);
                    }
                }
            }
            FireOutcome::Empty => {
                self.start_reload(config);
            }
            FireOutcome::OnCooldown | FireOutcome::Reloading => {}
        }
        outcome
    }

    /// Begin a reload unless one is running or the magazine is full.
    pub fn start_reload(&mut self, config: &WeaponConfig) -> bool {
        if self.is_reloading() || config.infinite_ammo || self.ammo >= config.max_ammo {
            return false;
        }
        self.reload = Some(Timer::new(config.reload_time));
        true
    }

    /// Advance the reload timer. Returns true on the tick the magazine refills.
    pub fn tick(&mut self, dt: f32, config: &WeaponConfig) -> bool {
        let done = match self.reload.as_mut() {
            Some(timer) => timer.tick(dt),
            None => return false,
        };
        if done {
            self.reload = None;
            self.ammo = config.max_ammo;
        }
        done
    }

    /// Abort a running reload. Ammo stays where it was.
    pub fn cancel_reload(&mut self) {
        self.reload = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WeaponConfig {
        WeaponConfig {
            fire_rate: 2.0,
            max_ammo: 10,
            reload_time: 3.0,
            ..WeaponConfig::default()
        }
    }

    #[test]
    fn test_ten_shots_then_reload() {
        let c = config();
        let mut w = WeaponState::new(&c);
        for i in 0..10 {
            assert_eq!(w.try_fire(i as f64 * 0.5, &c), FireOutcome::Fired, "shot {}", i);
        }
        assert_eq!(w.ammo, 0);
        assert!(w.is_reloading());
        assert_eq!(w.try_fire(5.0, &c), FireOutcome::Reloading);

        // 2.9 s of reload: still blocked.
        for _ in 0..29 {
            w.tick(0.1, &c);
        }
        assert_eq!(w.try_fire(7.9, &c), FireOutcome::Reloading);
        for _ in 0..2 {
            w.tick(0.1, &c);
        }
        assert!(!w.is_reloading());
        assert_eq!(w.ammo, 10);
        assert_eq!(w.try_fire(8.1, &c), FireOutcome::Fired);
    }

    #[test]
    fn test_cadence_gate() {
        let c = config();
        let mut w = WeaponState::new(&c);
        assert!(w.try_fire(1.0, &c).fired());
        assert_eq!(w.try_fire(1.3, &c), FireOutcome::OnCooldown);
        assert_eq!(w.ammo, 9);
        assert!(w.try_fire(1.5, &c).fired());
    }

    #[test]
    fn test_infinite_ammo_never_reloads() {
        let c = WeaponConfig {
            infinite_ammo: true,
            max_ammo: 1,
            ..config()
        };
        let mut w = WeaponState::new(&c);
        for i in 0..50 {
            assert!(w.try_fire(i as f64, &c).fired());
        }
        assert!(!w.is_reloading());
    }

    #[test]
    fn test_cancel_reload_keeps_weapon_empty() {
        let c = config();
        let mut w = WeaponState::new(&c);
        w.ammo = 1;
        w.try_fire(0.0, &c);
        assert!(w.is_reloading());
        w.cancel_reload();
        assert!(!w.is_reloading());
        assert_eq!(w.try_fire(10.0, &c), FireOutcome::Empty);
        assert!(w.is_reloading(), "an empty trigger pull restarts the reload");
    }
}
