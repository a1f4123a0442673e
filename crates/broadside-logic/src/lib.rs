//! Pure simulation logic for Broadside.
//!
//! This crate contains the game rules that do not depend on the ECS world,
//! the random number generator or any runtime. Functions take plain data and
//! return results, and the small state machines here advance only when their
//! owner ticks them. That keeps every formula unit-testable on its own and
//! lets `broadside-core` stay a thin layer of queries around it.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`ai`] | Enemy state machine transitions, lead prediction, steering |
//! | [`ballistics`] | Projectile flight, first-hit resolution, weak-point damage |
//! | [`buoyancy`] | Submersion depth, per-point buoyancy and damping forces |
//! | [`capture`] | Range/health-gated capture progress state machine |
//! | [`config`] | All tunables with defaults and validation |
//! | [`constants`] | Physical constants, collider layers, scoring values |
//! | [`difficulty`] | Session difficulty director |
//! | [`grapple`] | Grapple launch/attach state machine, spring constraint, rope, zipline |
//! | [`health`] | Damage mitigation, healing, regeneration, death |
//! | [`movement`] | Thrust, speed-dependent steering, lateral damping, visual tilt |
//! | [`rigid_body`] | Rigid body state and semi-implicit Euler integration |
//! | [`scoring`] | Per-session stat counters |
//! | [`spawn`] | Enemy archetypes and weighted selection |
//! | [`timer`] | Elapsed/duration timers used instead of coroutines |
//! | [`wave`] | Procedural wave field and its coarse sample cache |
//! | [`weapon`] | Fire-rate, ammo and reload gating |

pub mod ai;
pub mod ballistics;
pub mod buoyancy;
pub mod capture;
pub mod config;
pub mod constants;
pub mod difficulty;
pub mod grapple;
pub mod health;
pub mod movement;
pub mod rigid_body;
pub mod scoring;
pub mod spawn;
pub mod timer;
pub mod wave;
pub mod weapon;
