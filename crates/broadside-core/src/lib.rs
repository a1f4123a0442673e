//! Broadside Core - naval combat simulation engine
//!
//! An ECS-based simulation of armed boats on a procedural ocean. Vessels
//! float, steer, shoot, grapple and board one another; enemy vessels are
//! driven by a state-machine AI and can be captured once beaten.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Vessels, projectiles, pooled effects
//! - **Components**: Plain data (RigidBody, Health, Weapon, AiController, ...)
//! - **Systems**: Free functions over the world, run in a fixed per-tick order
//!
//! Rules that do not need the world (wave math, buoyancy, state machines)
//! live in `broadside-logic`.
//!
//! # Example
//!
//! ```rust,no_run
//! use broadside_core::prelude::*;
//!
//! let config = GameConfig::default();
//! let mut engine = SimulationEngine::new(config.clone()).unwrap();
//! let player = engine.spawn_vessel(VesselBuilder::sloop("Player", Faction::Player, &config));
//! engine.set_player(player).unwrap();
//!
//! loop {
//!     engine.update(1.0 / 90.0);
//!     for event in engine.drain_events() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod builder;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod pool;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::builder::VesselBuilder;
    pub use crate::components::*;
    pub use crate::engine::{SimulationEngine, VesselStatus};
    pub use crate::error::EngineError;
    pub use crate::events::{GameEvent, ReleaseReason};
    pub use broadside_logic::config::GameConfig;
    pub use broadside_logic::movement::ControlInput;
}
