//! Component definitions for the ECS simulation.
//!
//! Components are plain data attached to vessel, projectile and effect
//! entities. Behaviour lives in systems; rules live in `broadside-logic`.

mod combat;
mod control;
mod vessel;

pub use combat::*;
pub use control::*;
pub use vessel::*;

// Logic types that are attached to entities as-is.
pub use broadside_logic::health::Health;
pub use broadside_logic::rigid_body::RigidBody;
