//! Systems - logic that operates on components

mod ai;
mod boarding;
mod capture;
mod damage;
mod grapple;
mod lifecycle;
mod ocean;
mod physics;
mod weapons;

pub use ai::*;
pub use boarding::*;
pub use capture::*;
pub use damage::*;
pub use grapple::*;
pub use lifecycle::*;
pub use ocean::*;
pub use physics::*;
pub use weapons::*;
