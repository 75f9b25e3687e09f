//! Impulse-based 2D rigid body physics engine.
//!
//! Bodies are oriented rectangles and circles. Every [`World::step`] call
//! integrates velocities, rebuilds a spatial hash broad phase, runs an SAT
//! narrow phase on the candidate pairs, splits overlap into positional
//! separation and restitution plus Coulomb friction impulses, and finally
//! relaxes spring and hinge joints.
//!
//! The whole simulation is single threaded and owned by an explicit
//! [`World`] value, there is no global state.

pub mod collision;
pub mod constraint;
pub mod math;
pub mod rigidbody;
pub mod settings;
mod solver;
pub mod world;

pub use collision::{contact::Contact, sat::CollisionInfo, shape::Obb, shape::Shape};
pub use constraint::{Joint, JointKey, JointKind};
pub use rigidbody::{BodyKey, RigidBody};
pub use settings::Settings;
pub use world::{CollisionEvent, Counters, World};

/// Failures surfaced by the public API.
///
/// Anything not covered here degrades to a logged no-op instead of a panic.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    /// Broad phase tiles need a positive side length.
    #[error("cell size must be greater than zero, got {0}")]
    InvalidCellSize(i32),
    /// Simulating zero or negative time is rejected as a whole.
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),
    /// The fixed capacity body or joint registry cannot take another entry.
    #[error("the {0} registry is full")]
    RegistryFull(&'static str),
}
