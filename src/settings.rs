use serde::Deserialize;
use vek::Vec2;

use crate::collision::shape::Obb;

/// Runtime parameters of a [`World`](crate::World).
///
/// Loadable from a settings file so tweaking doesn't require a recompile.
/// Everything except the cell size has a usable default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Side length of a broad phase tile, must be greater than zero.
    ///
    /// Good values are a bit larger than the common body size, a tile should
    /// hold a handful of bodies at most.
    pub cell_size: i32,
    /// How many sub-steps are taken in a single step.
    ///
    /// This doubles as the solver convergence knob, the impulse solver runs
    /// a single pass per sub-step.
    pub substeps: u32,
    /// Relaxation passes of the joint solver per step.
    pub joint_iterations: u32,
    /// Acceleration applied to every dynamic body each sub-step.
    pub gravity: Vec2<f64>,
    /// Multiplier on `density * area` when deriving body masses.
    pub mass_scale: f64,
    /// Density of the air drag applied against the velocity.
    pub air_density: f64,
    /// Skip integrating bodies that fall outside of [`Self::frustum`].
    pub frustum_sleeping: bool,
    /// World region bodies have to touch to stay awake.
    pub frustum: Option<Obb>,
    /// Feed hinge anchor error back as velocity, keeps chains from drifting.
    pub position_correction: bool,
    /// Record every contact point for debug rendering.
    pub record_contacts: bool,
    /// Capacity of the body registry.
    pub max_bodies: usize,
    /// Capacity of the joint registry.
    pub max_joints: usize,
}

impl Settings {
    /// Construct settings with a broad phase tile size.
    pub fn new(cell_size: i32) -> Self {
        Self {
            cell_size,
            substeps: 10,
            joint_iterations: 5,
            gravity: Vec2::zero(),
            mass_scale: 1.5e-4,
            air_density: 1.0e-5,
            frustum_sleeping: false,
            frustum: None,
            position_correction: true,
            record_contacts: false,
            max_bodies: 2000,
            max_joints: 256,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(64)
    }
}
