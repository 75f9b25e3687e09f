use log::warn;
use slotmap::new_key_type;
use vek::{Aabr, Vec2};

use crate::{
    collision::shape::{Obb, Shape},
    math::Rotation,
};

/// Lightest density that still behaves well, g/cm^3.
pub const MIN_DENSITY: f64 = 0.25;

/// Heaviest density that still behaves well, g/cm^3.
pub const MAX_DENSITY: f64 = 20.0;

new_key_type! {
    /// Stable generational handle to a rigid body inside a world.
    pub struct BodyKey;
}

/// A single simulated rigid body.
///
/// Construct one with [`RigidBody::new`] or [`RigidBody::fixed`], tweak it
/// with the `with_*` methods and hand it to
/// [`World::create_body`](crate::World::create_body). Mass, inertia and
/// their inverses are derived from the density and shape at registration and
/// are never touched by the solver afterwards.
#[derive(Debug, Clone)]
pub struct RigidBody {
    /// Collision shape, fixed after construction.
    pub(crate) shape: Shape,
    /// Top left corner for rectangles, center for circles.
    pub(crate) pos: Vec2<f64>,
    /// Orientation around the shape center.
    pub(crate) rot: Rotation,
    /// Linear velocity.
    pub(crate) vel: Vec2<f64>,
    /// Angular velocity in radians per second.
    pub(crate) ang_vel: f64,
    /// Density the mass is derived from.
    pub(crate) density: f64,
    /// Bounciness, the fraction of the approach speed kept after impact.
    pub(crate) restitution: f64,
    /// Friction coefficient while resting.
    pub(crate) static_friction: f64,
    /// Friction coefficient while sliding.
    pub(crate) dynamic_friction: f64,
    /// Immovable, behaves as if infinitely heavy.
    pub(crate) is_static: bool,
    /// Reports overlaps but never receives or applies impulses.
    pub(crate) is_trigger: bool,
    /// Host controlled flag, inactive bodies skip integration.
    pub(crate) active: bool,
    /// Set by the engine when the body falls outside the sleep frustum.
    pub(crate) sleeping: bool,
    /// Collision mask, pairs with no layer in common never collide.
    pub(crate) layers: u16,
    /// Opaque host handle, carried along in collision events.
    pub(crate) user_data: u64,
    /// Surface area, derived at registration.
    pub(crate) area: f64,
    /// Mass, derived at registration.
    pub(crate) mass: f64,
    /// Inverse mass, zero means infinitely heavy.
    pub(crate) inv_mass: f64,
    /// Moment of inertia, derived at registration.
    pub(crate) inertia: f64,
    /// Inverse moment of inertia, zero means impossible to spin.
    pub(crate) inv_inertia: f64,
    /// Position change applied by the engine during the last step.
    pub(crate) step_delta: Vec2<f64>,
    /// Rotation change in radians applied by the engine during the last step.
    pub(crate) step_delta_rot: f64,
}

impl RigidBody {
    /// Construct a dynamic body without movement.
    pub fn new(pos: Vec2<f64>, shape: Shape) -> Self {
        Self {
            shape,
            pos,
            rot: Rotation::default(),
            vel: Vec2::zero(),
            ang_vel: 0.0,
            density: 1.0,
            restitution: 0.5,
            static_friction: 0.6,
            dynamic_friction: 0.4,
            is_static: false,
            is_trigger: false,
            active: true,
            sleeping: false,
            layers: u16::MAX,
            user_data: 0,
            area: 0.0,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            step_delta: Vec2::zero(),
            step_delta_rot: 0.0,
        }
    }

    /// Construct a fixed body with infinite mass.
    pub fn fixed(pos: Vec2<f64>, shape: Shape) -> Self {
        Self {
            is_static: true,
            ..Self::new(pos, shape)
        }
    }

    /// Mark the body as a trigger.
    ///
    /// Triggers take part in detection and emit events but never receive or
    /// apply impulses.
    #[must_use]
    pub fn with_trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// Set the density the mass is derived from.
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Set the bounciness, clamped to `0..=1`.
    #[must_use]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution.clamp(0.0, 1.0);
        self
    }

    /// Set the resting and sliding friction coefficients.
    #[must_use]
    pub fn with_friction(mut self, static_friction: f64, dynamic_friction: f64) -> Self {
        self.static_friction = static_friction.max(0.0);
        self.dynamic_friction = dynamic_friction.max(0.0);
        self
    }

    /// Set the linear velocity.
    #[must_use]
    pub fn with_velocity(mut self, vel: Vec2<f64>) -> Self {
        self.vel = vel;
        self
    }

    /// Set the angular velocity in radians per second.
    #[must_use]
    pub fn with_angular_velocity(mut self, ang_vel: f64) -> Self {
        self.ang_vel = ang_vel;
        self
    }

    /// Set the orientation from degrees.
    #[must_use]
    pub fn with_rotation_degrees(mut self, degrees: f64) -> Self {
        self.rot = Rotation::from_degrees(degrees);
        self
    }

    /// Set the collision mask, pairs with no layer in common never collide.
    #[must_use]
    pub fn with_layers(mut self, layers: u16) -> Self {
        self.layers = layers;
        self
    }

    /// Attach an opaque host handle, carried along in collision events.
    #[must_use]
    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    /// Derive area, mass and inertia from the density and shape.
    ///
    /// Static bodies and triggers get zero inverse mass and inertia, the
    /// solver reads those as infinite.
    pub(crate) fn compute_mass_properties(&mut self, mass_scale: f64) {
        if !(MIN_DENSITY..=MAX_DENSITY).contains(&self.density) {
            warn!(
                "density {} outside of the supported range {MIN_DENSITY}..={MAX_DENSITY}",
                self.density
            );
        }

        self.area = self.shape.area();
        self.mass = self.density * self.area * mass_scale;
        self.inertia = self.shape.inertia(self.mass);

        if self.is_static || self.is_trigger {
            self.inv_mass = 0.0;
            self.inv_inertia = 0.0;
        } else {
            self.inv_mass = if self.mass > 0.0 {
                self.mass.recip()
            } else {
                0.0
            };
            self.inv_inertia = if self.inertia > 0.0 {
                self.inertia.recip()
            } else {
                0.0
            };
        }
    }

    /// Perform a single sub-step with a deltatime.
    ///
    /// Applies gravity, air drag and the velocities. Static bodies only get
    /// their velocity cleared in case the host wrote one.
    pub(crate) fn integrate(
        &mut self,
        dt: f64,
        gravity: Vec2<f64>,
        air_density: f64,
        mass_scale: f64,
    ) {
        if self.is_static {
            self.vel = Vec2::zero();
            self.ang_vel = 0.0;
            return;
        }

        self.vel += gravity * dt;

        // Air drag per axis, opposing the velocity
        let cross_section = self.shape.cross_extents() * mass_scale;
        let coefficient = self.shape.drag_coefficient();
        let drag = Vec2::new(
            -0.5 * air_density * coefficient * cross_section.x * self.vel.x * self.vel.x.abs(),
            -0.5 * air_density * coefficient * cross_section.y * self.vel.y * self.vel.y.abs(),
        );
        self.vel += drag * self.inv_mass * dt;

        self.pos += self.vel * dt;
        self.rot += self.ang_vel * dt;

        self.step_delta += self.vel * dt;
        self.step_delta_rot += self.ang_vel * dt;
    }

    /// Reset the accumulated step deltas, called at the start of a step.
    pub(crate) fn begin_step(&mut self) {
        self.step_delta = Vec2::zero();
        self.step_delta_rot = 0.0;
    }

    /// Move the body as part of a positional correction.
    pub(crate) fn separate(&mut self, offset: Vec2<f64>) {
        self.pos += offset;
        self.step_delta += offset;
    }

    /// Whether the body takes part in integration this step.
    pub(crate) fn is_awake(&self) -> bool {
        self.active && !self.sleeping
    }

    /// Smallest restitution of the pair wins.
    pub(crate) fn combine_restitutions(&self, other: &Self) -> f64 {
        self.restitution.min(other.restitution)
    }

    /// Resting frictions of the pair are averaged.
    pub(crate) fn combine_static_frictions(&self, other: &Self) -> f64 {
        (self.static_friction + other.static_friction) / 2.0
    }

    /// Sliding frictions of the pair are averaged.
    pub(crate) fn combine_dynamic_frictions(&self, other: &Self) -> f64 {
        (self.dynamic_friction + other.dynamic_friction) / 2.0
    }

    /// Global position, top left corner for rectangles and center for circles.
    pub fn position(&self) -> Vec2<f64> {
        self.pos
    }

    /// Teleport to a global position without introducing velocity.
    pub fn set_position(&mut self, pos: Vec2<f64>) {
        self.pos = pos;
    }

    /// Center of the shape, the pivot for rotations.
    pub fn center(&self) -> Vec2<f64> {
        self.shape.center(self.pos)
    }

    /// Orientation.
    pub fn rotation(&self) -> Rotation {
        self.rot
    }

    /// Orientation in degrees.
    pub fn rotation_degrees(&self) -> f64 {
        self.rot.to_degrees()
    }

    /// Set the orientation from degrees.
    pub fn set_rotation_degrees(&mut self, degrees: f64) {
        self.rot = Rotation::from_degrees(degrees);
    }

    /// Linear velocity.
    pub fn velocity(&self) -> Vec2<f64> {
        self.vel
    }

    /// Set the linear velocity.
    pub fn set_velocity(&mut self, vel: Vec2<f64>) {
        self.vel = vel;
    }

    /// Angular velocity in radians per second.
    pub fn angular_velocity(&self) -> f64 {
        self.ang_vel
    }

    /// Angular velocity in degrees per second.
    pub fn angular_velocity_degrees(&self) -> f64 {
        self.ang_vel.to_degrees()
    }

    /// Set the angular velocity in radians per second.
    pub fn set_angular_velocity(&mut self, ang_vel: f64) {
        self.ang_vel = ang_vel;
    }

    /// Collision shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Derived mass.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Inverse of the mass, zero for static bodies and triggers.
    pub fn inverse_mass(&self) -> f64 {
        self.inv_mass
    }

    /// Derived moment of inertia.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Inverse of the moment of inertia, zero for static bodies and triggers.
    pub fn inverse_inertia(&self) -> f64 {
        self.inv_inertia
    }

    /// Derived surface area.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Whether the body is immovable.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Whether the body only reports overlaps.
    pub fn is_trigger(&self) -> bool {
        self.is_trigger
    }

    /// Whether the engine put the body to sleep outside the frustum.
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Host controlled flag, inactive bodies skip integration.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or disable integration for this body.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Collision mask.
    pub fn layers(&self) -> u16 {
        self.layers
    }

    /// Opaque host handle.
    pub fn user_data(&self) -> u64 {
        self.user_data
    }

    /// Position change applied by the engine during the last step.
    ///
    /// Covers integration and positional separation, host writes through the
    /// setters are not included. Useful for syncing an external transform
    /// without copying the absolute position every frame.
    pub fn step_delta(&self) -> Vec2<f64> {
        self.step_delta
    }

    /// Rotation change in radians applied by the engine during the last step.
    pub fn step_delta_rotation(&self) -> f64 {
        self.step_delta_rot
    }

    /// Axis aligned bounding box at the current position and rotation.
    pub fn aabr(&self) -> Aabr<f64> {
        self.shape.aabr(self.pos, self.rot)
    }

    /// Oriented bounding box at the current position and rotation.
    pub fn obb(&self) -> Obb {
        self.shape.obb(self.pos, self.rot)
    }
}

#[cfg(test)]
mod tests {
    use vek::Vec2;

    use crate::Shape;

    use super::RigidBody;

    #[test]
    fn test_mass_properties() {
        let mut body = RigidBody::new(Vec2::zero(), Shape::rectangle(10.0, 20.0)).with_density(2.0);
        body.compute_mass_properties(0.5);

        assert_eq!(body.area(), 200.0);
        assert_eq!(body.mass(), 200.0);
        assert_eq!(body.inverse_mass(), 1.0 / 200.0);
        assert_eq!(body.inertia(), 200.0 * (100.0 + 400.0) / 12.0);
        assert!(body.inverse_inertia() > 0.0);
    }

    #[test]
    fn test_infinite_mass_for_static_and_trigger() {
        let mut fixed = RigidBody::fixed(Vec2::zero(), Shape::circle(10.0));
        fixed.compute_mass_properties(1.0);
        assert!(fixed.mass() > 0.0);
        assert_eq!(fixed.inverse_mass(), 0.0);
        assert_eq!(fixed.inverse_inertia(), 0.0);

        let mut trigger = RigidBody::new(Vec2::zero(), Shape::circle(10.0)).with_trigger();
        trigger.compute_mass_properties(1.0);
        assert_eq!(trigger.inverse_mass(), 0.0);
        assert_eq!(trigger.inverse_inertia(), 0.0);
    }

    #[test]
    fn test_integrate_applies_gravity() {
        let mut body = RigidBody::new(Vec2::zero(), Shape::circle(10.0));
        body.compute_mass_properties(1.0);

        body.integrate(1.0, Vec2::new(0.0, 10.0), 0.0, 1.0);

        assert_eq!(body.velocity(), Vec2::new(0.0, 10.0));
        assert_eq!(body.position(), Vec2::new(0.0, 10.0));
        assert_eq!(body.step_delta(), Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_integrate_leaves_static_in_place() {
        let mut body = RigidBody::fixed(Vec2::new(5.0, 5.0), Shape::circle(10.0));
        body.compute_mass_properties(1.0);
        // Host wrote a velocity by accident, it has to be discarded
        body.set_velocity(Vec2::new(3.0, 0.0));

        body.integrate(1.0, Vec2::new(0.0, 10.0), 0.0, 1.0);

        assert_eq!(body.velocity(), Vec2::zero());
        assert_eq!(body.position(), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_drag_opposes_motion() {
        let mut body = RigidBody::new(Vec2::zero(), Shape::circle(10.0)).with_density(1.0);
        body.compute_mass_properties(1.0);
        body.set_velocity(Vec2::new(100.0, -100.0));

        body.integrate(0.1, Vec2::zero(), 1.0, 1.0);

        assert!(body.velocity().x < 100.0);
        assert!(body.velocity().y > -100.0);
    }
}
