//! Simulation state and the step orchestrator.

use itertools::Itertools;
use log::error;
use slotmap::HopSlotMap;

use crate::{
    collision::{
        contact::{self, Contact},
        pairs::PairTable,
        sat,
        spatial_grid::SpatialGrid,
    },
    constraint::{hinge, spring, Joint, JointKey, JointKind},
    rigidbody::{BodyKey, RigidBody},
    settings::Settings,
    solver, Error,
};

/// Callback fired while the step exclusively owns the simulation.
pub type EventCallback = Box<dyn FnMut(CollisionEvent)>;

/// Snapshot of a detected pair, handed to the collision and trigger
/// callbacks.
///
/// Only copies cross the callback boundary, the callback can identify the
/// bodies through the keys or the attached user data but cannot reach back
/// into the world while it is stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    /// First body of the pair.
    pub a: BodyKey,
    /// Second body of the pair.
    pub b: BodyKey,
    /// Host handle of the first body.
    pub user_a: u64,
    /// Host handle of the second body.
    pub user_b: u64,
}

impl CollisionEvent {
    fn new(a_key: BodyKey, a: &RigidBody, b_key: BodyKey, b: &RigidBody) -> Self {
        Self {
            a: a_key,
            b: b_key,
            user_a: a.user_data(),
            user_b: b.user_data(),
        }
    }
}

/// Runtime statistics for debug overlays.
///
/// The per sub-step values hold the numbers of the last sub-step simulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Candidate pairs offered by the broad phase, per sub-step.
    pub contact_checks: usize,
    /// Contact points generated, per sub-step.
    pub contacts_found: usize,
    /// Unique colliding pairs, per sub-step.
    pub collision_pairs: usize,
    /// Tile registrations in the spatial hash, duplicates included.
    pub world_nodes: usize,
    /// Bodies put to sleep outside the frustum.
    pub sleeping: usize,
}

/// The whole physics simulation.
///
/// Owns the body and joint registries, the broad phase structures and the
/// runtime configuration. Everything happens on the thread calling
/// [`World::step`].
pub struct World {
    /// Runtime parameters, tweakable between steps.
    settings: Settings,
    /// Every simulated body.
    bodies: HopSlotMap<BodyKey, RigidBody>,
    /// Every registered joint.
    joints: HopSlotMap<JointKey, Joint>,
    /// Broad phase tile hash, rebuilt every sub-step.
    grid: SpatialGrid<BodyKey>,
    /// Deduplication of pairs spanning multiple tiles.
    pairs: PairTable,
    /// Runtime statistics.
    counters: Counters,
    /// Contact points of the last step, only filled when recording is on.
    contacts: Vec<Contact>,
    /// Fired for every resolved collision.
    on_collision: Option<EventCallback>,
    /// Fired for every overlap involving a trigger.
    on_trigger: Option<EventCallback>,
}

impl World {
    /// Construct a world from settings.
    ///
    /// Fails when the broad phase cell size is not positive.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        if settings.cell_size <= 0 {
            error!(
                "cannot initialize with a cell size of {}",
                settings.cell_size
            );
            return Err(Error::InvalidCellSize(settings.cell_size));
        }

        let bodies = HopSlotMap::with_capacity_and_key(settings.max_bodies);
        let joints = HopSlotMap::with_capacity_and_key(settings.max_joints);
        let grid = SpatialGrid::new(settings.cell_size as f64);
        let pairs = PairTable::new();

        Ok(Self {
            settings,
            bodies,
            joints,
            grid,
            pairs,
            counters: Counters::default(),
            contacts: Vec::new(),
            on_collision: None,
            on_trigger: None,
        })
    }

    /// Advance the simulation by a timestep in seconds.
    ///
    /// Runs the configured amount of sub-steps, each integrating, rebuilding
    /// the broad phase and resolving every colliding pair once, followed by
    /// the joint relaxation passes.
    pub fn step(&mut self, dt: f64) -> Result<(), Error> {
        puffin::profile_function!();

        if !dt.is_finite() || dt <= 0.0 {
            error!("cannot step the simulation by {dt}");
            return Err(Error::InvalidTimeStep(dt));
        }

        self.contacts.clear();
        for body in self.bodies.values_mut() {
            body.begin_step();
        }

        self.refresh_sleeping();

        let substeps = self.settings.substeps.max(1);
        let sub_dt = dt / f64::from(substeps);
        for _ in 0..substeps {
            self.substep(sub_dt);
        }

        for _ in 0..self.settings.joint_iterations {
            self.solve_joints(dt);
        }

        Ok(())
    }

    /// Register a body, deriving its mass properties.
    ///
    /// Fails when the registry is at capacity.
    pub fn create_body(&mut self, mut body: RigidBody) -> Result<BodyKey, Error> {
        if self.bodies.len() >= self.settings.max_bodies {
            error!(
                "cannot register another body, all {} slots are taken",
                self.settings.max_bodies
            );
            return Err(Error::RegistryFull("body"));
        }

        body.compute_mass_properties(self.settings.mass_scale);

        Ok(self.bodies.insert(body))
    }

    /// Remove a body.
    ///
    /// The broad phase is rebuilt every sub-step so no unregistration is
    /// needed. Joints referring to the body stay behind and are skipped by
    /// the solver, cleaning those up is up to the host.
    pub fn remove_body(&mut self, key: BodyKey) -> bool {
        self.bodies.remove(key).is_some()
    }

    /// Remove every body.
    pub fn clear_bodies(&mut self) {
        self.bodies.clear();
        self.grid.clear();
    }

    /// Register a joint.
    ///
    /// Fails when the registry is at capacity.
    pub fn add_joint(&mut self, joint: Joint) -> Result<JointKey, Error> {
        if self.joints.len() >= self.settings.max_joints {
            error!(
                "cannot register another joint, all {} slots are taken",
                self.settings.max_joints
            );
            return Err(Error::RegistryFull("joint"));
        }

        Ok(self.joints.insert(joint))
    }

    /// Remove a joint.
    pub fn remove_joint(&mut self, key: JointKey) -> bool {
        self.joints.remove(key).is_some()
    }

    /// Remove every joint.
    pub fn clear_joints(&mut self) {
        self.joints.clear();
    }

    /// Set the callback fired for every resolved collision.
    pub fn on_collision(&mut self, callback: impl FnMut(CollisionEvent) + 'static) {
        self.on_collision = Some(Box::new(callback));
    }

    /// Set the callback fired for every overlap involving a trigger.
    pub fn on_trigger(&mut self, callback: impl FnMut(CollisionEvent) + 'static) {
        self.on_trigger = Some(Box::new(callback));
    }

    /// Whether a pair takes part in collision detection.
    ///
    /// Static pairs, trigger pairs, masked out pairs and pairs whose joint
    /// suppresses contact never collide. Symmetric in its arguments, unknown
    /// keys never collide.
    pub fn should_collide(&self, a_key: BodyKey, b_key: BodyKey) -> bool {
        let (Some(a), Some(b)) = (self.bodies.get(a_key), self.bodies.get(b_key)) else {
            return false;
        };

        should_collide(a_key, a, b_key, b, &self.joints)
    }

    /// Look up a body.
    pub fn body(&self, key: BodyKey) -> Option<&RigidBody> {
        self.bodies.get(key)
    }

    /// Look up a body for mutation.
    pub fn body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody> {
        self.bodies.get_mut(key)
    }

    /// Iterate over all bodies.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &RigidBody)> {
        self.bodies.iter()
    }

    /// Amount of registered bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Look up a joint.
    pub fn joint(&self, key: JointKey) -> Option<&Joint> {
        self.joints.get(key)
    }

    /// Amount of registered joints.
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Runtime statistics of the last step.
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Contact points of the last step.
    ///
    /// Empty unless [`Settings::record_contacts`] is enabled.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Runtime parameters.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runtime parameters for tweaking between steps.
    ///
    /// The cell size and registry capacities are fixed after construction,
    /// changing those here has no effect.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Call a function with every broad phase tile a body touches.
    ///
    /// Debug helper for renderers, an unknown key logs and does nothing.
    pub fn for_each_intersecting_tile(&mut self, key: BodyKey, mut visit: impl FnMut(i64, i64)) {
        let Some(body) = self.bodies.get(key) else {
            error!("cannot visit tiles of an unknown body");
            return;
        };

        self.grid
            .for_each_intersecting_tile(body, |_grid, tile_x, tile_y| visit(tile_x, tile_y));
    }

    /// Mark every body outside the frustum as sleeping.
    fn refresh_sleeping(&mut self) {
        let frustum = self
            .settings
            .frustum_sleeping
            .then_some(self.settings.frustum)
            .flatten();

        let mut sleeping = 0;
        for body in self.bodies.values_mut() {
            let asleep = match &frustum {
                Some(frustum) => !sat::body_intersects_obb(body, frustum),
                None => false,
            };

            body.sleeping = asleep;
            if asleep {
                sleeping += 1;
            }
        }

        self.counters.sleeping = sleeping;
    }

    /// A single sub-step, integration followed by collision resolution.
    fn substep(&mut self, dt: f64) {
        puffin::profile_scope!("substep");

        let gravity = self.settings.gravity;
        let air_density = self.settings.air_density;
        let mass_scale = self.settings.mass_scale;

        for body in self.bodies.values_mut() {
            if body.is_awake() {
                body.integrate(dt, gravity, air_density, mass_scale);
            }
        }

        // Re-register everything at the new positions
        self.grid.clear();
        for (key, body) in self.bodies.iter() {
            self.grid.insert_body(key, body);
        }
        self.counters.world_nodes = self.grid.nodes();

        self.pairs.clear();
        self.counters.contact_checks = 0;
        self.counters.contacts_found = 0;
        self.counters.collision_pairs = 0;

        // Split the borrows so bodies can be mutated while walking the grid
        let Self {
            settings,
            bodies,
            joints,
            grid,
            pairs,
            counters,
            contacts,
            on_collision,
            on_trigger,
        } = self;

        for bucket in grid.pair_buckets() {
            for (a_key, b_key) in bucket.iter().copied().tuple_combinations() {
                counters.contact_checks += 1;

                if a_key == b_key {
                    // The same body can sit twice in one bucket when two of
                    // its tiles hash together
                    continue;
                }

                let Some([a, b]) = bodies.get_disjoint_mut([a_key, b_key]) else {
                    continue;
                };

                if !should_collide(a_key, a, b_key, b, joints) {
                    continue;
                }
                if pairs.contains(a_key, b_key) {
                    continue;
                }

                let Some(info) = sat::collide(a, b) else {
                    continue;
                };

                pairs.insert(a_key, b_key);
                counters.collision_pairs = pairs.len();

                if a.is_trigger() || b.is_trigger() {
                    if let Some(callback) = on_trigger {
                        callback(CollisionEvent::new(a_key, a, b_key, b));
                    }
                    continue;
                }

                let manifold = contact::generate(a, b, &info);
                solver::separate_bodies(a, b, info.normal, info.depth);

                if manifold.is_empty() {
                    continue;
                }
                counters.contacts_found += manifold.len();
                if settings.record_contacts {
                    contacts.extend_from_slice(&manifold);
                }

                solver::resolve_collision(a, b, &manifold);

                if let Some(callback) = on_collision {
                    callback(CollisionEvent::new(a_key, a, b_key, b));
                }
            }
        }
    }

    /// A single relaxation pass over every joint.
    fn solve_joints(&mut self, dt: f64) {
        puffin::profile_scope!("solve joints");

        let Self {
            bodies,
            joints,
            settings,
            ..
        } = self;

        for joint in joints.values() {
            match joint.kind() {
                JointKind::Spring { .. } => spring::solve(joint, bodies, dt),
                JointKind::Hinge { .. } => {
                    hinge::solve(joint, bodies, dt, settings.position_correction);
                }
            }
        }
    }
}

/// Whether a pair takes part in collision detection.
fn should_collide(
    a_key: BodyKey,
    a: &RigidBody,
    b_key: BodyKey,
    b: &RigidBody,
    joints: &HopSlotMap<JointKey, Joint>,
) -> bool {
    if a.is_static() && b.is_static() {
        return false;
    }
    if a.is_trigger() && b.is_trigger() {
        return false;
    }
    if a.layers() & b.layers() == 0 {
        return false;
    }

    !joints
        .values()
        .any(|joint| joint.connects(a_key, b_key) && joint.suppresses_collisions())
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use vek::Vec2;

    use crate::{rigidbody::RigidBody, Error, Joint, Settings, Shape, World};

    /// Settings without gravity and drag for exact assertions.
    fn vacuum(cell_size: i32) -> Settings {
        let mut settings = Settings::new(cell_size);
        settings.air_density = 0.0;

        settings
    }

    #[test]
    fn test_invalid_configuration() {
        assert_eq!(
            World::new(Settings::new(0)).err(),
            Some(Error::InvalidCellSize(0))
        );

        let mut world = World::new(Settings::new(64)).unwrap();
        assert_eq!(world.step(0.0), Err(Error::InvalidTimeStep(0.0)));
        assert_eq!(world.step(-1.0), Err(Error::InvalidTimeStep(-1.0)));
        assert!(world.step(0.016).is_ok());
    }

    #[test]
    fn test_registry_capacity() {
        let mut settings = vacuum(64);
        settings.max_bodies = 2;

        let mut world = World::new(settings).unwrap();
        let a = world
            .create_body(RigidBody::new(Vec2::zero(), Shape::circle(1.0)))
            .unwrap();
        world
            .create_body(RigidBody::new(Vec2::new(10.0, 0.0), Shape::circle(1.0)))
            .unwrap();

        assert_eq!(
            world
                .create_body(RigidBody::new(Vec2::new(20.0, 0.0), Shape::circle(1.0)))
                .err(),
            Some(Error::RegistryFull("body"))
        );

        // Removing frees the slot again
        assert!(world.remove_body(a));
        assert!(world
            .create_body(RigidBody::new(Vec2::new(20.0, 0.0), Shape::circle(1.0)))
            .is_ok());
    }

    /// Equal circles in a head-on fully elastic impact trade velocities.
    #[test]
    fn test_elastic_circle_swap() {
        let mut world = World::new(vacuum(64)).unwrap();

        let a = world
            .create_body(
                RigidBody::new(Vec2::new(0.0, 0.0), Shape::circle(10.0))
                    .with_restitution(1.0)
                    .with_friction(0.0, 0.0)
                    .with_velocity(Vec2::new(1.0, 0.0)),
            )
            .unwrap();
        let b = world
            .create_body(
                RigidBody::new(Vec2::new(21.0, 0.0), Shape::circle(10.0))
                    .with_restitution(1.0)
                    .with_friction(0.0, 0.0)
                    .with_velocity(Vec2::new(-1.0, 0.0)),
            )
            .unwrap();

        for _ in 0..100 {
            world.step(0.016).unwrap();
        }

        let a_vel = world.body(a).unwrap().velocity();
        let b_vel = world.body(b).unwrap().velocity();
        assert!(a_vel.distance(Vec2::new(-1.0, 0.0)) < 1e-2, "{a_vel}");
        assert!(b_vel.distance(Vec2::new(1.0, 0.0)) < 1e-2, "{b_vel}");
    }

    /// Total linear momentum survives an elastic impact between unequal
    /// masses.
    #[test]
    fn test_momentum_conservation() {
        let mut world = World::new(vacuum(64)).unwrap();

        let a = world
            .create_body(
                RigidBody::new(Vec2::new(0.0, 0.0), Shape::circle(10.0))
                    .with_density(1.0)
                    .with_restitution(1.0)
                    .with_friction(0.0, 0.0)
                    .with_velocity(Vec2::new(2.0, 0.0)),
            )
            .unwrap();
        let b = world
            .create_body(
                RigidBody::new(Vec2::new(25.0, 0.0), Shape::circle(10.0))
                    .with_density(4.0)
                    .with_restitution(1.0)
                    .with_friction(0.0, 0.0)
                    .with_velocity(Vec2::new(-2.0, 0.0)),
            )
            .unwrap();

        let momentum = |world: &World| {
            let a = world.body(a).unwrap();
            let b = world.body(b).unwrap();

            a.velocity() * a.mass() + b.velocity() * b.mass()
        };

        let before = momentum(&world);
        for _ in 0..100 {
            world.step(0.016).unwrap();
        }
        let after = momentum(&world);

        assert!((before - after).magnitude() < 1e-3);
        // The impact actually happened
        assert!(world.body(a).unwrap().velocity().x < 2.0);
    }

    /// A ball dropped on a static floor comes to rest on top of it.
    #[test]
    fn test_ball_settles_on_floor() {
        let mut settings = Settings::new(100);
        settings.gravity = Vec2::new(0.0, 60.0);

        let mut world = World::new(settings).unwrap();

        let floor = world
            .create_body(
                RigidBody::fixed(Vec2::new(0.0, 500.0), Shape::rectangle(1000.0, 40.0))
                    .with_restitution(0.5),
            )
            .unwrap();
        let ball = world
            .create_body(
                RigidBody::new(Vec2::new(500.0, 465.0), Shape::circle(25.0))
                    .with_density(2.0)
                    .with_restitution(0.5),
            )
            .unwrap();

        for _ in 0..125 {
            world.step(0.016).unwrap();
        }

        let ball = world.body(ball).unwrap();
        assert!(ball.velocity().y.abs() < 1.0, "{}", ball.velocity());
        // Resting position is one radius above the floor top
        assert!(
            (ball.position().y - 475.0).abs() < 5.0,
            "{}",
            ball.position()
        );

        // The floor never moved
        let floor = world.body(floor).unwrap();
        assert_eq!(floor.position(), Vec2::new(0.0, 500.0));
        assert_eq!(floor.velocity(), Vec2::zero());
    }

    /// An off-center impact transfers momentum into rotation.
    #[test]
    fn test_rotational_impulse() {
        let mut world = World::new(vacuum(100)).unwrap();

        let initial_spin = 90f64.to_radians();
        let spinner = world
            .create_body(
                RigidBody::new(Vec2::new(0.0, 0.0), Shape::rectangle(100.0, 100.0))
                    .with_density(2.0)
                    .with_velocity(Vec2::new(50.0, 0.0))
                    .with_angular_velocity(initial_spin),
            )
            .unwrap();
        // Wall placed so the impact happens away from the center line
        world
            .create_body(RigidBody::fixed(
                Vec2::new(250.0, 60.0),
                Shape::rectangle(40.0, 100.0),
            ))
            .unwrap();

        for _ in 0..250 {
            world.step(0.016).unwrap();
        }

        let spinner = world.body(spinner).unwrap();
        // The wall stopped the approach
        assert!(spinner.velocity().x < 50.0);
        // And the impulse changed the spin
        assert!((spinner.angular_velocity() - initial_spin).abs() > 1e-6);
    }

    /// A trigger reports overlaps without disturbing the simulation.
    #[test]
    fn test_trigger_reports_without_resolving() {
        let mut world = World::new(vacuum(64)).unwrap();

        let sensor = world
            .create_body(
                RigidBody::new(Vec2::new(0.0, 0.0), Shape::circle(10.0))
                    .with_trigger()
                    .with_user_data(1),
            )
            .unwrap();
        let visitor = world
            .create_body(
                RigidBody::new(Vec2::new(5.0, 0.0), Shape::circle(10.0)).with_user_data(2),
            )
            .unwrap();

        let triggers = Rc::new(Cell::new(0));
        let collisions = Rc::new(Cell::new(0));
        {
            let triggers = Rc::clone(&triggers);
            world.on_trigger(move |event| {
                assert_eq!(event.user_a + event.user_b, 3);
                triggers.set(triggers.get() + 1);
            });
        }
        {
            let collisions = Rc::clone(&collisions);
            world.on_collision(move |_| collisions.set(collisions.get() + 1));
        }

        world.step(0.016).unwrap();

        // Once per sub-step, nothing resolved
        assert_eq!(triggers.get(), 10);
        assert_eq!(collisions.get(), 0);
        assert_eq!(world.body(sensor).unwrap().velocity(), Vec2::zero());
        assert_eq!(world.body(visitor).unwrap().velocity(), Vec2::zero());
        assert_eq!(world.body(visitor).unwrap().position(), Vec2::new(5.0, 0.0));
    }

    /// Two bodies on a spring settle at the rest length.
    #[test]
    fn test_spring_settles() {
        let mut world = World::new(vacuum(64)).unwrap();

        let a = world
            .create_body(RigidBody::new(Vec2::new(0.0, 0.0), Shape::circle(5.0)))
            .unwrap();
        let b = world
            .create_body(RigidBody::new(Vec2::new(200.0, 0.0), Shape::circle(5.0)))
            .unwrap();
        world
            .add_joint(Joint::spring(a, b, 100.0, 5.0).with_bias_factor(0.2))
            .unwrap();

        for _ in 0..312 {
            world.step(0.016).unwrap();
        }

        let distance = world
            .body(a)
            .unwrap()
            .center()
            .distance(world.body(b).unwrap().center());
        assert!((distance - 100.0).abs() < 5.0, "{distance}");
    }

    /// A world anchored spring holds its body at the rest distance.
    #[test]
    fn test_world_anchored_spring() {
        let mut world = World::new(vacuum(64)).unwrap();

        let body = world
            .create_body(RigidBody::new(Vec2::new(0.0, 0.0), Shape::circle(5.0)))
            .unwrap();
        world
            .add_joint(Joint::spring_to_world(
                body,
                Vec2::new(200.0, 0.0),
                100.0,
                5.0,
            ))
            .unwrap();

        for _ in 0..312 {
            world.step(0.016).unwrap();
        }

        let distance = world
            .body(body)
            .unwrap()
            .center()
            .distance(Vec2::new(200.0, 0.0));
        assert!((distance - 100.0).abs() < 5.0, "{distance}");
    }

    /// A hinge pulls its anchors together and keeps them there.
    #[test]
    fn test_hinge_pins_anchors() {
        let mut world = World::new(vacuum(64)).unwrap();

        let anchor = world
            .create_body(RigidBody::fixed(
                Vec2::new(0.0, 0.0),
                Shape::rectangle(20.0, 20.0),
            ))
            .unwrap();
        let swinger = world
            .create_body(
                RigidBody::new(Vec2::new(30.0, 0.0), Shape::rectangle(20.0, 20.0))
                    .with_velocity(Vec2::new(0.0, 15.0)),
            )
            .unwrap();
        world
            .add_joint(
                Joint::hinge(anchor, swinger)
                    .with_anchors(Vec2::new(10.0, 0.0), Vec2::new(-10.0, 0.0)),
            )
            .unwrap();

        for _ in 0..250 {
            world.step(0.016).unwrap();
        }

        let anchor_world =
            crate::constraint::world_anchor(world.body(anchor).unwrap(), Vec2::new(10.0, 0.0));
        let swinger_world =
            crate::constraint::world_anchor(world.body(swinger).unwrap(), Vec2::new(-10.0, 0.0));
        assert!(
            anchor_world.distance(swinger_world) < 2.0,
            "{anchor_world} {swinger_world}"
        );
    }

    /// Bodies sharing several tiles are still processed once per sub-step.
    #[test]
    fn test_pair_deduplication_across_tiles() {
        let mut settings = vacuum(100);
        settings.substeps = 1;

        let mut world = World::new(settings).unwrap();

        world
            .create_body(RigidBody::new(
                Vec2::new(10.0, 10.0),
                Shape::rectangle(180.0, 180.0),
            ))
            .unwrap();
        world
            .create_body(RigidBody::new(
                Vec2::new(30.0, 30.0),
                Shape::rectangle(180.0, 180.0),
            ))
            .unwrap();

        world.step(0.016).unwrap();

        let counters = world.counters();
        // Both rectangles span the same 4 tiles
        assert_eq!(counters.contact_checks, 4);
        // But the pair only resolves once
        assert_eq!(counters.collision_pairs, 1);
        assert!(
            (1..=2).contains(&counters.contacts_found),
            "{}",
            counters.contacts_found
        );
    }

    #[test]
    fn test_should_collide_is_symmetric() {
        let mut world = World::new(vacuum(64)).unwrap();

        let fixed_a = world
            .create_body(RigidBody::fixed(Vec2::zero(), Shape::circle(1.0)))
            .unwrap();
        let fixed_b = world
            .create_body(RigidBody::fixed(Vec2::zero(), Shape::circle(1.0)))
            .unwrap();
        let masked_a = world
            .create_body(RigidBody::new(Vec2::zero(), Shape::circle(1.0)).with_layers(0b01))
            .unwrap();
        let masked_b = world
            .create_body(RigidBody::new(Vec2::zero(), Shape::circle(1.0)).with_layers(0b10))
            .unwrap();
        let hinged = world
            .create_body(RigidBody::new(Vec2::zero(), Shape::circle(1.0)))
            .unwrap();
        world.add_joint(Joint::hinge(fixed_a, hinged)).unwrap();

        let pairs = [
            (fixed_a, fixed_b),
            (masked_a, masked_b),
            (fixed_a, hinged),
            (fixed_a, masked_a),
            (masked_a, hinged),
        ];
        for (a, b) in pairs {
            assert_eq!(world.should_collide(a, b), world.should_collide(b, a));
        }

        // Two statics never collide
        assert!(!world.should_collide(fixed_a, fixed_b));
        // No layer in common
        assert!(!world.should_collide(masked_a, masked_b));
        // Hinged pairs skip detection
        assert!(!world.should_collide(fixed_a, hinged));
        // A static against a dynamic on a shared layer is fine
        assert!(world.should_collide(fixed_a, masked_a));
    }

    /// Joints pointing at a removed body are skipped, not fatal.
    #[test]
    fn test_dangling_joint_is_harmless() {
        let mut world = World::new(vacuum(64)).unwrap();

        let a = world
            .create_body(RigidBody::new(Vec2::zero(), Shape::circle(5.0)))
            .unwrap();
        let b = world
            .create_body(RigidBody::new(Vec2::new(50.0, 0.0), Shape::circle(5.0)))
            .unwrap();
        world.add_joint(Joint::spring(a, b, 10.0, 1.0)).unwrap();

        world.remove_body(b);
        assert_eq!(world.joint_count(), 1);

        // Stepping with the dangling joint must not panic or move a
        let before = world.body(a).unwrap().position();
        world.step(0.016).unwrap();
        assert_eq!(world.body(a).unwrap().position(), before);
    }

    /// Bodies outside the sleep frustum are not integrated.
    #[test]
    fn test_frustum_sleeping() {
        let mut settings = vacuum(64);
        settings.gravity = Vec2::new(0.0, 10.0);
        settings.frustum_sleeping = true;
        settings.frustum = Some(crate::Obb::new(
            Vec2::new(0.0, 0.0),
            vek::Extent2::new(100.0, 100.0),
            crate::math::Rotation::default(),
        ));

        let mut world = World::new(settings).unwrap();

        let inside = world
            .create_body(RigidBody::new(Vec2::new(50.0, 50.0), Shape::circle(5.0)))
            .unwrap();
        let outside = world
            .create_body(RigidBody::new(Vec2::new(500.0, 50.0), Shape::circle(5.0)))
            .unwrap();

        world.step(0.016).unwrap();

        assert!(world.body(inside).unwrap().velocity().y > 0.0);
        assert_eq!(world.body(outside).unwrap().velocity(), Vec2::zero());
        assert!(world.body(outside).unwrap().is_sleeping());
        assert_eq!(world.counters().sleeping, 1);
    }

    /// Deactivated bodies are left alone by integration.
    #[test]
    fn test_inactive_body_skips_integration() {
        let mut settings = vacuum(64);
        settings.gravity = Vec2::new(0.0, 10.0);

        let mut world = World::new(settings).unwrap();
        let body = world
            .create_body(RigidBody::new(Vec2::new(0.0, 0.0), Shape::circle(5.0)))
            .unwrap();

        world.body_mut(body).unwrap().set_active(false);
        world.step(0.016).unwrap();
        assert_eq!(world.body(body).unwrap().position(), Vec2::zero());

        world.body_mut(body).unwrap().set_active(true);
        world.step(0.016).unwrap();
        assert!(world.body(body).unwrap().position().y > 0.0);
    }

    /// The accumulated step delta mirrors the actual position change.
    #[test]
    fn test_step_delta_accumulation() {
        let mut settings = vacuum(64);
        settings.gravity = Vec2::new(0.0, 10.0);

        let mut world = World::new(settings).unwrap();
        let body = world
            .create_body(RigidBody::new(Vec2::new(0.0, 0.0), Shape::circle(5.0)))
            .unwrap();

        let before = world.body(body).unwrap().position();
        world.step(0.5).unwrap();
        let moved = world.body(body).unwrap().position() - before;

        assert!(moved.y > 0.0);
        assert!((world.body(body).unwrap().step_delta() - moved).magnitude() < 1e-12);
    }
}
