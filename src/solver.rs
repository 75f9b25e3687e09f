//! Positional separation and the impulse solver.
//!
//! Runs once per colliding pair per sub-step. Overlap is resolved by
//! teleporting the bodies apart along the minimum translation vector, the
//! velocities are then corrected with restitution and Coulomb friction
//! impulses at each contact point.

use arrayvec::ArrayVec;
use vek::Vec2;

use crate::{collision::contact::Contact, math::EPSILON, rigidbody::RigidBody};

/// Scalar 2D cross product.
fn cross(a: Vec2<f64>, b: Vec2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Push two overlapping bodies apart along the collision normal.
///
/// A static body never moves, its partner takes the full correction. Two
/// dynamic bodies share it evenly.
pub(crate) fn separate_bodies(a: &mut RigidBody, b: &mut RigidBody, normal: Vec2<f64>, depth: f64) {
    let mtv = normal * depth;

    if a.is_static {
        b.separate(mtv);
    } else if b.is_static {
        a.separate(-mtv);
    } else {
        a.separate(-mtv / 2.0);
        b.separate(mtv / 2.0);
    }
}

/// Impulse of a single contact point, staged so all contacts observe the
/// same incoming velocities.
struct StagedImpulse {
    impulse: Vec2<f64>,
    r_a: Vec2<f64>,
    r_b: Vec2<f64>,
    /// Normal impulse magnitude, bounds the friction cone.
    magnitude: f64,
}

/// Resolve the velocities of a colliding pair.
///
/// One restitution pass followed by one friction pass over the contact
/// points. The single pass trades solver convergence for speed, stacking
/// accuracy comes from the sub-step count instead.
pub(crate) fn resolve_collision(a: &mut RigidBody, b: &mut RigidBody, contacts: &[Contact]) {
    puffin::profile_function!();

    debug_assert!(!contacts.is_empty());

    let normal = contacts[0].normal;
    let restitution = a.combine_restitutions(b);
    let contact_count = contacts.len() as f64;

    // Restitution along the normal
    let mut staged: ArrayVec<StagedImpulse, 2> = ArrayVec::new();
    for contact in contacts {
        let r_a = contact.point - a.center();
        let r_b = contact.point - b.center();

        let relative_velocity = contact_velocity(b, r_b) - contact_velocity(a, r_a);
        let approach = relative_velocity.dot(normal);
        if approach > 0.0 {
            // Already separating
            continue;
        }

        let denominator = effective_mass(a, b, r_a, r_b, normal);
        if denominator <= EPSILON {
            continue;
        }

        let magnitude = -(1.0 + restitution) * approach / denominator / contact_count;

        staged.push(StagedImpulse {
            impulse: normal * magnitude,
            r_a,
            r_b,
            magnitude,
        });
    }
    for stage in &staged {
        apply_impulse(a, b, stage.impulse, stage.r_a, stage.r_b);
    }

    // Coulomb friction along the tangent
    let static_friction = a.combine_static_frictions(b);
    let dynamic_friction = a.combine_dynamic_frictions(b);

    let mut friction: ArrayVec<StagedImpulse, 2> = ArrayVec::new();
    for stage in &staged {
        let (r_a, r_b) = (stage.r_a, stage.r_b);

        let relative_velocity = contact_velocity(b, r_b) - contact_velocity(a, r_a);
        let tangent_velocity = relative_velocity - normal * relative_velocity.dot(normal);

        let Some(tangent) = tangent_velocity.try_normalized() else {
            continue;
        };
        if tangent_velocity.magnitude() <= EPSILON {
            continue;
        }

        let denominator = effective_mass(a, b, r_a, r_b, tangent);
        if denominator <= EPSILON {
            continue;
        }

        let magnitude = -relative_velocity.dot(tangent) / denominator / contact_count;

        // Inside the cone the surfaces hold, outside they slide
        let impulse = if magnitude.abs() <= stage.magnitude * static_friction {
            tangent * magnitude
        } else {
            tangent * -(stage.magnitude * dynamic_friction)
        };

        friction.push(StagedImpulse {
            impulse,
            r_a,
            r_b,
            magnitude,
        });
    }
    for stage in &friction {
        apply_impulse(a, b, stage.impulse, stage.r_a, stage.r_b);
    }
}

/// Velocity of a body at a point relative to its center, including the
/// angular contribution.
fn contact_velocity(body: &RigidBody, r: Vec2<f64>) -> Vec2<f64> {
    let r_perp = Vec2::new(-r.y, r.x);

    body.vel + r_perp * body.ang_vel
}

/// Denominator of the impulse magnitude along a direction.
///
/// Zero tolerant, infinite masses simply drop out of the sum.
fn effective_mass(
    a: &RigidBody,
    b: &RigidBody,
    r_a: Vec2<f64>,
    r_b: Vec2<f64>,
    direction: Vec2<f64>,
) -> f64 {
    let r_a_perp = Vec2::new(-r_a.y, r_a.x);
    let r_b_perp = Vec2::new(-r_b.y, r_b.x);

    a.inv_mass
        + b.inv_mass
        + r_a_perp.dot(direction).powi(2) * a.inv_inertia
        + r_b_perp.dot(direction).powi(2) * b.inv_inertia
}

/// Apply an impulse and its reaction at a contact offset.
fn apply_impulse(
    a: &mut RigidBody,
    b: &mut RigidBody,
    impulse: Vec2<f64>,
    r_a: Vec2<f64>,
    r_b: Vec2<f64>,
) {
    a.vel -= impulse * a.inv_mass;
    a.ang_vel -= cross(r_a, impulse) * a.inv_inertia;

    b.vel += impulse * b.inv_mass;
    b.ang_vel += cross(r_b, impulse) * b.inv_inertia;
}

#[cfg(test)]
mod tests {
    use vek::Vec2;

    use crate::{collision::sat, rigidbody::RigidBody, Shape};

    use super::{resolve_collision, separate_bodies};

    fn circle(x: f64, radius: f64, density: f64, vx: f64) -> RigidBody {
        let mut body = RigidBody::new(Vec2::new(x, 0.0), Shape::circle(radius))
            .with_density(density)
            .with_restitution(1.0)
            .with_friction(0.0, 0.0)
            .with_velocity(Vec2::new(vx, 0.0));
        body.compute_mass_properties(1.0);

        body
    }

    /// A fully elastic frictionless impact keeps the total momentum.
    #[test]
    fn test_momentum_conservation() {
        let mut a = circle(0.0, 10.0, 1.0, 2.0);
        let mut b = circle(15.0, 10.0, 3.0, -1.0);

        let before = a.velocity() * a.mass() + b.velocity() * b.mass();

        let info = sat::collide(&a, &b).expect("circles overlap");
        let contacts = crate::collision::contact::generate(&a, &b, &info);
        resolve_collision(&mut a, &mut b, &contacts);

        let after = a.velocity() * a.mass() + b.velocity() * b.mass();
        assert!((before - after).magnitude() < 1e-3);
        // Something actually happened
        assert!(a.velocity().x < 2.0);
    }

    /// Equal masses in a head-on elastic impact trade velocities.
    #[test]
    fn test_elastic_velocity_swap() {
        let mut a = circle(0.0, 10.0, 1.0, 1.0);
        let mut b = circle(15.0, 10.0, 1.0, -1.0);

        let info = sat::collide(&a, &b).unwrap();
        let contacts = crate::collision::contact::generate(&a, &b, &info);
        resolve_collision(&mut a, &mut b, &contacts);

        assert!(a.velocity().distance(Vec2::new(-1.0, 0.0)) < 1e-9);
        assert!(b.velocity().distance(Vec2::new(1.0, 0.0)) < 1e-9);
    }

    /// A separating pair is left alone.
    #[test]
    fn test_separating_pair_untouched() {
        let mut a = circle(0.0, 10.0, 1.0, -1.0);
        let mut b = circle(15.0, 10.0, 1.0, 1.0);

        let info = sat::collide(&a, &b).unwrap();
        let contacts = crate::collision::contact::generate(&a, &b, &info);
        resolve_collision(&mut a, &mut b, &contacts);

        assert_eq!(a.velocity(), Vec2::new(-1.0, 0.0));
        assert_eq!(b.velocity(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_separation_split() {
        let normal = Vec2::new(1.0, 0.0);

        // Mobile pair shares the correction
        let mut a = circle(0.0, 10.0, 1.0, 0.0);
        let mut b = circle(15.0, 10.0, 1.0, 0.0);
        separate_bodies(&mut a, &mut b, normal, 5.0);
        assert_eq!(a.position(), Vec2::new(-2.5, 0.0));
        assert_eq!(b.position(), Vec2::new(17.5, 0.0));

        // A static partner takes none of it
        let mut fixed = RigidBody::fixed(Vec2::new(0.0, 0.0), Shape::circle(10.0));
        fixed.compute_mass_properties(1.0);
        let mut mobile = circle(15.0, 10.0, 1.0, 0.0);
        separate_bodies(&mut fixed, &mut mobile, normal, 5.0);
        assert_eq!(fixed.position(), Vec2::zero());
        assert_eq!(mobile.position(), Vec2::new(20.0, 0.0));
    }
}
