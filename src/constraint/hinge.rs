//! Hinge constraint solving.
//!
//! An anchor coincidence constraint in velocity space with a full 2x2
//! effective mass matrix, the joint equivalent of Box2D-Lite. Rotation
//! around the pivot stays free.

use log::debug;
use slotmap::HopSlotMap;
use vek::Vec2;

use crate::rigidbody::{BodyKey, RigidBody};

use super::{world_anchor, Joint, JointKind};

/// Scalar 2D cross product.
fn cross(a: Vec2<f64>, b: Vec2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Pull the two hinge anchors onto the same point.
pub(crate) fn solve(
    joint: &Joint,
    bodies: &mut HopSlotMap<BodyKey, RigidBody>,
    dt: f64,
    position_correction: bool,
) {
    puffin::profile_function!();

    let JointKind::Hinge { softness } = joint.kind else {
        return;
    };

    match joint.b {
        Some(b_key) => {
            let Some([a, b]) = bodies.get_disjoint_mut([joint.a, b_key]) else {
                debug!("skipping hinge with a dangling body reference");
                return;
            };

            pin(a, Some(b), joint, softness, dt, position_correction);
        }
        None => {
            let Some(a) = bodies.get_mut(joint.a) else {
                debug!("skipping hinge with a dangling body reference");
                return;
            };

            pin(a, None, joint, softness, dt, position_correction);
        }
    }
}

/// Compute and apply the hinge impulse.
///
/// The second body is missing for world pinned hinges, the world side then
/// acts as an infinite mass at the fixed anchor.
fn pin(
    a: &mut RigidBody,
    b: Option<&mut RigidBody>,
    joint: &Joint,
    softness: f64,
    dt: f64,
    position_correction: bool,
) {
    // Anchor offsets from the centers of mass
    let r_a = world_anchor(a, joint.local_anchor_a) - a.center();
    let (r_b, anchor_b) = match &b {
        Some(b) => {
            let anchor = world_anchor(b, joint.local_anchor_b);
            (anchor - b.center(), anchor)
        }
        None => (Vec2::zero(), joint.local_anchor_b),
    };
    let anchor_a = a.center() + r_a;

    let (b_inv_mass, b_inv_inertia) = b
        .as_ref()
        .map(|b| (b.inv_mass, b.inv_inertia))
        .unwrap_or_default();

    // Effective mass matrix of the anchor coincidence constraint:
    // K = (1/m_a + 1/m_b) I + 1/I_a skew(r_a)^T skew(r_a)
    //                        + 1/I_b skew(r_b)^T skew(r_b) + softness I
    let inv_mass_sum = a.inv_mass + b_inv_mass;
    let k11 = inv_mass_sum
        + a.inv_inertia * r_a.y * r_a.y
        + b_inv_inertia * r_b.y * r_b.y
        + softness;
    let k12 = -a.inv_inertia * r_a.x * r_a.y - b_inv_inertia * r_b.x * r_b.y;
    let k22 = inv_mass_sum
        + a.inv_inertia * r_a.x * r_a.x
        + b_inv_inertia * r_b.x * r_b.x
        + softness;

    let determinant = k11 * k22 - k12 * k12;
    if determinant.abs() <= f64::EPSILON {
        // Both ends are immovable
        return;
    }

    // Feed a fraction of the anchor gap back as a velocity target
    let bias = if position_correction {
        (anchor_b - anchor_a) * (-joint.bias_factor / dt)
    } else {
        Vec2::zero()
    };

    let b_velocity = b
        .as_ref()
        .map(|b| b.vel + Vec2::new(-r_b.y, r_b.x) * b.ang_vel)
        .unwrap_or_default();
    let a_velocity = a.vel + Vec2::new(-r_a.y, r_a.x) * a.ang_vel;
    let relative_velocity = b_velocity - a_velocity;

    // Solve K impulse = bias - dv
    let rhs = bias - relative_velocity;
    let impulse = Vec2::new(
        (k22 * rhs.x - k12 * rhs.y) / determinant,
        (k11 * rhs.y - k12 * rhs.x) / determinant,
    );

    a.vel -= impulse * a.inv_mass;
    a.ang_vel -= cross(r_a, impulse) * a.inv_inertia;

    if let Some(b) = b {
        b.vel += impulse * b.inv_mass;
        b.ang_vel += cross(r_b, impulse) * b.inv_inertia;
    }
}
