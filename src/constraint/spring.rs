//! Spring constraint solving.

use log::debug;
use slotmap::HopSlotMap;
use vek::Vec2;

use crate::rigidbody::{BodyKey, RigidBody};

use super::{world_anchor, Joint, JointKind};

/// Relax a spring joint towards its rest length.
///
/// Computes a single velocity impulse along the anchor line. The bias term
/// converts the length error into a target closing velocity, scaled by the
/// spring constant.
pub(crate) fn solve(joint: &Joint, bodies: &mut HopSlotMap<BodyKey, RigidBody>, dt: f64) {
    puffin::profile_function!();

    let JointKind::Spring {
        rest_length,
        spring_constant,
    } = joint.kind
    else {
        return;
    };

    match joint.b {
        Some(b_key) => {
            let Some([a, b]) = bodies.get_disjoint_mut([joint.a, b_key]) else {
                debug!("skipping spring with a dangling body reference");
                return;
            };

            let anchor_a = world_anchor(a, joint.local_anchor_a);
            let anchor_b = world_anchor(b, joint.local_anchor_b);

            relax(
                a,
                Some(b),
                anchor_a,
                anchor_b,
                rest_length,
                spring_constant,
                joint.bias_factor,
                dt,
            );
        }
        None => {
            let Some(a) = bodies.get_mut(joint.a) else {
                debug!("skipping spring with a dangling body reference");
                return;
            };

            let anchor_a = world_anchor(a, joint.local_anchor_a);

            relax(
                a,
                None,
                anchor_a,
                joint.local_anchor_b,
                rest_length,
                spring_constant,
                joint.bias_factor,
                dt,
            );
        }
    }
}

/// Apply the spring impulse between an anchored body pair.
///
/// The second body is missing for world anchored springs, the world side
/// then acts as an infinite mass.
#[allow(clippy::too_many_arguments)]
fn relax(
    a: &mut RigidBody,
    b: Option<&mut RigidBody>,
    anchor_a: Vec2<f64>,
    anchor_b: Vec2<f64>,
    rest_length: f64,
    spring_constant: f64,
    bias_factor: f64,
    dt: f64,
) {
    let delta = anchor_a - anchor_b;
    let distance = delta.magnitude();
    let offset = distance - rest_length;

    // Direction from a towards b, coinciding anchors pick an arbitrary one
    let direction = (-delta).try_normalized().unwrap_or_else(Vec2::unit_y);

    let combined_inverse_mass =
        a.inv_mass + b.as_ref().map(|b| b.inv_mass).unwrap_or_default();
    if combined_inverse_mass <= 0.0 {
        // Both ends are immovable
        return;
    }

    let bias = -(bias_factor / dt) * offset * spring_constant;

    let closing_velocity =
        (a.vel - b.as_ref().map(|b| b.vel).unwrap_or_default()).dot(direction);
    let lambda = -(closing_velocity + bias) / combined_inverse_mass;

    a.vel += direction * lambda * a.inv_mass;
    if let Some(b) = b {
        b.vel -= direction * lambda * b.inv_mass;
    }
}
