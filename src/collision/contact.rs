//! Contact point generation for colliding pairs.

use arrayvec::ArrayVec;
use vek::Vec2;

use crate::{
    math::{closest_point_on_segment, nearly_equal, vec2_nearly_equal},
    rigidbody::RigidBody,
};

use super::{sat::CollisionInfo, shape::Shape};

/// Single point of contact between two colliding bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// World space contact position.
    pub point: Vec2<f64>,
    /// Collision normal, pointing from the first body towards the second.
    pub normal: Vec2<f64>,
    /// How deep the bodies overlap along the normal.
    pub penetration: f64,
}

/// Generate the contact points for a colliding pair.
///
/// In 2D a convex pair can only ever touch in 1 or 2 points. The list can
/// also come back empty, shallow circle grazes produce a collision without a
/// usable contact.
pub fn generate(a: &RigidBody, b: &RigidBody, info: &CollisionInfo) -> ArrayVec<Contact, 2> {
    puffin::profile_function!();

    let mut contacts = ArrayVec::new();

    match (a.shape(), b.shape()) {
        (Shape::Circle { radius: a_radius }, Shape::Circle { radius: b_radius }) => {
            circle_circle(a, a_radius, b, b_radius, &mut contacts);
        }
        (Shape::Circle { radius }, Shape::Rectangle { .. }) => {
            circle_rectangle(a.position(), radius, b, info, &mut contacts);
        }
        (Shape::Rectangle { .. }, Shape::Circle { radius }) => {
            circle_rectangle(b.position(), radius, a, info, &mut contacts);
        }
        (Shape::Rectangle { .. }, Shape::Rectangle { .. }) => {
            rectangle_rectangle(a, b, info, &mut contacts);
        }
    }

    contacts
}

/// One contact on the first circle's edge along the midline.
fn circle_circle(
    a: &RigidBody,
    a_radius: f64,
    b: &RigidBody,
    b_radius: f64,
    contacts: &mut ArrayVec<Contact, 2>,
) {
    let midline = b.position() - a.position();
    let magnitude = midline.magnitude();

    if magnitude <= 0.0 || magnitude >= a_radius + b_radius {
        return;
    }

    let normal = midline / magnitude;

    contacts.push(Contact {
        point: a.position() + normal * a_radius,
        normal,
        penetration: a_radius + b_radius - magnitude,
    });
}

/// One contact at the closest rectangle edge point to the circle center.
fn circle_rectangle(
    center: Vec2<f64>,
    radius: f64,
    rectangle: &RigidBody,
    info: &CollisionInfo,
    contacts: &mut ArrayVec<Contact, 2>,
) {
    let vertices = rectangle.obb().vertices();

    let mut min_distance = f64::MAX;
    let mut closest = center;

    for index in 0..4 {
        let (point, distance) = closest_point_on_segment(
            vertices[index],
            vertices[(index + 1) % 4],
            center,
        );

        if distance < min_distance {
            min_distance = distance;
            closest = point;
        }
    }

    let penetration = radius - min_distance;
    if penetration < 0.0 {
        return;
    }

    contacts.push(Contact {
        point: closest,
        normal: info.normal,
        penetration,
    });
}

/// Up to two contacts where the rectangles touch.
///
/// Every vertex of each rectangle is tested against every edge of the other
/// one. The closest point wins, a second candidate at practically the same
/// distance but a different location becomes the second contact of a face
/// touching a face.
fn rectangle_rectangle(
    a: &RigidBody,
    b: &RigidBody,
    info: &CollisionInfo,
    contacts: &mut ArrayVec<Contact, 2>,
) {
    let a_vertices = a.obb().vertices();
    let b_vertices = b.obb().vertices();

    let mut min_distance = f64::MAX;
    let mut first = Vec2::zero();
    let mut second: Option<Vec2<f64>> = None;

    let mut consider = |vertex: Vec2<f64>, edges: &[Vec2<f64>; 4]| {
        for index in 0..4 {
            let (point, distance) =
                closest_point_on_segment(edges[index], edges[(index + 1) % 4], vertex);

            if nearly_equal(distance, min_distance) {
                if !vec2_nearly_equal(point, first) {
                    second = Some(point);
                }
            } else if distance < min_distance {
                min_distance = distance;
                first = point;
                second = None;
            }
        }
    };

    for vertex in a_vertices {
        consider(vertex, &b_vertices);
    }
    for vertex in b_vertices {
        consider(vertex, &a_vertices);
    }

    if min_distance == f64::MAX {
        return;
    }

    contacts.push(Contact {
        point: first,
        normal: info.normal,
        penetration: info.depth,
    });
    if let Some(point) = second {
        contacts.push(Contact {
            point,
            normal: info.normal,
            penetration: info.depth,
        });
    }
}
