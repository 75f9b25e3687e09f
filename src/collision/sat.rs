//! Separating axis theorem narrow phase.

use vek::{Aabr, Vec2};

use crate::rigidbody::RigidBody;

use super::shape::{Obb, Shape};

/// Narrow phase result.
///
/// The normal always points from the first body towards the second, the
/// depth is the smallest translation along it that separates the pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionInfo {
    /// Normalized direction of the minimum translation vector.
    pub normal: Vec2<f64>,
    /// Length of the minimum translation vector.
    pub depth: f64,
}

/// A simple projection on an axis that can be used to check for overlaps.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Projection {
    /// Minimum projected value.
    min: f64,
    /// Maximum projected value.
    max: f64,
}

impl Projection {
    /// Project polygon vertices on an axis.
    fn vertices(vertices: &[Vec2<f64>; 4], axis: Vec2<f64>) -> Self {
        // Start by projecting the first so we don't have to check for infinite
        let mut min = axis.dot(vertices[0]);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            let projection = axis.dot(*vertex);

            min = min.min(projection);
            max = max.max(projection);
        }

        Self { min, max }
    }

    /// Project a circle on an axis.
    fn circle(center: Vec2<f64>, radius: f64, axis: Vec2<f64>) -> Self {
        let center = axis.dot(center);

        Self {
            min: center - radius,
            max: center + radius,
        }
    }

    /// Whether a gap exists between this and another projection.
    fn separated(&self, other: &Self) -> bool {
        self.min >= other.max || other.min >= self.max
    }

    /// Size of the overlapping region with another projection.
    fn overlap(&self, other: &Self) -> f64 {
        (self.max.min(other.max) - self.min.max(other.min)).max(0.0)
    }
}

/// Outward normals of the polygon edges, normalized.
fn edge_axes(vertices: &[Vec2<f64>; 4]) -> [Vec2<f64>; 4] {
    [0, 1, 2, 3].map(|index| {
        let edge = vertices[(index + 1) % 4] - vertices[index];

        Vec2::new(-edge.y, edge.x).normalized()
    })
}

/// Detect a collision between two bodies.
///
/// Returns `None` when there is no overlap, otherwise the normal points from
/// `a` towards `b`.
pub fn collide(a: &RigidBody, b: &RigidBody) -> Option<CollisionInfo> {
    puffin::profile_function!();

    match (a.shape(), b.shape()) {
        (Shape::Circle { radius: a_radius }, Shape::Circle { radius: b_radius }) => {
            circle_circle(a.position(), a_radius, b.position(), b_radius)
        }
        (Shape::Circle { radius }, Shape::Rectangle { .. }) => {
            circle_obb(a.position(), radius, &b.obb())
        }
        (Shape::Rectangle { .. }, Shape::Circle { radius }) => {
            // Flip so the normal still points from a to b
            circle_obb(b.position(), radius, &a.obb()).map(|info| CollisionInfo {
                normal: -info.normal,
                depth: info.depth,
            })
        }
        (Shape::Rectangle { .. }, Shape::Rectangle { .. }) => obb_obb(&a.obb(), &b.obb()),
    }
}

/// Circle-circle collision along the midline.
pub fn circle_circle(
    a_center: Vec2<f64>,
    a_radius: f64,
    b_center: Vec2<f64>,
    b_radius: f64,
) -> Option<CollisionInfo> {
    let midline = b_center - a_center;
    let magnitude = midline.magnitude();

    if magnitude <= 0.0 || magnitude >= a_radius + b_radius {
        return None;
    }

    Some(CollisionInfo {
        normal: midline / magnitude,
        depth: a_radius + b_radius - magnitude,
    })
}

/// Rectangle-rectangle collision with the separating axis theorem.
///
/// Checks the edge normals of both rectangles and keeps the axis with the
/// smallest overlap as the minimum translation vector.
pub fn obb_obb(a: &Obb, b: &Obb) -> Option<CollisionInfo> {
    let a_vertices = a.vertices();
    let b_vertices = b.vertices();

    let mut depth = f64::MAX;
    let mut normal = Vec2::zero();

    for axis in edge_axes(&a_vertices)
        .into_iter()
        .chain(edge_axes(&b_vertices))
    {
        let a_projection = Projection::vertices(&a_vertices, axis);
        let b_projection = Projection::vertices(&b_vertices, axis);

        if a_projection.separated(&b_projection) {
            return None;
        }

        let overlap = a_projection.overlap(&b_projection);
        if overlap < depth {
            depth = overlap;
            normal = axis;
        }
    }

    // Point the normal from a to b
    let direction = b.center() - a.center();
    if direction.dot(normal) < 0.0 {
        normal = -normal;
    }

    Some(CollisionInfo { normal, depth })
}

/// Circle-rectangle collision.
///
/// The rectangle edge normals are augmented with the axis from the closest
/// rectangle corner to the circle center, which covers the corner region the
/// edge normals miss.
pub fn circle_obb(center: Vec2<f64>, radius: f64, obb: &Obb) -> Option<CollisionInfo> {
    let vertices = obb.vertices();

    let mut depth = f64::MAX;
    let mut normal = Vec2::zero();

    let closest_vertex = vertices
        .into_iter()
        .min_by(|a, b| a.distance_squared(center).total_cmp(&b.distance_squared(center)))
        .expect("vertex array is never empty");
    let corner_axis = (closest_vertex - center).try_normalized();

    for axis in edge_axes(&vertices).into_iter().chain(corner_axis) {
        let obb_projection = Projection::vertices(&vertices, axis);
        let circle_projection = Projection::circle(center, radius, axis);

        if obb_projection.separated(&circle_projection) {
            return None;
        }

        let overlap = obb_projection.overlap(&circle_projection);
        if overlap < depth {
            depth = overlap;
            normal = axis;
        }
    }

    // Point the normal from the circle to the rectangle
    let direction = obb.center() - center;
    if direction.dot(normal) < 0.0 {
        normal = -normal;
    }

    Some(CollisionInfo { normal, depth })
}

/// Whether two oriented rectangles overlap, without translation information.
pub fn obb_intersects_obb(a: &Obb, b: &Obb) -> bool {
    let a_vertices = a.vertices();
    let b_vertices = b.vertices();

    edge_axes(&a_vertices)
        .into_iter()
        .chain(edge_axes(&b_vertices))
        .all(|axis| {
            !Projection::vertices(&a_vertices, axis)
                .separated(&Projection::vertices(&b_vertices, axis))
        })
}

/// Whether a circle overlaps an axis aligned box.
///
/// Clamps the center into the box and compares the remaining distance
/// against the radius.
pub fn circle_intersects_aabr(center: Vec2<f64>, radius: f64, aabr: Aabr<f64>) -> bool {
    let closest = Vec2::new(
        center.x.clamp(aabr.min.x, aabr.max.x),
        center.y.clamp(aabr.min.y, aabr.max.y),
    );

    center.distance(closest) < radius
}

/// Whether a body overlaps an oriented rectangle, used for tiles and frustums.
pub fn body_intersects_obb(body: &RigidBody, obb: &Obb) -> bool {
    match body.shape() {
        Shape::Rectangle { .. } => obb_intersects_obb(&body.obb(), obb),
        Shape::Circle { radius } => {
            circle_obb(body.position(), radius, obb).is_some()
        }
    }
}
