//! Bilateral constraints between bodies.
//!
//! Joints live in their own registry and are solved in velocity space after
//! all collision sub-steps. Removing a body does not remove the joints
//! referring to it, dangling joints are skipped until the host cleans them
//! up.

pub mod hinge;
pub mod spring;

use slotmap::new_key_type;
use vek::Vec2;

use crate::{
    collision::shape::Shape,
    rigidbody::{BodyKey, RigidBody},
};

new_key_type! {
    /// Stable generational handle to a joint inside a world.
    pub struct JointKey;
}

/// Constraint behavior of a [`Joint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointKind {
    /// Keeps the anchors at a rest distance from each other.
    Spring {
        /// Distance the joint tries to resolve to.
        rest_length: f64,
        /// How aggressively the offset is corrected.
        spring_constant: f64,
    },
    /// Pins the anchors to the same point, rotation stays free.
    Hinge {
        /// Softens the constraint, zero is fully rigid.
        softness: f64,
    },
}

/// Bilateral constraint between two bodies, or one body and a world anchor.
#[derive(Debug, Clone)]
pub struct Joint {
    /// First endpoint.
    pub(crate) a: BodyKey,
    /// Second endpoint, anchored to the world when missing.
    pub(crate) b: Option<BodyKey>,
    /// Attachment on the first body, relative to its center at rotation zero.
    pub(crate) local_anchor_a: Vec2<f64>,
    /// Attachment on the second body, or the world position when `b` is unset.
    pub(crate) local_anchor_b: Vec2<f64>,
    /// Fraction of the position error fed back as velocity per step.
    pub(crate) bias_factor: f64,
    /// Suppress collision detection between the two endpoints.
    pub(crate) disable_collisions: bool,
    /// Constraint behavior.
    pub(crate) kind: JointKind,
}

impl Joint {
    /// Construct a spring between two bodies, anchored to their centers.
    pub fn spring(a: BodyKey, b: BodyKey, rest_length: f64, spring_constant: f64) -> Self {
        Self {
            a,
            b: Some(b),
            local_anchor_a: Vec2::zero(),
            local_anchor_b: Vec2::zero(),
            bias_factor: 0.2,
            disable_collisions: false,
            kind: JointKind::Spring {
                rest_length,
                spring_constant,
            },
        }
    }

    /// Construct a spring between a body and a fixed world position.
    pub fn spring_to_world(
        a: BodyKey,
        world_anchor: Vec2<f64>,
        rest_length: f64,
        spring_constant: f64,
    ) -> Self {
        Self {
            b: None,
            local_anchor_b: world_anchor,
            ..Self::spring(a, BodyKey::default(), rest_length, spring_constant)
        }
    }

    /// Construct a hinge pinning two bodies together at their anchors.
    ///
    /// Hinged pairs skip collision detection with each other, the shapes
    /// usually overlap around the pivot.
    pub fn hinge(a: BodyKey, b: BodyKey) -> Self {
        Self {
            a,
            b: Some(b),
            local_anchor_a: Vec2::zero(),
            local_anchor_b: Vec2::zero(),
            bias_factor: 0.2,
            disable_collisions: false,
            kind: JointKind::Hinge { softness: 0.0 },
        }
    }

    /// Construct a hinge pinning a body to a fixed world position.
    pub fn hinge_to_world(a: BodyKey, world_anchor: Vec2<f64>) -> Self {
        Self {
            b: None,
            local_anchor_b: world_anchor,
            ..Self::hinge(a, BodyKey::default())
        }
    }

    /// Set the attachment points relative to the body centers at rotation zero.
    #[must_use]
    pub fn with_anchors(mut self, local_anchor_a: Vec2<f64>, local_anchor_b: Vec2<f64>) -> Self {
        self.local_anchor_a = local_anchor_a;
        self.local_anchor_b = local_anchor_b;
        self
    }

    /// Set how much position error is fed back as velocity per step.
    #[must_use]
    pub fn with_bias_factor(mut self, bias_factor: f64) -> Self {
        self.bias_factor = bias_factor;
        self
    }

    /// Soften a hinge, springs are unaffected.
    #[must_use]
    pub fn with_softness(mut self, value: f64) -> Self {
        if let JointKind::Hinge { softness } = &mut self.kind {
            *softness = value;
        }
        self
    }

    /// Suppress collision detection between the two endpoints.
    #[must_use]
    pub fn with_disabled_collisions(mut self) -> Self {
        self.disable_collisions = true;
        self
    }

    /// Constraint behavior.
    pub fn kind(&self) -> JointKind {
        self.kind
    }

    /// First endpoint.
    pub fn body_a(&self) -> BodyKey {
        self.a
    }

    /// Second endpoint, anchored to the world when missing.
    pub fn body_b(&self) -> Option<BodyKey> {
        self.b
    }

    /// Whether the joint connects exactly these two bodies.
    pub(crate) fn connects(&self, x: BodyKey, y: BodyKey) -> bool {
        (self.a == x && self.b == Some(y)) || (self.a == y && self.b == Some(x))
    }

    /// Whether collision detection between the endpoints is suppressed.
    pub(crate) fn suppresses_collisions(&self) -> bool {
        self.disable_collisions || matches!(self.kind, JointKind::Hinge { .. })
    }
}

/// World space position of a local anchor on a body.
///
/// The anchor rotates with the body. For rectangles the local anchor is
/// relative to the center, which sits half a size away from the position.
pub(crate) fn world_anchor(body: &RigidBody, local_anchor: Vec2<f64>) -> Vec2<f64> {
    let mut anchor = body.rotation().rotate(local_anchor);

    if let Shape::Rectangle { size } = body.shape() {
        anchor += Vec2::new(size.w, size.h) / 2.0;
    }

    body.position() + anchor
}

#[cfg(test)]
mod tests {
    use vek::Vec2;

    use crate::{math::Rotation, rigidbody::RigidBody, Shape};

    use super::world_anchor;

    /// Rectangle anchors pivot around the center, not the corner.
    #[test]
    fn test_world_anchor() {
        let mut rect = RigidBody::new(Vec2::new(10.0, 10.0), Shape::rectangle(20.0, 10.0));
        assert_eq!(world_anchor(&rect, Vec2::zero()), Vec2::new(20.0, 15.0));
        assert_eq!(world_anchor(&rect, Vec2::new(5.0, 0.0)), Vec2::new(25.0, 15.0));

        rect.rot = Rotation::from_degrees(90.0);
        let rotated = world_anchor(&rect, Vec2::new(5.0, 0.0));
        assert!(rotated.distance(Vec2::new(20.0, 20.0)) < 1e-9);

        let circle = RigidBody::new(Vec2::new(10.0, 10.0), Shape::circle(4.0));
        assert_eq!(world_anchor(&circle, Vec2::zero()), Vec2::new(10.0, 10.0));
    }
}
