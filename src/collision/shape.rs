use std::f64::consts::PI;

use serde::Deserialize;
use vek::{Aabr, Extent2, Vec2};

use crate::math::Rotation;

/// Drag coefficient of a flat plate moving through air.
const RECTANGLE_DRAG_COEFFICIENT: f64 = 2.05;

/// Drag coefficient of a smooth cylinder moving through air.
const CIRCLE_DRAG_COEFFICIENT: f64 = 1.17;

/// Collision shape of a rigid body.
///
/// Dimensions are fixed after construction, moving and rotating happens on
/// the body itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Rectangle rotating around its center, positioned by its top left corner.
    Rectangle {
        /// Full width and height.
        size: Extent2<f64>,
    },
    /// Circle positioned by its center.
    Circle {
        /// Distance from the center to the edge.
        radius: f64,
    },
}

impl Shape {
    /// Construct a rectangle from its full size.
    pub fn rectangle(width: f64, height: f64) -> Self {
        debug_assert!(width > 0.0 && height > 0.0);

        Self::Rectangle {
            size: Extent2::new(width, height),
        }
    }

    /// Construct a circle from its radius.
    pub fn circle(radius: f64) -> Self {
        debug_assert!(radius > 0.0);

        Self::Circle { radius }
    }

    /// Surface area.
    pub fn area(&self) -> f64 {
        match self {
            Self::Rectangle { size } => size.w * size.h,
            Self::Circle { radius } => PI * radius * radius,
        }
    }

    /// Moment of inertia around the center for a given mass.
    pub fn inertia(&self, mass: f64) -> f64 {
        // https://en.wikipedia.org/wiki/List_of_moments_of_inertia
        match self {
            Self::Rectangle { size } => mass * (size.w.powi(2) + size.h.powi(2)) / 12.0,
            Self::Circle { radius } => mass * radius.powi(2) / 2.0,
        }
    }

    /// Air drag coefficient.
    pub(crate) fn drag_coefficient(&self) -> f64 {
        match self {
            Self::Rectangle { .. } => RECTANGLE_DRAG_COEFFICIENT,
            Self::Circle { .. } => CIRCLE_DRAG_COEFFICIENT,
        }
    }

    /// Extent facing movement along each axis, used as the drag cross section.
    pub(crate) fn cross_extents(&self) -> Vec2<f64> {
        match self {
            Self::Rectangle { size } => Vec2::new(size.h, size.w),
            Self::Circle { radius } => Vec2::broadcast(radius * 2.0),
        }
    }

    /// Center of the shape for a body position.
    pub fn center(&self, pos: Vec2<f64>) -> Vec2<f64> {
        match self {
            Self::Rectangle { size } => pos + Vec2::new(size.w, size.h) / 2.0,
            Self::Circle { .. } => pos,
        }
    }

    /// Oriented bounding box at a body position and rotation.
    ///
    /// Circles report their enclosing square with a rotation of zero.
    pub fn obb(&self, pos: Vec2<f64>, rot: Rotation) -> Obb {
        match self {
            Self::Rectangle { size } => Obb::new(pos, *size, rot),
            Self::Circle { radius } => Obb::new(
                pos - Vec2::broadcast(*radius),
                Extent2::broadcast(radius * 2.0),
                Rotation::default(),
            ),
        }
    }

    /// Axis aligned bounding box at a body position and rotation.
    pub fn aabr(&self, pos: Vec2<f64>, rot: Rotation) -> Aabr<f64> {
        match self {
            Self::Rectangle { .. } => self.obb(pos, rot).aabr(),
            Self::Circle { radius } => Aabr {
                min: pos - Vec2::broadcast(*radius),
                max: pos + Vec2::broadcast(*radius),
            },
        }
    }
}

/// Oriented rectangle, the rotation pivots around the center.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Obb {
    /// Top left corner before rotating.
    pub pos: Vec2<f64>,
    /// Full width and height.
    pub size: Extent2<f64>,
    /// Rotation around the center.
    #[serde(default)]
    pub rot: Rotation,
}

impl Obb {
    /// Construct from the top left corner, the size and a rotation.
    pub fn new(pos: Vec2<f64>, size: Extent2<f64>, rot: Rotation) -> Self {
        Self { pos, size, rot }
    }

    /// Center point, invariant under the rotation.
    pub fn center(&self) -> Vec2<f64> {
        self.pos + Vec2::new(self.size.w, self.size.h) / 2.0
    }

    /// The 4 corner points, rotated around the center.
    ///
    /// Order is top left, top right, bottom right, bottom left.
    pub fn vertices(&self) -> [Vec2<f64>; 4] {
        let center = self.center();

        [
            self.pos,
            self.pos + Vec2::new(self.size.w, 0.0),
            self.pos + Vec2::new(self.size.w, self.size.h),
            self.pos + Vec2::new(0.0, self.size.h),
        ]
        .map(|corner| center + self.rot.rotate(corner - center))
    }

    /// Axis aligned bounding box around the rotated corners.
    pub fn aabr(&self) -> Aabr<f64> {
        let vertices = self.vertices();

        let mut aabr = Aabr {
            min: vertices[0],
            max: vertices[0],
        };
        for vertex in vertices.into_iter().skip(1) {
            aabr.expand_to_contain_point(vertex);
        }

        aabr
    }
}
