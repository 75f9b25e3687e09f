use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::Deserialize;
use vek::Vec2;

/// Distance under which two world space values count as the same, half a millimeter.
pub const EPSILON: f64 = 5.0e-4;

/// Rotation split into its sine and cosine parts.
///
/// This allows something to rotate infinitely without the angle growing
/// unbounded. Degrees only exist at the host boundary.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "f64")]
pub struct Rotation {
    /// Cosine part of the rotation.
    cos: f64,
    /// Sine part of the rotation.
    sin: f64,
}

impl Rotation {
    /// Create from radians.
    pub fn from_radians(rotation: f64) -> Self {
        let (sin, cos) = rotation.sin_cos();

        Self { sin, cos }
    }

    /// Create from degrees.
    pub fn from_degrees(rotation: f64) -> Self {
        Self::from_radians(rotation.to_radians())
    }

    /// Convert to radians.
    pub fn to_radians(self) -> f64 {
        self.sin.atan2(self.cos)
    }

    /// Convert to degrees.
    pub fn to_degrees(self) -> f64 {
        self.to_radians().to_degrees()
    }

    /// Rotate a point around the origin.
    pub fn rotate(&self, point: Vec2<f64>) -> Vec2<f64> {
        Vec2::new(
            point.x * self.cos - point.y * self.sin,
            point.x * self.sin + point.y * self.cos,
        )
    }

    /// Sine.
    pub fn sin(&self) -> f64 {
        self.sin
    }

    /// Cosine.
    pub fn cos(&self) -> f64 {
        self.cos
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self { cos: 1.0, sin: 0.0 }
    }
}

impl From<f64> for Rotation {
    fn from(value: f64) -> Self {
        Self::from_radians(value)
    }
}

impl Add<Self> for Rotation {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            cos: self.cos * rhs.cos - self.sin * rhs.sin,
            sin: self.sin * rhs.cos + self.cos * rhs.sin,
        }
    }
}

impl Add<f64> for Rotation {
    type Output = Self;

    fn add(self, rhs: f64) -> Self::Output {
        self + Self::from_radians(rhs)
    }
}

impl AddAssign<f64> for Rotation {
    fn add_assign(&mut self, rhs: f64) {
        *self = *self + rhs;
    }
}

impl AddAssign<Self> for Rotation {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub<Self> for Rotation {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self + -rhs
    }
}

impl SubAssign<Self> for Rotation {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Rotation {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            cos: self.cos,
            sin: -self.sin,
        }
    }
}

/// Closest point on the segment `a..=b` to `point`, with its distance.
///
/// The projection parameter is clamped so the result always lies on the
/// segment, degenerate segments return `a`.
pub fn closest_point_on_segment(
    a: Vec2<f64>,
    b: Vec2<f64>,
    point: Vec2<f64>,
) -> (Vec2<f64>, f64) {
    let ab = b - a;
    let ab_len_sq = ab.magnitude_squared();

    let closest = if ab_len_sq <= EPSILON * EPSILON {
        a
    } else {
        let t = (point - a).dot(ab) / ab_len_sq;

        a + ab * t.clamp(0.0, 1.0)
    };

    (closest, point.distance(closest))
}

/// Whether two values are within the world space epsilon of each other.
pub fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Whether two points are within the world space epsilon of each other.
pub fn vec2_nearly_equal(a: Vec2<f64>, b: Vec2<f64>) -> bool {
    nearly_equal(a.x, b.x) && nearly_equal(a.y, b.y)
}

#[cfg(test)]
mod tests {
    use vek::Vec2;

    use super::{closest_point_on_segment, Rotation};

    /// Test different operations on rotations.
    #[test]
    fn test_ops() {
        let mut a = Rotation::from_degrees(90.0);
        let b = Rotation::from_degrees(45.0);

        assert_eq!((-a).to_degrees().round() as i16, -90);
        assert_eq!((a + b).to_degrees().round() as i16, 135);
        assert_eq!((a - b).to_degrees().round() as i16, 45);

        a += 10f64.to_radians();
        assert_eq!(a.to_degrees().round() as i16, 100);
    }

    #[test]
    fn test_rotate_point() {
        let quarter = Rotation::from_degrees(90.0);
        let rotated = quarter.rotate(Vec2::new(1.0, 0.0));

        assert!(rotated.distance(Vec2::new(0.0, 1.0)) < 1e-9);
    }

    /// Clamped ends return the segment endpoints, interior projections are colinear.
    #[test]
    fn test_closest_point_on_segment() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);

        let (before, _) = closest_point_on_segment(a, b, Vec2::new(-5.0, 3.0));
        assert_eq!(before, a);

        let (after, _) = closest_point_on_segment(a, b, Vec2::new(15.0, 3.0));
        assert_eq!(after, b);

        let (mid, dist) = closest_point_on_segment(a, b, Vec2::new(4.0, 3.0));
        let ab = b - a;
        let cross = ab.x * (mid.y - a.y) - ab.y * (mid.x - a.x);
        assert!(cross.abs() < 1e-9);
        assert!((dist - 3.0).abs() < 1e-9);
    }
}
