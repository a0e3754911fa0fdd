//! Math utilities and types
//!
//! Provides the fundamental 2D math types used by the geometry kernel and
//! the collision handler.

pub use nalgebra::{Rotation2, Vector2, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 4D vector type (used for RGBA debug colors)
pub type Vec4 = Vector4<f32>;

/// Transform representing position, rotation, and uniform scale in 2D
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    /// Position in 2D space
    pub position: Vec2,

    /// Rotation in radians (counter-clockwise)
    pub rotation: f32,

    /// Uniform scale factor
    pub scale: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

impl Transform2D {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform from all three components
    pub fn new(position: Vec2, rotation: f32, scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Apply this transform to a point (scale, then rotate, then translate)
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.position + self.transform_vector(point)
    }

    /// Apply this transform to a vector (no translation)
    pub fn transform_vector(&self, vector: Vec2) -> Vec2 {
        Rotation2::new(self.rotation) * (vector * self.scale)
    }

    /// Combine this transform with a child offset
    pub fn combine(&self, other: &Transform2D) -> Transform2D {
        Transform2D {
            position: self.transform_point(other.position),
            rotation: self.rotation + other.rotation,
            scale: self.scale * other.scale,
        }
    }

    /// Get the inverse transform
    pub fn inverse(&self) -> Transform2D {
        let inv_scale = if self.scale == 0.0 { 0.0 } else { 1.0 / self.scale };
        let inv_rotation = -self.rotation;
        let inv_position = Rotation2::new(inv_rotation) * (-self.position * inv_scale);

        Transform2D {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Tolerance used for approximate float comparisons
    pub const EPSILON: f32 = 1e-6;
}

/// Extension trait for Vec2 with the helpers the geometry kernel leans on
pub trait Vec2Ext {
    /// Perpendicular rotated 90 degrees counter-clockwise, `(-y, x)`
    fn perpendicular_left(&self) -> Vec2;

    /// Perpendicular rotated 90 degrees clockwise, `(y, -x)`
    fn perpendicular_right(&self) -> Vec2;

    /// 2D cross product (z component of the 3D cross product)
    fn cross_2d(&self, other: &Vec2) -> f32;

    /// Projection of `self` onto `onto`; zero when `onto` is zero
    fn project_onto(&self, onto: &Vec2) -> Vec2;

    /// Normalized copy, or zero for a zero-length vector
    fn normalize_or_zero(&self) -> Vec2;

    /// Rotate by `angle` radians
    fn rotated(&self, angle: f32) -> Vec2;

    /// True if both vectors point into the same half-plane (`dot > 0`)
    fn is_facing_same_direction(&self, other: &Vec2) -> bool;

    /// True if both vectors point into opposite half-planes (`dot < 0`)
    fn is_facing_opposite_direction(&self, other: &Vec2) -> bool;

    /// True if both vectors are parallel (exact, cross product is zero)
    fn is_parallel(&self, other: &Vec2) -> bool;
}

impl Vec2Ext for Vec2 {
    fn perpendicular_left(&self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    fn perpendicular_right(&self) -> Vec2 {
        Vec2::new(self.y, -self.x)
    }

    fn cross_2d(&self, other: &Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    fn project_onto(&self, onto: &Vec2) -> Vec2 {
        let len_sq = onto.magnitude_squared();
        if len_sq == 0.0 {
            return Vec2::zeros();
        }
        onto * (self.dot(onto) / len_sq)
    }

    fn normalize_or_zero(&self) -> Vec2 {
        let len = self.magnitude();
        if len == 0.0 || !len.is_finite() {
            Vec2::zeros()
        } else {
            self / len
        }
    }

    fn rotated(&self, angle: f32) -> Vec2 {
        Rotation2::new(angle) * self
    }

    fn is_facing_same_direction(&self, other: &Vec2) -> bool {
        self.dot(other) > 0.0
    }

    fn is_facing_opposite_direction(&self, other: &Vec2) -> bool {
        self.dot(other) < 0.0
    }

    fn is_parallel(&self, other: &Vec2) -> bool {
        self.perpendicular_left().dot(other) == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_point_applies_scale_rotation_translation() {
        let transform = Transform2D::new(Vec2::new(10.0, 0.0), constants::PI * 0.5, 2.0);
        let p = transform.transform_point(Vec2::new(1.0, 0.0));
        assert_relative_eq!(p, Vec2::new(10.0, 2.0), epsilon = EPSILON);
    }

    #[test]
    fn test_combine_with_inverse_is_identity() {
        let transform = Transform2D::new(Vec2::new(3.0, -4.0), 0.7, 2.5);
        let combined = transform.combine(&transform.inverse());
        assert_relative_eq!(combined.position, Vec2::zeros(), epsilon = EPSILON);
        assert_relative_eq!(combined.rotation, 0.0, epsilon = EPSILON);
        assert_relative_eq!(combined.scale, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_perpendiculars_and_facing() {
        let v = Vec2::new(1.0, 0.0);
        assert_eq!(v.perpendicular_left(), Vec2::new(0.0, 1.0));
        assert_eq!(v.perpendicular_right(), Vec2::new(0.0, -1.0));
        assert!(v.is_facing_same_direction(&Vec2::new(0.5, 3.0)));
        assert!(v.is_facing_opposite_direction(&Vec2::new(-0.5, 3.0)));
        assert!(!v.is_facing_same_direction(&Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn test_normalize_or_zero_handles_zero_vector() {
        assert_eq!(Vec2::zeros().normalize_or_zero(), Vec2::zeros());
        assert_relative_eq!(Vec2::new(3.0, 4.0).normalize_or_zero(), Vec2::new(0.6, 0.8), epsilon = EPSILON);
    }

    #[test]
    fn test_project_onto() {
        let p = Vec2::new(2.0, 2.0).project_onto(&Vec2::new(4.0, 0.0));
        assert_relative_eq!(p, Vec2::new(2.0, 0.0), epsilon = EPSILON);
        assert_eq!(Vec2::new(2.0, 2.0).project_onto(&Vec2::zeros()), Vec2::zeros());
    }
}
