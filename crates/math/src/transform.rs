use serde::{Deserialize, Serialize};

use crate::matrix::Mat4;
use crate::vector::Vec3;

/// Spatial transform: position, Euler rotation (radians), scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Uniform scale at the origin with no rotation.
    pub fn uniform(scale: f32) -> Self {
        Self {
            scale: Vec3::splat(scale),
            ..Self::default()
        }
    }

    /// Model matrix `T * Ry(rotation.y + spin) * Rx * Rz * S`.
    ///
    /// `spin` is an extra yaw about the object's own Y axis, used for the
    /// idle turntable animation.
    pub fn matrix(&self, spin: f32) -> Mat4 {
        Mat4::translate(self.position)
            * Mat4::rotate_y(self.rotation.y + spin)
            * Mat4::rotate_x(self.rotation.x)
            * Mat4::rotate_z(self.rotation.z)
            * Mat4::scale(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(0.0), Mat4::IDENTITY);
    }

    #[test]
    fn scale_applies_before_translation() {
        let t = Transform {
            position: Vec3::new(0.0, 1.0, 0.0),
            ..Transform::uniform(3.0)
        };
        let p = t.matrix(0.0).transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(3.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn spin_turns_about_y() {
        let t = Transform::default();
        let p = t
            .matrix(core::f32::consts::FRAC_PI_2)
            .transform_point(Vec3::new(0.0, 0.0, 1.0));
        assert!((p - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }
}
