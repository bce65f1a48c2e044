//! Vector/Matrix Math: value types for camera and model transforms.
//!
//! # Invariants
//! - All operations are pure; inputs are never mutated.
//! - `Mat4` is column-major, laid out the way GLSL `mat4` uniforms expect.
//! - `a * b` applied to a point is `b` first, then `a`.
//! - Degenerate inputs (zero-length normalize, singular invert) return the
//!   input unchanged instead of producing NaNs.

mod matrix;
mod transform;
mod vector;

pub use matrix::Mat4;
pub use transform::Transform;
pub use vector::{Vec2, Vec3, Vec4};
