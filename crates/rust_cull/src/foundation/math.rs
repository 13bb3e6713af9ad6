//! Math utilities and types
//!
//! Provides the math types used by cullable objects and render contexts.

pub use nalgebra::{Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Build a right-handed world-to-camera view matrix
pub fn look_at(eye: Point3, target: Point3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(&eye, &target, &up)
}

/// Depth of a world-space point in front of a right-handed camera
///
/// The camera looks down its local -Z axis, so points in front of it have a
/// positive depth.
pub fn view_depth(view: &Mat4, point: &Point3) -> f32 {
    -view.transform_point(point).z
}
