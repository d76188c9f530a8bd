//! Vector and matrix helpers
//!
//! Plain arithmetic (add, scale, dot, cross, matrix multiply) comes straight
//! from nalgebra. The functions here add the checks a camera needs: nothing
//! in this module ever returns a NaN built from a zero-length vector.

use crate::error::{Error, Result};
use nalgebra::{Matrix4, Perspective3, Point3, Unit, UnitQuaternion, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 4x4 matrix with floating point components
pub type Matrix4f = Matrix4<f32>;

/// A unit quaternion with floating point components
pub type Rotation3f = UnitQuaternion<f32>;

/// Vectors shorter than this cannot be normalized
pub const DEGENERATE_EPSILON: f32 = 1e-6;

/// Normalize a vector, failing on near-zero or non-finite input
pub fn normalize(v: &Vector3f) -> Result<Vector3f> {
    let length = v.norm();
    if !length.is_finite() || length < DEGENERATE_EPSILON {
        return Err(Error::DegenerateVector { length });
    }
    Ok(v / length)
}

/// Normalize a vector into a nalgebra unit type
pub fn unit(v: &Vector3f) -> Result<Unit<Vector3f>> {
    normalize(v).map(Unit::new_unchecked)
}

/// Rotation of `angle` radians about `axis`
pub fn rotation_about(axis: &Vector3f, angle: f32) -> Result<Rotation3f> {
    Ok(UnitQuaternion::from_axis_angle(&unit(axis)?, angle))
}

/// Right-handed camera basis `(forward, right, up)` for a view direction and
/// an approximate up vector.
///
/// Fails when `forward` is degenerate or parallel to `up`.
pub fn camera_basis(forward: &Vector3f, up: &Vector3f) -> Result<(Vector3f, Vector3f, Vector3f)> {
    let forward = normalize(forward)?;
    let right = normalize(&forward.cross(up))?;
    let up = right.cross(&forward);
    Ok((forward, right, up))
}

/// Right-handed look-at view matrix
pub fn look_at(eye: &Point3f, target: &Point3f, up: &Vector3f) -> Result<Matrix4f> {
    let (_, _, up) = camera_basis(&(target - eye), up)?;
    Ok(Matrix4::look_at_rh(eye, target, &up))
}

/// Perspective projection with OpenGL clip conventions
pub fn perspective(aspect: f32, fov_y: f32, near: f32, far: f32) -> Result<Matrix4f> {
    if !(aspect.is_finite() && aspect > 0.0) {
        return Err(Error::InvalidData(format!("aspect ratio must be positive, got {}", aspect)));
    }
    if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) {
        return Err(Error::InvalidData(format!("field of view must be in (0, pi), got {}", fov_y)));
    }
    if !(near > 0.0 && far > near) {
        return Err(Error::InvalidData(format!(
            "clip planes must satisfy 0 < near < far, got near={} far={}",
            near, far
        )));
    }
    Ok(Perspective3::new(aspect, fov_y, near, far).to_homogeneous())
}

/// Rotate `point` about `pivot`
pub fn rotate_about_pivot(point: &Point3f, pivot: &Point3f, rotation: &Rotation3f) -> Point3f {
    pivot + rotation * (point - pivot)
}
