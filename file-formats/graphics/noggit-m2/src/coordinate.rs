//! Conversion from file coordinates into the editor's coordinate system
//!
//! Model files store Z-up vectors. The editor renders with Y up, so every
//! position, normal, pivot, quaternion and scale is converted once at load.

use glam::{Quat, Vec3};

/// Convert a position or direction: `(x, y, z) -> (x, z, -y)`
#[inline]
pub fn fix_vector(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}

/// Convert a rotation: the vector part follows [`fix_vector`]
///
/// Quaternions applied to column vectors (`q * v`) must be conjugated by the
/// same axis swap as positions, otherwise a converted rotation spins the
/// wrong way around the new up axis.
#[inline]
pub fn fix_quat(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, q.z, -q.y, q.w)
}

/// Convert a scale vector: `(x, y, z) -> (x, z, y)`
#[inline]
pub fn fix_scale(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}
