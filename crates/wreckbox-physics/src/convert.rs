//! glam ↔ nalgebra conversions at the Rapier boundary.

use glam::{Quat, Vec3};
use rapier3d::prelude::{Rotation, Vector};

/// glam vector → Rapier vector.
pub fn to_vector(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

/// Rapier vector → glam vector.
pub fn to_vec3(v: &Vector) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// glam quaternion → Rapier rotation. Renormalizes, so slightly drifted
/// inputs are accepted.
pub fn to_rotation(q: Quat) -> Rotation {
    Rotation::from_xyzw(q.x, q.y, q.z, q.w).normalize()
}

/// Rapier rotation → glam quaternion.
pub fn to_quat(r: &Rotation) -> Quat {
    Quat::from_xyzw(r.x, r.y, r.z, r.w)
}
