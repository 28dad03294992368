//! Euler-angle conversions

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use std::f32::consts::PI;

/// Decompose a rotation into X-Y-Z Euler angles `[a, b, c]` such that
/// `R = Rx(a) * Ry(b) * Rz(c)`.
///
/// The first angle is kept in `[0, π]`, the range a PCL/Eigen based viewer
/// produces for the same rotation, so labels land with the same orientation.
pub fn euler_angles_xyz(rotation: &UnitQuaternion<f32>) -> Vector3<f32> {
    let m: Matrix3<f32> = rotation.to_rotation_matrix().into_inner();

    let mut a = m[(1, 2)].atan2(m[(2, 2)]);
    let c2 = (m[(0, 0)] * m[(0, 0)] + m[(0, 1)] * m[(0, 1)]).sqrt();
    let b = if a > 0.0 {
        a -= PI;
        (-m[(0, 2)]).atan2(-c2)
    } else {
        (-m[(0, 2)]).atan2(c2)
    };
    let (s1, c1) = a.sin_cos();
    let c = (s1 * m[(2, 0)] - c1 * m[(1, 0)]).atan2(c1 * m[(1, 1)] - s1 * m[(2, 1)]);

    -Vector3::new(a, b, c)
}

/// Inverse of [`euler_angles_xyz`]: build `Rx(a) * Ry(b) * Rz(c)`.
pub fn rotation_from_euler_xyz(angles: &Vector3<f32>) -> UnitQuaternion<f32> {
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), angles.x);
    let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), angles.y);
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), angles.z);
    UnitQuaternion::from_rotation_matrix(&(rx * ry * rz))
}
