//! Attitude algebra on Hamilton (w, x, y, z) quaternions.
//!
//! Naming follows the `q_a2b` convention of the sensor: `q_e2b` is the
//! ECEF to body attitude, and its rotation matrix maps body vectors
//! into ECEF (`R_b2e`). None of these functions normalize their input:
//! a non unit quaternion yields a non orthonormal matrix, NaN propagates.
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use std::f64::consts::{FRAC_PI_2, PI};

/// Direction cosine matrix of `q`. For `q_a2b`, the returned matrix is `R_b2a`.
pub fn quaternion_to_rotation_matrix(q: &Quaternion<f64>) -> Matrix3<f64> {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);
    Matrix3::new(
        1.0 - 2.0 * (y * y + z * z),
        2.0 * (x * y - w * z),
        2.0 * (x * z + w * y),
        2.0 * (x * y + w * z),
        1.0 - 2.0 * (x * x + z * z),
        2.0 * (y * z - w * x),
        2.0 * (x * z - w * y),
        2.0 * (y * z + w * x),
        1.0 - 2.0 * (x * x + y * y),
    )
}

/// Hamilton product `lhs ⊗ rhs`.
/// The rotation matrix of the product is the product of rotation matrices.
pub fn quaternion_compose(lhs: &Quaternion<f64>, rhs: &Quaternion<f64>) -> Quaternion<f64> {
    lhs * rhs
}

pub fn quaternion_conjugate(q: &Quaternion<f64>) -> Quaternion<f64> {
    q.conjugate()
}

/// Vector part of `q ⊗ v ⊗ q*`.
pub fn rotate_vector(q: &Quaternion<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    (q * Quaternion::from_imag(*v) * q.conjugate()).imag()
}

/// Vector part of `q* ⊗ v ⊗ q`, the inverse of [rotate_vector].
pub fn conjugate_rotate_vector(q: &Quaternion<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    (q.conjugate() * Quaternion::from_imag(*v) * q).imag()
}

/// ECEF to NED attitude at given geodetic coordinates (radians).
/// Its rotation matrix maps NED vectors into ECEF.
pub fn quaternion_ecef_to_ned(lat_rad: f64, lon_rad: f64) -> Quaternion<f64> {
    UnitQuaternion::from_euler_angles(0.0, -lat_rad - FRAC_PI_2, lon_rad).into_inner()
}

/// Fixed NED to ENU attitude: 180° roll then 90° yaw.
/// Its rotation matrix is the x/y swap + z negation permutation,
/// which is its own inverse.
pub fn quaternion_ned_to_enu() -> Quaternion<f64> {
    UnitQuaternion::from_euler_angles(PI, 0.0, FRAC_PI_2).into_inner()
}

/// Re-expresses a NED vector in ENU: `(n, e, d) -> (e, n, -d)`.
pub fn ned_to_enu(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.y, v.x, -v.z)
}

/// Exact rotation matrix of [quaternion_ned_to_enu], free of trigonometric rounding.
pub fn rotation_ned_to_enu() -> Matrix3<f64> {
    Matrix3::new(0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -1.0)
}
