//! WGS84 geodetic conversions.
use nalgebra::{Matrix3, Vector3};

use crate::constants::{
    EARTH_ECCENTRICITY_SQUARED_WGS84 as E2, EARTH_FLATTENING_WGS84 as F,
    EARTH_SECOND_ECCENTRICITY_SQUARED_WGS84 as EP2, EARTH_SEMI_MAJOR_AXIS_WGS84 as A,
    EARTH_SEMI_MINOR_AXIS_WGS84 as B,
};

/// Converts ECEF coordinates (meters) to geodetic (lat rad, lon rad, alt m)
/// using Bowring's method.
///
/// `iterations` is the exact number of refinements applied after the initial
/// Bowring step. There is no convergence test, so a given input always goes
/// through the same arithmetic.
pub fn ecef_to_lla(ecef_m: &Vector3<f64>, iterations: usize) -> Vector3<f64> {
    let (x, y, z) = (ecef_m.x, ecef_m.y, ecef_m.z);

    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    // reduced latitude
    let mut beta = z.atan2((1.0 - F) * p);
    let mut lat = bowring_latitude(z, p, beta);

    for _ in 0..iterations {
        beta = ((1.0 - F) * lat.sin()).atan2(lat.cos());
        lat = bowring_latitude(z, p, beta);
    }

    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = prime_vertical_radius(sin_lat);
    let alt = p * cos_lat + (z + E2 * n * sin_lat) * sin_lat - n;

    Vector3::new(lat, lon, alt)
}

fn bowring_latitude(z: f64, p: f64, beta: f64) -> f64 {
    let (sin_beta, cos_beta) = beta.sin_cos();
    (z + EP2 * B * sin_beta.powi(3)).atan2(p - E2 * A * cos_beta.powi(3))
}

fn prime_vertical_radius(sin_lat: f64) -> f64 {
    A / (1.0 - E2 * sin_lat * sin_lat).sqrt()
}

/// Converts geodetic (lat rad, lon rad, alt m) coordinates to ECEF meters.
pub fn lla_to_ecef(lla_rad: &Vector3<f64>) -> Vector3<f64> {
    let (sin_lat, cos_lat) = lla_rad[0].sin_cos();
    let (sin_lon, cos_lon) = lla_rad[1].sin_cos();
    let alt = lla_rad[2];
    let n = prime_vertical_radius(sin_lat);
    Vector3::new(
        (n + alt) * cos_lat * cos_lon,
        (n + alt) * cos_lat * sin_lon,
        (n * (1.0 - E2) + alt) * sin_lat,
    )
}

/// Rotation matrix from ECEF to the local NED frame at (lat, lon) in radians.
pub fn rotation_ecef_to_ned(lat_rad: f64, lon_rad: f64) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();
    Matrix3::new(
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        -sin_lon,
        cos_lon,
        0.0,
        -cos_lat * cos_lon,
        -cos_lat * sin_lon,
        -sin_lat,
    )
}

/// Projects `point_lla_rad` on the local tangent plane (NED, meters)
/// of `ref_lla_rad`. Both inputs must already be in radians:
/// degrees are silently interpreted as radians.
pub fn lla_to_ned(ref_lla_rad: &Vector3<f64>, point_lla_rad: &Vector3<f64>) -> Vector3<f64> {
    let delta_ecef = lla_to_ecef(point_lla_rad) - lla_to_ecef(ref_lla_rad);
    rotation_ecef_to_ned(ref_lla_rad[0], ref_lla_rad[1]) * delta_ecef
}

/// (lat °, lon °, alt m) -> (lat rad, lon rad, alt m)
pub fn lla_deg_to_rad(lla_deg: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(lla_deg[0].to_radians(), lla_deg[1].to_radians(), lla_deg[2])
}
