//! Rotation and geodesy primitives. Pure and stateless.
mod geodetic;
mod quaternion;

pub use geodetic::{
    ecef_to_lla, lla_deg_to_rad, lla_to_ecef, lla_to_ned, rotation_ecef_to_ned,
};

pub use quaternion::{
    conjugate_rotate_vector, ned_to_enu, quaternion_compose, quaternion_conjugate,
    quaternion_ecef_to_ned, quaternion_ned_to_enu, quaternion_to_rotation_matrix, rotate_vector,
    rotation_ned_to_enu,
};
