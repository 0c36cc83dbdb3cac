//! Pose and twist re-expression in ECEF, NED and ENU.
use nalgebra::{Matrix6, Quaternion, Vector3};

use crate::prelude::Epoch;

mod converter;
pub use converter::FrameConverter;

/// One navigation solution, as reported by the INS in ECEF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavSample {
    /// GPS week number
    pub week: u32,
    /// GPS time of week (seconds)
    pub time_of_week_s: f64,
    /// Position, ECEF (meters)
    pub ecef_m: Vector3<f64>,
    /// ECEF to body attitude (w, x, y, z)
    pub q_e2b: Quaternion<f64>,
    /// Velocity, ECEF (m.s⁻¹)
    pub ecef_velocity_m_s: Vector3<f64>,
    /// Angular rate, body frame (rad.s⁻¹)
    pub body_angular_rate_rad_s: Vector3<f64>,
}

/// Reference point of the local NED/ENU frames, stored in the sensor flash.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ReferenceOrigin {
    /// (latitude °, longitude °, altitude m)
    pub lla_deg_deg_m: Vector3<f64>,
    /// False until the sensor reported its reference
    pub known: bool,
}

impl ReferenceOrigin {
    /// Builds a known [ReferenceOrigin] from (lat °, lon °, alt m).
    pub fn from_lla_deg(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lla_deg_deg_m: Vector3::new(lat_deg, lon_deg, alt_m),
            known: true,
        }
    }
}

/// Latest values of the slower streams that each navigation
/// solution is combined with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavContext {
    /// [position, attitude] pose covariance, body/ECEF native frames
    pub pose_covariance: Matrix6<f64>,
    /// [linear velocity, angular rate] twist covariance, body/ECEF native frames
    pub twist_covariance: Matrix6<f64>,
    /// Latest IMU angular rate (rad.s⁻¹)
    pub body_angular_rate_rad_s: Vector3<f64>,
}

impl Default for NavContext {
    fn default() -> Self {
        Self {
            pose_covariance: Matrix6::zeros(),
            twist_covariance: Matrix6::zeros(),
            body_angular_rate_rad_s: Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Ecef,
    Ned,
    Enu,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ecef => write!(f, "ECEF"),
            Self::Ned => write!(f, "NED"),
            Self::Enu => write!(f, "ENU"),
        }
    }
}

/// Pose, twist and covariances expressed in one [FrameKind].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameResult {
    pub frame: FrameKind,
    /// Position (meters)
    pub position_m: Vector3<f64>,
    /// Frame to body attitude
    pub orientation: Quaternion<f64>,
    /// Linear velocity (m.s⁻¹)
    pub linear_velocity_m_s: Vector3<f64>,
    /// Angular velocity (rad.s⁻¹)
    pub angular_velocity_rad_s: Vector3<f64>,
    /// [position, attitude] covariance
    pub pose_covariance: Matrix6<f64>,
    /// [linear velocity, angular rate] covariance
    pub twist_covariance: Matrix6<f64>,
    pub timestamp: Epoch,
}

/// Results of one conversion. `None` means unavailable: either disabled,
/// or (NED/ENU) the [ReferenceOrigin] is not known yet.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameOutputs {
    pub ecef: Option<FrameResult>,
    pub ned: Option<FrameResult>,
    pub enu: Option<FrameResult>,
}

impl FrameOutputs {
    /// Iterates over available [FrameResult]s, in ECEF, NED, ENU order.
    pub fn iter(&self) -> impl Iterator<Item = &FrameResult> {
        [&self.ecef, &self.ned, &self.enu]
            .into_iter()
            .filter_map(|result| result.as_ref())
    }
}
