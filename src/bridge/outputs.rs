use nalgebra::{Matrix3, Vector3};

use crate::{
    bridge::messages::{
        GnssObservation, GnssTime, GpsPosition, RtkMisc, SatelliteCno, GPS_STATUS_FIX_2D,
        GPS_STATUS_FIX_3D, GPS_STATUS_FIX_MASK, GPS_STATUS_FIX_RTK_FIX, GPS_STATUS_FIX_RTK_FLOAT,
        GPS_STATUS_FIX_RTK_SINGLE, GPS_STATUS_FIX_SBAS, GPS_STATUS_FLAGS_RTK_FIX_AND_HOLD,
    },
    frame::FrameResult,
    prelude::Epoch,
};

/// Everything the [Bridge](crate::prelude::Bridge) publishes
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Pose and twist in one frame, see [FrameResult::frame]
    Odometry(FrameResult),
    Imu(ImuOutput),
    GpsFix(GpsFix),
    NavSatFix(NavSatFix),
    ObservationBundle(ObservationBundle),
    RtkRelative(RtkRelativeOutput),
    RtkInfo(RtkInfo),
    /// Strobe input event time
    StrobeTime(Epoch),
    MagneticField(MagneticField),
    FluidPressure(FluidPressure),
    SatelliteInfo(SatelliteInfo),
}

/// IMU rates, from averaged pre-integrated increments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuOutput {
    pub timestamp: Epoch,
    /// Averaged delta theta (rad)
    pub delta_theta_rad: Vector3<f64>,
    /// Averaged delta velocity (m.s⁻¹)
    pub delta_velocity_m_s: Vector3<f64>,
    pub dt_s: f64,
    pub angular_velocity_rad_s: Vector3<f64>,
    pub linear_acceleration_m_s2: Vector3<f64>,
}

/// GNSS fix, merged with the matching receiver velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub timestamp: Epoch,
    pub week: u32,
    pub status: u32,
    pub num_sats_used: u8,
    pub cno_mean: f64,
    pub lla_deg_deg_m: Vector3<f64>,
    pub ecef_m: Vector3<f64>,
    pub hmsl_m: f64,
    pub h_acc: f64,
    pub v_acc: f64,
    pub p_dop: f64,
    pub ecef_velocity_m_s: Vector3<f64>,
}

impl GpsFix {
    pub(crate) fn new(timestamp: Epoch, msg: &GpsPosition) -> Self {
        Self {
            timestamp,
            week: msg.week,
            status: msg.status,
            num_sats_used: msg.num_sats_used(),
            cno_mean: msg.cno_mean,
            lla_deg_deg_m: msg.lla_deg_deg_m,
            ecef_m: msg.ecef_m,
            hmsl_m: msg.hmsl_m,
            h_acc: msg.h_acc,
            v_acc: msg.v_acc,
            p_dop: msg.p_dop,
            ecef_velocity_m_s: Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavSatStatus {
    NoFix,
    Fix,
    /// Satellite based augmentation
    SbasFix,
    /// Ground based augmentation (RTK)
    GbasFix,
}

impl NavSatStatus {
    /// Status from fix type, see `GPS_STATUS_FIX_*`
    pub fn from_fix_type(fix_type: u32) -> Self {
        if fix_type >= GPS_STATUS_FIX_RTK_SINGLE {
            Self::GbasFix
        } else if fix_type == GPS_STATUS_FIX_SBAS {
            Self::SbasFix
        } else if fix_type >= GPS_STATUS_FIX_2D {
            Self::Fix
        } else {
            Self::NoFix
        }
    }
}

/// Standard geodetic fix, with diagonal covariance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavSatFix {
    pub timestamp: Epoch,
    pub status: NavSatStatus,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
    /// East, north, up (m²). Diagonal.
    pub position_covariance: Matrix3<f64>,
}

impl NavSatFix {
    pub(crate) fn new(timestamp: Epoch, msg: &GpsPosition) -> Self {
        let var_h = (msg.h_acc / 1000.0).powi(2);
        let var_v = (msg.v_acc / 1000.0).powi(2);
        Self {
            timestamp,
            status: NavSatStatus::from_fix_type(msg.fix_type()),
            latitude_deg: msg.lla_deg_deg_m[0],
            longitude_deg: msg.lla_deg_deg_m[1],
            altitude_m: msg.lla_deg_deg_m[2],
            position_covariance: Matrix3::from_diagonal(&Vector3::new(var_h, var_h, var_v)),
        }
    }
}

/// Raw observations sharing the same receiver time
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationBundle {
    pub timestamp: Epoch,
    pub time: GnssTime,
    pub observations: Vec<GnssObservation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtkFixStatus {
    Fix3D,
    Single,
    Float,
    Fix,
    FixAndHold,
}

impl RtkFixStatus {
    /// Decodes status word, `None` when not recognized.
    pub fn from_status(status: u32) -> Option<Self> {
        match status & GPS_STATUS_FIX_MASK {
            GPS_STATUS_FIX_3D => Some(Self::Fix3D),
            GPS_STATUS_FIX_RTK_SINGLE => Some(Self::Single),
            GPS_STATUS_FIX_RTK_FLOAT => Some(Self::Float),
            GPS_STATUS_FIX_RTK_FIX => Some(Self::Fix),
            _ => {
                if status & GPS_STATUS_FLAGS_RTK_FIX_AND_HOLD > 0 {
                    Some(Self::FixAndHold)
                } else {
                    None
                }
            },
        }
    }
}

impl std::fmt::Display for RtkFixStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fix3D => write!(f, "3D"),
            Self::Single => write!(f, "Single"),
            Self::Float => write!(f, "Float"),
            Self::Fix => write!(f, "Fix"),
            Self::FixAndHold => write!(f, "Fix and Hold"),
        }
    }
}

/// RTK baseline solution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtkRelativeOutput {
    pub timestamp: Epoch,
    pub fix_status: Option<RtkFixStatus>,
    pub differential_age_s: f64,
    pub ar_ratio: f64,
    pub base_to_rover_m: Vector3<f64>,
    pub base_to_rover_distance_m: f64,
    pub base_to_rover_heading_rad: f64,
}

/// RTK link statistics, summed over constellations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtkInfo {
    pub timestamp: Epoch,
    pub base_lla_deg_deg_m: Vector3<f64>,
    pub base_antenna_count: u32,
    pub base_ephemeris: u32,
    pub base_observations: u32,
    pub rover_ephemeris: u32,
    pub rover_observations: u32,
    pub cycle_slip_count: u32,
}

impl RtkInfo {
    pub(crate) fn new(timestamp: Epoch, msg: &RtkMisc) -> Self {
        Self {
            timestamp,
            base_lla_deg_deg_m: msg.base_lla_deg_deg_m,
            base_antenna_count: msg.base_antenna_count,
            base_ephemeris: msg.base_ephemeris.total(),
            base_observations: msg.base_observations.total(),
            rover_ephemeris: msg.rover_ephemeris.total(),
            rover_observations: msg.rover_observations.total(),
            cycle_slip_count: msg.cycle_slip_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagneticField {
    pub timestamp: Epoch,
    pub field: Vector3<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidPressure {
    pub timestamp: Epoch,
    pub pressure_kpa: f64,
    pub temperature_c: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteInfo {
    pub timestamp: Epoch,
    pub satellites: Vec<SatelliteCno>,
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(0x0000, NavSatStatus::NoFix)]
    #[case(0x0100, NavSatStatus::NoFix)]
    #[case(0x0200, NavSatStatus::Fix)]
    #[case(0x0300, NavSatStatus::Fix)]
    #[case(0x0800, NavSatStatus::Fix)]
    #[case(0x0900, NavSatStatus::SbasFix)]
    #[case(0x0A00, NavSatStatus::GbasFix)]
    #[case(0x0C00, NavSatStatus::GbasFix)]
    fn nav_sat_status(#[case] fix_type: u32, #[case] expected: NavSatStatus) {
        assert_eq!(NavSatStatus::from_fix_type(fix_type), expected);
    }

    #[rstest]
    #[case(0x0000_030C, Some(RtkFixStatus::Fix3D))]
    #[case(0x0000_0A0C, Some(RtkFixStatus::Single))]
    #[case(0x0000_0B0C, Some(RtkFixStatus::Float))]
    #[case(0x0004_0C0C, Some(RtkFixStatus::Fix))]
    #[case(0x0004_0000, Some(RtkFixStatus::FixAndHold))]
    #[case(0x0000_0200, None)]
    fn rtk_fix_status(#[case] status: u32, #[case] expected: Option<RtkFixStatus>) {
        assert_eq!(RtkFixStatus::from_status(status), expected);
    }

    #[test]
    fn nav_sat_fix_covariance() {
        let msg = GpsPosition {
            status: 0x0000_0C0A,
            h_acc: 20.0,
            v_acc: 50.0,
            lla_deg_deg_m: Vector3::new(43.6, 1.44, 150.0),
            ..Default::default()
        };
        let fix = NavSatFix::new(Epoch::from_unix_seconds(0.0), &msg);
        assert_eq!(fix.status, NavSatStatus::GbasFix);
        assert_eq!(fix.latitude_deg, 43.6);
        assert_eq!(fix.longitude_deg, 1.44);
        assert_eq!(fix.altitude_m, 150.0);
        assert!((fix.position_covariance[(0, 0)] - 4.0E-4).abs() < 1.0E-12);
        assert!((fix.position_covariance[(1, 1)] - 4.0E-4).abs() < 1.0E-12);
        assert!((fix.position_covariance[(2, 2)] - 2.5E-3).abs() < 1.0E-12);
        assert_eq!(fix.position_covariance[(0, 1)], 0.0);
    }
}
