use nalgebra::{Quaternion, Vector3};

use crate::covariance::PackedCovariance6;

/// Number of satellites used, in GPS status word
pub const GPS_STATUS_NUM_SATS_USED_MASK: u32 = 0x0000_00FF;
/// Fix type, in GPS status word
pub const GPS_STATUS_FIX_MASK: u32 = 0x0000_1F00;
pub const GPS_STATUS_FIX_NONE: u32 = 0x0000_0000;
pub const GPS_STATUS_FIX_2D: u32 = 0x0000_0200;
pub const GPS_STATUS_FIX_3D: u32 = 0x0000_0300;
pub const GPS_STATUS_FIX_SBAS: u32 = 0x0000_0900;
pub const GPS_STATUS_FIX_RTK_SINGLE: u32 = 0x0000_0A00;
pub const GPS_STATUS_FIX_RTK_FLOAT: u32 = 0x0000_0B00;
pub const GPS_STATUS_FIX_RTK_FIX: u32 = 0x0000_0C00;
pub const GPS_STATUS_FLAGS_RTK_FIX_AND_HOLD: u32 = 0x0004_0000;

/// Decoded sensor records, dispatched by [Bridge::handle](crate::prelude::Bridge::handle).
#[derive(Debug, Clone, PartialEq)]
pub enum SensorMessage {
    FlashConfig(FlashConfig),
    InsEcef(InsEcef),
    PoseTwistCovariance(PoseTwistCovariance),
    PreintegratedImu(PreintegratedImu),
    GpsPosition(GpsPosition),
    GpsVelocity(GpsVelocity),
    /// Raw observations of a single receiver epoch (possibly partial)
    GnssObservations(Vec<GnssObservation>),
    RtkRelative(RtkRelative),
    RtkMisc(RtkMisc),
    StrobeIn(StrobeIn),
    Magnetometer(Magnetometer),
    Barometer(Barometer),
    GpsSatellites(GpsSatellites),
}

/// Persistent sensor configuration
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FlashConfig {
    /// Reference (latitude °, longitude °, altitude m) of local frames
    pub ref_lla_deg_deg_m: Vector3<f64>,
}

/// INS solution, ECEF
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsEcef {
    pub week: u32,
    pub time_of_week_s: f64,
    pub ins_status: u32,
    pub hdw_status: u32,
    /// ECEF to body attitude (w, x, y, z)
    pub q_e2b: Quaternion<f64>,
    /// ECEF velocity (m.s⁻¹)
    pub ecef_velocity_m_s: Vector3<f64>,
    /// ECEF position (m)
    pub ecef_m: Vector3<f64>,
}

/// Packed covariances of the INS solution
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PoseTwistCovariance {
    pub time_of_week_s: f64,
    /// [attitude, position] ordering
    pub pose: PackedCovariance6,
    /// [linear velocity, angular rate] ordering
    pub twist: PackedCovariance6,
}

/// Pre-integrated IMU increments, from two redundant IMUs
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PreintegratedImu {
    /// Sensor start time (s)
    pub time_s: f64,
    /// Integration period (s)
    pub dt_s: f64,
    /// Delta theta (rad), IMU 1 and 2
    pub theta1_rad: Vector3<f64>,
    pub theta2_rad: Vector3<f64>,
    /// Delta velocity (m.s⁻¹), IMU 1 and 2
    pub vel1_m_s: Vector3<f64>,
    pub vel2_m_s: Vector3<f64>,
}

/// GNSS receiver position
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GpsPosition {
    pub week: u32,
    pub time_of_week_ms: u32,
    /// Status word: satellites used, fix type and flags
    pub status: u32,
    /// (latitude °, longitude °, ellipsoid altitude m)
    pub lla_deg_deg_m: Vector3<f64>,
    pub ecef_m: Vector3<f64>,
    /// Height above mean sea level (m)
    pub hmsl_m: f64,
    /// Horizontal accuracy
    pub h_acc: f64,
    /// Vertical accuracy
    pub v_acc: f64,
    pub p_dop: f64,
    /// Mean carrier to noise ratio (dB-Hz)
    pub cno_mean: f64,
    /// GPS time of week minus sensor start time (s).
    /// Zero until receiver time is known.
    pub tow_offset_s: f64,
}

impl GpsPosition {
    /// Fix type, see `GPS_STATUS_FIX_*`
    pub fn fix_type(&self) -> u32 {
        self.status & GPS_STATUS_FIX_MASK
    }

    pub fn num_sats_used(&self) -> u8 {
        (self.status & GPS_STATUS_NUM_SATS_USED_MASK) as u8
    }
}

/// GNSS receiver velocity, ECEF
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GpsVelocity {
    pub time_of_week_ms: u32,
    pub ecef_velocity_m_s: Vector3<f64>,
}

/// Receiver time of raw observations
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GnssTime {
    /// Seconds, GPS epoch on the UNIX axis (leap seconds included)
    pub seconds: u64,
    /// Fraction of second
    pub subsec: f64,
}

/// Raw observation of one satellite
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GnssObservation {
    pub time: GnssTime,
    /// Satellite number
    pub sat: u8,
    /// Receiver number
    pub rcv: u8,
    /// Signal strength (0.25 dB-Hz)
    pub snr: u8,
    /// Loss of lock indicator
    pub lli: u8,
    pub code: u8,
    pub qual_l: u8,
    pub qual_p: u8,
    /// Carrier phase (cycles)
    pub carrier_phase_cycles: f64,
    /// Pseudo range (m)
    pub pseudo_range_m: f64,
    /// Doppler (Hz)
    pub doppler_hz: f64,
}

/// RTK baseline solution
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RtkRelative {
    pub time_of_week_ms: u32,
    pub status: u32,
    /// Age of differential corrections (s)
    pub differential_age_s: f64,
    /// Ambiguity resolution ratio
    pub ar_ratio: f64,
    /// Base to rover vector, ECEF (m)
    pub base_to_rover_m: Vector3<f64>,
    pub base_to_rover_distance_m: f64,
    pub base_to_rover_heading_rad: f64,
}

/// Observation and ephemeris counters, per constellation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConstellationCounts {
    pub gps: u32,
    pub glonass: u32,
    pub galileo: u32,
    pub beidou: u32,
}

impl ConstellationCounts {
    pub fn total(&self) -> u32 {
        self.gps + self.glonass + self.galileo + self.beidou
    }
}

/// RTK link statistics
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RtkMisc {
    pub time_of_week_ms: u32,
    /// Base position (latitude °, longitude °, altitude m)
    pub base_lla_deg_deg_m: Vector3<f64>,
    pub base_antenna_count: u32,
    pub base_ephemeris: ConstellationCounts,
    pub base_observations: ConstellationCounts,
    pub rover_ephemeris: ConstellationCounts,
    pub rover_observations: ConstellationCounts,
    pub cycle_slip_count: u32,
}

/// Strobe input event
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StrobeIn {
    pub week: u32,
    pub time_of_week_ms: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Magnetometer {
    /// Sensor start time (s)
    pub time_s: f64,
    /// Magnetic field, body frame (normalized units)
    pub field: Vector3<f64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Barometer {
    /// Sensor start time (s)
    pub time_s: f64,
    /// Pressure (kPa)
    pub pressure_kpa: f64,
    /// Barometer temperature (°C)
    pub temperature_c: f64,
}

/// Tracking state of one satellite
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SatelliteCno {
    pub sv_id: u8,
    /// Carrier to noise ratio (dB-Hz)
    pub cno: u8,
}

/// Satellites in view
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GpsSatellites {
    pub time_of_week_ms: u32,
    pub satellites: Vec<SatelliteCno>,
}
