#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod bridge;
mod cfg;
mod constants;
mod covariance;
mod error;
mod frame;
mod math;
mod rtk;
mod time;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::bridge::{
        Barometer, Bridge, ConstellationCounts, DiagnosticLevel, Diagnostics, FlashConfig,
        FluidPressure, GnssObservation, GnssTime, GpsFix, GpsPosition, GpsSatellites, GpsVelocity,
        ImuOutput, InsEcef, MagneticField, Magnetometer, NavSatFix, NavSatStatus,
        ObservationBundle, Output, PoseTwistCovariance, PreintegratedImu, RtkFixStatus, RtkInfo,
        RtkMisc, RtkRelative, RtkRelativeOutput, SatelliteCno, SatelliteInfo, SensorMessage,
        StatusReport, StrobeIn,
    };
    pub use crate::cfg::{Config, CorrectionProtocol, FrameSelection, RtkLinkConfig, RtkMode};
    pub use crate::covariance::{
        pose_covariance_from_sensor, to_row_major, transform_6x6, twist_covariance_from_sensor,
        unpack_lower_diagonal, PackedCovariance6,
    };
    pub use crate::error::Error;
    pub use crate::frame::{
        FrameConverter, FrameKind, FrameOutputs, FrameResult, NavContext, NavSample,
        ReferenceOrigin,
    };
    pub use crate::math::{
        conjugate_rotate_vector, ecef_to_lla, lla_deg_to_rad, lla_to_ecef, lla_to_ned, ned_to_enu,
        quaternion_compose, quaternion_conjugate, quaternion_ecef_to_ned, quaternion_ned_to_enu,
        quaternion_to_rotation_matrix, rotate_vector, rotation_ecef_to_ned, rotation_ned_to_enu,
    };
    pub use crate::rtk::{
        spawn_watchdog, ConfigProvider, Connector, Endpoint, LinkEvent, NtripCredentials,
        RtkLinkManager, RtkLinkState, RtkRole, Sleeper, ThreadSleeper, WatchdogHandle,
    };
    pub use crate::time::{LocalOffset, SystemClock, TimeBase, TimeBaseState, WallClock};
    // re-export
    pub use hifitime::{Duration, Epoch};
    pub use nalgebra::{Matrix3, Matrix6, Quaternion, Vector3};
}

// pub export
pub use error::Error;
