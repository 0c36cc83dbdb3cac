use log::error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::prelude::{Duration, Error};

fn default_frame_id() -> String {
    "body".to_string()
}

fn default_frame_enabled() -> bool {
    true
}

fn default_server_address() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    7777
}

fn default_retry_limit() -> u32 {
    1
}

fn default_retry_backoff_unit_s() -> f64 {
    2.0
}

fn default_watchdog_enabled() -> bool {
    false
}

fn default_watchdog_period_s() -> f64 {
    1.0
}

fn default_stall_tolerance_ticks() -> u32 {
    5
}

fn default_observation_bundle_timeout_s() -> f64 {
    1.0E-2
}

/// Corrections stream format requested to the caster
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CorrectionProtocol {
    /// RTCM v3 messages
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "rtcm3", alias = "RTCM3"))]
    Rtcm3,
    /// UBX raw observations
    #[cfg_attr(feature = "serde", serde(alias = "ublox", alias = "UBLOX"))]
    Ublox,
}

impl std::fmt::Display for CorrectionProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rtcm3 => write!(f, "RTCM3"),
            Self::Ublox => write!(f, "UBLOX"),
        }
    }
}

impl std::str::FromStr for CorrectionProtocol {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rtcm3" => Ok(Self::Rtcm3),
            "ublox" | "ubx" => Ok(Self::Ublox),
            _ => Err(Error::UnknownCorrectionProtocol(s.to_string())),
        }
    }
}

/// Role of this unit in the RTK setup.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RtkMode {
    /// No corrections link
    #[default]
    Disabled,
    /// Rover receiving corrections from a network caster
    Rover,
    /// Rover receiving corrections over an external radio (no network link)
    RoverRadio,
    /// Base serving corrections to rovers
    Base,
    /// Dual antenna heading (compassing), no corrections link
    DualGnss,
}

impl RtkMode {
    /// Resolves legacy boolean flags. Conflicting requests are logged:
    /// dual GNSS wins over rover, rover wins over base.
    pub fn from_flags(rover: bool, rover_radio: bool, base: bool, dual_gnss: bool) -> Self {
        if (rover || rover_radio) && base {
            error!("unable to be both RTK rover and base: defaulting to rover");
        }
        if (rover || rover_radio) && dual_gnss {
            error!("unable to be both RTK rover and dual GNSS: defaulting to dual GNSS");
        }
        if dual_gnss {
            Self::DualGnss
        } else if rover_radio {
            Self::RoverRadio
        } else if rover {
            Self::Rover
        } else if base {
            Self::Base
        } else {
            Self::Disabled
        }
    }
}

impl std::fmt::Display for RtkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Rover => write!(f, "rover"),
            Self::RoverRadio => write!(f, "rover (radio)"),
            Self::Base => write!(f, "base"),
            Self::DualGnss => write!(f, "dual gnss"),
        }
    }
}

impl std::str::FromStr for RtkMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disabled" | "none" => Ok(Self::Disabled),
            "rover" => Ok(Self::Rover),
            "rover_radio" | "radio" => Ok(Self::RoverRadio),
            "base" => Ok(Self::Base),
            "dual_gnss" | "compassing" => Ok(Self::DualGnss),
            _ => Err(Error::UnknownRtkMode(s.to_string())),
        }
    }
}

/// RTK corrections link parametrization
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RtkLinkConfig {
    /// [CorrectionProtocol] requested to the caster
    #[cfg_attr(feature = "serde", serde(default))]
    pub protocol: CorrectionProtocol,
    /// Caster (rover) or bind (base) address
    #[cfg_attr(feature = "serde", serde(default = "default_server_address"))]
    pub server_address: String,
    #[cfg_attr(feature = "serde", serde(default = "default_server_port"))]
    pub server_port: u16,
    /// NTRIP mount point. NTRIP credentials are only sent when both
    /// mount point and username are defined.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mount: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub username: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub password: String,
    /// Maximal number of sequential connection attempts
    #[cfg_attr(feature = "serde", serde(default = "default_retry_limit"))]
    pub retry_limit: u32,
    /// Linear backoff unit: we wait `attempt * unit` after a failed attempt (seconds)
    #[cfg_attr(feature = "serde", serde(default = "default_retry_backoff_unit_s"))]
    pub retry_backoff_unit_s: f64,
    /// Enables the traffic watchdog in rover mode
    #[cfg_attr(feature = "serde", serde(default = "default_watchdog_enabled"))]
    pub watchdog_enabled: bool,
    /// Watchdog tick period (seconds)
    #[cfg_attr(feature = "serde", serde(default = "default_watchdog_period_s"))]
    pub watchdog_period_s: f64,
    /// Consecutive ticks without traffic before we reconnect
    #[cfg_attr(feature = "serde", serde(default = "default_stall_tolerance_ticks"))]
    pub stall_tolerance_ticks: u32,
}

impl Default for RtkLinkConfig {
    fn default() -> Self {
        Self {
            protocol: Default::default(),
            server_address: default_server_address(),
            server_port: default_server_port(),
            mount: Default::default(),
            username: Default::default(),
            password: Default::default(),
            retry_limit: default_retry_limit(),
            retry_backoff_unit_s: default_retry_backoff_unit_s(),
            watchdog_enabled: default_watchdog_enabled(),
            watchdog_period_s: default_watchdog_period_s(),
            stall_tolerance_ticks: default_stall_tolerance_ticks(),
        }
    }
}

impl RtkLinkConfig {
    /// Returns the backoff [Duration] to apply after failed `attempt` (1 based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_seconds(attempt as f64 * self.retry_backoff_unit_s)
    }

    /// Returns the watchdog tick period as [Duration].
    pub fn watchdog_period(&self) -> Duration {
        Duration::from_seconds(self.watchdog_period_s)
    }

    /// Verifies this [RtkLinkConfig] is usable.
    pub fn validate(&self) -> Result<(), Error> {
        if self.retry_limit == 0 {
            return Err(Error::InvalidRetryLimit);
        }
        if self.watchdog_enabled
            && (self.stall_tolerance_ticks == 0 || !(self.watchdog_period_s > 0.0))
        {
            return Err(Error::InvalidWatchdogSettings);
        }
        Ok(())
    }

    /// Copies and returns [RtkLinkConfig] with updated caster endpoint.
    pub fn with_server(&self, address: &str, port: u16) -> Self {
        let mut s = self.clone();
        s.server_address = address.to_string();
        s.server_port = port;
        s
    }

    /// Copies and returns [RtkLinkConfig] with NTRIP credentials.
    pub fn with_ntrip(&self, mount: &str, username: &str, password: &str) -> Self {
        let mut s = self.clone();
        s.mount = mount.to_string();
        s.username = username.to_string();
        s.password = password.to_string();
        s
    }
}

/// Odometry frames to produce
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameSelection {
    #[cfg_attr(feature = "serde", serde(default = "default_frame_enabled"))]
    pub ecef: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_frame_enabled"))]
    pub ned: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_frame_enabled"))]
    pub enu: bool,
}

impl Default for FrameSelection {
    fn default() -> Self {
        Self {
            ecef: default_frame_enabled(),
            ned: default_frame_enabled(),
            enu: default_frame_enabled(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Frame identifier of published outputs
    #[cfg_attr(feature = "serde", serde(default = "default_frame_id"))]
    pub frame_id: String,
    /// [FrameSelection]
    #[cfg_attr(feature = "serde", serde(default))]
    pub frames: FrameSelection,
    /// [RtkMode] of this unit
    #[cfg_attr(feature = "serde", serde(default))]
    pub rtk_mode: RtkMode,
    /// [RtkLinkConfig]
    #[cfg_attr(feature = "serde", serde(default))]
    pub rtk: RtkLinkConfig,
    /// GNSS observations are published once no new observation
    /// arrived during this period (seconds).
    #[cfg_attr(feature = "serde", serde(default = "default_observation_bundle_timeout_s"))]
    pub observation_bundle_timeout_s: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_id: default_frame_id(),
            frames: Default::default(),
            rtk_mode: Default::default(),
            rtk: Default::default(),
            observation_bundle_timeout_s: default_observation_bundle_timeout_s(),
        }
    }
}

impl Config {
    /// Returns [Config] for a network RTK rover, using given caster.
    /// You can then customize [Self] as you will.
    pub fn rover_preset(address: &str, port: u16) -> Self {
        let mut s = Self::default();
        s.rtk_mode = RtkMode::Rover;
        s.rtk = s.rtk.with_server(address, port);
        s.rtk.watchdog_enabled = true;
        s
    }

    /// Returns [Config] for an RTK base serving corrections on given port.
    pub fn base_preset(port: u16) -> Self {
        let mut s = Self::default();
        s.rtk_mode = RtkMode::Base;
        s.rtk = s.rtk.with_server("0.0.0.0", port);
        s
    }

    /// Copies and returns [Config] with updated [FrameSelection].
    pub fn with_frames(&self, frames: FrameSelection) -> Self {
        let mut s = self.clone();
        s.frames = frames;
        s
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::*;
    use std::str::FromStr;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.frame_id, "body");
        assert_eq!(cfg.rtk_mode, RtkMode::Disabled);
        assert_eq!(cfg.rtk.server_address, "127.0.0.1");
        assert_eq!(cfg.rtk.server_port, 7777);
        assert_eq!(cfg.rtk.retry_limit, 1);
        assert_eq!(cfg.rtk.stall_tolerance_ticks, 5);
        assert!(!cfg.rtk.watchdog_enabled);
        assert!(cfg.frames.ecef && cfg.frames.ned && cfg.frames.enu);
        assert!(cfg.rtk.validate().is_ok());
    }

    #[test]
    fn linear_backoff() {
        let mut cfg = RtkLinkConfig::default();
        cfg.retry_backoff_unit_s = 2.0;
        assert_eq!(cfg.backoff(1), Duration::from_seconds(2.0));
        assert_eq!(cfg.backoff(2), Duration::from_seconds(4.0));
        assert_eq!(cfg.backoff(3), Duration::from_seconds(6.0));
    }

    #[test]
    fn validation() {
        let mut cfg = RtkLinkConfig::default();
        cfg.retry_limit = 0;
        assert_eq!(cfg.validate(), Err(Error::InvalidRetryLimit));

        let mut cfg = RtkLinkConfig::default();
        cfg.watchdog_enabled = true;
        cfg.stall_tolerance_ticks = 0;
        assert_eq!(cfg.validate(), Err(Error::InvalidWatchdogSettings));

        cfg.stall_tolerance_ticks = 3;
        cfg.watchdog_period_s = f64::NAN;
        assert_eq!(cfg.validate(), Err(Error::InvalidWatchdogSettings));
    }

    #[rstest]
    #[case(false, false, false, false, RtkMode::Disabled)]
    #[case(true, false, false, false, RtkMode::Rover)]
    #[case(false, true, false, false, RtkMode::RoverRadio)]
    #[case(false, false, true, false, RtkMode::Base)]
    #[case(false, false, false, true, RtkMode::DualGnss)]
    #[case(true, false, true, false, RtkMode::Rover)]
    #[case(true, false, false, true, RtkMode::DualGnss)]
    #[case(true, true, true, true, RtkMode::DualGnss)]
    fn mode_from_flags(
        #[case] rover: bool,
        #[case] rover_radio: bool,
        #[case] base: bool,
        #[case] dual_gnss: bool,
        #[case] expected: RtkMode,
    ) {
        assert_eq!(
            RtkMode::from_flags(rover, rover_radio, base, dual_gnss),
            expected
        );
    }

    #[test]
    fn parsing() {
        assert_eq!(RtkMode::from_str(" Rover ").unwrap(), RtkMode::Rover);
        assert_eq!(RtkMode::from_str("compassing").unwrap(), RtkMode::DualGnss);
        assert!(RtkMode::from_str("moon").is_err());
        assert_eq!(
            CorrectionProtocol::from_str("RTCM3").unwrap(),
            CorrectionProtocol::Rtcm3
        );
        assert_eq!(CorrectionProtocol::Ublox.to_string(), "UBLOX");
        assert_eq!(
            CorrectionProtocol::from_str("sbf"),
            Err(Error::UnknownCorrectionProtocol("sbf".to_string()))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_partial() {
        let content = r#"{
            "frame_id": "imu_link",
            "rtk_mode": "Rover",
            "frames": { "ecef": false },
            "rtk": { "server_address": "caster.example.net", "server_port": 2101, "retry_limit": 3 }
        }"#;
        let cfg: Config = serde_json::from_str(content).unwrap();
        assert_eq!(cfg.frame_id, "imu_link");
        assert_eq!(cfg.rtk_mode, RtkMode::Rover);
        assert!(!cfg.frames.ecef);
        assert!(cfg.frames.ned);
        assert_eq!(cfg.rtk.server_port, 2101);
        assert_eq!(cfg.rtk.retry_limit, 3);
        assert_eq!(cfg.rtk.retry_backoff_unit_s, 2.0);
        assert_eq!(cfg.observation_bundle_timeout_s, 1.0E-2);
    }
}
