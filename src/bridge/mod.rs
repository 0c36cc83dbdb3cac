//! Sensor record dispatch.
use log::{debug, info};

use nalgebra::Vector3;

use crate::{
    cfg::{Config, RtkMode},
    constants::GPS_VELOCITY_MATCH_TOLERANCE_S,
    covariance::{pose_covariance_from_sensor, twist_covariance_from_sensor},
    frame::{FrameConverter, NavContext, NavSample, ReferenceOrigin},
    prelude::{Duration, Epoch},
    time::{TimeBase, WallClock},
};

mod diagnostics;
mod messages;
mod observations;
mod outputs;

pub use diagnostics::{DiagnosticLevel, Diagnostics, StatusReport};
pub use messages::*;
pub use outputs::{
    FluidPressure, GpsFix, ImuOutput, MagneticField, NavSatFix, NavSatStatus, ObservationBundle,
    Output, RtkFixStatus, RtkInfo, RtkRelativeOutput, SatelliteInfo,
};

use observations::ObservationBundler;

/// [Bridge] turns decoded [SensorMessage]s into publishable [Output]s.
///
/// It owns all the state shared between sensor streams (reference origin,
/// latest covariances and body rate, time base) so each message kind only
/// needs a `match` arm. It is single threaded: feed it from the sensor
/// callback path.
#[derive(Debug, Clone)]
pub struct Bridge<C: WallClock> {
    cfg: Config,
    converter: FrameConverter,
    origin: ReferenceOrigin,
    ctx: NavContext,
    time_base: TimeBase<C>,
    bundler: ObservationBundler,
    /// Latest fixed GPS position, waiting for its velocity
    pending_fix: Option<GpsFix>,
    /// Latest GPS velocity, waiting for its position
    pending_velocity: Option<(Epoch, Vector3<f64>)>,
    diagnostics: Diagnostics,
}

impl<C: WallClock> Bridge<C> {
    pub fn new(cfg: Config, clock: C) -> Self {
        Self {
            converter: FrameConverter::new(cfg.frames),
            bundler: ObservationBundler::new(Duration::from_seconds(
                cfg.observation_bundle_timeout_s,
            )),
            origin: Default::default(),
            ctx: Default::default(),
            time_base: TimeBase::new(clock),
            pending_fix: None,
            pending_velocity: None,
            diagnostics: Default::default(),
            cfg,
        }
    }

    /// Frame identifier of every [Output]
    pub fn frame_id(&self) -> &str {
        &self.cfg.frame_id
    }

    pub fn reference_origin(&self) -> ReferenceOrigin {
        self.origin
    }

    pub fn nav_context(&self) -> &NavContext {
        &self.ctx
    }

    pub fn time_base(&self) -> &TimeBase<C> {
        &self.time_base
    }

    /// Latest [Diagnostics] snapshot
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Periodic [StatusReport]s: CNO mean, then RTK status when RTK is enabled.
    pub fn status_reports(&self) -> Vec<StatusReport> {
        let mut reports = vec![self.diagnostics.cno_status()];
        if self.rtk_enabled() {
            reports.push(self.diagnostics.rtk_status());
        }
        reports
    }

    fn rtk_enabled(&self) -> bool {
        self.cfg.rtk_mode != RtkMode::Disabled
    }

    /// Processes one [SensorMessage].
    pub fn handle(&mut self, msg: SensorMessage) -> Vec<Output> {
        match msg {
            SensorMessage::FlashConfig(msg) => {
                self.on_flash_config(&msg);
                vec![]
            },
            SensorMessage::PoseTwistCovariance(msg) => {
                self.on_covariance(&msg);
                vec![]
            },
            SensorMessage::InsEcef(msg) => self.on_ins_ecef(&msg),
            SensorMessage::PreintegratedImu(msg) => vec![self.on_preintegrated_imu(&msg)],
            SensorMessage::GpsPosition(msg) => self.on_gps_position(&msg),
            SensorMessage::GpsVelocity(msg) => self.on_gps_velocity(&msg),
            SensorMessage::GnssObservations(obs) => self.on_observations(&obs),
            SensorMessage::RtkRelative(msg) => self.on_rtk_relative(&msg),
            SensorMessage::RtkMisc(msg) => self.on_rtk_misc(&msg),
            SensorMessage::StrobeIn(msg) => self.on_strobe_in(&msg),
            SensorMessage::Magnetometer(msg) => vec![self.on_magnetometer(&msg)],
            SensorMessage::Barometer(msg) => vec![self.on_barometer(&msg)],
            SensorMessage::GpsSatellites(msg) => self.on_gps_satellites(msg),
        }
    }

    /// Periodic call: publishes observations once the receiver epoch is complete.
    pub fn tick(&mut self) -> Vec<Output> {
        let now = self.time_base.clock().now();
        self.bundler
            .poll(now)
            .map(|(time, observations)| self.observation_bundle(time, observations))
            .into_iter()
            .collect()
    }

    fn on_flash_config(&mut self, msg: &FlashConfig) {
        let lla = msg.ref_lla_deg_deg_m;
        if !self.origin.known || self.origin.lla_deg_deg_m != lla {
            info!(
                "reference origin: lat={:.7}° lon={:.7}° alt={:.3}m",
                lla[0], lla[1], lla[2]
            );
        }
        self.origin = ReferenceOrigin::from_lla_deg(lla[0], lla[1], lla[2]);
    }

    fn on_covariance(&mut self, msg: &PoseTwistCovariance) {
        self.ctx.pose_covariance = pose_covariance_from_sensor(&msg.pose);
        self.ctx.twist_covariance = twist_covariance_from_sensor(&msg.twist);
    }

    fn on_ins_ecef(&mut self, msg: &InsEcef) -> Vec<Output> {
        let sample = NavSample {
            week: msg.week,
            time_of_week_s: msg.time_of_week_s,
            ecef_m: msg.ecef_m,
            q_e2b: msg.q_e2b,
            ecef_velocity_m_s: msg.ecef_velocity_m_s,
            body_angular_rate_rad_s: self.ctx.body_angular_rate_rad_s,
        };

        let timestamp = self
            .time_base
            .from_week_and_tow(msg.week, msg.time_of_week_s);

        self.converter
            .convert(&sample, self.origin, &self.ctx, timestamp)
            .iter()
            .map(|result| Output::Odometry(*result))
            .collect()
    }

    fn on_preintegrated_imu(&mut self, msg: &PreintegratedImu) -> Output {
        let timestamp = self.time_base.from_start_time(msg.time_s);

        let delta_theta_rad = (msg.theta1_rad + msg.theta2_rad) / 2.0;
        let delta_velocity_m_s = (msg.vel1_m_s + msg.vel2_m_s) / 2.0;

        let angular_velocity_rad_s = delta_theta_rad / msg.dt_s;
        self.ctx.body_angular_rate_rad_s = angular_velocity_rad_s;

        Output::Imu(ImuOutput {
            timestamp,
            delta_theta_rad,
            delta_velocity_m_s,
            dt_s: msg.dt_s,
            angular_velocity_rad_s,
            linear_acceleration_m_s2: delta_velocity_m_s / msg.dt_s,
        })
    }

    fn on_gps_position(&mut self, msg: &GpsPosition) -> Vec<Output> {
        self.time_base.update_gps(msg.week, msg.tow_offset_s);
        self.diagnostics.cno_mean = msg.cno_mean;

        let timestamp = self
            .time_base
            .from_week_and_tow(msg.week, msg.time_of_week_ms as f64 / 1.0E3);

        let mut outputs = Vec::with_capacity(2);

        if msg.fix_type() != GPS_STATUS_FIX_NONE {
            self.pending_fix = Some(GpsFix::new(timestamp, msg));
            outputs.extend(self.merge_gps());
        }

        outputs.push(Output::NavSatFix(NavSatFix::new(timestamp, msg)));
        outputs
    }

    fn on_gps_velocity(&mut self, msg: &GpsVelocity) -> Vec<Output> {
        if !self.time_base.is_synced() {
            return vec![];
        }

        let timestamp = self.time_base.from_tow(msg.time_of_week_ms as f64 / 1.0E3);
        self.pending_velocity = Some((timestamp, msg.ecef_velocity_m_s));
        self.merge_gps().into_iter().collect()
    }

    /// Publishes the pending fix with its velocity, when both stamps match.
    fn merge_gps(&mut self) -> Option<Output> {
        let fix = self.pending_fix?;
        let (t_velocity, velocity) = self.pending_velocity?;

        let tolerance = Duration::from_seconds(GPS_VELOCITY_MATCH_TOLERANCE_S);

        if (t_velocity - fix.timestamp).abs() < tolerance {
            self.pending_fix = None;
            self.pending_velocity = None;
            Some(Output::GpsFix(GpsFix {
                ecef_velocity_m_s: velocity,
                ..fix
            }))
        } else {
            None
        }
    }

    fn on_observations(&mut self, observations: &[GnssObservation]) -> Vec<Output> {
        let now = self.time_base.clock().now();
        self.bundler
            .push(observations, now)
            .map(|(time, observations)| self.observation_bundle(time, observations))
            .into_iter()
            .collect()
    }

    fn observation_bundle(&self, time: GnssTime, observations: Vec<GnssObservation>) -> Output {
        Output::ObservationBundle(ObservationBundle {
            timestamp: self.time_base.from_gnss_time(time.seconds, time.subsec),
            time,
            observations,
        })
    }

    fn on_rtk_relative(&mut self, msg: &RtkRelative) -> Vec<Output> {
        if !self.rtk_enabled() {
            return vec![];
        }
        if !self.time_base.is_synced() {
            debug!("rtk baseline dropped: time base not synchronized");
            return vec![];
        }

        let timestamp = self.time_base.from_tow(msg.time_of_week_ms as f64 / 1.0E3);
        let fix_status = RtkFixStatus::from_status(msg.status);

        self.diagnostics.ar_ratio = msg.ar_ratio;
        self.diagnostics.differential_age_s = msg.differential_age_s;
        self.diagnostics.heading_base_to_rover_rad = msg.base_to_rover_heading_rad;
        self.diagnostics.fix_status = fix_status;

        vec![Output::RtkRelative(RtkRelativeOutput {
            timestamp,
            fix_status,
            differential_age_s: msg.differential_age_s,
            ar_ratio: msg.ar_ratio,
            base_to_rover_m: msg.base_to_rover_m,
            base_to_rover_distance_m: msg.base_to_rover_distance_m,
            base_to_rover_heading_rad: msg.base_to_rover_heading_rad,
        })]
    }

    fn on_rtk_misc(&mut self, msg: &RtkMisc) -> Vec<Output> {
        if !self.rtk_enabled() || !self.time_base.is_synced() {
            return vec![];
        }
        let timestamp = self.time_base.from_tow(msg.time_of_week_ms as f64 / 1.0E3);
        vec![Output::RtkInfo(RtkInfo::new(timestamp, msg))]
    }

    fn on_strobe_in(&mut self, msg: &StrobeIn) -> Vec<Output> {
        if !self.time_base.is_synced() {
            debug!("strobe event dropped: time base not synchronized");
            return vec![];
        }
        let timestamp = self
            .time_base
            .from_week_and_tow(msg.week, msg.time_of_week_ms as f64 / 1.0E3);
        vec![Output::StrobeTime(timestamp)]
    }

    fn on_magnetometer(&mut self, msg: &Magnetometer) -> Output {
        Output::MagneticField(MagneticField {
            timestamp: self.time_base.from_start_time(msg.time_s),
            field: msg.field,
        })
    }

    fn on_barometer(&mut self, msg: &Barometer) -> Output {
        Output::FluidPressure(FluidPressure {
            timestamp: self.time_base.from_start_time(msg.time_s),
            pressure_kpa: msg.pressure_kpa,
            temperature_c: msg.temperature_c,
        })
    }

    fn on_gps_satellites(&mut self, msg: GpsSatellites) -> Vec<Output> {
        if !self.time_base.is_synced() {
            return vec![];
        }
        let timestamp = self.time_base.from_tow(msg.time_of_week_ms as f64 / 1.0E3);
        vec![Output::SatelliteInfo(SatelliteInfo {
            timestamp,
            satellites: msg.satellites,
        })]
    }
}
