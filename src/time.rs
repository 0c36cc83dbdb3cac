//! Sensor time to absolute [Epoch] conversion.
use log::info;

use crate::{
    constants::{
        GPS_TIME_VALID_THRESHOLD_S, LEAP_SECONDS, LOCAL_OFFSET_SMOOTHING_WEIGHT, SECONDS_PER_WEEK,
        UNIX_GPS_EPOCH_OFFSET_S,
    },
    prelude::{Duration, Epoch},
};

const NANOSECONDS_PER_SECOND: i128 = 1_000_000_000;

/// Source of "now", used to anchor sensor clocks while GPS time is unknown.
pub trait WallClock {
    /// Current time, UNIX representation
    fn now(&self) -> Epoch;
}

/// [WallClock] reading the host system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> Epoch {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as i128)
            .unwrap_or_default();
        Epoch::from_unix_duration(Duration::from_total_nanoseconds(nanos))
    }
}

/// Low-pass estimate of (wall clock - sensor clock).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LocalOffset {
    offset_s: f64,
    have_first_sample: bool,
}

impl LocalOffset {
    /// Current estimate (seconds), if at least one sample was processed.
    pub fn offset_s(&self) -> Option<f64> {
        if self.have_first_sample {
            Some(self.offset_s)
        } else {
            None
        }
    }

    /// Updates the estimate with a new (now, sensor time) pair and
    /// returns the smoothed offset.
    fn update(&mut self, now_s: f64, sensor_time_s: f64) -> f64 {
        let measured = now_s - sensor_time_s;
        if self.have_first_sample {
            self.offset_s = LOCAL_OFFSET_SMOOTHING_WEIGHT * measured
                + (1.0 - LOCAL_OFFSET_SMOOTHING_WEIGHT) * self.offset_s;
        } else {
            self.have_first_sample = true;
            self.offset_s = measured;
        }
        self.offset_s
    }
}

/// [TimeBase] internal state
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TimeBaseState {
    /// Latest GPS week
    pub gps_week: u32,
    /// GPS time of week minus sensor start time (seconds)
    pub gps_tow_offset_s: f64,
    /// Latched once GPS time has been observed
    pub gps_time_valid: bool,
    /// Navigation stream (time of week) estimator
    pub nav_offset: LocalOffset,
    /// IMU stream (sensor start time) estimator
    pub imu_offset: LocalOffset,
}

/// [TimeBase] stamps sensor records.
///
/// Before GPS time is known, each stream is anchored to the [WallClock]
/// through its own smoothed [LocalOffset]. Once the receiver reported a
/// time of week offset, exact GPS arithmetic is used from then on.
#[derive(Debug, Clone)]
pub struct TimeBase<C: WallClock> {
    clock: C,
    state: TimeBaseState,
}

impl<C: WallClock> TimeBase<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: Default::default(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn state(&self) -> &TimeBaseState {
        &self.state
    }

    pub fn is_synced(&self) -> bool {
        self.state.gps_time_valid
    }

    /// Latest GPS week
    pub fn week(&self) -> u32 {
        self.state.gps_week
    }

    /// Latest GPS time of week offset (seconds)
    pub fn tow_offset_s(&self) -> f64 {
        self.state.gps_tow_offset_s
    }

    /// Updates the GPS reference, from a GPS position record.
    /// Once synchronized, offsets within tolerance are ignored and
    /// the last valid one is kept.
    pub fn update_gps(&mut self, week: u32, tow_offset_s: f64) {
        self.state.gps_week = week;

        if tow_offset_s.abs() > GPS_TIME_VALID_THRESHOLD_S {
            if !self.state.gps_time_valid {
                info!(
                    "time base synchronized: week={} tow_offset={:.3}s",
                    week, tow_offset_s
                );
            }
            self.state.gps_time_valid = true;
            self.state.gps_tow_offset_s = tow_offset_s;
        } else if !self.state.gps_time_valid {
            self.state.gps_tow_offset_s = tow_offset_s;
        }
    }

    /// Stamps a (week, time of week) record.
    pub fn from_week_and_tow(&mut self, week: u32, tow_s: f64) -> Epoch {
        if self.state.gps_time_valid {
            Self::gps_epoch(week, tow_s)
        } else {
            let now_s = self.clock.now().to_unix_seconds();
            let offset_s = self.state.nav_offset.update(now_s, tow_s);
            Epoch::from_unix_seconds(offset_s + tow_s)
        }
    }

    /// Stamps a time of week record, using the latest GPS week.
    pub fn from_tow(&mut self, tow_s: f64) -> Epoch {
        self.from_week_and_tow(self.state.gps_week, tow_s)
    }

    /// Stamps a record expressed in sensor start time (seconds since boot).
    pub fn from_start_time(&mut self, time_s: f64) -> Epoch {
        if self.state.gps_time_valid {
            Self::gps_epoch(self.state.gps_week, time_s + self.state.gps_tow_offset_s)
        } else {
            let now_s = self.clock.now().to_unix_seconds();
            let offset_s = self.state.imu_offset.update(now_s, time_s);
            Epoch::from_unix_seconds(offset_s + time_s)
        }
    }

    /// Converts an [Epoch] back to time of week, within the latest GPS week.
    pub fn tow_from_epoch(&self, epoch: Epoch) -> f64 {
        let week_start_s =
            UNIX_GPS_EPOCH_OFFSET_S + self.state.gps_week as u64 * SECONDS_PER_WEEK;
        let nanos = epoch.to_unix_duration().total_nanoseconds()
            - week_start_s as i128 * NANOSECONDS_PER_SECOND;
        nanos as f64 / NANOSECONDS_PER_SECOND as f64
    }

    /// Stamps a raw GNSS observation (seconds since the GPS epoch on the
    /// UNIX axis, with leap seconds, plus fraction of second).
    pub fn from_gnss_time(&self, seconds: u64, subsec: f64) -> Epoch {
        let seconds = seconds.saturating_sub(LEAP_SECONDS) as i128;
        let nanos = (subsec * 1.0E9) as i128;
        Epoch::from_unix_duration(Duration::from_total_nanoseconds(
            seconds * NANOSECONDS_PER_SECOND + nanos,
        ))
    }

    fn gps_epoch(week: u32, tow_s: f64) -> Epoch {
        let whole_s = tow_s.floor();
        let seconds = UNIX_GPS_EPOCH_OFFSET_S as i128
            + whole_s as i128
            + week as i128 * SECONDS_PER_WEEK as i128;
        let nanos = ((tow_s - whole_s) * 1.0E9) as i128;
        Epoch::from_unix_duration(Duration::from_total_nanoseconds(
            seconds * NANOSECONDS_PER_SECOND + nanos,
        ))
    }
}
