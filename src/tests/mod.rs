
use log::LevelFilter;
use std::{cell::Cell, rc::Rc, sync::Once};

use crate::{
    bridge::InsEcef,
    constants::EARTH_SEMI_MAJOR_AXIS_WGS84,
    prelude::{Epoch, Quaternion, Vector3},
    time::WallClock,
};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Manually driven [WallClock]. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now_s: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn at(now_s: f64) -> Self {
        let clock = Self::default();
        clock.set(now_s);
        clock
    }

    pub fn set(&self, now_s: f64) {
        self.now_s.set(now_s);
    }

    pub fn advance(&self, dt_s: f64) {
        self.now_s.set(self.now_s.get() + dt_s);
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> Epoch {
        Epoch::from_unix_seconds(self.now_s.get())
    }
}

/// Static INS solution on the equator, at the prime meridian,
/// body axes aligned with ECEF, moving along +X.
pub fn equator_ins(week: u32, time_of_week_s: f64) -> InsEcef {
    InsEcef {
        week,
        time_of_week_s,
        ins_status: 0,
        hdw_status: 0,
        q_e2b: Quaternion::identity(),
        ecef_velocity_m_s: Vector3::new(1.0, 0.0, 0.0),
        ecef_m: Vector3::new(EARTH_SEMI_MAJOR_AXIS_WGS84, 0.0, 0.0),
    }
}

/// Unix seconds of GPS (week, tow)
pub fn gps_unix_s(week: u32, tow_s: f64) -> f64 {
    315_964_800.0 + week as f64 * 604_800.0 + tow_s
}
