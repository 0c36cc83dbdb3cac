/// WGS84 Earth Frame Ellipsoid semi-major axis (meters)
pub const EARTH_SEMI_MAJOR_AXIS_WGS84: f64 = 6378137.0_f64;

/// WGS84 flattening
pub const EARTH_FLATTENING_WGS84: f64 = 1.0 / 298.257223563;

/// WGS84 semi-minor axis (meters)
pub const EARTH_SEMI_MINOR_AXIS_WGS84: f64 =
    EARTH_SEMI_MAJOR_AXIS_WGS84 * (1.0 - EARTH_FLATTENING_WGS84);

/// WGS84 first eccentricity squared
pub const EARTH_ECCENTRICITY_SQUARED_WGS84: f64 =
    EARTH_FLATTENING_WGS84 * (2.0 - EARTH_FLATTENING_WGS84);

/// WGS84 second eccentricity squared
pub const EARTH_SECOND_ECCENTRICITY_SQUARED_WGS84: f64 =
    EARTH_ECCENTRICITY_SQUARED_WGS84 / (1.0 - EARTH_ECCENTRICITY_SQUARED_WGS84);

/// Number of Bowring refinements applied by [crate::prelude::ecef_to_lla]
/// in the frame conversion path.
pub const ECEF_TO_LLA_ITERATIONS: usize = 5;

/// Seconds between 1970-01-01 (UNIX) and 1980-01-06 (GPS week 0)
pub const UNIX_GPS_EPOCH_OFFSET_S: u64 = 315_964_800;

/// Seconds in one GPS week
pub const SECONDS_PER_WEEK: u64 = 7 * 24 * 3600;

/// GPS - UTC leap seconds applied to absolute GNSS observation time
pub const LEAP_SECONDS: u64 = 18;

/// |tow offset| above which GPS time is considered valid (seconds)
pub const GPS_TIME_VALID_THRESHOLD_S: f64 = 0.001;

/// Weight of a new local offset estimate in the exponential smoothing
pub const LOCAL_OFFSET_SMOOTHING_WEIGHT: f64 = 0.005;

/// GPS position and velocity are merged when their stamps are this close (s)
pub const GPS_VELOCITY_MATCH_TOLERANCE_S: f64 = 2.0E-3;

/// RTK corrections older than this are reported (s)
pub const DIFFERENTIAL_AGE_WARNING_S: f64 = 1.5;

/// Maximal number of [crate::prelude::LinkEvent]s kept until drained
pub const RTK_EVENT_JOURNAL_CAPACITY: usize = 64;
