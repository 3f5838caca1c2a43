use chrono::{DateTime, Utc};

/// A single temperature reading reported by a sensor.
///
/// `time` is the observation instant reported by the sensor, not the
/// ingestion instant. At least one of the two temperature channels is
/// present; single-channel sensors report only `t1`.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub sensor_id: String,

    pub time: DateTime<Utc>,

    pub t1: Option<f64>,

    pub t2: Option<f64>,
}
