use anyhow::{Context as _, Result, bail};
use chrono::DateTime;
use serde::Deserialize;

use crate::measurement::Measurement;

/// Wire shape of the `lastmeasurement` response. Fields the pipeline does
/// not use (`lastseen`, `lowbattery`, humidity, internal counters) are
/// ignored by the decoder.
#[derive(Debug, Deserialize)]
pub struct LastMeasurementResponse {
    pub success: bool,

    #[serde(default)]
    pub devices: Vec<DeviceReading>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceReading {
    #[serde(default)]
    pub deviceid: Option<String>,

    #[serde(default)]
    pub measurement: Option<RawMeasurement>,
}

#[derive(Debug, Deserialize)]
pub struct RawMeasurement {
    /// Observation instant in unix seconds.
    #[serde(default)]
    pub ts: Option<i64>,

    #[serde(default)]
    pub t1: Option<f64>,

    #[serde(default)]
    pub t2: Option<f64>,
}

impl DeviceReading {
    /// Converts one device entry into a domain measurement. Entries missing
    /// a device id, a timestamp, or both temperature channels are rejected;
    /// the caller skips them without failing the cycle.
    pub fn into_measurement(self) -> Result<Measurement> {
        let Some(sensor_id) = self.deviceid.filter(|id| !id.is_empty()) else {
            bail!("device entry is missing a device id");
        };

        let Some(raw) = self.measurement else {
            bail!("device {sensor_id} has no measurement");
        };

        let Some(ts) = raw.ts else {
            bail!("device {sensor_id} is missing a measurement timestamp");
        };

        let time = DateTime::from_timestamp(ts, 0)
            .with_context(|| format!("device {sensor_id} has an out-of-range timestamp: {ts}"))?;

        if raw.t1.is_none() && raw.t2.is_none() {
            bail!("device {sensor_id} reported no temperature channels");
        }

        Ok(Measurement {
            sensor_id,
            time,
            t1: raw.t1,
            t2: raw.t2,
        })
    }
}
