use std::time::Duration;

use anyhow::{Context as _, Result, bail};

use crate::mobile_alerts::LastMeasurementResponse;

pub const DEFAULT_ENDPOINT: &str = "https://www.data199.com/api/pv1/device/lastmeasurement";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Mobile Alerts `lastmeasurement` endpoint. One request
/// covers the whole sensor set: the ids are comma-joined into a single
/// form-encoded `deviceids` field.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: String,
}

impl Client {
    pub fn new(endpoint: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }

    pub async fn last_measurements(&self, sensor_ids: &[String]) -> Result<LastMeasurementResponse> {
        let deviceids = sensor_ids.join(",");
        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("deviceids", deviceids.as_str())])
            .send()
            .await
            .context("measurement API request failed")?
            .error_for_status()
            .context("measurement API returned an error status")?;

        let payload: LastMeasurementResponse = response
            .json()
            .await
            .context("failed to decode measurement API response")?;

        if !payload.success {
            bail!("measurement API reported failure");
        }

        Ok(payload)
    }
}
