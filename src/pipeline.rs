use std::time::Duration;

use anyhow::Result;

use crate::db::Store;
use crate::mobile_alerts::Client;

/// Aggregate counts for one fetch cycle, logged by the scheduler.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    pub received: usize,
    pub inserted: usize,
}

/// One fetch-insert cycle: a single batched API call for the whole sensor
/// set, then one idempotent insert per usable device entry. A malformed
/// device or a failed insert skips that device only; an API-level failure
/// propagates and the scheduler absorbs it.
pub async fn run_cycle(
    client: &Client,
    store: &mut Store,
    sensor_ids: &[String],
) -> Result<CycleOutcome> {
    if sensor_ids.is_empty() {
        tracing::info!("no sensors configured; skipping fetch");
        return Ok(CycleOutcome::default());
    }

    let response = client.last_measurements(sensor_ids).await?;

    let mut outcome = CycleOutcome {
        received: response.devices.len(),
        inserted: 0,
    };

    for device in response.devices {
        let measurement = match device.into_measurement() {
            Ok(measurement) => measurement,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "skipping device with unusable data");
                continue;
            }
        };

        match store.insert_measurement(&measurement).await {
            Ok(()) => outcome.inserted += 1,
            Err(err) => tracing::warn!(
                sensor = %measurement.sensor_id,
                error = %format!("{err:#}"),
                "failed to store measurement; skipping"
            ),
        }
    }

    Ok(outcome)
}

/// End-of-cycle sleep: the interval is a lower bound on cadence, so a cycle
/// that overruns it is followed immediately by the next one.
pub fn sleep_duration(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::postgres::PgConnectOptions;

    use super::{CycleOutcome, run_cycle, sleep_duration};
    use crate::db::{RetryPolicy, Store};
    use crate::mobile_alerts::Client;

    #[test]
    fn sleeps_for_the_remainder_of_the_interval() {
        assert_eq!(
            sleep_duration(Duration::from_secs(300), Duration::from_secs(10)),
            Duration::from_secs(290)
        );
    }

    #[test]
    fn overrunning_cycle_gets_zero_sleep() {
        assert_eq!(
            sleep_duration(Duration::from_secs(300), Duration::from_secs(310)),
            Duration::ZERO
        );
    }

    #[tokio::test]
    async fn empty_sensor_list_is_a_no_op() {
        let client = Client::new("http://127.0.0.1:1/api/pv1/device/lastmeasurement").unwrap();
        let opts = PgConnectOptions::new().host("127.0.0.1").port(1);
        let mut store = Store::new(opts, RetryPolicy::attempts(1));

        // Neither the API nor the store is reachable; an empty id list must
        // return without touching either.
        let outcome = run_cycle(&client, &mut store, &[]).await.unwrap();
        assert_eq!(outcome, CycleOutcome::default());
    }
}
