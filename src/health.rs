use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;

use crate::db::Store;

pub const DEFAULT_THRESHOLD_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Recent { age: TimeDelta },
    Stale { age: TimeDelta },
    NeverSeen,
}

impl SensorState {
    pub fn is_recent(&self) -> bool {
        matches!(self, SensorState::Recent { .. })
    }
}

/// Per-sensor staleness, keyed in configured order.
#[derive(Debug)]
pub struct ProbeReport {
    pub states: IndexMap<String, SensorState>,
}

impl ProbeReport {
    pub fn recent_count(&self) -> usize {
        self.states.values().filter(|s| s.is_recent()).count()
    }

    pub fn total(&self) -> usize {
        self.states.len()
    }

    /// Disjunctive health: the system is alive if any configured sensor is
    /// still reporting. Individually dead sensors are tolerated. An empty
    /// report is vacuously healthy.
    pub fn healthy(&self) -> bool {
        self.states.is_empty() || self.recent_count() > 0
    }
}

/// A sensor with no recorded measurement counts as stale, not as unknown.
pub fn classify(
    latest: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold: TimeDelta,
) -> SensorState {
    match latest {
        None => SensorState::NeverSeen,
        Some(latest) => {
            let age = now - latest;
            if age <= threshold {
                SensorState::Recent { age }
            } else {
                SensorState::Stale { age }
            }
        }
    }
}

/// Queries the most recent reading per configured sensor and classifies each
/// against the threshold.
pub async fn probe(
    store: &mut Store,
    sensor_ids: &[String],
    threshold: TimeDelta,
) -> Result<ProbeReport> {
    let now = Utc::now();
    let mut states = IndexMap::with_capacity(sensor_ids.len());

    for sensor_id in sensor_ids {
        let latest = store.latest_measurement_time(sensor_id).await?;
        let state = classify(latest, now, threshold);
        match state {
            SensorState::NeverSeen => {
                tracing::info!(sensor = %sensor_id, "no measurements recorded; treated as stale");
            }
            SensorState::Recent { age } => {
                tracing::info!(
                    sensor = %sensor_id,
                    age_minutes = age.num_minutes(),
                    "last measurement is recent"
                );
            }
            SensorState::Stale { age } => {
                tracing::info!(
                    sensor = %sensor_id,
                    age_minutes = age.num_minutes(),
                    "last measurement is stale"
                );
            }
        }
        states.insert(sensor_id.clone(), state);
    }

    Ok(ProbeReport { states })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use indexmap::IndexMap;

    use super::{ProbeReport, SensorState, classify};

    fn threshold() -> TimeDelta {
        TimeDelta::minutes(30)
    }

    #[test]
    fn reading_within_threshold_is_recent() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let latest = now - TimeDelta::minutes(5);
        assert!(classify(Some(latest), now, threshold()).is_recent());
    }

    #[test]
    fn reading_exactly_at_threshold_is_recent() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let latest = now - TimeDelta::minutes(30);
        assert!(classify(Some(latest), now, threshold()).is_recent());
    }

    #[test]
    fn reading_past_threshold_is_stale() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let latest = now - TimeDelta::minutes(40);
        assert!(!classify(Some(latest), now, threshold()).is_recent());
    }

    #[test]
    fn never_seen_counts_against_health() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(classify(None, now, threshold()), SensorState::NeverSeen);
    }

    #[test]
    fn one_recent_sensor_keeps_the_probe_healthy() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut states = IndexMap::new();
        states.insert(
            "A".to_string(),
            classify(Some(now - TimeDelta::minutes(5)), now, threshold()),
        );
        states.insert(
            "B".to_string(),
            classify(Some(now - TimeDelta::minutes(40)), now, threshold()),
        );

        let report = ProbeReport { states };
        assert_eq!(report.recent_count(), 1);
        assert!(report.healthy());
    }

    #[test]
    fn all_stale_sensors_make_the_probe_unhealthy() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut states = IndexMap::new();
        states.insert(
            "A".to_string(),
            classify(Some(now - TimeDelta::minutes(45)), now, threshold()),
        );
        states.insert("B".to_string(), classify(None, now, threshold()));

        let report = ProbeReport { states };
        assert_eq!(report.recent_count(), 0);
        assert!(!report.healthy());
    }

    #[test]
    fn empty_report_is_vacuously_healthy() {
        let report = ProbeReport {
            states: IndexMap::new(),
        };
        assert!(report.healthy());
    }
}
