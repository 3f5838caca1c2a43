use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// A validity-scoped mapping from a sensor to a room. `None` dates mean
/// "from the beginning" and "until now" respectively.
#[derive(Debug, Clone)]
pub struct RoomAssociation {
    pub sensor_id: String,

    pub room_id: String,

    pub start_date: Option<DateTime<Utc>>,

    pub end_date: Option<DateTime<Utc>>,
}

/// Parses an ISO 8601 timestamp. Values carrying an explicit offset are
/// converted; values without one (including bare dates) are interpreted as
/// UTC. Treating timezone-unaware input as UTC is a policy decision, applied
/// here as the single normalization point for textual timestamps.
pub fn parse_utc_date(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    bail!("unrecognized timestamp: {raw}")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::parse_utc_date;

    #[test]
    fn parses_rfc3339_with_utc_suffix() {
        let parsed = parse_utc_date("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn converts_explicit_offsets_to_utc() {
        let parsed = parse_utc_date("2024-06-01T12:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn treats_offsetless_datetimes_as_utc() {
        let parsed = parse_utc_date("2024-06-01T12:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn accepts_bare_dates_at_midnight_utc() {
        let parsed = parse_utc_date("2024-06-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_utc_date("next tuesday").is_err());
    }
}
