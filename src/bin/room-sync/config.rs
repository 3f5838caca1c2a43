//! Loading and validation of the association document. Expected structure:
//!
//! ```yaml
//! associations:
//!   - sensor_id: 0123456789AB
//!     room_id: living-room
//!     start_date: 2024-01-01T00:00:00Z    # optional
//!     end_date: 2025-06-01T00:00:00Z      # optional, null = until now
//! ```
//!
//! Validation happens here in full, before any database interaction.

use std::path::Path;

use room_climate::room_assoc::{RoomAssociation, parse_utc_date};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("config must contain a top-level 'associations' key")]
    MissingAssociations,

    #[error("association #{index} is missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("association #{index} has an invalid {field}: {message}")]
    InvalidDate {
        index: usize,
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    associations: Option<Vec<RawAssociation>>,
}

#[derive(Debug, Deserialize)]
struct RawAssociation {
    #[serde(default)]
    sensor_id: Option<String>,

    #[serde(default)]
    room_id: Option<String>,

    #[serde(default)]
    start_date: Option<String>,

    #[serde(default)]
    end_date: Option<String>,
}

pub fn load_associations(path: &Path) -> Result<Vec<RoomAssociation>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_associations(&raw)
}

pub fn parse_associations(raw: &str) -> Result<Vec<RoomAssociation>, ConfigError> {
    // An empty or null document is an authoritative "no associations".
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let Some(file) = serde_yaml::from_str::<Option<ConfigFile>>(raw)? else {
        return Ok(Vec::new());
    };

    let Some(entries) = file.associations else {
        return Err(ConfigError::MissingAssociations);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| validate_entry(index, entry))
        .collect()
}

fn validate_entry(index: usize, entry: RawAssociation) -> Result<RoomAssociation, ConfigError> {
    let sensor_id = entry
        .sensor_id
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingField {
            index,
            field: "sensor_id",
        })?;

    let room_id = entry
        .room_id
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingField {
            index,
            field: "room_id",
        })?;

    let start_date = parse_date_field(index, "start_date", entry.start_date.as_deref())?;
    let end_date = parse_date_field(index, "end_date", entry.end_date.as_deref())?;

    Ok(RoomAssociation {
        sensor_id,
        room_id,
        start_date,
        end_date,
    })
}

fn parse_date_field(
    index: usize,
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, ConfigError> {
    raw.map(|value| {
        parse_utc_date(value).map_err(|err| ConfigError::InvalidDate {
            index,
            field,
            message: err.to_string(),
        })
    })
    .transpose()
}
