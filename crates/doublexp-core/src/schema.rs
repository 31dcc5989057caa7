//! Typed shape of the mission endpoint payload.
//!
//! ```json
//! {
//!   "Biomes": {
//!     "Crystalline Caverns": [
//!       { "CodeName": "Hidden Lode", "MissionMutator": "Double XP", ... }
//!     ]
//!   },
//!   "timestamp": "2024-05-02T15:00:00Z"
//! }
//! ```
//!
//! Biome records stay untyped until a record is known to carry the target
//! mutator, so a malformed record of no interest cannot spoil the report.
//! Optional collections (`MissionWarnings`, `included_in`) become empty
//! vectors when missing or null. Missing text fields on a record that is
//! decoded are a parse error.

use chrono::{DateTime, NaiveDateTime, Utc};
use doublexp_models::Mission;
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{MissionError, Result};

/// Epoch values above this are taken as milliseconds.
const MILLIS_THRESHOLD: f64 = 1e11;

/// Raw endpoint payload.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionReport {
    /// Mission records grouped by biome, in payload order.
    #[serde(rename = "Biomes")]
    pub biomes: IndexMap<String, Vec<Value>>,

    /// Window start for the requested selector.
    #[serde(deserialize_with = "de_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Mutator named by a raw record, if it has a textual one.
pub fn record_mutator(record: &Value) -> Option<&str> {
    record.get("MissionMutator")?.as_str()
}

/// One mission record as delivered by the endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMission {
    /// Absent on missions without a mutator.
    #[serde(rename = "MissionMutator", default)]
    pub mutator: Option<String>,

    #[serde(rename = "CodeName")]
    pub code_name: String,

    #[serde(rename = "Complexity", deserialize_with = "de_text")]
    pub complexity: String,

    #[serde(rename = "Length", deserialize_with = "de_text")]
    pub length: String,

    #[serde(rename = "PrimaryObjective")]
    pub primary_objective: String,

    #[serde(rename = "SecondaryObjective")]
    pub secondary_objective: String,

    #[serde(rename = "MissionWarnings", default, deserialize_with = "de_null_default")]
    pub warnings: Vec<String>,

    #[serde(default, deserialize_with = "de_null_default")]
    pub included_in: Vec<String>,
}

impl RawMission {
    /// Decodes one biome record.
    ///
    /// # Errors
    /// Returns [`MissionError::DataFormat`] if a required field is missing
    /// or has the wrong type.
    pub fn from_record(record: &Value) -> Result<Self> {
        Ok(RawMission::deserialize(record)?)
    }

    /// Builds a [`Mission`] annotated with its biome.
    ///
    /// Returns `None` when the record has no mutator.
    pub fn to_mission(&self, biome: &str) -> Option<Mission> {
        let mutator = self.mutator.clone()?;
        Some(Mission {
            biome: biome.to_string(),
            code_name: self.code_name.clone(),
            complexity: self.complexity.clone(),
            length: self.length.clone(),
            primary_objective: self.primary_objective.clone(),
            secondary_objective: self.secondary_objective.clone(),
            warnings: self.warnings.clone(),
            mutator,
            included_in: self.included_in.iter().cloned().collect(),
        })
    }
}

/// Parses a full response body.
///
/// # Errors
/// Returns [`MissionError::DataFormat`] if the body is not valid JSON or
/// does not match the payload shape.
pub fn parse_report(body: &str) -> Result<MissionReport> {
    serde_json::from_str(body).map_err(|e| MissionError::DataFormat(e.to_string()))
}

fn de_null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

/// Ratings are usually strings ("2") but older payloads carry bare numbers.
fn de_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Number(n) => n.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Epoch(f64),
}

fn de_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(s) => parse_time_text(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", s))),
        RawTimestamp::Epoch(value) => {
            let millis = if value.abs() > MILLIS_THRESHOLD {
                value
            } else {
                value * 1000.0
            };
            DateTime::<Utc>::from_timestamp_millis(millis.round() as i64)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", value)))
        }
    }
}

/// Accepts RFC 3339, or a naive ISO-8601 date-time taken as UTC.
fn parse_time_text(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
