// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Due-time normalization
//!
//! Store documents carry timestamps in several shapes: RFC 3339 strings,
//! naive timestamps (no offset), extended-JSON `{"$date": ...}` wrappers and
//! epoch milliseconds. Everything is normalized to `DateTime<Utc>` before it
//! is compared with "now". Naive values are interpreted as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Errors from timestamp normalization
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("unrecognized timestamp: {0}")]
    Unrecognized(String),
    #[error("timestamp out of range: {0}")]
    OutOfRange(i64),
    #[error("expected a timestamp, found {0}")]
    WrongType(&'static str),
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp string into a UTC instant
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, TimeError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(TimeError::Unrecognized(raw.to_string()))
}

/// Normalize a JSON timestamp value into a UTC instant
pub fn normalize(value: &Value) -> Result<DateTime<Utc>, TimeError> {
    match value {
        Value::String(s) => parse_instant(s),
        Value::Number(n) => {
            let millis = n.as_i64().ok_or(TimeError::WrongType("non-integer number"))?;
            from_millis(millis)
        }
        Value::Object(map) => match map.get("$date") {
            Some(Value::Object(inner)) => match inner.get("$numberLong") {
                Some(Value::String(s)) => {
                    let millis = s
                        .parse::<i64>()
                        .map_err(|_| TimeError::Unrecognized(s.clone()))?;
                    from_millis(millis)
                }
                _ => Err(TimeError::WrongType("object")),
            },
            Some(inner) => normalize(inner),
            None => Err(TimeError::WrongType("object")),
        },
        Value::Null => Err(TimeError::WrongType("null")),
        Value::Bool(_) => Err(TimeError::WrongType("bool")),
        Value::Array(_) => Err(TimeError::WrongType("array")),
    }
}

/// `deserialize_with` helper for optional record timestamps
///
/// Accepts every shape [`normalize`] does. `null` reads as `None`; pair it
/// with `#[serde(default)]` so a missing field does too.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => normalize(&value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, TimeError> {
    DateTime::from_timestamp_millis(millis).ok_or(TimeError::OutOfRange(millis))
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod tests;
