// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use serde_json::json;
use yare::parameterized;

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
}

#[parameterized(
    rfc3339_zulu = { "2026-05-04T12:00:00Z" },
    rfc3339_offset = { "2026-05-04T14:00:00+02:00" },
    compact_offset = { "2026-05-04T07:00:00-0500" },
    naive_t = { "2026-05-04T12:00:00" },
    naive_space = { "2026-05-04 12:00:00" },
    naive_fraction = { "2026-05-04T12:00:00.000" },
    naive_minutes = { "2026-05-04T12:00" },
    padded = { "  2026-05-04T12:00:00Z  " },
)]
fn parse_instant_accepts(raw: &str) {
    assert_eq!(parse_instant(raw).unwrap(), noon());
}

#[test]
fn parse_instant_date_only_is_midnight_utc() {
    let parsed = parse_instant("2026-05-04").unwrap();
    assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 5, 4, 0, 0, 0).unwrap());
}

#[test]
fn parse_instant_rejects_garbage() {
    assert_eq!(
        parse_instant("next tuesday"),
        Err(TimeError::Unrecognized("next tuesday".to_string()))
    );
}

#[test]
fn normalize_handles_extended_json_dates() {
    let millis = noon().timestamp_millis();

    assert_eq!(normalize(&json!(millis)).unwrap(), noon());
    assert_eq!(normalize(&json!({"$date": millis})).unwrap(), noon());
    assert_eq!(
        normalize(&json!({"$date": "2026-05-04T12:00:00Z"})).unwrap(),
        noon()
    );
    assert_eq!(
        normalize(&json!({"$date": {"$numberLong": millis.to_string()}})).unwrap(),
        noon()
    );
}

#[test]
fn normalize_rejects_non_timestamps() {
    assert_eq!(normalize(&Value::Null), Err(TimeError::WrongType("null")));
    assert_eq!(normalize(&json!(true)), Err(TimeError::WrongType("bool")));
    assert_eq!(
        normalize(&json!({"when": "2026-05-04"})),
        Err(TimeError::WrongType("object"))
    );
}
