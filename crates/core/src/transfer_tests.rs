// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use serde_json::json;

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
}

#[test]
fn op_names_parse_back() {
    for op in TransferOp::ALL {
        assert_eq!(op.as_str().parse::<TransferOp>().unwrap(), op);
        assert_eq!(
            serde_json::to_value(op).unwrap(),
            Value::String(op.to_string())
        );
    }
}

#[test]
fn unknown_op_is_an_error() {
    assert_eq!(
        "subtract".parse::<TransferOp>(),
        Err(UnknownOp("subtract".to_string()))
    );
}

#[test]
fn details_keep_unknown_keys() {
    let raw = json!({"done": false, "note": "from import", "attempts": 2});
    let details: TransferDetails = serde_json::from_value(raw.clone()).unwrap();

    assert!(!details.done);
    assert_eq!(details.removed, None);
    assert_eq!(details.extra.get("note"), Some(&json!("from import")));
    assert_eq!(serde_json::to_value(&details).unwrap(), raw);
}

#[test]
fn transfer_defaults_missing_fields() {
    let raw = json!({
        "id": "t-1",
        "target_component": "c-1",
        "operation": "toggle",
        "owner": "u-1",
        "timestamp": "2026-03-01T09:30:00Z",
    });
    let transfer: DataTransfer = serde_json::from_value(raw).unwrap();

    assert_eq!(transfer.op().unwrap(), TransferOp::Toggle);
    assert_eq!(transfer.data_value, Value::Null);
    assert!(!transfer.is_done());
    assert_eq!(transfer.timestamp, at());
}

#[test]
fn builder_sets_source_and_schedule() {
    let transfer = DataTransfer::new("t-1", "c-1", TransferOp::Add, json!({"item": 3}), "u", at())
        .with_source("c-0")
        .with_schedule(at());

    assert_eq!(transfer.operation, "add");
    assert_eq!(transfer.source_component, Some(ComponentId::from("c-0")));
    assert_eq!(transfer.schedule_time, Some(at()));
}

#[test]
fn removal_ops() {
    assert!(TransferOp::RemoveBack.is_removal());
    assert!(TransferOp::DeleteAt.is_removal());
    assert!(!TransferOp::PushAt.is_removal());
}
