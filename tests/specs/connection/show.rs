//! Connection show specs
//!
//! Verify the connection view reads the file-backed store.

use crate::prelude::*;

const CONNECTION: &str = r#"{
  "id": "c-1",
  "source": "s-1",
  "target": "s-2",
  "type": "daily",
  "data_transfers": ["t-1", "t-gone"],
  "owner": "u-1",
  "end_date": "2026-05-01T09:00:00Z",
  "done": true
}"#;

const TRANSFER: &str = r#"{
  "id": "t-1",
  "target_component": "score",
  "data_value": {"item": 3},
  "operation": "add",
  "owner": "u-1",
  "timestamp": "2026-04-30T12:00:00Z",
  "details": {"done": true}
}"#;

#[test]
fn show_missing_connection_fails() {
    let temp = Project::empty();

    temp.pl()
        .args(&["connection", "show", "c-9"])
        .fails()
        .stderr_has("connection not found: c-9");
}

#[test]
fn show_lists_transfers() {
    let temp = Project::empty();
    temp.file("store/connections/c-1.json", CONNECTION);
    temp.file("store/transfers/t-1.json", TRANSFER);

    temp.pl()
        .args(&["connection", "show", "c-1"])
        .passes()
        .stdout_has("Connection: c-1")
        .stdout_has("Status: done")
        .stdout_has("Due: 2026-05-01T09:00:00Z")
        .stdout_has("Transfers: 2")
        .stdout_has("add")
        .stdout_has("missing");
}

#[test]
fn show_as_json() {
    let temp = Project::empty();
    temp.file("store/connections/c-1.json", CONNECTION);
    temp.file("store/transfers/t-1.json", TRANSFER);

    let shown = temp
        .pl()
        .args(&["-o", "json", "connection", "show", "c-1"])
        .passes()
        .json();

    assert_eq!(shown["status"], "done");
    assert_eq!(shown["transfers"][0]["target"], "score");
    assert_eq!(shown["transfers"][0]["done"], true);
    assert_eq!(shown["transfers"][1]["done"], serde_json::Value::Null);
}
