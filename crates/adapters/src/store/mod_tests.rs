// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn list(ids: &[&str]) -> Vec<ArrayElement> {
    ids.iter().map(|id| ArrayElement::new(*id, json!(id))).collect()
}

fn ids(elements: &[ArrayElement]) -> Vec<&str> {
    elements.iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn insert_allows_end_position() {
    let mut elements = list(&["a", "b"]);
    ElementChange::Insert {
        index: 2,
        element: ArrayElement::new("c", json!("c")),
    }
    .apply(&mut elements)
    .unwrap();
    assert_eq!(ids(&elements), vec!["a", "b", "c"]);
}

#[test]
fn remove_and_update_reject_end_position() {
    let mut elements = list(&["a", "b"]);
    let err = ElementChange::Remove { index: 2 }
        .apply(&mut elements)
        .unwrap_err();
    assert!(matches!(err, StoreError::Position { index: 2, len: 2 }));

    let err = ElementChange::Update {
        index: 5,
        element: ArrayElement::new("x", json!(1)),
    }
    .apply(&mut elements)
    .unwrap_err();
    assert!(matches!(err, StoreError::Position { index: 5, len: 2 }));
    assert_eq!(ids(&elements), vec!["a", "b"]);
}

#[test]
fn replace_swaps_whole_list() {
    let mut elements = list(&["a", "b"]);
    ElementChange::Replace(list(&["z"]))
        .apply(&mut elements)
        .unwrap();
    assert_eq!(ids(&elements), vec!["z"]);
}
