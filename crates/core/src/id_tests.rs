// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn record_ids_serialize_as_bare_strings() {
    let id = ConnectionId::from("conn-1");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"conn-1\"");

    let back: ConnectionId = serde_json::from_str("\"conn-1\"").unwrap();
    assert_eq!(back, id);
    assert_eq!(back.to_string(), "conn-1");
}

#[test]
fn uuid_gen_creates_unique_ids() {
    let id_gen = UuidIdGen;
    let id1 = id_gen.next();
    let id2 = id_gen.next();
    assert_ne!(id1, id2);
    assert_eq!(id1.len(), 36); // UUID format
}

#[test]
fn sequential_gen_defaults_to_element_prefix() {
    let id_gen = SequentialIdGen::default();
    assert_eq!(id_gen.next(), "el-1");
    assert_eq!(id_gen.next(), "el-2");
}

#[test]
fn sequential_gen_is_cloneable_and_shared() {
    let id_gen1 = SequentialIdGen::new("shared");
    let id_gen2 = id_gen1.clone();
    assert_eq!(id_gen1.next(), "shared-1");
    assert_eq!(id_gen2.next(), "shared-2");
    assert_eq!(id_gen1.next(), "shared-3");
}
