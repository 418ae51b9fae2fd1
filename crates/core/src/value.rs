// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component values, envelopes and primitive kinds
//!
//! Values travel as `serde_json::Value`. Callers may hand over either a bare
//! value (`3`) or an envelope holding exactly one field (`{"item": 3}`);
//! [`unwrap_envelope`] strips one level so both are treated alike.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Strip a single-field envelope, one level deep.
///
/// `{"item": 3}` becomes `3`; objects with zero or several fields are
/// returned unchanged, so a pair (`{"key", "value"}`) is never unwrapped.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
            Some((_, inner)) => inner,
            None => Value::Object(Map::new()),
        },
        other => other,
    }
}

/// Borrowing variant of [`unwrap_envelope`]
pub fn peel(value: &Value) -> &Value {
    match value {
        Value::Object(map) if map.len() == 1 => map.values().next().unwrap_or(value),
        other => other,
    }
}

/// True if the value is a `{key, value}` pair object
pub fn is_pair(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.contains_key("key") && map.contains_key("value"))
}

/// True if the string looks like a phone number
pub fn is_phone(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty()
        && trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ' | '.'))
}

/// Underlying primitive kind carried by a scalar value or array element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Int,
    Double,
    Str,
    Bool,
    Date,
    Phone,
    Pair,
}

impl PrimitiveKind {
    /// Check whether a bare value carries this kind.
    ///
    /// Integers are accepted where doubles are expected; the reverse is not.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            PrimitiveKind::Int => value.as_i64().is_some(),
            PrimitiveKind::Double => value.is_number(),
            PrimitiveKind::Str => value.is_string(),
            PrimitiveKind::Bool => value.is_boolean(),
            PrimitiveKind::Date => value
                .as_str()
                .is_some_and(|s| crate::time::parse_instant(s).is_ok()),
            PrimitiveKind::Phone => value.as_str().is_some_and(is_phone),
            PrimitiveKind::Pair => is_pair(value),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Int => "int",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Str => "str",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Date => "date",
            PrimitiveKind::Phone => "phone",
            PrimitiveKind::Pair => "pair",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of an array-typed component, stored outside the component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayElement {
    pub id: String,
    pub item: Value,
}

impl ArrayElement {
    pub fn new(id: impl Into<String>, item: Value) -> Self {
        Self {
            id: id.into(),
            item,
        }
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
