// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Components: typed, user-owned value cells
//!
//! Scalar components hold their value inline. Array components hold no inline
//! value; their elements live in a separate ordered collection of
//! [`ArrayElement`](crate::value::ArrayElement) envelopes.

use crate::id::{ComponentId, SubjectId};
use crate::transfer::TransferOp;
use crate::value::PrimitiveKind;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Declared type of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "phone")]
    Phone,
    #[serde(rename = "pair")]
    Pair,
    #[serde(rename = "Array_type")]
    ArrayType,
    #[serde(rename = "Array_generic")]
    ArrayGeneric,
    #[serde(rename = "Array_of_pairs")]
    ArrayOfPairs,
}

const NUMERIC_OPS: &[TransferOp] = &[TransferOp::Replace, TransferOp::Add, TransferOp::Multiply];
const REPLACE_ONLY: &[TransferOp] = &[TransferOp::Replace];
const BOOL_OPS: &[TransferOp] = &[TransferOp::Replace, TransferOp::Toggle];
const PAIR_OPS: &[TransferOp] = &[
    TransferOp::Replace,
    TransferOp::UpdateKey,
    TransferOp::UpdateValue,
];
const ARRAY_OPS: &[TransferOp] = &[
    TransferOp::Replace,
    TransferOp::Append,
    TransferOp::RemoveBack,
    TransferOp::RemoveFront,
    TransferOp::DeleteAt,
    TransferOp::PushAt,
];
const PAIR_ARRAY_OPS: &[TransferOp] = &[
    TransferOp::Replace,
    TransferOp::Append,
    TransferOp::RemoveBack,
    TransferOp::RemoveFront,
    TransferOp::DeleteAt,
    TransferOp::PushAt,
    TransferOp::UpdatePair,
];

impl ComponentType {
    /// Operations a transfer may apply to a component of this type
    pub fn legal_operations(self) -> &'static [TransferOp] {
        match self {
            ComponentType::Int | ComponentType::Double => NUMERIC_OPS,
            ComponentType::Str | ComponentType::Date | ComponentType::Phone => REPLACE_ONLY,
            ComponentType::Bool => BOOL_OPS,
            ComponentType::Pair => PAIR_OPS,
            ComponentType::ArrayType | ComponentType::ArrayGeneric => ARRAY_OPS,
            ComponentType::ArrayOfPairs => PAIR_ARRAY_OPS,
        }
    }

    pub fn allows(self, op: TransferOp) -> bool {
        self.legal_operations().contains(&op)
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            ComponentType::ArrayType | ComponentType::ArrayGeneric | ComponentType::ArrayOfPairs
        )
    }

    /// Primitive kind of the inline value, for scalar types
    pub fn scalar_kind(self) -> Option<PrimitiveKind> {
        match self {
            ComponentType::Int => Some(PrimitiveKind::Int),
            ComponentType::Double => Some(PrimitiveKind::Double),
            ComponentType::Str => Some(PrimitiveKind::Str),
            ComponentType::Bool => Some(PrimitiveKind::Bool),
            ComponentType::Date => Some(PrimitiveKind::Date),
            ComponentType::Phone => Some(PrimitiveKind::Phone),
            ComponentType::Pair => Some(PrimitiveKind::Pair),
            ComponentType::ArrayType | ComponentType::ArrayGeneric | ComponentType::ArrayOfPairs => {
                None
            }
        }
    }

    /// Value a freshly created component starts with (`Null` for arrays)
    pub fn default_value(self, now: DateTime<Utc>) -> Value {
        match self {
            ComponentType::Int => json!(0),
            ComponentType::Double => json!(0.0),
            ComponentType::Str | ComponentType::Phone => json!(""),
            ComponentType::Bool => json!(true),
            ComponentType::Date => json!(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ComponentType::Pair => json!({"key": "", "value": ""}),
            ComponentType::ArrayType | ComponentType::ArrayGeneric | ComponentType::ArrayOfPairs => {
                Value::Null
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Int => "int",
            ComponentType::Double => "double",
            ComponentType::Str => "str",
            ComponentType::Bool => "bool",
            ComponentType::Date => "date",
            ComponentType::Phone => "phone",
            ComponentType::Pair => "pair",
            ComponentType::ArrayType => "Array_type",
            ComponentType::ArrayGeneric => "Array_generic",
            ComponentType::ArrayOfPairs => "Array_of_pairs",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// A typed value cell owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    /// Inline value; `Null` for array types
    #[serde(default)]
    pub value: Value,
    /// Declared element kind of an `Array_type` component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<PrimitiveKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectId>,
    pub owner: String,
    #[serde(default = "default_true")]
    pub deletable: bool,
    #[serde(default)]
    pub widgets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_widget: Option<String>,
}

impl Component {
    /// Create a component holding its type's default value
    pub fn new(
        id: impl Into<ComponentId>,
        name: impl Into<String>,
        component_type: ComponentType,
        owner: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            component_type,
            value: component_type.default_value(now),
            element_type: None,
            subject: None,
            owner: owner.into(),
            deletable: true,
            widgets: Vec::new(),
            allowed_widget: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    pub fn with_element_type(mut self, kind: PrimitiveKind) -> Self {
        self.element_type = Some(kind);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<SubjectId>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Element kind enforced on array elements, `None` when anything goes
    pub fn element_kind(&self) -> Option<PrimitiveKind> {
        match self.component_type {
            ComponentType::ArrayType => self.element_type,
            ComponentType::ArrayOfPairs => Some(PrimitiveKind::Pair),
            _ => None,
        }
    }

    /// Check a bare value against this component's declared shape
    ///
    /// For arrays the value is a single element.
    pub fn accepts(&self, value: &Value) -> bool {
        match self.component_type.scalar_kind() {
            Some(kind) => kind.accepts(value),
            None => match self.element_kind() {
                Some(kind) => kind.accepts(value),
                None => true,
            },
        }
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
