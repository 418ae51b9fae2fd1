// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data transfers: deferred mutation instructions against a component

use crate::id::{ComponentId, TransferId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Operation a transfer applies to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOp {
    Replace,
    Add,
    Multiply,
    Toggle,
    UpdateKey,
    UpdateValue,
    Append,
    RemoveBack,
    RemoveFront,
    DeleteAt,
    PushAt,
    UpdatePair,
}

impl TransferOp {
    pub const ALL: [TransferOp; 12] = [
        TransferOp::Replace,
        TransferOp::Add,
        TransferOp::Multiply,
        TransferOp::Toggle,
        TransferOp::UpdateKey,
        TransferOp::UpdateValue,
        TransferOp::Append,
        TransferOp::RemoveBack,
        TransferOp::RemoveFront,
        TransferOp::DeleteAt,
        TransferOp::PushAt,
        TransferOp::UpdatePair,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransferOp::Replace => "replace",
            TransferOp::Add => "add",
            TransferOp::Multiply => "multiply",
            TransferOp::Toggle => "toggle",
            TransferOp::UpdateKey => "update_key",
            TransferOp::UpdateValue => "update_value",
            TransferOp::Append => "append",
            TransferOp::RemoveBack => "remove_back",
            TransferOp::RemoveFront => "remove_front",
            TransferOp::DeleteAt => "delete_at",
            TransferOp::PushAt => "push_at",
            TransferOp::UpdatePair => "update_pair",
        }
    }

    /// Operations that take an element out of an array and record it
    pub fn is_removal(self) -> bool {
        matches!(
            self,
            TransferOp::RemoveBack | TransferOp::RemoveFront | TransferOp::DeleteAt
        )
    }
}

impl fmt::Display for TransferOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation: {0}")]
pub struct UnknownOp(pub String);

impl FromStr for TransferOp {
    type Err = UnknownOp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransferOp::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOp(s.to_string()))
    }
}

/// Free-form details bag carried by a transfer
///
/// `done` and `removed` are interpreted; every other key round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferDetails {
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single mutation instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransfer {
    pub id: TransferId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_component: Option<ComponentId>,
    pub target_component: ComponentId,
    #[serde(default)]
    pub data_value: Value,
    /// Operation name as stored; parsed at execution time
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_time: Option<DateTime<Utc>>,
    pub owner: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: TransferDetails,
}

impl DataTransfer {
    pub fn new(
        id: impl Into<TransferId>,
        target: impl Into<ComponentId>,
        operation: TransferOp,
        data_value: Value,
        owner: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            source_component: None,
            target_component: target.into(),
            data_value,
            operation: operation.as_str().to_string(),
            schedule_time: None,
            owner: owner.into(),
            timestamp,
            details: TransferDetails::default(),
        }
    }

    pub fn with_source(mut self, source: impl Into<ComponentId>) -> Self {
        self.source_component = Some(source.into());
        self
    }

    pub fn with_schedule(mut self, at: DateTime<Utc>) -> Self {
        self.schedule_time = Some(at);
        self
    }

    pub fn op(&self) -> Result<TransferOp, UnknownOp> {
        self.operation.parse()
    }

    pub fn is_done(&self) -> bool {
        self.details.done
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
