// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connections: scheduled batches of data transfers
//!
//! A connection links two subjects and carries an ordered list of transfer
//! ids. It becomes due at its `end_date` and, once executed, is marked
//! `done` and never executed again.

use crate::id::{ConnectionId, SubjectId, TransferId};
use crate::time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: SubjectId,
    pub target: SubjectId,
    #[serde(rename = "type", default)]
    pub con_type: String,
    #[serde(default)]
    pub data_transfers: Vec<TransferId>,
    pub owner: String,
    #[serde(
        default,
        deserialize_with = "time::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "time::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub done: bool,
}

/// Derived scheduling status of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Due-time in the future, or no due-time at all
    Scheduled,
    Due,
    Done,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Scheduled => write!(f, "scheduled"),
            ConnectionStatus::Due => write!(f, "due"),
            ConnectionStatus::Done => write!(f, "done"),
        }
    }
}

impl Connection {
    pub fn new(
        id: impl Into<ConnectionId>,
        source: impl Into<SubjectId>,
        target: impl Into<SubjectId>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            con_type: String::new(),
            data_transfers: Vec::new(),
            owner: owner.into(),
            start_date: None,
            end_date: None,
            done: false,
        }
    }

    pub fn due_at(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_transfer(mut self, id: impl Into<TransferId>) -> Self {
        self.data_transfers.push(id.into());
        self
    }

    /// Not yet executed and due at or before `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.done && self.end_date.is_some_and(|end| end <= now)
    }

    pub fn status(&self, now: DateTime<Utc>) -> ConnectionStatus {
        if self.done {
            ConnectionStatus::Done
        } else if self.is_due(now) {
            ConnectionStatus::Due
        } else {
            ConnectionStatus::Scheduled
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
