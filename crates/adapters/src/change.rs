// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change notifications for connection documents

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Capacity of a change feed before slow receivers start lagging
pub const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Replace,
    Delete,
}

impl ChangeKind {
    /// Kinds that may carry a newly schedulable document
    pub fn is_upsert(self) -> bool {
        matches!(self, ChangeKind::Insert | ChangeKind::Update | ChangeKind::Replace)
    }
}

/// A change to one connection, carrying the full document after the change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub document: Value,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, document: Value) -> Self {
        Self { kind, document }
    }
}

/// Broadcast sender shared by every clone of a store
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }
}

impl ChangeFeed {
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Send to current subscribers; nobody listening is not an error
    pub fn publish(&self, event: ChangeEvent) {
        let receivers = self.tx.send(event).unwrap_or(0);
        tracing::trace!(receivers, "published change event");
    }
}
