// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change listener: queues connections as soon as the store reports them
//!
//! The listener only shortens the delay between a write and its scheduling.
//! Anything it misses (lagged receiver, dropped subscription, writes from
//! another process) is picked up by the loader on the next reload.

use crate::config::chrono_offset;
use crate::error::EngineError;
use crate::shutdown;
use chrono::{DateTime, Utc};
use pl_adapters::{ChangeEvent, ChangeKind};
use pl_core::{time, Clock};
use pl_storage::DurableQueue;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Why an event did not produce a queue entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Delete events never schedule anything
    Kind(ChangeKind),
    Done,
    MissingId,
    MissingEndDate,
    InvalidEndDate(String),
    BeyondHorizon,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::Kind(kind) => write!(f, "{kind:?} event"),
            IgnoreReason::Done => write!(f, "connection done"),
            IgnoreReason::MissingId => write!(f, "document has no id"),
            IgnoreReason::MissingEndDate => write!(f, "document has no end_date"),
            IgnoreReason::InvalidEndDate(e) => write!(f, "unreadable end_date: {e}"),
            IgnoreReason::BeyondHorizon => write!(f, "due beyond horizon"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    Queued { id: String, due: DateTime<Utc> },
    Ignored(IgnoreReason),
}

/// How a listen loop ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenExit {
    Shutdown,
    /// The change feed closed; the caller may resubscribe
    Closed,
}

/// Queue the connection carried by one change event, if it is due soon
pub fn handle_event(
    queue: &DurableQueue,
    event: &ChangeEvent,
    now: DateTime<Utc>,
    horizon: Duration,
) -> Result<ListenOutcome, EngineError> {
    if !event.kind.is_upsert() {
        return Ok(ListenOutcome::Ignored(IgnoreReason::Kind(event.kind)));
    }
    let doc = &event.document;
    if doc.get("done").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(ListenOutcome::Ignored(IgnoreReason::Done));
    }
    let Some(id) = document_id(doc) else {
        return Ok(ListenOutcome::Ignored(IgnoreReason::MissingId));
    };
    let due = match doc.get("end_date") {
        None | Some(Value::Null) => {
            return Ok(ListenOutcome::Ignored(IgnoreReason::MissingEndDate))
        }
        Some(raw) => match time::normalize(raw) {
            Ok(due) => due,
            Err(e) => {
                return Ok(ListenOutcome::Ignored(IgnoreReason::InvalidEndDate(
                    e.to_string(),
                )))
            }
        },
    };
    if due > now + chrono_offset(horizon) {
        return Ok(ListenOutcome::Ignored(IgnoreReason::BeyondHorizon));
    }

    queue.push(due, &id)?;
    Ok(ListenOutcome::Queued { id, due })
}

/// Consume change events until shutdown or until the feed closes
///
/// Only queue failures end the loop with an error.
pub async fn listen<C: Clock>(
    mut changes: broadcast::Receiver<ChangeEvent>,
    queue: &DurableQueue,
    clock: &C,
    horizon: Duration,
    mut stop: watch::Receiver<bool>,
) -> Result<ListenExit, EngineError> {
    loop {
        let received = tokio::select! {
            _ = shutdown::requested(&mut stop) => return Ok(ListenExit::Shutdown),
            received = changes.recv() => received,
        };

        match received {
            Ok(event) => match handle_event(queue, &event, clock.now(), horizon)? {
                ListenOutcome::Queued { id, due } => {
                    tracing::info!(%id, %due, "queued changed connection")
                }
                ListenOutcome::Ignored(reason) => {
                    tracing::debug!(%reason, "ignored change event")
                }
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "change listener lagged; reload will catch up");
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(ListenExit::Closed),
        }
    }
}

/// Connection id from `id`, `_id` or an extended-JSON `{"$oid": ...}`
fn document_id(doc: &Value) -> Option<String> {
    let raw = doc.get("id").or_else(|| doc.get("_id"))?;
    match raw {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map.get("$oid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
