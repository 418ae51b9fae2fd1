// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-connection loader
//!
//! Pushes every undone connection that is overdue or due within the horizon.
//! Entries already in the queue are pushed again; the executor ignores
//! connections that are done by the time they pop.

use crate::config::chrono_offset;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use pl_adapters::ConnectionStore;
use pl_core::Connection;
use pl_storage::DurableQueue;
use std::time::Duration;

/// Connections pushed by one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub overdue: usize,
    pub upcoming: usize,
}

impl LoadReport {
    pub fn total(&self) -> usize {
        self.overdue + self.upcoming
    }
}

/// Query the store for pending connections and push them onto the queue
pub async fn load_pending<S: ConnectionStore>(
    store: &S,
    queue: &DurableQueue,
    now: DateTime<Utc>,
    horizon: Duration,
) -> Result<LoadReport, EngineError> {
    let overdue = store.overdue_connections(now).await?;
    let upcoming = store
        .connections_due_between(now, now + chrono_offset(horizon))
        .await?;

    let report = LoadReport {
        overdue: push_all(queue, &overdue)?,
        upcoming: push_all(queue, &upcoming)?,
    };
    tracing::info!(
        overdue = report.overdue,
        upcoming = report.upcoming,
        "loaded pending connections"
    );
    Ok(report)
}

fn push_all(queue: &DurableQueue, connections: &[Connection]) -> Result<usize, EngineError> {
    let mut pushed = 0;
    for connection in connections {
        // The store queries only return dated connections
        let Some(due) = connection.end_date else {
            continue;
        };
        queue.push(due, connection.id.as_str())?;
        pushed += 1;
    }
    Ok(pushed)
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
