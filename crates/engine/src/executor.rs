// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection executor

use crate::error::EngineError;
use crate::transfer::{TransferEngine, TransferOutcome};
use pl_adapters::{ComponentStore, ConnectionStore, TransferStore};
use pl_core::{ConnectionId, IdGen};
use std::time::Instant;
use tracing::Instrument;

/// Counts from one connection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub applied: usize,
    pub already_done: usize,
    pub rejected: usize,
}

impl ExecutionReport {
    fn record(&mut self, outcome: &TransferOutcome) {
        match outcome {
            TransferOutcome::Applied => self.applied += 1,
            TransferOutcome::AlreadyDone => self.already_done += 1,
            TransferOutcome::Rejected(_) => self.rejected += 1,
            // Deferral only happens for standalone transfers
            TransferOutcome::Deferred => {}
        }
    }
}

/// Result of executing one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Connection was already done; nothing ran
    AlreadyDone,
    Executed(ExecutionReport),
}

/// Runs every transfer of a due connection, then marks it done
#[derive(Clone)]
pub struct ConnectionExecutor<S, I> {
    store: S,
    transfers: TransferEngine<S, I>,
}

impl<S, I> ConnectionExecutor<S, I>
where
    S: ConnectionStore + TransferStore + ComponentStore + Clone,
    I: IdGen,
{
    pub fn new(store: S, id_gen: I) -> Self {
        Self {
            transfers: TransferEngine::new(store.clone(), id_gen),
            store,
        }
    }

    pub fn transfers(&self) -> &TransferEngine<S, I> {
        &self.transfers
    }

    /// Execute a connection by id
    ///
    /// Missing records abort the run and leave the connection pending, so a
    /// later reload retries it. Transfers already applied on an earlier
    /// attempt are skipped by their `done` flag.
    pub async fn execute(&self, id: &ConnectionId) -> Result<ExecutionOutcome, EngineError> {
        let span = tracing::info_span!("connection", %id);
        async {
            let start = Instant::now();
            let result = self.execute_inner(id).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(ExecutionOutcome::AlreadyDone) => {
                    tracing::debug!(elapsed_ms, "connection already done")
                }
                Ok(ExecutionOutcome::Executed(report)) => tracing::info!(
                    elapsed_ms,
                    applied = report.applied,
                    already_done = report.already_done,
                    rejected = report.rejected,
                    "connection executed"
                ),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "connection failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute_inner(&self, id: &ConnectionId) -> Result<ExecutionOutcome, EngineError> {
        let mut connection = self
            .store
            .get_connection(id)
            .await?
            .ok_or_else(|| EngineError::ConnectionNotFound(id.clone()))?;
        if connection.done {
            return Ok(ExecutionOutcome::AlreadyDone);
        }

        let mut report = ExecutionReport::default();
        for transfer_id in &connection.data_transfers {
            let transfer = self
                .store
                .get_transfer(transfer_id)
                .await?
                .ok_or_else(|| EngineError::TransferNotFound(transfer_id.clone()))?;
            let outcome = self.transfers.execute(&transfer).await?;
            report.record(&outcome);
        }

        connection.done = true;
        self.store.save_connection(&connection).await?;
        Ok(ExecutionOutcome::Executed(report))
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
