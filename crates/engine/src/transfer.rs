// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-transfer engine: applies one transfer to its target component

use crate::error::{EngineError, TransferRejection};
use crate::ops::{self, Mutation, PlanInput};
use chrono::{DateTime, Utc};
use pl_adapters::{ComponentStore, TransferStore};
use pl_core::value::peel;
use pl_core::{Component, DataTransfer, IdGen};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::Instrument;

/// Result of executing one transfer
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    Applied,
    /// `details.done` was already set; nothing happened
    AlreadyDone,
    /// Refused for a logical reason; nothing was written
    Rejected(TransferRejection),
    /// Standalone transfer scheduled for later; left stored
    Deferred,
}

impl TransferOutcome {
    /// Boolean view: did this call change the target
    pub fn applied(&self) -> bool {
        matches!(self, TransferOutcome::Applied)
    }
}

/// Executes data transfers against the component store
#[derive(Clone)]
pub struct TransferEngine<S, I> {
    store: S,
    id_gen: I,
}

impl<S, I> TransferEngine<S, I>
where
    S: ComponentStore + TransferStore,
    I: IdGen,
{
    pub fn new(store: S, id_gen: I) -> Self {
        Self { store, id_gen }
    }

    /// Execute a transfer at most once
    ///
    /// Missing components are errors (the caller cannot tell what the
    /// transfer would have done); everything else that blocks the mutation is
    /// a [`TransferOutcome::Rejected`].
    pub async fn execute(&self, transfer: &DataTransfer) -> Result<TransferOutcome, EngineError> {
        let span = tracing::info_span!(
            "transfer",
            id = %transfer.id,
            op = %transfer.operation,
            target = %transfer.target_component,
        );
        async {
            if transfer.is_done() {
                tracing::debug!("already done");
                return Ok(TransferOutcome::AlreadyDone);
            }

            let start = Instant::now();
            let outcome = self.apply(transfer).await?;
            match &outcome {
                TransferOutcome::Rejected(reason) => tracing::warn!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    %reason,
                    "transfer rejected"
                ),
                _ => tracing::info!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "transfer applied"
                ),
            }
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    /// Store a standalone transfer and run it now unless scheduled later
    pub async fn execute_standalone(
        &self,
        transfer: &DataTransfer,
        now: DateTime<Utc>,
    ) -> Result<TransferOutcome, EngineError> {
        self.store.save_transfer(transfer).await?;
        match transfer.schedule_time {
            Some(at) if at > now => {
                tracing::info!(id = %transfer.id, %at, "transfer deferred");
                Ok(TransferOutcome::Deferred)
            }
            _ => self.execute(transfer).await,
        }
    }

    async fn apply(&self, transfer: &DataTransfer) -> Result<TransferOutcome, EngineError> {
        let target = self
            .store
            .get_component(&transfer.target_component)
            .await?
            .ok_or_else(|| EngineError::ComponentNotFound(transfer.target_component.clone()))?;
        let source = match &transfer.source_component {
            Some(id) => Some(
                self.store
                    .get_component(id)
                    .await?
                    .ok_or_else(|| EngineError::ComponentNotFound(id.clone()))?,
            ),
            None => None,
        };

        let op = match transfer.op() {
            Ok(op) => op,
            Err(unknown) => {
                return Ok(TransferOutcome::Rejected(
                    TransferRejection::UnknownOperation(unknown.0),
                ))
            }
        };

        let elements = if target.component_type.is_array() {
            self.store.elements(&target.id).await?
        } else {
            Vec::new()
        };
        let operand = match &source {
            Some(source) => self.source_value(source).await?,
            None => peel(&transfer.data_value).clone(),
        };

        let input = PlanInput {
            op,
            target: &target,
            elements: &elements,
            operand: &operand,
            data_value: &transfer.data_value,
            has_source: source.is_some(),
        };
        let mutation = match ops::plan(&input, &self.id_gen) {
            Ok(mutation) => mutation,
            Err(reason) => return Ok(TransferOutcome::Rejected(reason)),
        };

        let mut finished = transfer.clone();
        match mutation {
            Mutation::SetValue(value) => {
                let mut updated = target.clone();
                updated.value = value;
                self.store.save_component(&updated).await?;
            }
            Mutation::Elements { change, removed } => {
                self.store.change_elements(&target.id, change).await?;
                if let Some(element) = removed {
                    finished.details.removed = Some(json!({"id": element.id, "item": element.item}));
                }
            }
            Mutation::Nothing => tracing::debug!("array already empty"),
        }

        finished.details.done = true;
        self.store.save_transfer(&finished).await?;
        Ok(TransferOutcome::Applied)
    }

    /// Operand taken from a source component: its value, or its element
    /// items for an array
    async fn source_value(&self, source: &Component) -> Result<Value, EngineError> {
        if source.component_type.is_array() {
            let items = self
                .store
                .elements(&source.id)
                .await?
                .into_iter()
                .map(|e| e.item)
                .collect();
            return Ok(Value::Array(items));
        }
        Ok(peel(&source.value).clone())
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
