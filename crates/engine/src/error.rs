// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use pl_adapters::StoreError;
use pl_core::{ComponentId, ComponentType, ConnectionId, TransferId, TransferOp};
use pl_storage::QueueError;
use thiserror::Error;

/// Errors that stop a connection from completing
///
/// A connection that fails with one of these stays `done=false` and is picked
/// up again by a later reload.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("connection not found: {0}")]
    ConnectionNotFound(ConnectionId),
    #[error("transfer not found: {0}")]
    TransferNotFound(TransferId),
    #[error("component not found: {0}")]
    ComponentNotFound(ComponentId),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

impl EngineError {
    /// Infrastructure failures the loop should back off from, as opposed to
    /// missing or unaddressable records
    pub fn is_outage(&self) -> bool {
        match self {
            EngineError::Store(StoreError::InvalidId(_)) => false,
            EngineError::Store(_) | EngineError::Queue(_) => true,
            _ => false,
        }
    }
}

/// Logical reasons a single transfer is refused
///
/// Rejections never mutate anything and never abort the surrounding batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferRejection {
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("operation '{op}' not supported for component type '{component_type}'")]
    OperationNotSupported {
        op: TransferOp,
        component_type: ComponentType,
    },
    #[error("invalid operand: {0}")]
    InvalidOperand(String),
}

impl TransferRejection {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        TransferRejection::InvalidOperand(reason.into())
    }
}
