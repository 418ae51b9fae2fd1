// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record store adapters
//!
//! The scheduler reads connections, transfers, components and subjects from a
//! backing store that other services write to. These traits are the seam.

mod json;
#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use json::JsonStore;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryStore, StoreCall};

use crate::change::ChangeEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pl_core::{
    ArrayElement, Component, ComponentId, Connection, ConnectionId, DataTransfer, Subject,
    SubjectId, TransferId,
};
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("element position {index} out of range for {len} elements")]
    Position { index: usize, len: usize },
    #[error("invalid record id: {0:?}")]
    InvalidId(String),
    #[error("component {0} is not deletable")]
    NotDeletable(ComponentId),
}

/// One mutation of an array component's element list
#[derive(Debug, Clone, PartialEq)]
pub enum ElementChange {
    /// Replace the whole list
    Replace(Vec<ArrayElement>),
    /// Insert at `index`, shifting later elements right (`index == len` appends)
    Insert { index: usize, element: ArrayElement },
    Remove { index: usize },
    Update { index: usize, element: ArrayElement },
}

impl ElementChange {
    /// Apply to an in-memory list, checking the position
    pub fn apply(self, elements: &mut Vec<ArrayElement>) -> Result<(), StoreError> {
        let len = elements.len();
        match self {
            ElementChange::Replace(list) => *elements = list,
            ElementChange::Insert { index, element } => {
                if index > len {
                    return Err(StoreError::Position { index, len });
                }
                elements.insert(index, element);
            }
            ElementChange::Remove { index } => {
                if index >= len {
                    return Err(StoreError::Position { index, len });
                }
                elements.remove(index);
            }
            ElementChange::Update { index, element } => match elements.get_mut(index) {
                Some(slot) => *slot = element,
                None => return Err(StoreError::Position { index, len }),
            },
        }
        Ok(())
    }
}

/// Connection records and their change feed
#[async_trait]
pub trait ConnectionStore: Clone + Send + Sync + 'static {
    async fn get_connection(&self, id: &ConnectionId) -> Result<Option<Connection>, StoreError>;

    /// Not-done connections with `end_date <= now`
    async fn overdue_connections(&self, now: DateTime<Utc>)
        -> Result<Vec<Connection>, StoreError>;

    /// Not-done connections with `after < end_date <= until`
    async fn connections_due_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Connection>, StoreError>;

    async fn save_connection(&self, connection: &Connection) -> Result<(), StoreError>;

    /// Subscribe to connection changes made from now on
    fn watch(&self) -> broadcast::Receiver<ChangeEvent>;
}

#[async_trait]
pub trait TransferStore: Clone + Send + Sync + 'static {
    async fn get_transfer(&self, id: &TransferId) -> Result<Option<DataTransfer>, StoreError>;
    async fn save_transfer(&self, transfer: &DataTransfer) -> Result<(), StoreError>;
    async fn delete_transfer(&self, id: &TransferId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ComponentStore: Clone + Send + Sync + 'static {
    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>, StoreError>;
    async fn save_component(&self, component: &Component) -> Result<(), StoreError>;

    /// Ordered elements of an array component (empty when none are stored)
    async fn elements(&self, id: &ComponentId) -> Result<Vec<ArrayElement>, StoreError>;

    async fn change_elements(
        &self,
        id: &ComponentId,
        change: ElementChange,
    ) -> Result<(), StoreError>;

    /// Delete a deletable component, detaching it from its subject and
    /// purging its elements. Returns `false` when no such component exists.
    async fn delete_component(&self, id: &ComponentId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait SubjectStore: Clone + Send + Sync + 'static {
    async fn get_subject(&self, id: &SubjectId) -> Result<Option<Subject>, StoreError>;
    async fn save_subject(&self, subject: &Subject) -> Result<(), StoreError>;
}

/// Everything the scheduler needs from a backing store
pub trait Store: ConnectionStore + TransferStore + ComponentStore + SubjectStore {}

impl<T> Store for T where T: ConnectionStore + TransferStore + ComponentStore + SubjectStore {}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
