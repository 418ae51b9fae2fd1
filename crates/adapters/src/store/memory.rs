// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    ComponentStore, ConnectionStore, ElementChange, StoreError, SubjectStore, TransferStore,
};
use crate::change::{ChangeEvent, ChangeFeed, ChangeKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pl_core::{
    ArrayElement, Component, ComponentId, Connection, ConnectionId, DataTransfer, Subject,
    SubjectId, TransferId,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

/// Recorded store call
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    GetConnection(ConnectionId),
    OverdueConnections,
    ConnectionsDueBetween,
    SaveConnection(ConnectionId),
    GetTransfer(TransferId),
    SaveTransfer(TransferId),
    DeleteTransfer(TransferId),
    GetComponent(ComponentId),
    SaveComponent(ComponentId),
    Elements(ComponentId),
    ChangeElements(ComponentId),
    DeleteComponent(ComponentId),
    GetSubject(SubjectId),
    SaveSubject(SubjectId),
}

#[derive(Default)]
struct MemoryState {
    connections: BTreeMap<ConnectionId, Connection>,
    transfers: BTreeMap<TransferId, DataTransfer>,
    components: BTreeMap<ComponentId, Component>,
    elements: BTreeMap<ComponentId, Vec<ArrayElement>>,
    subjects: BTreeMap<SubjectId, Subject>,
    calls: Vec<StoreCall>,
}

/// In-memory store with call recording and an outage switch
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    unavailable: Arc<AtomicBool>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Publish a change as if another writer had made it
    pub fn emit(&self, event: ChangeEvent) {
        self.feed.publish(event);
    }

    // Seeding helpers bypass the outage switch and call recording

    pub fn insert_connection(&self, connection: Connection) {
        self.lock()
            .connections
            .insert(connection.id.clone(), connection);
    }

    pub fn insert_transfer(&self, transfer: DataTransfer) {
        self.lock().transfers.insert(transfer.id.clone(), transfer);
    }

    pub fn insert_component(&self, component: Component) {
        self.lock()
            .components
            .insert(component.id.clone(), component);
    }

    pub fn insert_elements(&self, id: impl Into<ComponentId>, elements: Vec<ArrayElement>) {
        self.lock().elements.insert(id.into(), elements);
    }

    pub fn insert_subject(&self, subject: Subject) {
        self.lock().subjects.insert(subject.id.clone(), subject);
    }

    pub fn connection(&self, id: &str) -> Option<Connection> {
        self.lock()
            .connections
            .get(&ConnectionId::from(id))
            .cloned()
    }

    pub fn transfer(&self, id: &str) -> Option<DataTransfer> {
        self.lock().transfers.get(&TransferId::from(id)).cloned()
    }

    pub fn component(&self, id: &str) -> Option<Component> {
        self.lock().components.get(&ComponentId::from(id)).cloned()
    }

    pub fn element_items(&self, id: &str) -> Vec<serde_json::Value> {
        self.lock()
            .elements
            .get(&ComponentId::from(id))
            .map(|list| list.iter().map(|e| e.item.clone()).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a call, failing it when the store is switched off
    fn record(&self, call: StoreCall) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        let mut state = self.lock();
        state.calls.push(call);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(state)
    }

    fn pending_where(
        &self,
        call: StoreCall,
        due: impl Fn(DateTime<Utc>) -> bool,
    ) -> Result<Vec<Connection>, StoreError> {
        let state = self.record(call)?;
        Ok(state
            .connections
            .values()
            .filter(|c| !c.done && c.end_date.is_some_and(&due))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn get_connection(&self, id: &ConnectionId) -> Result<Option<Connection>, StoreError> {
        let state = self.record(StoreCall::GetConnection(id.clone()))?;
        Ok(state.connections.get(id).cloned())
    }

    async fn overdue_connections(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Connection>, StoreError> {
        self.pending_where(StoreCall::OverdueConnections, |end| end <= now)
    }

    async fn connections_due_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Connection>, StoreError> {
        self.pending_where(StoreCall::ConnectionsDueBetween, |end| {
            after < end && end <= until
        })
    }

    async fn save_connection(&self, connection: &Connection) -> Result<(), StoreError> {
        let existed = {
            let mut state = self.record(StoreCall::SaveConnection(connection.id.clone()))?;
            state
                .connections
                .insert(connection.id.clone(), connection.clone())
                .is_some()
        };
        let kind = if existed {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        self.feed
            .publish(ChangeEvent::new(kind, serde_json::to_value(connection)?));
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}

#[async_trait]
impl TransferStore for MemoryStore {
    async fn get_transfer(&self, id: &TransferId) -> Result<Option<DataTransfer>, StoreError> {
        let state = self.record(StoreCall::GetTransfer(id.clone()))?;
        Ok(state.transfers.get(id).cloned())
    }

    async fn save_transfer(&self, transfer: &DataTransfer) -> Result<(), StoreError> {
        let mut state = self.record(StoreCall::SaveTransfer(transfer.id.clone()))?;
        state.transfers.insert(transfer.id.clone(), transfer.clone());
        Ok(())
    }

    async fn delete_transfer(&self, id: &TransferId) -> Result<(), StoreError> {
        let mut state = self.record(StoreCall::DeleteTransfer(id.clone()))?;
        state.transfers.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ComponentStore for MemoryStore {
    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>, StoreError> {
        let state = self.record(StoreCall::GetComponent(id.clone()))?;
        Ok(state.components.get(id).cloned())
    }

    async fn save_component(&self, component: &Component) -> Result<(), StoreError> {
        let mut state = self.record(StoreCall::SaveComponent(component.id.clone()))?;
        state
            .components
            .insert(component.id.clone(), component.clone());
        Ok(())
    }

    async fn elements(&self, id: &ComponentId) -> Result<Vec<ArrayElement>, StoreError> {
        let state = self.record(StoreCall::Elements(id.clone()))?;
        Ok(state.elements.get(id).cloned().unwrap_or_default())
    }

    async fn change_elements(
        &self,
        id: &ComponentId,
        change: ElementChange,
    ) -> Result<(), StoreError> {
        let mut state = self.record(StoreCall::ChangeElements(id.clone()))?;
        let mut elements = state.elements.get(id).cloned().unwrap_or_default();
        change.apply(&mut elements)?;
        state.elements.insert(id.clone(), elements);
        Ok(())
    }

    async fn delete_component(&self, id: &ComponentId) -> Result<bool, StoreError> {
        let mut state = self.record(StoreCall::DeleteComponent(id.clone()))?;
        let Some(component) = state.components.get(id).cloned() else {
            return Ok(false);
        };
        if !component.deletable {
            return Err(StoreError::NotDeletable(id.clone()));
        }
        if let Some(subject_id) = &component.subject {
            if let Some(subject) = state.subjects.get_mut(subject_id) {
                subject.detach(id);
            }
        }
        state.elements.remove(id);
        state.components.remove(id);
        Ok(true)
    }
}

#[async_trait]
impl SubjectStore for MemoryStore {
    async fn get_subject(&self, id: &SubjectId) -> Result<Option<Subject>, StoreError> {
        let state = self.record(StoreCall::GetSubject(id.clone()))?;
        Ok(state.subjects.get(id).cloned())
    }

    async fn save_subject(&self, subject: &Subject) -> Result<(), StoreError> {
        let mut state = self.record(StoreCall::SaveSubject(subject.id.clone()))?;
        state.subjects.insert(subject.id.clone(), subject.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
