// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::change::ChangeEvent;
use crate::store::{
    ComponentStore, ConnectionStore, ElementChange, StoreError, SubjectStore, TransferStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pl_core::{
    ArrayElement, Component, ComponentId, Connection, ConnectionId, DataTransfer, Subject,
    SubjectId, TransferId,
};
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::Instrument;

/// Wrapper that adds tracing to any store
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[async_trait]
impl<S: ConnectionStore> ConnectionStore for TracedStore<S> {
    async fn get_connection(&self, id: &ConnectionId) -> Result<Option<Connection>, StoreError> {
        let result = self.inner.get_connection(id).await;
        tracing::trace!(%id, found = ?result.as_ref().map(|c| c.is_some()).ok(), "loaded connection");
        result
    }

    async fn overdue_connections(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Connection>, StoreError> {
        let span = tracing::info_span!("store.overdue", %now);
        async move {
            let start = Instant::now();
            let result = self.inner.overdue_connections(now).await;
            match &result {
                Ok(found) => tracing::debug!(
                    count = found.len(),
                    elapsed_ms = elapsed_ms(start),
                    "queried overdue"
                ),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "query failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn connections_due_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Connection>, StoreError> {
        let span = tracing::info_span!("store.due_between", %after, %until);
        async move {
            let start = Instant::now();
            let result = self.inner.connections_due_between(after, until).await;
            match &result {
                Ok(found) => tracing::debug!(
                    count = found.len(),
                    elapsed_ms = elapsed_ms(start),
                    "queried upcoming"
                ),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "query failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn save_connection(&self, connection: &Connection) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.save_connection", id = %connection.id);
        async move {
            let start = Instant::now();
            let result = self.inner.save_connection(connection).await;
            match &result {
                Ok(()) => tracing::debug!(
                    done = connection.done,
                    elapsed_ms = elapsed_ms(start),
                    "connection saved"
                ),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "save failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn watch(&self) -> broadcast::Receiver<ChangeEvent> {
        tracing::debug!("subscribing to connection changes");
        self.inner.watch()
    }
}

#[async_trait]
impl<S: TransferStore> TransferStore for TracedStore<S> {
    async fn get_transfer(&self, id: &TransferId) -> Result<Option<DataTransfer>, StoreError> {
        let result = self.inner.get_transfer(id).await;
        tracing::trace!(%id, found = ?result.as_ref().map(|t| t.is_some()).ok(), "loaded transfer");
        result
    }

    async fn save_transfer(&self, transfer: &DataTransfer) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.save_transfer", id = %transfer.id);
        async move {
            let start = Instant::now();
            let result = self.inner.save_transfer(transfer).await;
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms = elapsed_ms(start), "transfer saved"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "save failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn delete_transfer(&self, id: &TransferId) -> Result<(), StoreError> {
        let result = self.inner.delete_transfer(id).await;
        match &result {
            Ok(()) => tracing::info!(%id, "transfer deleted"),
            Err(e) => tracing::warn!(%id, error = %e, "transfer delete failed"),
        }
        result
    }
}

#[async_trait]
impl<S: ComponentStore> ComponentStore for TracedStore<S> {
    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>, StoreError> {
        let result = self.inner.get_component(id).await;
        tracing::trace!(%id, found = ?result.as_ref().map(|c| c.is_some()).ok(), "loaded component");
        result
    }

    async fn save_component(&self, component: &Component) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.save_component", id = %component.id);
        async move {
            let start = Instant::now();
            let result = self.inner.save_component(component).await;
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms = elapsed_ms(start), "component saved"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "save failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn elements(&self, id: &ComponentId) -> Result<Vec<ArrayElement>, StoreError> {
        let result = self.inner.elements(id).await;
        tracing::trace!(%id, count = result.as_ref().map(|v| v.len()).ok(), "loaded elements");
        result
    }

    async fn change_elements(
        &self,
        id: &ComponentId,
        change: ElementChange,
    ) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.change_elements", %id);
        async move {
            tracing::debug!(?change, "changing elements");
            let start = Instant::now();
            let result = self.inner.change_elements(id, change).await;
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms = elapsed_ms(start), "elements changed"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "change failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn delete_component(&self, id: &ComponentId) -> Result<bool, StoreError> {
        let span = tracing::info_span!("store.delete_component", %id);
        async move {
            let result = self.inner.delete_component(id).await;
            match &result {
                Ok(true) => tracing::info!("component deleted"),
                Ok(false) => tracing::debug!("no such component"),
                Err(e) => tracing::warn!(error = %e, "delete failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<S: SubjectStore> SubjectStore for TracedStore<S> {
    async fn get_subject(&self, id: &SubjectId) -> Result<Option<Subject>, StoreError> {
        self.inner.get_subject(id).await
    }

    async fn save_subject(&self, subject: &Subject) -> Result<(), StoreError> {
        let result = self.inner.save_subject(subject).await;
        if let Err(e) = &result {
            tracing::error!(id = %subject.id, error = %e, "subject save failed");
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
