// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON file-based store
//!
//! One pretty-printed JSON document per record under a directory per kind.
//! Writes go to a temp file which is fsynced and renamed over the target.
//! Connection saves are published on an in-process change feed; records
//! written by other processes are only seen by queries.

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
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

const CONNECTIONS: &str = "connections";
const TRANSFERS: &str = "transfers";
const COMPONENTS: &str = "components";
const SUBJECTS: &str = "subjects";
const ELEMENTS: &str = "elements";

/// JSON file-based store
#[derive(Clone)]
pub struct JsonStore {
    base_path: PathBuf,
    feed: ChangeFeed,
}

impl JsonStore {
    /// Open a store at the given path
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            feed: ChangeFeed::default(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Every stored connection, in id order
    pub fn connections(&self) -> Result<Vec<Connection>, StoreError> {
        self.load_all(CONNECTIONS)
    }

    /// Write a value; returns whether a previous version existed
    fn save<T: Serialize>(&self, kind: &str, id: &str, data: &T) -> Result<bool, StoreError> {
        let path = self.path_for(kind, id)?;
        fs::create_dir_all(self.base_path.join(kind))?;
        let existed = path.exists();

        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(data)?;
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)?;
        Ok(existed)
    }

    fn load<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<Option<T>, StoreError> {
        let json = match fs::read_to_string(self.path_for(kind, id)?) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn delete(&self, kind: &str, id: &str) -> Result<bool, StoreError> {
        match fs::remove_file(self.path_for(kind, id)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List all IDs of a given kind
    fn list(&self, kind: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.base_path.join(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem() {
                    ids.push(stem.to_string_lossy().to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Every readable record of a kind; unparseable documents are skipped
    fn load_all<T: DeserializeOwned>(&self, kind: &str) -> Result<Vec<T>, StoreError> {
        let mut records = Vec::new();
        for id in self.list(kind)? {
            match self.load(kind, &id) {
                Ok(Some(record)) => records.push(record),
                // Deleted between list and load
                Ok(None) => {}
                Err(StoreError::Json(e)) => {
                    tracing::warn!(kind, id = %id, error = %e, "skipping unreadable record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    fn pending_where(
        &self,
        due: impl Fn(DateTime<Utc>) -> bool,
    ) -> Result<Vec<Connection>, StoreError> {
        Ok(self
            .connections()?
            .into_iter()
            .filter(|c| !c.done && c.end_date.is_some_and(&due))
            .collect())
    }

    fn path_for(&self, kind: &str, id: &str) -> Result<PathBuf, StoreError> {
        if !is_file_safe(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.base_path.join(kind).join(format!("{}.json", id)))
    }
}

/// Ids become file names and must stay inside their kind directory
fn is_file_safe(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}

#[async_trait]
impl ConnectionStore for JsonStore {
    async fn get_connection(&self, id: &ConnectionId) -> Result<Option<Connection>, StoreError> {
        self.load(CONNECTIONS, id.as_str())
    }

    async fn overdue_connections(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Connection>, StoreError> {
        self.pending_where(|end| end <= now)
    }

    async fn connections_due_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Connection>, StoreError> {
        self.pending_where(|end| after < end && end <= until)
    }

    async fn save_connection(&self, connection: &Connection) -> Result<(), StoreError> {
        let existed = self.save(CONNECTIONS, connection.id.as_str(), connection)?;
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
impl TransferStore for JsonStore {
    async fn get_transfer(&self, id: &TransferId) -> Result<Option<DataTransfer>, StoreError> {
        self.load(TRANSFERS, id.as_str())
    }

    async fn save_transfer(&self, transfer: &DataTransfer) -> Result<(), StoreError> {
        self.save(TRANSFERS, transfer.id.as_str(), transfer)?;
        Ok(())
    }

    async fn delete_transfer(&self, id: &TransferId) -> Result<(), StoreError> {
        self.delete(TRANSFERS, id.as_str())?;
        Ok(())
    }
}

#[async_trait]
impl ComponentStore for JsonStore {
    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>, StoreError> {
        self.load(COMPONENTS, id.as_str())
    }

    async fn save_component(&self, component: &Component) -> Result<(), StoreError> {
        self.save(COMPONENTS, component.id.as_str(), component)?;
        Ok(())
    }

    async fn elements(&self, id: &ComponentId) -> Result<Vec<ArrayElement>, StoreError> {
        Ok(self.load(ELEMENTS, id.as_str())?.unwrap_or_default())
    }

    async fn change_elements(
        &self,
        id: &ComponentId,
        change: ElementChange,
    ) -> Result<(), StoreError> {
        let mut elements: Vec<ArrayElement> =
            self.load(ELEMENTS, id.as_str())?.unwrap_or_default();
        change.apply(&mut elements)?;
        self.save(ELEMENTS, id.as_str(), &elements)?;
        Ok(())
    }

    async fn delete_component(&self, id: &ComponentId) -> Result<bool, StoreError> {
        let Some(component) = self.load::<Component>(COMPONENTS, id.as_str())? else {
            return Ok(false);
        };
        if !component.deletable {
            return Err(StoreError::NotDeletable(id.clone()));
        }

        if let Some(subject_id) = &component.subject {
            if let Some(mut subject) = self.load::<Subject>(SUBJECTS, subject_id.as_str())? {
                if subject.detach(id) {
                    self.save(SUBJECTS, subject.id.as_str(), &subject)?;
                }
            }
        }
        self.delete(ELEMENTS, id.as_str())?;
        self.delete(COMPONENTS, id.as_str())?;
        Ok(true)
    }
}

#[async_trait]
impl SubjectStore for JsonStore {
    async fn get_subject(&self, id: &SubjectId) -> Result<Option<Subject>, StoreError> {
        self.load(SUBJECTS, id.as_str())
    }

    async fn save_subject(&self, subject: &Subject) -> Result<(), StoreError> {
        self.save(SUBJECTS, subject.id.as_str(), subject)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
