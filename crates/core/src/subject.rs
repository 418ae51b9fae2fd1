// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subjects group components

use crate::id::{ComponentId, SubjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub components: Vec<ComponentId>,
}

impl Subject {
    pub fn new(id: impl Into<SubjectId>, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            components: Vec::new(),
        }
    }

    pub fn with_component(mut self, id: impl Into<ComponentId>) -> Self {
        self.components.push(id.into());
        self
    }

    /// Remove a component from the ordered list; returns whether it was present
    pub fn detach(&mut self, id: &ComponentId) -> bool {
        let before = self.components.len();
        self.components.retain(|c| c != id);
        self.components.len() != before
    }
}
