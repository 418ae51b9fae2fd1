// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional `pld.toml` in the data root
//!
//! ```toml
//! [scheduler]
//! max_sleep = "30s"
//! horizon = "5m"
//!
//! [queue]
//! buckets = 16
//! ```

use pl_engine::SchedulerConfig;
use pl_storage::QueueConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the settings file inside the data root
pub const SETTINGS_FILE: &str = "pld.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("invalid settings in {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub scheduler: SchedulerConfig,
    pub queue: QueueConfig,
}

impl Settings {
    /// Load settings from the data root; a missing file means defaults
    pub fn load(data_root: &Path) -> Result<Self, SettingsError> {
        let path = data_root.join(SETTINGS_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(SettingsError::Read(path, e)),
        };
        toml::from_str(&content).map_err(|e| SettingsError::Parse(path, e))
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
