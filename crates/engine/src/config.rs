// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler timing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timings for the scheduler loop and the change listener
///
/// Durations are written in humantime form (`"30s"`, `"5m"`) when read from
/// a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Longest single sleep while waiting for the head entry
    #[serde(with = "humantime_serde")]
    pub max_sleep: Duration,
    /// Sleep after finding the queue empty
    #[serde(with = "humantime_serde")]
    pub empty_sleep: Duration,
    /// Period of the pending-connection reload
    #[serde(with = "humantime_serde")]
    pub reload_interval: Duration,
    /// How far ahead of now connections are queued
    #[serde(with = "humantime_serde")]
    pub horizon: Duration,
    /// Sleep after a queue or store failure in the loop
    #[serde(with = "humantime_serde")]
    pub error_backoff: Duration,
    /// Wait before resubscribing a stopped change listener
    #[serde(with = "humantime_serde")]
    pub listener_backoff: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_sleep: Duration::from_secs(30),
            empty_sleep: Duration::from_secs(10),
            reload_interval: Duration::from_secs(60),
            horizon: Duration::from_secs(5 * 60),
            error_backoff: Duration::from_secs(10),
            listener_backoff: Duration::from_secs(5),
        }
    }
}

/// Convert a config duration to a chrono offset, saturating on overflow
pub(crate) fn chrono_offset(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
