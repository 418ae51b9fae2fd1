// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from durable queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    /// No records in any bucket
    #[error("queue is empty")]
    Empty,
    /// Another handle has the queue directory open
    #[error("queue at {} is locked by another process: daemon running?", .0.display())]
    Locked(PathBuf),
    #[error("invalid bucket count: {0}")]
    InvalidBucketCount(u32),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
