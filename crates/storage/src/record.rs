// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue record with checksum verification
//!
//! Each record carries a per-bucket sequence number, the due-time in
//! microseconds since the epoch, the connection id and a CRC32 checksum of
//! the other three fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single line in a bucket file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Sequence number, unique within its bucket
    pub seq: u64,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub due: DateTime<Utc>,
    pub id: String,
    pub checksum: u32,
}

impl Record {
    pub fn new(seq: u64, due: DateTime<Utc>, id: impl Into<String>) -> Self {
        let id = id.into();
        let checksum = Self::calculate_checksum(seq, due, &id);
        Self {
            seq,
            due,
            id,
            checksum,
        }
    }

    fn calculate_checksum(seq: u64, due: DateTime<Utc>, id: &str) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&seq.to_le_bytes());
        hasher.update(&due.timestamp_micros().to_le_bytes());
        hasher.update(id.as_bytes());
        hasher.finalize()
    }

    pub fn verify(&self) -> bool {
        self.checksum == Self::calculate_checksum(self.seq, self.due, &self.id)
    }

    /// Serialize to one line of JSON, without the trailing newline
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Queue order: due-time first, sequence as a tiebreak
    pub fn queue_cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
