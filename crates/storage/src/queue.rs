// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable priority queue of `(due-time, connection id)` entries
//!
//! Entries are spread over a fixed number of bucket files by hashing the
//! due-time. Each bucket caches its minimum in memory, so `peek` never
//! touches the disk and `pop` only rewrites the one bucket holding the head.
//! All operations serialize on one internal mutex.
//!
//! An open queue holds an exclusive lock on `<dir>/lock`, so only one
//! process can write a queue directory at a time. Other processes read it
//! through [`DurableQueue::inspect`], which never writes.

use crate::bucket::{self, Bucket, TEMP_SUFFIX};
use crate::error::QueueError;
use crate::record::Record;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const META_FILE: &str = "meta.json";
const LOCK_FILE: &str = "lock";

/// Default number of bucket files
pub const DEFAULT_BUCKETS: u32 = 16;

/// Queue configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Bucket count for a new queue directory. An existing directory keeps
    /// the count recorded in its `meta.json`.
    pub buckets: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct QueueMeta {
    buckets: u32,
}

/// An entry handed out by the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub due: DateTime<Utc>,
    pub id: String,
}

/// Read-only view of a queue directory, from [`DurableQueue::inspect`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub buckets: usize,
    /// Entries in due order
    pub entries: Vec<QueueEntry>,
}

impl QueueSnapshot {
    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }
}

/// Result of [`DurableQueue::compact`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompactReport {
    pub records: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

/// Result of [`DurableQueue::repair`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub temp_files_removed: usize,
    pub buckets_truncated: usize,
    pub bytes_dropped: u64,
    pub records: usize,
}

/// Bucketed, crash-safe priority queue keyed by due-time
#[derive(Debug)]
pub struct DurableQueue {
    dir: PathBuf,
    buckets: Mutex<Vec<Bucket>>,
    // NOTE(lifetime): Held to keep the directory lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

impl DurableQueue {
    /// Open or create a queue directory
    ///
    /// Fails with [`QueueError::Locked`] while another handle has the
    /// directory open. Removes temp files left by interrupted rewrites and
    /// truncates torn bucket tails before any operation runs.
    pub fn open(dir: impl Into<PathBuf>, config: QueueConfig) -> Result<Self, QueueError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let lock_file = acquire_lock(&dir)?;

        let count = read_or_init_meta(&dir, config)?;
        let temp_removed = remove_temp_files(&dir)?;
        let (buckets, report) = open_buckets(&dir, count)?;

        tracing::info!(
            dir = %dir.display(),
            buckets = count,
            records = report.records,
            temp_removed,
            truncated = report.buckets_truncated,
            "opened durable queue"
        );

        Ok(Self {
            dir,
            buckets: Mutex::new(buckets),
            lock_file,
        })
    }

    /// Read a queue directory without locking or modifying it
    ///
    /// Safe while another process has the queue open: temp files are
    /// ignored and a torn tail ends its bucket. A directory that was never
    /// opened reads as empty with the configured bucket count.
    pub fn inspect(dir: &Path, config: QueueConfig) -> Result<QueueSnapshot, QueueError> {
        let Some(buckets) = read_meta(dir)? else {
            return Ok(QueueSnapshot {
                buckets: config.buckets as usize,
                entries: Vec::new(),
            });
        };
        let mut records = Vec::new();
        for index in 0..buckets {
            records.extend(bucket::scan(&bucket_path(dir, index))?.records);
        }
        Ok(QueueSnapshot {
            buckets,
            entries: in_due_order(records),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn bucket_count(&self) -> usize {
        self.lock().len()
    }

    /// Append an entry. Duplicate ids are allowed.
    pub fn push(&self, due: DateTime<Utc>, id: &str) -> Result<(), QueueError> {
        let mut buckets = self.lock();
        let index = bucket_index(due, buckets.len());
        if let Some(bucket) = buckets.get_mut(index) {
            let record = bucket.append(due, id)?;
            tracing::debug!(id, %due, bucket = index, seq = record.seq, "queue push");
        }
        Ok(())
    }

    /// Remove and return the entry with the earliest due-time
    pub fn pop(&self) -> Result<QueueEntry, QueueError> {
        let mut buckets = self.lock();
        loop {
            let Some((index, seq)) = head(&buckets).map(|(i, r)| (i, r.seq)) else {
                return Err(QueueError::Empty);
            };
            let Some(bucket) = buckets.get_mut(index) else {
                return Err(QueueError::Empty);
            };
            // A miss means the file changed under us; the bucket cache was
            // refreshed from disk, so look again.
            if let Some(record) = bucket.remove(seq)? {
                tracing::debug!(id = %record.id, due = %record.due, bucket = index, "queue pop");
                return Ok(QueueEntry {
                    due: record.due,
                    id: record.id,
                });
            }
            tracing::warn!(bucket = %bucket.path().display(), seq, "cached head missing from bucket");
        }
    }

    /// The entry `pop` would return, without removing it
    pub fn peek(&self) -> Option<QueueEntry> {
        let buckets = self.lock();
        head(&buckets).map(|(_, r)| QueueEntry {
            due: r.due,
            id: r.id.clone(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lock().iter().all(|b| b.len() == 0)
    }

    pub fn len(&self) -> usize {
        self.lock().iter().map(Bucket::len).sum()
    }

    /// All entries in due order
    pub fn entries(&self) -> Result<Vec<QueueEntry>, QueueError> {
        let buckets = self.lock();
        let mut records = Vec::new();
        for bucket in buckets.iter() {
            records.extend(bucket::scan(bucket.path())?.records);
        }
        Ok(in_due_order(records))
    }

    /// Drop every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, QueueError> {
        let mut buckets = self.lock();
        let mut removed = 0;
        for bucket in buckets.iter_mut() {
            removed += bucket.len();
            bucket.rewrite(&[])?;
        }
        tracing::info!(removed, "queue cleared");
        Ok(removed)
    }

    /// Rewrite every bucket in due order, dropping anything unreadable
    pub fn compact(&self) -> Result<CompactReport, QueueError> {
        let mut buckets = self.lock();
        let mut report = CompactReport::default();
        for bucket in buckets.iter_mut() {
            let scan = bucket::scan(bucket.path())?;
            let mut records = scan.records;
            records.sort_by(|a, b| a.queue_cmp(b));
            bucket.rewrite(&records)?;

            report.records += records.len();
            report.bytes_before += scan.file_len;
            report.bytes_after += fs::metadata(bucket.path())?.len();
        }
        tracing::info!(
            records = report.records,
            bytes_before = report.bytes_before,
            bytes_after = report.bytes_after,
            "queue compacted"
        );
        Ok(report)
    }

    /// Re-run crash recovery: remove temp files and truncate torn tails
    pub fn repair(&self) -> Result<RepairReport, QueueError> {
        let mut buckets = self.lock();
        let temp_files_removed = remove_temp_files(&self.dir)?;
        let (reopened, mut report) = open_buckets(&self.dir, buckets.len())?;
        *buckets = reopened;
        report.temp_files_removed = temp_files_removed;
        tracing::info!(
            temp_files_removed,
            buckets_truncated = report.buckets_truncated,
            bytes_dropped = report.bytes_dropped,
            "queue repaired"
        );
        Ok(report)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Bucket>> {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Stable bucket choice for a due-time
fn bucket_index(due: DateTime<Utc>, count: usize) -> usize {
    let hash = crc32fast::hash(&due.timestamp_micros().to_le_bytes());
    (hash as usize) % count.max(1)
}

fn head(buckets: &[Bucket]) -> Option<(usize, &Record)> {
    buckets
        .iter()
        .enumerate()
        .filter_map(|(i, b)| b.min().map(|r| (i, r)))
        .min_by(|(_, a), (_, b)| a.queue_cmp(b))
}

fn in_due_order(mut records: Vec<Record>) -> Vec<QueueEntry> {
    records.sort_by(|a, b| a.queue_cmp(b));
    records
        .into_iter()
        .map(|r| QueueEntry { due: r.due, id: r.id })
        .collect()
}

fn acquire_lock(dir: &Path) -> Result<File, QueueError> {
    let path = dir.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(file),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(QueueError::Locked(path))
        }
        Err(e) => Err(e.into()),
    }
}

fn bucket_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("bucket-{index:04}.jsonl"))
}

/// Bucket count recorded in `meta.json`, if the directory has one
fn read_meta(dir: &Path) -> Result<Option<usize>, QueueError> {
    let path = dir.join(META_FILE);
    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let meta: QueueMeta = serde_json::from_str(&json)?;
    if meta.buckets == 0 {
        return Err(QueueError::InvalidBucketCount(meta.buckets));
    }
    Ok(Some(meta.buckets as usize))
}

fn read_or_init_meta(dir: &Path, config: QueueConfig) -> Result<usize, QueueError> {
    if let Some(existing) = read_meta(dir)? {
        if existing != config.buckets as usize {
            tracing::debug!(
                configured = config.buckets,
                existing,
                "keeping bucket count of existing queue"
            );
        }
        return Ok(existing);
    }

    if config.buckets == 0 {
        return Err(QueueError::InvalidBucketCount(config.buckets));
    }
    let temp_path = dir.join(format!("{META_FILE}.{TEMP_SUFFIX}"));
    let json = serde_json::to_string_pretty(&QueueMeta {
        buckets: config.buckets,
    })?;
    {
        use std::io::Write;
        let mut file = File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, dir.join(META_FILE))?;
    Ok(config.buckets as usize)
}

fn remove_temp_files(dir: &Path) -> Result<usize, QueueError> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == TEMP_SUFFIX) {
            fs::remove_file(&path)?;
            tracing::warn!(path = %path.display(), "removed leftover temp file");
            removed += 1;
        }
    }
    Ok(removed)
}

fn open_buckets(dir: &Path, count: usize) -> Result<(Vec<Bucket>, RepairReport), QueueError> {
    let mut buckets = Vec::with_capacity(count);
    let mut report = RepairReport::default();
    for index in 0..count {
        let (bucket, dropped) = Bucket::open(bucket_path(dir, index))?;
        if dropped > 0 {
            report.buckets_truncated += 1;
            report.bytes_dropped += dropped;
        }
        report.records += bucket.len();
        buckets.push(bucket);
    }
    Ok((buckets, report))
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
