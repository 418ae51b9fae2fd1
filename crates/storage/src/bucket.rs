// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One bucket file of the durable queue
//!
//! A bucket is an append-only JSON-lines file of [`Record`]s. Appends are
//! fsynced before returning. Removal rewrites the whole bucket to a temp file
//! and renames it over the original. A line that fails to parse or verify,
//! or a final line missing its newline, marks the end of the bucket.

use crate::error::QueueError;
use crate::record::Record;
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub(crate) const TEMP_SUFFIX: &str = "tmp";

/// Result of reading a bucket file up to its first invalid line
#[derive(Debug, Default)]
pub(crate) struct Scan {
    pub records: Vec<Record>,
    /// Byte offset just past the last valid line
    pub valid_len: u64,
    pub file_len: u64,
}

impl Scan {
    pub fn is_torn(&self) -> bool {
        self.valid_len < self.file_len
    }
}

/// Read every valid record of a bucket file. A missing file is an empty bucket.
pub(crate) fn scan(path: &Path) -> Result<Scan, QueueError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Scan::default()),
        Err(e) => return Err(e.into()),
    };
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut scan = Scan {
        file_len,
        ..Scan::default()
    };

    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(n) => n as u64,
            // Non-UTF-8 garbage
            Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
            Err(e) => return Err(e.into()),
        };
        if !line.ends_with('\n') {
            break;
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            match Record::from_line(trimmed) {
                Ok(record) if record.verify() => scan.records.push(record),
                _ => break,
            }
        }
        scan.valid_len += bytes_read;
    }

    Ok(scan)
}

/// A bucket file plus its cached minimum and length
#[derive(Debug)]
pub(crate) struct Bucket {
    path: PathBuf,
    next_seq: u64,
    len: usize,
    min: Option<Record>,
}

impl Bucket {
    /// Open a bucket, truncating a torn tail. Returns the bucket and the
    /// number of bytes dropped.
    pub fn open(path: PathBuf) -> Result<(Self, u64), QueueError> {
        let scan = scan(&path)?;
        let mut dropped = 0;
        if scan.is_torn() {
            dropped = scan.file_len - scan.valid_len;
            truncate(&path, scan.valid_len)?;
            tracing::warn!(
                bucket = %path.display(),
                valid_len = scan.valid_len,
                dropped,
                "truncated torn bucket tail"
            );
        }

        let mut bucket = Self {
            path,
            next_seq: 0,
            len: 0,
            min: None,
        };
        bucket.refresh(&scan.records);
        Ok((bucket, dropped))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn min(&self) -> Option<&Record> {
        self.min.as_ref()
    }

    /// Append a record and fsync before returning
    pub fn append(&mut self, due: DateTime<Utc>, id: &str) -> Result<Record, QueueError> {
        let record = Record::new(self.next_seq, due, id);
        let mut line = record.to_line()?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_all()?;

        self.next_seq += 1;
        self.len += 1;
        let replaces_min = match &self.min {
            Some(min) => record.queue_cmp(min).is_lt(),
            None => true,
        };
        if replaces_min {
            self.min = Some(record.clone());
        }
        Ok(record)
    }

    /// Remove the record with the given sequence number
    ///
    /// Returns `None` when the file holds no such record; the cache is
    /// refreshed from disk either way.
    pub fn remove(&mut self, seq: u64) -> Result<Option<Record>, QueueError> {
        let mut records = scan(&self.path)?.records;
        let removed = records
            .iter()
            .position(|r| r.seq == seq)
            .map(|pos| records.remove(pos));

        if removed.is_some() {
            self.rewrite(&records)?;
        } else {
            self.refresh(&records);
        }
        Ok(removed)
    }

    /// Replace the bucket contents atomically
    pub fn rewrite(&mut self, records: &[Record]) -> Result<(), QueueError> {
        let temp_path = self.path.with_extension(format!("jsonl.{TEMP_SUFFIX}"));
        {
            let mut file = File::create(&temp_path)?;
            for record in records {
                let line = record.to_line()?;
                file.write_all(line.as_bytes())?;
                file.write_all(b"\n")?;
            }
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;

        self.refresh(records);
        Ok(())
    }

    /// Recompute the cached minimum and length from records read off disk
    fn refresh(&mut self, records: &[Record]) {
        self.len = records.len();
        self.min = records.iter().min_by(|a, b| a.queue_cmp(b)).cloned();
        let next = records.iter().map(|r| r.seq + 1).max().unwrap_or(0);
        self.next_seq = self.next_seq.max(next);
    }
}

pub(crate) fn truncate(path: &Path, len: u64) -> Result<(), QueueError> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(len)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
#[path = "bucket_tests.rs"]
mod tests;
