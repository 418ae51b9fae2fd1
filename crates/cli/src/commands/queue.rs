// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue commands

use crate::output::{self, OutputFormat};
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use pl_daemon::{queue_path, Settings};
use pl_storage::{CompactReport, DurableQueue, QueueEntry, QueueSnapshot, RepairReport};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommand,
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// Show entry count and head
    Status,
    /// List all entries in due order
    List,
    /// Show the next entry without removing it
    Peek,
    /// Queue a connection id by hand
    Push {
        /// Connection id
        id: String,
        /// Due time (RFC 3339 or naive UTC timestamp)
        #[arg(long, value_parser = parse_due, conflicts_with = "delay")]
        due: Option<DateTime<Utc>>,
        /// Due after a delay from now (e.g. 5m, 1h30m)
        #[arg(long = "in", value_parser = humantime::parse_duration)]
        delay: Option<Duration>,
    },
    /// Remove every entry
    Clear,
    /// Rewrite bucket files without dead bytes
    Compact,
    /// Drop temp files and torn bucket tails
    Repair,
}

fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    pl_core::time::parse_instant(s).map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct EntryInfo {
    due: DateTime<Utc>,
    id: String,
}

impl From<QueueEntry> for EntryInfo {
    fn from(entry: QueueEntry) -> Self {
        Self {
            due: entry.due,
            id: entry.id,
        }
    }
}

impl fmt::Display for EntryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", output::timestamp(self.due), self.id)
    }
}

#[derive(Serialize)]
struct StatusInfo {
    entries: usize,
    buckets: usize,
    head: Option<EntryInfo>,
}

impl fmt::Display for StatusInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Entries: {}", self.entries)?;
        writeln!(f, "Buckets: {}", self.buckets)?;
        match &self.head {
            Some(head) => write!(f, "Head:    {}", head),
            None => write!(f, "Head:    -"),
        }
    }
}

#[derive(Serialize)]
struct CountInfo {
    removed: usize,
}

impl fmt::Display for CountInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Removed {} entries", self.removed)
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct Compacted(CompactReport);

impl fmt::Display for Compacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Compacted {} entries ({} -> {} bytes)",
            self.0.records, self.0.bytes_before, self.0.bytes_after
        )
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct Repaired(RepairReport);

impl fmt::Display for Repaired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.0;
        write!(
            f,
            "Repaired queue: {} entries kept, {} buckets truncated ({} bytes dropped), {} temp files removed",
            r.records, r.buckets_truncated, r.bytes_dropped, r.temp_files_removed
        )
    }
}

impl From<QueueSnapshot> for StatusInfo {
    fn from(snapshot: QueueSnapshot) -> Self {
        Self {
            entries: snapshot.entries.len(),
            buckets: snapshot.buckets,
            head: snapshot.entries.into_iter().next().map(EntryInfo::from),
        }
    }
}

/// Read commands inspect the directory as-is; the rest need the queue lock,
/// which a running daemon holds.
pub fn handle(command: QueueCommand, data_root: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let settings = Settings::load(data_root)?;
    let path = queue_path(data_root);

    match command {
        QueueCommand::Status => {
            let status = StatusInfo::from(inspect(&path, &settings)?);
            output::print(&status, format);
        }
        QueueCommand::List => {
            let entries: Vec<EntryInfo> = inspect(&path, &settings)?
                .entries
                .into_iter()
                .map(EntryInfo::from)
                .collect();
            output::print_list(&entries, format, "Queue empty");
        }
        QueueCommand::Peek => {
            let head = inspect(&path, &settings)?
                .entries
                .into_iter()
                .next()
                .map(EntryInfo::from);
            output::print_option(head.as_ref(), format, "Queue empty");
        }
        QueueCommand::Push { id, due, delay } => {
            let queue = open(&path, &settings)?;
            let due = match (due, delay) {
                (Some(due), _) => due,
                (None, Some(delay)) => {
                    Utc::now()
                        + chrono::Duration::from_std(delay)
                            .with_context(|| format!("delay too large: {:?}", delay))?
                }
                (None, None) => Utc::now(),
            };
            queue.push(due, &id)?;
            output::print(&EntryInfo { due, id }, format);
        }
        QueueCommand::Clear => {
            let removed = open(&path, &settings)?.clear()?;
            output::print(&CountInfo { removed }, format);
        }
        QueueCommand::Compact => {
            let report = open(&path, &settings)?.compact()?;
            output::print(&Compacted(report), format);
        }
        QueueCommand::Repair => {
            let report = open(&path, &settings)?.repair()?;
            output::print(&Repaired(report), format);
        }
    }

    Ok(())
}

fn inspect(path: &Path, settings: &Settings) -> anyhow::Result<QueueSnapshot> {
    DurableQueue::inspect(path, settings.queue)
        .with_context(|| format!("failed to read queue at {}", path.display()))
}

fn open(path: &Path, settings: &Settings) -> anyhow::Result<DurableQueue> {
    DurableQueue::open(path, settings.queue)
        .with_context(|| format!("failed to open queue at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn due_accepts_naive_and_offset_forms() {
        let expected = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();

        assert_eq!(parse_due("2026-05-01T09:00:00Z").unwrap(), expected);
        assert_eq!(parse_due("2026-05-01 09:00:00").unwrap(), expected);
        assert_eq!(parse_due("2026-05-01T11:00:00+02:00").unwrap(), expected);
        assert!(parse_due("tomorrow").is_err());
    }

    #[test]
    fn writes_are_refused_while_the_queue_is_held() {
        let data = tempfile::tempdir().unwrap();
        let held = DurableQueue::open(queue_path(data.path()), Default::default()).unwrap();
        held.push(Utc::now(), "c-1").unwrap();

        for command in [QueueCommand::Clear, QueueCommand::Compact, QueueCommand::Repair] {
            let err = handle(command, data.path(), OutputFormat::Json).unwrap_err();
            assert!(format!("{err:#}").contains("locked by another process"));
        }
        handle(QueueCommand::Status, data.path(), OutputFormat::Json).unwrap();

        assert_eq!(held.len(), 1);
    }

    #[test]
    fn status_text_shows_head() {
        let status = StatusInfo {
            entries: 2,
            buckets: 16,
            head: Some(EntryInfo {
                due: Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
                id: "c-1".into(),
            }),
        };

        assert_eq!(
            status.to_string(),
            "Entries: 2\nBuckets: 16\nHead:    2026-05-01T09:00:00Z  c-1"
        );
    }
}
