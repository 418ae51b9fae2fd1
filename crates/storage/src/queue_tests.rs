// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Duration, TimeZone};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap()
}

fn open(dir: &Path) -> DurableQueue {
    DurableQueue::open(dir, QueueConfig::default()).unwrap()
}

#[test]
fn pop_on_empty_queue_is_empty_error() {
    let dir = TempDir::new().unwrap();
    let queue = open(dir.path());

    assert!(queue.is_empty());
    assert!(queue.peek().is_none());
    assert!(matches!(queue.pop(), Err(QueueError::Empty)));
}

#[test]
fn pops_in_due_order_across_buckets() {
    let dir = TempDir::new().unwrap();
    let queue = open(dir.path());

    queue.push(base() + Duration::seconds(30), "c").unwrap();
    queue.push(base(), "a").unwrap();
    queue.push(base() + Duration::seconds(10), "b").unwrap();

    assert_eq!(queue.len(), 3);
    assert_eq!(queue.peek().unwrap().id, "a");
    let order: Vec<_> = (0..3).map(|_| queue.pop().unwrap().id).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
    assert!(queue.is_empty());
}

#[test]
fn peek_does_not_remove() {
    let dir = TempDir::new().unwrap();
    let queue = open(dir.path());
    queue.push(base(), "a").unwrap();

    assert_eq!(queue.peek(), queue.peek());
    assert_eq!(queue.len(), 1);
}

#[test]
fn equal_due_times_pop_once_each() {
    let dir = TempDir::new().unwrap();
    let queue = open(dir.path());
    queue.push(base(), "first").unwrap();
    queue.push(base(), "second").unwrap();

    let mut popped = vec![queue.pop().unwrap().id, queue.pop().unwrap().id];
    popped.sort();
    assert_eq!(popped, vec!["first", "second"]);
    assert!(matches!(queue.pop(), Err(QueueError::Empty)));
}

#[test]
fn duplicate_ids_are_kept() {
    let dir = TempDir::new().unwrap();
    let queue = open(dir.path());
    queue.push(base(), "conn").unwrap();
    queue.push(base() + Duration::seconds(1), "conn").unwrap();

    assert_eq!(queue.len(), 2);
    assert_eq!(queue.pop().unwrap().due, base());
    assert_eq!(queue.pop().unwrap().id, "conn");
}

#[test]
fn reopen_keeps_bucket_count_of_existing_directory() {
    let dir = TempDir::new().unwrap();
    {
        let queue = DurableQueue::open(dir.path(), QueueConfig { buckets: 4 }).unwrap();
        assert_eq!(queue.bucket_count(), 4);
        queue.push(base(), "a").unwrap();
    }

    let queue = DurableQueue::open(dir.path(), QueueConfig { buckets: 32 }).unwrap();
    assert_eq!(queue.bucket_count(), 4);
    assert_eq!(queue.pop().unwrap().id, "a");
}

#[test]
fn zero_buckets_is_rejected() {
    let dir = TempDir::new().unwrap();
    let result = DurableQueue::open(dir.path(), QueueConfig { buckets: 0 });
    assert!(matches!(result, Err(QueueError::InvalidBucketCount(0))));
}

#[test]
fn open_removes_leftover_temp_files() {
    let dir = TempDir::new().unwrap();
    {
        let queue = open(dir.path());
        queue.push(base(), "a").unwrap();
    }
    let stray = dir.path().join("bucket-0003.jsonl.tmp");
    fs::write(&stray, "half a rewrite").unwrap();

    let queue = open(dir.path());
    assert!(!stray.exists());
    assert_eq!(queue.len(), 1);
}

#[test]
fn open_truncates_torn_tail_then_accepts_pushes() {
    let dir = TempDir::new().unwrap();
    {
        let queue = open(dir.path());
        queue.push(base(), "a").unwrap();
    }
    let torn = bucket_path(dir.path(), bucket_index(base(), DEFAULT_BUCKETS as usize));
    {
        let mut file = fs::OpenOptions::new().append(true).open(&torn).unwrap();
        file.write_all(br#"{"seq":1,"due":"#).unwrap();
    }

    let queue = open(dir.path());
    queue.push(base(), "b").unwrap();

    let ids: Vec<_> = queue.entries().unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn clear_empties_every_bucket() {
    let dir = TempDir::new().unwrap();
    let queue = open(dir.path());
    for i in 0..5 {
        queue.push(base() + Duration::seconds(i), &format!("c{i}")).unwrap();
    }

    assert_eq!(queue.clear().unwrap(), 5);
    assert!(queue.is_empty());
    let snapshot = DurableQueue::inspect(dir.path(), QueueConfig::default()).unwrap();
    assert!(snapshot.entries.is_empty());
}

#[test]
fn compact_preserves_entries() {
    let dir = TempDir::new().unwrap();
    let queue = DurableQueue::open(dir.path(), QueueConfig { buckets: 1 }).unwrap();
    queue.push(base() + Duration::seconds(2), "late").unwrap();
    queue.push(base(), "early").unwrap();

    let report = queue.compact().unwrap();
    assert_eq!(report.records, 2);

    let ids: Vec<_> = queue.entries().unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["early", "late"]);
    assert_eq!(queue.pop().unwrap().id, "early");
}

#[test]
fn repair_reports_truncation() {
    let dir = TempDir::new().unwrap();
    let queue = DurableQueue::open(dir.path(), QueueConfig { buckets: 1 }).unwrap();
    queue.push(base(), "a").unwrap();
    {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(bucket_path(dir.path(), 0))
            .unwrap();
        file.write_all(b"garbage\n").unwrap();
    }
    fs::write(dir.path().join("bucket-0000.jsonl.tmp"), "x").unwrap();

    let report = queue.repair().unwrap();
    assert_eq!(report.temp_files_removed, 1);
    assert_eq!(report.buckets_truncated, 1);
    assert_eq!(report.bytes_dropped, "garbage\n".len() as u64);
    assert_eq!(report.records, 1);
}

#[test]
fn second_open_is_locked_out_until_first_drops() {
    let dir = TempDir::new().unwrap();
    let queue = open(dir.path());
    queue.push(base(), "a").unwrap();

    let second = DurableQueue::open(dir.path(), QueueConfig::default());
    assert!(matches!(second, Err(QueueError::Locked(path)) if path == dir.path().join("lock")));

    drop(queue);
    assert_eq!(open(dir.path()).pop().unwrap().id, "a");
}

#[test]
fn inspect_reads_without_touching_files() {
    let dir = TempDir::new().unwrap();
    let queue = DurableQueue::open(dir.path(), QueueConfig { buckets: 1 }).unwrap();
    queue.push(base() + Duration::seconds(5), "late").unwrap();
    queue.push(base(), "early").unwrap();
    let bucket = bucket_path(dir.path(), 0);
    {
        let mut file = fs::OpenOptions::new().append(true).open(&bucket).unwrap();
        file.write_all(br#"{"seq":7,"due":"#).unwrap();
    }
    let stray = dir.path().join("bucket-0000.jsonl.tmp");
    fs::write(&stray, "rewrite in flight").unwrap();
    let len_before = fs::metadata(&bucket).unwrap().len();

    let snapshot = DurableQueue::inspect(dir.path(), QueueConfig::default()).unwrap();

    assert_eq!(snapshot.buckets, 1);
    let ids: Vec<_> = snapshot.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["early", "late"]);
    assert_eq!(snapshot.head().unwrap().id, "early");
    assert!(stray.exists());
    assert_eq!(fs::metadata(&bucket).unwrap().len(), len_before);
    assert_eq!(queue.len(), 2);
}

#[test]
fn inspect_of_missing_directory_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("queue");

    let snapshot = DurableQueue::inspect(&path, QueueConfig { buckets: 4 }).unwrap();

    assert_eq!(snapshot, QueueSnapshot { buckets: 4, entries: Vec::new() });
    assert!(!path.exists());
}

#[test]
fn concurrent_pushes_and_pops_deliver_each_entry_once() {
    const PUSHERS: usize = 4;
    const PER_PUSHER: usize = 25;
    let dir = TempDir::new().unwrap();
    let queue = Arc::new(open(dir.path()));

    let pushers: Vec<_> = (0..PUSHERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PUSHER {
                    let due = base() + Duration::seconds(i as i64);
                    queue.push(due, &format!("p{p}-{i}")).unwrap();
                }
            })
        })
        .collect();
    let popper = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut popped = Vec::new();
            while popped.len() < PUSHERS * PER_PUSHER {
                match queue.pop() {
                    Ok(entry) => popped.push(entry),
                    Err(QueueError::Empty) => thread::yield_now(),
                    Err(e) => panic!("pop failed: {e}"),
                }
            }
            popped
        })
    };
    for pusher in pushers {
        pusher.join().unwrap();
    }
    let popped = popper.join().unwrap();

    assert!(queue.is_empty());
    let mut seen = HashSet::new();
    for entry in &popped {
        assert!(seen.insert(entry.id.clone()), "{} popped twice", entry.id);
    }
    assert_eq!(seen.len(), PUSHERS * PER_PUSHER);

    // A pusher's entries are pushed in due order, so they pop in due order
    for p in 0..PUSHERS {
        let prefix = format!("p{p}-");
        let dues: Vec<_> = popped
            .iter()
            .filter(|e| e.id.starts_with(&prefix))
            .map(|e| e.due)
            .collect();
        assert!(dues.windows(2).all(|w| w[0] <= w[1]), "pusher {p}: {dues:?}");
    }
}

#[test]
fn pops_after_concurrent_pushes_are_in_due_order() {
    let dir = TempDir::new().unwrap();
    let queue = Arc::new(open(dir.path()));

    let pushers: Vec<_> = (0..4)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..20i64 {
                    // Interleave due-times across pushers
                    let due = base() + Duration::seconds(i * 4 + p);
                    queue.push(due, &format!("p{p}-{i}")).unwrap();
                }
            })
        })
        .collect();
    for pusher in pushers {
        pusher.join().unwrap();
    }

    let mut dues = Vec::new();
    while let Ok(entry) = queue.pop() {
        dues.push(entry.due);
    }
    assert_eq!(dues.len(), 80);
    assert!(dues.windows(2).all(|w| w[0] <= w[1]));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn reopened_queue_pops_everything_in_order(
        offsets in proptest::collection::vec(0i64..10_000, 1..40)
    ) {
        let dir = TempDir::new().unwrap();
        let mut expected: HashMap<String, DateTime<Utc>> = HashMap::new();
        {
            let queue = open(dir.path());
            for (i, offset) in offsets.iter().enumerate() {
                let due = base() + Duration::milliseconds(*offset);
                let id = format!("conn-{i}");
                queue.push(due, &id).unwrap();
                expected.insert(id, due);
            }
        }

        let queue = open(dir.path());
        let mut last = None;
        while let Ok(entry) = queue.pop() {
            if let Some(prev) = last {
                prop_assert!(entry.due >= prev);
            }
            last = Some(entry.due);
            prop_assert_eq!(expected.remove(&entry.id), Some(entry.due));
        }
        prop_assert!(expected.is_empty());
    }
}
