//! Queue maintenance specs
//!
//! Verify compact and repair, including recovery from a torn bucket tail.
//! Read commands never modify the queue directory.

use crate::prelude::*;
use std::io::Write;

fn bucket_files(temp: &Project) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(temp.path().join("queue"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == "jsonl"))
        .collect();
    files.sort();
    files
}

#[test]
fn compact_keeps_entries() {
    let temp = Project::empty();
    temp.pl()
        .args(&["queue", "push", "c-1", "--due", "2026-05-01T09:00:00Z"])
        .passes();

    temp.pl()
        .args(&["queue", "compact"])
        .passes()
        .stdout_has("Compacted 1 entries");
    temp.pl()
        .args(&["queue", "list"])
        .passes()
        .stdout_eq("2026-05-01T09:00:00Z  c-1\n");
}

#[test]
fn torn_tail_is_skipped_by_list_and_dropped_by_repair() {
    let temp = Project::empty();
    temp.pl()
        .args(&["queue", "push", "c-1", "--due", "2026-05-01T09:00:00Z"])
        .passes();
    let bucket = bucket_files(&temp)
        .into_iter()
        .find(|p| std::fs::metadata(p).unwrap().len() > 0)
        .unwrap();
    let mut file = std::fs::OpenOptions::new().append(true).open(&bucket).unwrap();
    file.write_all(br#"{"seq":9,"due":17"#).unwrap();

    temp.pl()
        .args(&["queue", "list"])
        .passes()
        .stdout_eq("2026-05-01T09:00:00Z  c-1\n");
    temp.pl()
        .args(&["queue", "repair"])
        .passes()
        .stdout_has("1 entries kept");
}

#[test]
fn repair_json_report() {
    let temp = Project::empty();

    let report = temp
        .pl()
        .args(&["--output", "json", "queue", "repair"])
        .passes()
        .json();

    assert_eq!(report["records"], 0);
    assert_eq!(report["temp_files_removed"], 0);
}

#[test]
fn read_commands_leave_a_fresh_data_root_untouched() {
    let temp = Project::empty();

    temp.pl().args(&["queue", "status"]).passes();
    temp.pl().args(&["queue", "list"]).passes();
    temp.pl().args(&["queue", "peek"]).passes();

    assert!(!temp.path().join("queue").exists());
}
