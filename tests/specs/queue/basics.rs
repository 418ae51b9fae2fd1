//! Queue command specs
//!
//! Verify push/peek/list/status/clear against a fresh data root.

use crate::prelude::*;

#[test]
fn peek_on_empty_queue() {
    let temp = Project::empty();

    temp.pl()
        .args(&["queue", "peek"])
        .passes()
        .stdout_eq("Queue empty\n");
}

#[test]
fn list_on_empty_queue() {
    let temp = Project::empty();

    temp.pl()
        .args(&["queue", "list"])
        .passes()
        .stdout_eq("Queue empty\n");
}

#[test]
fn push_reports_entry() {
    let temp = Project::empty();

    temp.pl()
        .args(&["queue", "push", "c-1", "--due", "2026-05-01T09:00:00Z"])
        .passes()
        .stdout_eq("2026-05-01T09:00:00Z  c-1\n");
}

#[test]
fn list_is_in_due_order() {
    let temp = Project::empty();
    temp.pl()
        .args(&["queue", "push", "c-late", "--due", "2026-05-01T10:00:00Z"])
        .passes();
    temp.pl()
        .args(&["queue", "push", "c-early", "--due", "2026-05-01 09:00:00"])
        .passes();

    temp.pl().args(&["queue", "list"]).passes().stdout_eq(
        "2026-05-01T09:00:00Z  c-early\n\
         2026-05-01T10:00:00Z  c-late\n",
    );
}

#[test]
fn status_shows_count_and_head() {
    let temp = Project::empty();
    temp.pl()
        .args(&["queue", "push", "c-2", "--due", "2026-05-02T00:00:00Z"])
        .passes();
    temp.pl()
        .args(&["queue", "push", "c-1", "--due", "2026-05-01T00:00:00Z"])
        .passes();

    temp.pl().args(&["queue", "status"]).passes().stdout_eq(
        "Entries: 2\n\
         Buckets: 16\n\
         Head:    2026-05-01T00:00:00Z  c-1\n",
    );
}

#[test]
fn status_uses_bucket_count_from_settings() {
    let temp = Project::empty();
    temp.file("pld.toml", "[queue]\nbuckets = 4\n");

    temp.pl()
        .args(&["queue", "status"])
        .passes()
        .stdout_has("Buckets: 4");
}

#[test]
fn peek_does_not_remove() {
    let temp = Project::empty();
    temp.pl()
        .args(&["queue", "push", "c-1", "--due", "2026-05-01T09:00:00Z"])
        .passes();

    temp.pl().args(&["queue", "peek"]).passes();
    temp.pl()
        .args(&["queue", "peek"])
        .passes()
        .stdout_eq("2026-05-01T09:00:00Z  c-1\n");
}

#[test]
fn push_with_delay_lands_in_future() {
    let temp = Project::empty();
    temp.pl()
        .args(&["queue", "push", "c-1", "--in", "1h"])
        .passes()
        .stdout_has("c-1");

    let head = temp.pl().args(&["-o", "json", "queue", "peek"]).passes().json();
    let due: chrono::DateTime<chrono::Utc> = head["due"].as_str().unwrap().parse().unwrap();

    assert!(due > chrono::Utc::now() + chrono::Duration::minutes(59));
}

#[test]
fn clear_removes_everything() {
    let temp = Project::empty();
    for id in ["c-1", "c-2", "c-3"] {
        temp.pl()
            .args(&["queue", "push", id, "--due", "2026-05-01T09:00:00Z"])
            .passes();
    }

    temp.pl()
        .args(&["queue", "clear"])
        .passes()
        .stdout_eq("Removed 3 entries\n");
    temp.pl()
        .args(&["queue", "peek"])
        .passes()
        .stdout_eq("Queue empty\n");
}
