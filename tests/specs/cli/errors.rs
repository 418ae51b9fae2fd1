//! CLI argument error specs

use crate::prelude::*;

#[test]
fn due_and_delay_conflict() {
    let temp = Project::empty();

    temp.pl()
        .args(&["queue", "push", "c-1", "--due", "2026-05-01T09:00:00Z", "--in", "5m"])
        .fails()
        .stderr_has("cannot be used with");
}

#[test]
fn unreadable_due_is_rejected() {
    let temp = Project::empty();

    temp.pl()
        .args(&["queue", "push", "c-1", "--due", "next tuesday"])
        .fails()
        .stderr_has("unrecognized timestamp");
}

#[test]
fn invalid_settings_are_reported() {
    let temp = Project::empty();
    temp.file("pld.toml", "[scheduler]\nmax_sleep = \"soon\"\n");

    temp.pl()
        .args(&["queue", "status"])
        .fails()
        .stderr_has("invalid settings");
}
