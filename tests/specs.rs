//! Behavioral specifications for the pl CLI.
//!
//! These tests are black-box: they invoke the CLI binary and verify
//! stdout, stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/errors.rs"]
mod cli_errors;

// queue/
#[path = "specs/queue/basics.rs"]
mod queue_basics;
#[path = "specs/queue/maintenance.rs"]
mod queue_maintenance;

// connection/
#[path = "specs/connection/show.rs"]
mod connection_show;
