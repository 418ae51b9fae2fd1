// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pl - operator CLI for the connection scheduler

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{connection, queue};
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pl",
    version,
    about = "Inspect and operate the due-time connection scheduler"
)]
struct Cli {
    /// Data root holding the queue and the store
    #[arg(long, global = true, env = "PL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Durable queue inspection and maintenance
    Queue(queue::QueueArgs),
    /// Connection inspection
    Connection(connection::ConnectionArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let data_root = match cli.data_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Queue(args) => queue::handle(args.command, &data_root, cli.output),
        Commands::Connection(args) => {
            connection::handle(args.command, &data_root, cli.output).await
        }
    }
}

/// Warnings and errors to stderr; `RUST_LOG` raises the level
fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
