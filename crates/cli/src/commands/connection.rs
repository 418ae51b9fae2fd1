// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection commands

use crate::output::{self, OutputFormat};
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use pl_adapters::{ConnectionStore, JsonStore, TransferStore};
use pl_core::{ConnectionId, ConnectionStatus, DataTransfer};
use pl_daemon::store_path;
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Args)]
pub struct ConnectionArgs {
    #[command(subcommand)]
    pub command: ConnectionCommand,
}

#[derive(Subcommand)]
pub enum ConnectionCommand {
    /// Show a connection, its status and its transfers
    Show {
        /// Connection id
        id: String,
    },
}

#[derive(Serialize)]
struct TransferInfo {
    id: String,
    operation: String,
    target: String,
    /// `None` when the transfer record is missing
    done: Option<bool>,
}

impl fmt::Display for TransferInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.done {
            Some(true) => "done",
            Some(false) => "pending",
            None => "missing",
        };
        write!(
            f,
            "{:<20} {:<13} {:<20} {}",
            self.id, self.operation, self.target, state
        )
    }
}

#[derive(Serialize)]
struct ConnectionInfo {
    id: String,
    status: ConnectionStatus,
    end_date: Option<DateTime<Utc>>,
    transfers: Vec<TransferInfo>,
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Connection: {}", self.id)?;
        writeln!(f, "  Status: {}", self.status)?;
        match self.end_date {
            Some(at) => writeln!(f, "  Due: {}", output::timestamp(at))?,
            None => writeln!(f, "  Due: -")?,
        }
        write!(f, "  Transfers: {}", self.transfers.len())?;
        for transfer in &self.transfers {
            write!(f, "\n    {}", transfer)?;
        }
        Ok(())
    }
}

pub async fn handle(
    command: ConnectionCommand,
    data_root: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let path = store_path(data_root);
    let store = JsonStore::open(&path)
        .with_context(|| format!("failed to open store at {}", path.display()))?;

    match command {
        ConnectionCommand::Show { id } => {
            let id = ConnectionId::from(id);
            let connection = store
                .get_connection(&id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("connection not found: {}", id))?;

            let mut transfers = Vec::with_capacity(connection.data_transfers.len());
            for transfer_id in &connection.data_transfers {
                let info = match store.get_transfer(transfer_id).await? {
                    Some(transfer) => transfer_info(&transfer),
                    None => TransferInfo {
                        id: transfer_id.to_string(),
                        operation: "-".into(),
                        target: "-".into(),
                        done: None,
                    },
                };
                transfers.push(info);
            }

            let info = ConnectionInfo {
                status: connection.status(Utc::now()),
                id: connection.id.to_string(),
                end_date: connection.end_date,
                transfers,
            };
            output::print(&info, format);
        }
    }

    Ok(())
}

fn transfer_info(transfer: &DataTransfer) -> TransferInfo {
    TransferInfo {
        id: transfer.id.to_string(),
        operation: transfer.operation.clone(),
        target: transfer.target_component.to_string(),
        done: Some(transfer.details.done),
    }
}
