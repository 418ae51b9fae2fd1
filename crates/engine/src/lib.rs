// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pl-engine: scheduling and execution of due connections

mod config;
mod error;
mod executor;
mod listener;
mod loader;
mod ops;
mod runtime;
mod scheduler;
mod shutdown;
mod transfer;

pub use config::SchedulerConfig;
pub use error::{EngineError, TransferRejection};
pub use executor::{ConnectionExecutor, ExecutionOutcome, ExecutionReport};
pub use listener::{handle_event, listen, IgnoreReason, ListenExit, ListenOutcome};
pub use loader::{load_pending, LoadReport};
pub use runtime::{Runtime, RuntimeDeps};
pub use scheduler::{Scheduler, SchedulerState, Tick};
pub use transfer::{TransferEngine, TransferOutcome};
