// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pl-daemon: process wiring for the connection scheduler

pub mod lifecycle;
pub mod settings;

pub use lifecycle::{queue_path, startup, store_path, Config, Daemon, LifecycleError};
pub use settings::{Settings, SettingsError, SETTINGS_FILE};
