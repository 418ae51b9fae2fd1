// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable priority queue of pending connections

mod bucket;
mod error;
mod queue;
mod record;

pub use error::QueueError;
pub use queue::{
    CompactReport, DurableQueue, QueueConfig, QueueEntry, QueueSnapshot, RepairReport,
    DEFAULT_BUCKETS,
};
