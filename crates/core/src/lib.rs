// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pl-core: domain model for the due-time connection scheduler
//!
//! This crate provides:
//! - Component types, values and the legal-operation table
//! - Data transfers, connections and subjects
//! - Clock and ID abstractions
//! - Timestamp normalization for store documents

pub mod clock;
pub mod component;
pub mod connection;
pub mod id;
pub mod subject;
pub mod time;
pub mod transfer;
pub mod value;

pub use clock::{Clock, FakeClock, SystemClock};
pub use component::{Component, ComponentType};
pub use connection::{Connection, ConnectionStatus};
pub use id::{ComponentId, ConnectionId, IdGen, SequentialIdGen, SubjectId, TransferId, UuidIdGen};
pub use subject::Subject;
pub use time::TimeError;
pub use transfer::{DataTransfer, TransferDetails, TransferOp, UnknownOp};
pub use value::{ArrayElement, PrimitiveKind};
