// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler loop: drains the durable queue as entries fall due
//!
//! The loop is written as a sequence of [`Tick`]s. Each tick does one unit of
//! work (a load, one executed connection, or a decision to sleep) and reports
//! how long to wait before the next one. [`Scheduler::run`] adds the sleeping
//! and the shutdown handling.

use crate::config::{chrono_offset, SchedulerConfig};
use crate::error::EngineError;
use crate::executor::{ConnectionExecutor, ExecutionOutcome};
use crate::loader::{self, LoadReport};
use crate::shutdown;
use chrono::{DateTime, Utc};
use pl_adapters::{ComponentStore, ConnectionStore, TransferStore};
use pl_core::{Clock, ConnectionId, IdGen};
use pl_storage::{DurableQueue, QueueError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Initial load has not succeeded yet
    Loading,
    /// Head of the queue is in the future, or the queue is empty
    Waiting,
    /// Executing due entries back to back
    Draining,
}

/// What one step of the loop did
#[derive(Debug)]
pub enum Tick {
    /// Pending connections were pushed
    Loaded(LoadReport),
    Executed {
        id: ConnectionId,
        outcome: ExecutionOutcome,
    },
    /// The connection stays pending; `retry_in` is set for outages
    Failed {
        id: ConnectionId,
        error: EngineError,
        retry_in: Option<Duration>,
    },
    /// Head is not due yet
    Sleep(Duration),
    /// Queue empty after a reload
    Idle(Duration),
    /// Queue or store failure in the loop itself
    Backoff(Duration),
}

impl Tick {
    /// Pause before the next tick
    pub fn sleep(&self) -> Duration {
        match self {
            Tick::Loaded(_) | Tick::Executed { .. } => Duration::ZERO,
            Tick::Failed { retry_in, .. } => retry_in.unwrap_or(Duration::ZERO),
            Tick::Sleep(d) | Tick::Idle(d) | Tick::Backoff(d) => *d,
        }
    }
}

pub struct Scheduler<S, C, I> {
    store: S,
    queue: Arc<DurableQueue>,
    executor: ConnectionExecutor<S, I>,
    clock: C,
    config: SchedulerConfig,
    state: SchedulerState,
    last_reload: Option<DateTime<Utc>>,
}

impl<S, C, I> Scheduler<S, C, I>
where
    S: ConnectionStore + TransferStore + ComponentStore + Clone,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        store: S,
        queue: Arc<DurableQueue>,
        clock: C,
        id_gen: I,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            executor: ConnectionExecutor::new(store.clone(), id_gen),
            store,
            queue,
            clock,
            config,
            state: SchedulerState::Loading,
            last_reload: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn executor(&self) -> &ConnectionExecutor<S, I> {
        &self.executor
    }

    /// Run one step of the loop
    pub async fn tick(&mut self) -> Tick {
        let now = self.clock.now();

        if self.reload_due(now) {
            return match self.reload(now).await {
                Ok(report) => {
                    if self.state == SchedulerState::Loading {
                        self.state = SchedulerState::Waiting;
                    }
                    Tick::Loaded(report)
                }
                Err(e) => self.backoff(e),
            };
        }

        let Some(head) = self.queue.peek() else {
            self.state = SchedulerState::Waiting;
            return match self.reload(now).await {
                Ok(report) if report.total() > 0 => Tick::Loaded(report),
                Ok(_) => Tick::Idle(self.config.empty_sleep),
                Err(e) => self.backoff(e),
            };
        };

        if head.due > now {
            self.state = SchedulerState::Waiting;
            let until = (head.due - now).to_std().unwrap_or(Duration::ZERO);
            return Tick::Sleep(until.min(self.config.max_sleep));
        }

        self.state = SchedulerState::Draining;
        let entry = match self.queue.pop() {
            Ok(entry) => entry,
            // Drained by someone else between peek and pop
            Err(QueueError::Empty) => return Tick::Sleep(Duration::ZERO),
            Err(e) => return self.backoff(e.into()),
        };

        let id = ConnectionId::from(entry.id);
        match self.executor.execute(&id).await {
            Ok(outcome) => Tick::Executed { id, outcome },
            Err(error) => {
                let retry_in = error.is_outage().then_some(self.config.error_backoff);
                tracing::warn!(%id, %error, ?retry_in, "connection left pending");
                Tick::Failed {
                    id,
                    error,
                    retry_in,
                }
            }
        }
    }

    /// Tick until shutdown is signalled
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        tracing::info!("scheduler started");
        loop {
            if *stop.borrow() {
                break;
            }
            let pause = self.tick().await.sleep();
            if pause.is_zero() {
                tokio::task::yield_now().await;
                continue;
            }
            if !shutdown::sleep(pause, &mut stop).await {
                break;
            }
        }
        tracing::info!("scheduler stopped");
    }

    fn reload_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_reload {
            None => true,
            Some(last) => now - last >= chrono_offset(self.config.reload_interval),
        }
    }

    async fn reload(&mut self, now: DateTime<Utc>) -> Result<LoadReport, EngineError> {
        let report = loader::load_pending(&self.store, &self.queue, now, self.config.horizon).await?;
        self.last_reload = Some(now);
        Ok(report)
    }

    fn backoff(&self, error: EngineError) -> Tick {
        tracing::error!(%error, backoff = ?self.config.error_backoff, "scheduler step failed");
        Tick::Backoff(self.config.error_backoff)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
