// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime: the scheduler and change-listener tasks

use crate::config::SchedulerConfig;
use crate::listener::{self, ListenExit};
use crate::scheduler::Scheduler;
use crate::shutdown;
use pl_adapters::{ChangeEvent, ComponentStore, ConnectionStore, TransferStore};
use pl_core::{Clock, IdGen};
use pl_storage::DurableQueue;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Runtime dependencies
pub struct RuntimeDeps<S, C, I> {
    pub store: S,
    pub queue: Arc<DurableQueue>,
    pub clock: C,
    pub id_gen: I,
}

/// Handles to the running tasks
pub struct Runtime {
    scheduler: JoinHandle<()>,
    listener: JoinHandle<()>,
}

impl Runtime {
    /// Spawn the listener, then the scheduler
    ///
    /// The change feed is subscribed before the scheduler's initial load, so a
    /// connection written in between is seen by at least one of them.
    pub fn start<S, C, I>(
        deps: RuntimeDeps<S, C, I>,
        config: SchedulerConfig,
        stop: watch::Receiver<bool>,
    ) -> Self
    where
        S: ConnectionStore + TransferStore + ComponentStore + Clone,
        C: Clock,
        I: IdGen,
    {
        let changes = deps.store.watch();
        let listener = tokio::spawn(supervise_listener(
            changes,
            deps.store.clone(),
            Arc::clone(&deps.queue),
            deps.clock.clone(),
            config.clone(),
            stop.clone(),
        ));

        let scheduler = Scheduler::new(deps.store, deps.queue, deps.clock, deps.id_gen, config);
        let scheduler = tokio::spawn(scheduler.run(stop));

        Self {
            scheduler,
            listener,
        }
    }

    /// Wait for both tasks to finish after shutdown
    pub async fn join(self) {
        if let Err(e) = self.listener.await {
            tracing::error!(error = %e, "change listener task panicked");
        }
        if let Err(e) = self.scheduler.await {
            tracing::error!(error = %e, "scheduler task panicked");
        }
    }
}

/// Keep a change listener running until shutdown, resubscribing after
/// `listener_backoff` whenever it stops
async fn supervise_listener<S, C>(
    mut changes: broadcast::Receiver<ChangeEvent>,
    store: S,
    queue: Arc<DurableQueue>,
    clock: C,
    config: SchedulerConfig,
    mut stop: watch::Receiver<bool>,
) where
    S: ConnectionStore,
    C: Clock,
{
    loop {
        match listener::listen(changes, &queue, &clock, config.horizon, stop.clone()).await {
            Ok(ListenExit::Shutdown) => break,
            Ok(ListenExit::Closed) => tracing::warn!("change feed closed"),
            Err(e) => tracing::error!(error = %e, "change listener failed"),
        }
        if !shutdown::sleep(config.listener_backoff, &mut stop).await {
            break;
        }
        tracing::info!("resubscribing change listener");
        changes = store.watch();
    }
    tracing::info!("change listener stopped");
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
