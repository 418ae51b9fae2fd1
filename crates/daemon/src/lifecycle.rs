// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use pl_adapters::{JsonStore, StoreError, TracedStore};
use pl_core::{SystemClock, UuidIdGen};
use pl_engine::{Runtime, RuntimeDeps};
use pl_storage::{DurableQueue, QueueError};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::settings::{Settings, SettingsError};

/// Daemon paths for one data root
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the queue, the store and `pld.toml`
    pub data_root: PathBuf,
    /// Durable queue directory
    pub queue_path: PathBuf,
    /// Record store directory
    pub store_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
}

impl Config {
    /// Create config for a data root, with state under the user state dir
    pub fn for_data_root(data_root: &Path) -> Result<Self, LifecycleError> {
        Self::with_state_root(data_root, &state_dir()?)
    }

    /// Create config with daemon state under `state_root/<hash>/`
    pub fn with_state_root(data_root: &Path, state_root: &Path) -> Result<Self, LifecycleError> {
        let canonical = data_root
            .canonicalize()
            .map_err(|e| LifecycleError::DataRootNotFound(data_root.to_path_buf(), e))?;
        let state_dir = state_root.join(data_root_hash(&canonical));

        Ok(Self {
            queue_path: queue_path(&canonical),
            store_path: store_path(&canonical),
            lock_path: state_dir.join("pld.pid"),
            version_path: state_dir.join("pld.version"),
            log_path: state_dir.join("pld.log"),
            data_root: canonical,
        })
    }
}

/// Queue directory inside a data root
pub fn queue_path(data_root: &Path) -> PathBuf {
    data_root.join("queue")
}

/// Store directory inside a data root
pub fn store_path(data_root: &Path) -> PathBuf {
    data_root.join("store")
}

/// Running daemon
pub struct Daemon {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub queue: Arc<DurableQueue>,
    runtime: Runtime,
    stop: watch::Sender<bool>,
    /// When daemon started
    pub start_time: Instant,
}

impl Daemon {
    /// Stop the scheduler and listener, then remove the state files
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        self.stop.send_replace(true);
        self.runtime.join().await;

        for path in [&self.config.lock_path, &self.config.version_path] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }

        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "Daemon shutdown complete"
        );
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Data root not found at {0}: {1}")]
    DataRootNotFound(PathBuf, std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config, settings: &Settings) -> Result<Daemon, LifecycleError> {
    // Acquire the lock FIRST; a daemon that loses the race must not touch
    // the winner's files
    let lock_file = acquire_lock(config)?;

    match startup_inner(config, settings, lock_file).await {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

fn acquire_lock(config: &Config) -> Result<File, LifecycleError> {
    if let Some(parent) = config.lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    Ok(lock_file)
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(
    config: &Config,
    settings: &Settings,
    lock_file: File,
) -> Result<Daemon, LifecycleError> {
    use std::io::Write;

    // 1. Write PID to lock file
    lock_file.set_len(0)?;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 2. Write version file
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 3. Open and lock the queue (drops temp files and torn tails from a crash)
    let queue = Arc::new(DurableQueue::open(&config.queue_path, settings.queue)?);
    info!(
        "Opened queue at {}: {} entries in {} buckets",
        config.queue_path.display(),
        queue.len(),
        queue.bucket_count()
    );

    // 4. Open the store (wrapped with tracing for observability)
    let store = TracedStore::new(JsonStore::open(&config.store_path)?);

    // 5. Start the listener and scheduler
    let (stop, stop_rx) = watch::channel(false);
    let runtime = Runtime::start(
        RuntimeDeps {
            store,
            queue: Arc::clone(&queue),
            clock: SystemClock,
            id_gen: UuidIdGen,
        },
        settings.scheduler.clone(),
        stop_rx,
    );

    info!("Daemon started for data root: {}", config.data_root.display());

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        queue,
        runtime,
        stop,
        start_time: Instant::now(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Get the state directory for pl
fn state_dir() -> Result<PathBuf, LifecycleError> {
    // Use XDG_STATE_HOME or default to ~/.local/state
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("pl"));
    }

    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/pl"))
}

/// Compute data root hash for unique daemon directory
pub fn data_root_hash(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let result = hasher.finalize();
    // Take first 16 chars of hex digest
    hex_encode(&result[..8])
}

// Hex encoding helper
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
