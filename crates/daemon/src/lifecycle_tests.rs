// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::{tempdir, TempDir};

fn config() -> (TempDir, TempDir, Config) {
    let data = tempdir().unwrap();
    let state = tempdir().unwrap();
    let config = Config::with_state_root(data.path(), state.path()).unwrap();
    (data, state, config)
}

#[test]
fn paths_are_derived_from_data_root() {
    let (data, state, config) = config();
    let canonical = data.path().canonicalize().unwrap();
    let hash = data_root_hash(&canonical);

    assert_eq!(hash.len(), 16);
    assert_eq!(config.queue_path, canonical.join("queue"));
    assert_eq!(config.store_path, canonical.join("store"));
    assert_eq!(config.lock_path, state.path().join(&hash).join("pld.pid"));
    assert_eq!(config.log_path, state.path().join(&hash).join("pld.log"));
}

#[test]
fn missing_data_root_is_an_error() {
    let state = tempdir().unwrap();
    let err = Config::with_state_root(Path::new("/definitely/not/here"), state.path())
        .unwrap_err();

    assert!(matches!(err, LifecycleError::DataRootNotFound(..)));
}

#[tokio::test]
async fn startup_writes_state_files_and_shutdown_removes_them() {
    let (_data, _state, config) = config();

    let daemon = startup(&config, &Settings::default()).await.unwrap();

    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert_eq!(
        std::fs::read_to_string(&config.version_path).unwrap(),
        env!("CARGO_PKG_VERSION")
    );
    assert!(config.queue_path.join("meta.json").exists());
    assert!(config.store_path.is_dir());

    daemon.shutdown().await.unwrap();

    assert!(!config.lock_path.exists());
    assert!(!config.version_path.exists());
}

#[tokio::test]
async fn second_daemon_fails_to_lock_and_leaves_first_intact() {
    let (_data, _state, config) = config();
    let daemon = startup(&config, &Settings::default()).await.unwrap();

    let err = startup(&config, &Settings::default())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, LifecycleError::LockFailed(_)));
    assert!(config.lock_path.exists());
    assert!(config.version_path.exists());

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn running_daemon_keeps_queue_locked_but_readable() {
    let (_data, _state, config) = config();
    let daemon = startup(&config, &Settings::default()).await.unwrap();
    let tomorrow = chrono::Utc::now() + chrono::Duration::days(1);
    daemon.queue.push(tomorrow, "c-1").unwrap();

    let second = DurableQueue::open(&config.queue_path, Default::default());
    assert!(matches!(second, Err(QueueError::Locked(_))));
    let snapshot = DurableQueue::inspect(&config.queue_path, Default::default()).unwrap();
    assert_eq!(snapshot.entries.len(), 1);

    daemon.shutdown().await.unwrap();

    let reopened = DurableQueue::open(&config.queue_path, Default::default()).unwrap();
    assert_eq!(reopened.len(), 1);
}
