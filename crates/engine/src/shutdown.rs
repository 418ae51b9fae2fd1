// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio::sync::watch;

/// Resolve once shutdown is signalled or the sender is gone
pub(crate) async fn requested(stop: &mut watch::Receiver<bool>) {
    // An error means the sender was dropped, which also means stop
    let _ = stop.wait_for(|stop| *stop).await;
}

/// Sleep unless shutdown arrives first. Returns false on shutdown.
pub(crate) async fn sleep(duration: std::time::Duration, stop: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = requested(stop) => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
