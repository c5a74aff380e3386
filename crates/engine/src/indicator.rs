//! Transient "syncing" indicator.

use std::sync::Arc;
use tokio::sync::watch;

/// True while at least one pull or dispatched push is in flight.
///
/// The in-flight count lives inside the watch channel, so the count and
/// what subscribers observe change under the same lock.
#[derive(Debug, Clone)]
pub struct SyncIndicator {
    tx: Arc<watch::Sender<usize>>,
}

impl Default for SyncIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncIndicator {
    /// Create an idle indicator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Whether a sync operation is in flight.
    pub fn is_syncing(&self) -> bool {
        *self.tx.borrow() > 0
    }

    /// Subscribe to idle/syncing transitions.
    pub fn subscribe(&self) -> SyncWatch {
        SyncWatch {
            rx: self.tx.subscribe(),
        }
    }

    /// Mark an operation as started; it ends when the guard drops.
    pub fn begin(&self) -> SyncGuard {
        self.tx.send_if_modified(|in_flight| {
            *in_flight += 1;
            *in_flight == 1
        });
        SyncGuard {
            indicator: self.clone(),
        }
    }
}

/// Receiving side of a [`SyncIndicator`]. Wakes only when the indicator
/// flips between idle and syncing.
#[derive(Debug, Clone)]
pub struct SyncWatch {
    rx: watch::Receiver<usize>,
}

impl SyncWatch {
    /// Whether a sync operation is in flight.
    pub fn is_syncing(&self) -> bool {
        *self.rx.borrow() > 0
    }

    /// Wait for the next transition and return the new state.
    pub async fn changed(&mut self) -> Result<bool, watch::error::RecvError> {
        self.rx.changed().await?;
        Ok(*self.rx.borrow_and_update() > 0)
    }
}

/// Keeps the indicator raised while alive.
#[derive(Debug)]
pub struct SyncGuard {
    indicator: SyncIndicator,
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        self.indicator.tx.send_if_modified(|in_flight| {
            *in_flight = in_flight.saturating_sub(1);
            *in_flight == 0
        });
    }
}
