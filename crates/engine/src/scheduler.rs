//! Sync scheduling - pull on activation, debounced push on mutation.
//!
//! Every remote failure is absorbed here. Callers only ever see
//! "no remote data" for a pull and nothing at all for a push.

use std::sync::Arc;
use std::time::Duration;
use pathtrack_core::{ProgressDocument, UserId};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::debounce::Debouncer;
use crate::indicator::SyncIndicator;
use crate::remote::RemoteProgressService;

/// In-flight pull, resolving to the remote document if one was usable.
pub type PullHandle = JoinHandle<Option<ProgressDocument>>;

/// Coordinates pulls and pushes against the remote service.
pub struct SyncScheduler {
    remote: Arc<dyn RemoteProgressService>,
    user: Option<UserId>,
    debouncer: Debouncer,
    indicator: SyncIndicator,
    pushes_scheduled: u64,
}

impl SyncScheduler {
    /// Create a scheduler. With no `user` the session is unauthenticated and
    /// nothing is ever pulled or pushed.
    pub fn new(remote: Arc<dyn RemoteProgressService>, user: Option<UserId>, debounce: Duration) -> Self {
        Self {
            remote,
            user,
            debouncer: Debouncer::new(debounce),
            indicator: SyncIndicator::new(),
            pushes_scheduled: 0,
        }
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Signed-in user.
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// Syncing indicator.
    pub fn indicator(&self) -> &SyncIndicator {
        &self.indicator
    }

    /// Fetch the remote document. Failures are logged and read as `None`.
    pub async fn pull(&self) -> Option<ProgressDocument> {
        let user = self.user.clone()?;
        fetch_absorbing(self.remote.clone(), user, self.indicator.clone()).await
    }

    /// Start a pull in the background. `None` when unauthenticated.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn begin_pull(&self) -> Option<PullHandle> {
        let user = self.user.clone()?;
        Some(tokio::spawn(fetch_absorbing(
            self.remote.clone(),
            user,
            self.indicator.clone(),
        )))
    }

    /// Schedule a debounced push of `doc`, replacing any pending one.
    pub fn schedule_push(&mut self, doc: ProgressDocument) {
        let Some(user) = self.user.clone() else {
            return;
        };
        self.pushes_scheduled += 1;
        debug!("Push scheduled in {:?}", self.debouncer.delay());
        self.debouncer.schedule(push_absorbing(
            self.remote.clone(),
            user,
            doc,
            self.indicator.clone(),
        ));
    }

    /// Drop the pending push, if it has not been dispatched yet.
    pub fn cancel_pending_push(&mut self) {
        self.debouncer.cancel();
    }

    /// Whether a push is waiting for its quiet period to end.
    pub fn has_pending_push(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Pushes scheduled and pushes superseded before dispatch.
    pub fn push_counts(&self) -> (u64, u64) {
        (self.pushes_scheduled, self.debouncer.superseded())
    }

    /// Wait for the pending push, if any, to be dispatched and settle.
    pub async fn flush(&mut self) {
        self.debouncer.flush().await;
    }
}

impl std::fmt::Debug for SyncScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncScheduler")
            .field("user", &self.user)
            .field("debouncer", &self.debouncer)
            .field("indicator", &self.indicator)
            .finish_non_exhaustive()
    }
}

async fn fetch_absorbing(
    remote: Arc<dyn RemoteProgressService>,
    user: UserId,
    indicator: SyncIndicator,
) -> Option<ProgressDocument> {
    let _guard = indicator.begin();
    match remote.fetch(&user).await {
        Ok(doc) => doc,
        Err(e) if e.is_unavailable() => {
            warn!("Failed to fetch remote progress: {}", e);
            None
        }
        Err(e) => {
            warn!("Ignoring remote progress: {}", e);
            None
        }
    }
}

async fn push_absorbing(
    remote: Arc<dyn RemoteProgressService>,
    user: UserId,
    doc: ProgressDocument,
    indicator: SyncIndicator,
) {
    let _guard = indicator.begin();
    match remote.store(&user, &doc).await {
        Ok(()) => info!("Synced progress for {} ({})", user, doc.last_updated),
        Err(e) => warn!("Failed to sync progress with remote: {}", e),
    }
}
