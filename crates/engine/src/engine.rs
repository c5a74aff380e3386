//! The progress engine - sole owner of the progress document.
//!
//! Runs the activation sequence:
//! ```text
//! Load local → Pull remote → Last-write-wins → Curriculum merge
//! ```
//! and afterwards applies user toggles. Every mutation is written locally
//! before its debounced push is scheduled.

use std::sync::{Arc, OnceLock};
use pathtrack_core::{epoch, Curriculum, ProgressDocument, UserId};
use pathtrack_progress::{
    phase_completion, phase_summaries, reconcile_curriculum, resolve_remote, snapshot,
    AnalyticsSnapshot, PhaseSummary, Resolution, StructuralChange,
};
use pathtrack_storage::LocalProgressStore;
use tracing::{debug, info, warn};
use crate::config::EngineConfig;
use crate::indicator::SyncWatch;
use crate::remote::HttpRemote;
use crate::scheduler::{PullHandle, SyncScheduler};

/// Outcome of an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activation {
    /// Result of the remote comparison; `None` if no remote document was
    /// available (unauthenticated, unreachable, empty, or malformed)
    pub resolution: Option<Resolution>,

    /// What the curriculum merge changed
    pub structural: StructuralChange,
}

impl Activation {
    /// Whether the remote copy replaced local progress.
    pub fn adopted_remote(&self) -> bool {
        self.resolution == Some(Resolution::AdoptedRemote)
    }
}

/// Owns the progress document and routes every mutation through local
/// persistence and the sync scheduler.
pub struct ProgressEngine {
    doc: ProgressDocument,
    curriculum: Curriculum,
    store: LocalProgressStore,
    sync: SyncScheduler,
    analytics: OnceLock<AnalyticsSnapshot>,
}

impl ProgressEngine {
    /// Create an engine over `store`, starting from whatever it holds.
    pub fn new(store: LocalProgressStore, sync: SyncScheduler) -> Self {
        let doc = store.get();
        debug!(
            "Loaded local progress: {} phases, last updated {}",
            doc.phases.len(),
            doc.last_updated
        );
        Self {
            doc,
            curriculum: Curriculum::default(),
            store,
            sync,
            analytics: OnceLock::new(),
        }
    }

    /// Create an engine that syncs with the HTTP service named in `config`.
    pub fn with_config(config: &EngineConfig, store: LocalProgressStore, user: Option<UserId>) -> Self {
        let remote = HttpRemote::new(config.endpoint.clone(), config.request_timeout);
        let sync = SyncScheduler::new(Arc::new(remote), user, config.debounce);
        Self::new(store, sync)
    }

    /// Activate against `curriculum`: pull and resolve the remote copy when
    /// authenticated, then merge the curriculum.
    pub async fn activate(&mut self, curriculum: Curriculum) -> Activation {
        self.curriculum = curriculum;
        self.invalidate();

        match self.begin_pull() {
            Some(pull) => {
                let remote = match pull.await {
                    Ok(remote) => remote,
                    Err(e) => {
                        warn!("Remote pull did not complete: {}", e);
                        None
                    }
                };
                self.apply_pull(remote)
            }
            None => Activation {
                resolution: None,
                structural: self.merge_curriculum(),
            },
        }
    }

    /// Start pulling the remote copy without waiting for it.
    ///
    /// Local mutations stay available while the pull is in flight. Hand the
    /// result to [`ProgressEngine::apply_pull`].
    pub fn begin_pull(&self) -> Option<PullHandle> {
        self.sync.begin_pull()
    }

    /// Resolve a pulled document against local progress, then merge the
    /// current curriculum.
    ///
    /// Adopting the remote copy persists it but does not push it back.
    /// Local progress that is newer than the remote copy, or that the remote
    /// does not have at all, is pushed without touching `lastUpdated`.
    pub fn apply_pull(&mut self, remote: Option<ProgressDocument>) -> Activation {
        let (resolution, local_ahead) = match remote {
            Some(remote) => {
                let remote_updated = remote.last_updated;
                let resolution = resolve_remote(&mut self.doc, remote);
                if resolution == Resolution::AdoptedRemote {
                    info!("Adopted remote progress from {}", self.doc.last_updated);
                    self.invalidate();
                    self.store.set(&self.doc);
                    self.sync.cancel_pending_push();
                }
                (Some(resolution), self.doc.last_updated > remote_updated)
            }
            None => (None, self.doc.last_updated > epoch()),
        };

        let structural = self.merge_curriculum();
        if local_ahead && !structural.is_change() {
            info!("Local progress from {} is ahead of remote", self.doc.last_updated);
            self.sync.schedule_push(self.doc.clone());
        }

        Activation {
            resolution,
            structural,
        }
    }

    /// Replace the curriculum and merge it into the document.
    pub fn set_curriculum(&mut self, curriculum: Curriculum) -> StructuralChange {
        self.curriculum = curriculum;
        self.invalidate();
        self.merge_curriculum()
    }

    /// Flip a task's completion flag.
    ///
    /// Returns the new flag, or `None` if the phase or task is unknown, in
    /// which case nothing is written or pushed.
    pub fn toggle_task(&mut self, phase_id: &str, task_id: &str) -> Option<bool> {
        match self.doc.toggle_task(phase_id, task_id) {
            Some(completed) => {
                debug!("Task {}/{} completed = {}", phase_id, task_id, completed);
                self.commit();
                Some(completed)
            }
            None => {
                debug!("Ignoring toggle of unknown task {}/{}", phase_id, task_id);
                None
            }
        }
    }

    /// Completion percentage of a phase, `0` if unknown or empty.
    pub fn phase_progress(&self, phase_id: &str) -> u32 {
        phase_completion(&self.doc, phase_id)
    }

    /// Completion flag of a task, `false` if unknown.
    pub fn is_task_completed(&self, phase_id: &str, task_id: &str) -> bool {
        self.doc.is_task_completed(phase_id, task_id)
    }

    /// Aggregate analytics, computed once per document revision.
    pub fn analytics(&self) -> AnalyticsSnapshot {
        *self
            .analytics
            .get_or_init(|| snapshot(&self.curriculum, &self.doc))
    }

    /// Headline "total progress" percentage.
    pub fn overall_completion(&self) -> u32 {
        pathtrack_progress::overall_completion(&self.curriculum, &self.doc)
    }

    /// Per-phase summaries in curriculum order.
    pub fn phase_summaries(&self) -> Vec<PhaseSummary> {
        phase_summaries(&self.curriculum, &self.doc)
    }

    /// Current document.
    pub fn document(&self) -> &ProgressDocument {
        &self.doc
    }

    /// Current curriculum.
    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// Whether a pull or push is in flight.
    pub fn is_syncing(&self) -> bool {
        self.sync.indicator().is_syncing()
    }

    /// Subscribe to the syncing indicator.
    pub fn subscribe_syncing(&self) -> SyncWatch {
        self.sync.indicator().subscribe()
    }

    /// Whether the last local write failed.
    pub fn is_persistence_degraded(&self) -> bool {
        self.store.is_degraded()
    }

    /// Whether a push is waiting for its quiet period to end.
    pub fn has_pending_push(&self) -> bool {
        self.sync.has_pending_push()
    }

    /// Sync scheduler.
    pub fn scheduler(&self) -> &SyncScheduler {
        &self.sync
    }

    /// Wait for the pending push, if any, to go out and settle.
    pub async fn flush(&mut self) {
        self.sync.flush().await;
    }

    fn merge_curriculum(&mut self) -> StructuralChange {
        let change = reconcile_curriculum(&mut self.doc, &self.curriculum);
        if change.is_change() {
            info!(
                "Curriculum merge: {} phases added, {} rebuilt",
                change.added_phases.len(),
                change.rebuilt_phases.len()
            );
            self.commit();
        }
        change
    }

    /// Write locally, then schedule the push.
    fn commit(&mut self) {
        self.invalidate();
        self.store.set(&self.doc);
        self.sync.schedule_push(self.doc.clone());
    }

    fn invalidate(&mut self) {
        self.analytics.take();
    }
}

impl std::fmt::Debug for ProgressEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressEngine")
            .field("phases", &self.doc.phases.len())
            .field("last_updated", &self.doc.last_updated)
            .field("store", &self.store)
            .field("sync", &self.sync)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{RemoteProgressService, Result, SyncError};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use pathtrack_core::{epoch, Phase, TaskDefinition};
    use pathtrack_storage::MemoryStore;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeRemote {
        data: Mutex<Option<ProgressDocument>>,
        pushed: Mutex<Vec<ProgressDocument>>,
        fail: bool,
    }

    impl FakeRemote {
        fn holding(doc: ProgressDocument) -> Self {
            Self {
                data: Mutex::new(Some(doc)),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn pushed(&self) -> Vec<ProgressDocument> {
            self.pushed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteProgressService for FakeRemote {
        async fn fetch(&self, _user: &UserId) -> Result<Option<ProgressDocument>> {
            if self.fail {
                return Err(SyncError::Status(500));
            }
            Ok(self.data.lock().unwrap().clone())
        }

        async fn store(&self, _user: &UserId, doc: &ProgressDocument) -> Result<()> {
            if self.fail {
                return Err(SyncError::Status(500));
            }
            self.pushed.lock().unwrap().push(doc.clone());
            *self.data.lock().unwrap() = Some(doc.clone());
            Ok(())
        }
    }

    fn curriculum() -> Curriculum {
        Curriculum::new(vec![
            Phase::new(
                "a",
                "Phase A",
                vec![TaskDefinition::new("a1", "A1"), TaskDefinition::new("a2", "A2")],
            ),
            Phase::new("b", "Phase B", vec![TaskDefinition::new("b1", "B1")]),
        ])
    }

    fn engine(remote: Arc<FakeRemote>, backend: Arc<MemoryStore>, user: Option<&str>) -> ProgressEngine {
        let sync = SyncScheduler::new(remote, user.map(UserId::from), Duration::from_millis(1000));
        ProgressEngine::new(LocalProgressStore::new(backend), sync)
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_unauthenticated_merges_curriculum() {
        let remote = Arc::new(FakeRemote::default());
        let backend = Arc::new(MemoryStore::new());
        let mut engine = engine(remote.clone(), backend.clone(), None);

        let activation = engine.activate(curriculum()).await;

        assert!(activation.resolution.is_none());
        assert_eq!(activation.structural.added_phases.len(), 2);
        assert_eq!(backend.writes(), 1);
        assert!(!engine.has_pending_push());

        engine.flush().await;
        assert!(remote.pushed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_device_adopts_remote() {
        let mut seeded = engine(Arc::new(FakeRemote::default()), Arc::new(MemoryStore::new()), None);
        seeded.activate(curriculum()).await;
        seeded.toggle_task("a", "a1");
        let remote_doc = seeded.document().clone();

        let remote = Arc::new(FakeRemote::holding(remote_doc.clone()));
        let backend = Arc::new(MemoryStore::new());
        let mut engine = engine(remote.clone(), backend, Some("u1"));

        let activation = engine.activate(curriculum()).await;

        assert!(activation.adopted_remote());
        assert!(!activation.structural.is_change());
        assert_eq!(engine.document(), &remote_doc);
        assert!(!engine.has_pending_push());

        engine.flush().await;
        assert!(remote.pushed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_local_is_kept() {
        let mut local = ProgressDocument::new();
        local.last_updated = epoch() + ChronoDuration::days(2);
        let mut stale = ProgressDocument::new();
        stale.last_updated = epoch() + ChronoDuration::days(1);

        let remote = Arc::new(FakeRemote::holding(stale));
        let backend = Arc::new(MemoryStore::with_document(&local).unwrap());
        let mut engine = engine(remote, backend, Some("u1"));

        let activation = engine.activate(Curriculum::default()).await;

        assert_eq!(activation.resolution, Some(Resolution::KeptLocal));
        assert_eq!(engine.document(), &local);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pull_failure_keeps_local() {
        let remote = Arc::new(FakeRemote::failing());
        let backend = Arc::new(MemoryStore::new());
        let mut engine = engine(remote, backend, Some("u1"));

        let activation = engine.activate(curriculum()).await;

        assert!(activation.resolution.is_none());
        assert_eq!(engine.document().phases.len(), 2);
        assert!(!engine.is_syncing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_writes_then_pushes() {
        let remote = Arc::new(FakeRemote::default());
        let backend = Arc::new(MemoryStore::new());
        let mut engine = engine(remote.clone(), backend.clone(), Some("u1"));
        engine.activate(curriculum()).await;
        engine.flush().await;
        let pushes_before = remote.pushed().len();

        assert_eq!(engine.toggle_task("a", "a2"), Some(true));
        assert_eq!(backend.writes(), 2);
        assert!(engine.has_pending_push());

        engine.flush().await;
        let pushed = remote.pushed();
        assert_eq!(pushed.len(), pushes_before + 1);
        assert!(pushed[pushed.len() - 1].is_task_completed("a", "a2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_toggle_is_noop() {
        let remote = Arc::new(FakeRemote::default());
        let backend = Arc::new(MemoryStore::new());
        let mut engine = engine(remote, backend.clone(), Some("u1"));
        engine.activate(curriculum()).await;
        engine.flush().await;
        let before = engine.document().clone();

        assert_eq!(engine.toggle_task("a", "zz"), None);
        assert_eq!(engine.toggle_task("zz", "a1"), None);

        assert_eq!(engine.document(), &before);
        assert_eq!(backend.writes(), 1);
        assert!(!engine.has_pending_push());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analytics_follow_mutations() {
        let remote = Arc::new(FakeRemote::default());
        let mut engine = engine(remote, Arc::new(MemoryStore::new()), None);
        engine.activate(curriculum()).await;

        assert_eq!(engine.analytics().completed_tasks, 0);
        engine.toggle_task("b", "b1");
        let analytics = engine.analytics();
        assert_eq!(analytics.completed_tasks, 1);
        assert_eq!(analytics.phases_completed, 1);
        assert_eq!(engine.phase_progress("b"), 100);
        assert!(engine.is_task_completed("b", "b1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_degrades() {
        let remote = Arc::new(FakeRemote::default());
        let backend = Arc::new(MemoryStore::new());
        backend.set_fail_writes(true);
        let mut engine = engine(remote, backend.clone(), None);

        engine.activate(curriculum()).await;
        assert!(engine.is_persistence_degraded());
        assert_eq!(engine.toggle_task("a", "a1"), Some(true));
        assert!(engine.is_task_completed("a", "a1"));

        backend.set_fail_writes(false);
        engine.toggle_task("a", "a2");
        assert!(!engine.is_persistence_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_split_pull_allows_mutation_in_flight() {
        let mut remote_doc = ProgressDocument::new();
        remote_doc.last_updated = epoch() + ChronoDuration::days(1);
        let remote = Arc::new(FakeRemote::holding(remote_doc));
        let mut engine = engine(remote, Arc::new(MemoryStore::new()), Some("u1"));
        engine.set_curriculum(curriculum());

        let pull = engine.begin_pull().unwrap();
        engine.toggle_task("a", "a1");
        let activation = engine.apply_pull(pull.await.unwrap());

        assert_eq!(activation.resolution, Some(Resolution::KeptLocal));
        assert!(engine.is_task_completed("a", "a1"));
    }
}
