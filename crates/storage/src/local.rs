//! The `get`/`set` adapter used by the engine.
//!
//! Persistence failures never propagate past this point. A failed read
//! yields a fresh document, a failed write leaves the caller running on its
//! in-memory copy, and both are logged.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use pathtrack_core::ProgressDocument;
use tracing::warn;
use super::ProgressStore;

/// Injected handle to local persistence, constructed once per session.
#[derive(Clone)]
pub struct LocalProgressStore {
    inner: Arc<dyn ProgressStore>,
    degraded: Arc<AtomicBool>,
}

impl LocalProgressStore {
    /// Wrap a store backend.
    pub fn new(inner: Arc<dyn ProgressStore>) -> Self {
        Self {
            inner,
            degraded: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The stored document, or a fresh empty one if nothing is stored or it
    /// cannot be read.
    pub fn get(&self) -> ProgressDocument {
        match self.inner.load() {
            Ok(Some(doc)) => doc,
            Ok(None) => ProgressDocument::new(),
            Err(e) => {
                warn!("Failed to read local progress, starting fresh: {}", e);
                ProgressDocument::new()
            }
        }
    }

    /// Persist `doc`, overwriting the previous copy.
    pub fn set(&self, doc: &ProgressDocument) {
        match self.inner.save(doc) {
            Ok(()) => {
                if self.degraded.swap(false, Ordering::SeqCst) {
                    warn!("Local progress persistence recovered");
                }
            }
            Err(e) => {
                if !self.degraded.swap(true, Ordering::SeqCst) {
                    warn!("Failed to persist progress, continuing in memory only: {}", e);
                }
            }
        }
    }

    /// Whether the last write failed and progress currently lives only in
    /// memory.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for LocalProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProgressStore")
            .field("degraded", &self.is_degraded())
            .finish_non_exhaustive()
    }
}
