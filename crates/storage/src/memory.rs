//! In-memory store, for tests and for sessions without a data directory.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use pathtrack_core::ProgressDocument;
use super::{ProgressStore, Result};

/// Keeps the serialized document in memory.
///
/// Failures can be injected to exercise the degraded path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `doc`.
    pub fn with_document(doc: &ProgressDocument) -> Result<Self> {
        let store = Self::new();
        store.save(doc)?;
        store.writes.store(0, Ordering::SeqCst);
        Ok(store)
    }

    /// Make subsequent reads fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned slot still holds the last complete write.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<Option<ProgressDocument>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected read failure").into());
        }
        match self.slot().as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, doc: &ProgressDocument) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure").into());
        }
        let json = serde_json::to_string(doc)?;
        *self.slot() = Some(json);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
