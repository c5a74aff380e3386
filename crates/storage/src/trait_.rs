//! Store trait abstraction.

use pathtrack_core::ProgressDocument;

/// Key the progress document is persisted under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "placement_prep_progress";

/// Error type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing the local copy.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable key/value persistence of a single progress document.
///
/// Writes are full-document overwrites and must be idempotent. Both calls
/// complete synchronously so a write has landed before the caller goes on
/// to schedule anything that depends on it.
pub trait ProgressStore: Send + Sync {
    /// Load the stored document, `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<ProgressDocument>>;

    /// Replace the stored document.
    fn save(&self, doc: &ProgressDocument) -> Result<()>;
}
