//! Progress engine - owns the document, syncs it with the remote service.

#![warn(missing_docs)]

pub mod config;
pub mod remote;
pub mod debounce;
pub mod indicator;
pub mod scheduler;
pub mod engine;

pub use config::EngineConfig;
pub use remote::{HttpRemote, RemoteProgressService, SyncError, Result};
pub use debounce::Debouncer;
pub use indicator::{SyncGuard, SyncIndicator, SyncWatch};
pub use scheduler::{PullHandle, SyncScheduler};
pub use engine::{Activation, ProgressEngine};
