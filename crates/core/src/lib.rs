//! PathTrack core data models.
//!
//! This crate defines the curriculum records supplied by the content
//! provider and the progress document that tracks a user through them.

#![warn(missing_docs)]

// Identities
mod id;

// Curriculum
mod phase;
mod task;

// User progress
mod progress;

// Re-exports
pub use id::*;

pub use phase::{Curriculum, Phase};
pub use task::{Difficulty, Resource, TaskDefinition, TaskProgress};
pub use progress::{epoch, now, PhaseProgress, ProgressDocument, ValidationError};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
