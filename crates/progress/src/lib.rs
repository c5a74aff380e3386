//! Progress reconciliation and analytics.
//!
//! Curriculum merge, last-write-wins conflict resolution, and completion
//! figures derived from a progress document.

#![warn(missing_docs)]

pub mod reconcile;
pub mod analytics;

pub use reconcile::{merge_tasks, reconcile_curriculum, resolve_remote, Resolution, StructuralChange};
pub use analytics::{
    overall_completion, percentage, phase_completion, phase_summaries, phases_completed, snapshot,
    AnalyticsSnapshot, PhaseSummary,
};
