//! Completion analytics.
//!
//! Everything here is a pure function of a curriculum and a progress
//! document, cheap enough to recompute on every render.

use pathtrack_core::{Curriculum, PhaseId, ProgressDocument};
use serde::Serialize;

/// Aggregate completion figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    /// Tasks across all curriculum phases
    pub total_tasks: usize,

    /// Completed tasks across all curriculum phases
    pub completed_tasks: usize,

    /// `total_tasks - completed_tasks`
    pub remaining_tasks: usize,

    /// Phases whose every task is completed
    pub phases_completed: usize,

    /// Phases in the curriculum
    pub total_phases: usize,

    /// Overall completion percentage, rounded
    pub completion_rate: u32,
}

/// Per-phase completion figures, in curriculum order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSummary {
    /// Phase id
    pub phase_id: PhaseId,

    /// Phase title
    pub title: String,

    /// Completed tasks
    pub completed_tasks: usize,

    /// Total tasks
    pub total_tasks: usize,

    /// Percentage complete, rounded
    pub percentage: u32,

    /// Every curriculum task completed (never true for an empty phase)
    pub is_complete: bool,
}

/// `completed / total * 100`, rounded half up; `0` when `total` is zero.
pub fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Completion percentage of one phase, from its stored task entries.
///
/// `0` for an unknown phase or a phase with no tasks.
pub fn phase_completion(doc: &ProgressDocument, phase_id: &str) -> u32 {
    match doc.phase(phase_id) {
        Some(phase) => percentage(phase.completed_count(), phase.tasks.len()),
        None => 0,
    }
}

/// Headline completion percentage across the curriculum.
///
/// A phase with no stored entry yet contributes its curriculum task count
/// to the total and nothing to the completed count.
pub fn overall_completion(curriculum: &Curriculum, doc: &ProgressDocument) -> u32 {
    let mut total = 0;
    let mut completed = 0;

    for phase in &curriculum.phases {
        match doc.phase(phase.id.as_str()) {
            Some(stored) => {
                total += stored.tasks.len();
                completed += stored.completed_count();
            }
            None => total += phase.tasks.len(),
        }
    }

    percentage(completed, total)
}

/// Whether every curriculum task of `phase_id` has a completed entry.
fn is_phase_complete(curriculum: &Curriculum, doc: &ProgressDocument, phase_id: &str) -> bool {
    let Some(phase) = curriculum.phase(phase_id) else {
        return false;
    };
    let Some(stored) = doc.phase(phase_id) else {
        return false;
    };
    !phase.tasks.is_empty()
        && phase
            .tasks
            .iter()
            .all(|t| stored.task(t.id.as_str()).map(|p| p.completed).unwrap_or(false))
}

/// Number of fully completed phases.
pub fn phases_completed(curriculum: &Curriculum, doc: &ProgressDocument) -> usize {
    curriculum
        .phases
        .iter()
        .filter(|p| is_phase_complete(curriculum, doc, p.id.as_str()))
        .count()
}

/// Compute the aggregate snapshot.
pub fn snapshot(curriculum: &Curriculum, doc: &ProgressDocument) -> AnalyticsSnapshot {
    let total_tasks = curriculum.total_tasks();
    let completed_tasks = curriculum
        .phases
        .iter()
        .filter_map(|p| doc.phase(p.id.as_str()))
        .map(|p| p.completed_count())
        .sum();

    AnalyticsSnapshot {
        total_tasks,
        completed_tasks,
        remaining_tasks: total_tasks.saturating_sub(completed_tasks),
        phases_completed: phases_completed(curriculum, doc),
        total_phases: curriculum.len(),
        completion_rate: percentage(completed_tasks, total_tasks),
    }
}

/// Per-phase breakdown in curriculum order.
pub fn phase_summaries(curriculum: &Curriculum, doc: &ProgressDocument) -> Vec<PhaseSummary> {
    curriculum
        .phases
        .iter()
        .map(|phase| {
            let (completed_tasks, total_tasks) = match doc.phase(phase.id.as_str()) {
                Some(stored) => (stored.completed_count(), stored.tasks.len()),
                None => (0, phase.tasks.len()),
            };
            PhaseSummary {
                phase_id: phase.id.clone(),
                title: phase.title.clone(),
                completed_tasks,
                total_tasks,
                percentage: percentage(completed_tasks, total_tasks),
                is_complete: is_phase_complete(curriculum, doc, phase.id.as_str()),
            }
        })
        .collect()
}
