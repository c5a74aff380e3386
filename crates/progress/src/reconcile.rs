//! Reconciliation of stored progress against the curriculum and against a
//! remote copy.
//!
//! Both merges are pure with respect to everything but the document they
//! are handed. Persisting and pushing the result is the caller's job.

use pathtrack_core::{Curriculum, PhaseId, PhaseProgress, ProgressDocument, TaskDefinition, TaskProgress};
use tracing::debug;

/// What a curriculum merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralChange {
    /// Phases that had no progress entry and were created
    pub added_phases: Vec<PhaseId>,

    /// Phases whose task list was rebuilt
    pub rebuilt_phases: Vec<PhaseId>,
}

impl StructuralChange {
    /// Whether anything changed.
    pub fn is_change(&self) -> bool {
        !self.added_phases.is_empty() || !self.rebuilt_phases.is_empty()
    }
}

/// Outcome of comparing local progress with the remote copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Local was newer or equally new and was kept unchanged
    KeptLocal,
    /// Remote was strictly newer and replaced local wholesale
    AdoptedRemote,
}

/// Rebuild a phase's task list from the curriculum.
///
/// Task fields come from the curriculum; the `completed` flag is carried
/// over by id and defaults to `false`. Entries whose id is no longer in the
/// curriculum are dropped.
pub fn merge_tasks(existing: &[TaskProgress], incoming: &[TaskDefinition]) -> Vec<TaskProgress> {
    incoming
        .iter()
        .map(|def| TaskProgress {
            task: def.clone(),
            completed: existing
                .iter()
                .find(|t| t.task.id == def.id)
                .map(|t| t.completed)
                .unwrap_or(false),
        })
        .collect()
}

/// Bring `doc` in line with `curriculum`.
///
/// Missing phases are created with every task pending. Phases whose ordered
/// task ids differ from the curriculum are rebuilt with [`merge_tasks`],
/// which also catches a same-length substitution. Phases the curriculum no
/// longer lists are left alone. `last_updated` is bumped only if something
/// changed, so merging the same curriculum twice is a no-op.
pub fn reconcile_curriculum(doc: &mut ProgressDocument, curriculum: &Curriculum) -> StructuralChange {
    let mut change = StructuralChange::default();

    for phase in &curriculum.phases {
        match doc.phases.get_mut(&phase.id) {
            None => {
                doc.phases.insert(
                    phase.id.clone(),
                    PhaseProgress {
                        phase_id: phase.id.clone(),
                        tasks: phase.tasks.iter().cloned().map(TaskProgress::pending).collect(),
                    },
                );
                change.added_phases.push(phase.id.clone());
            }
            Some(stored) => {
                let same_ids = stored.tasks.iter().map(|t| &t.task.id).eq(phase.task_ids());
                if !same_ids {
                    stored.tasks = merge_tasks(&stored.tasks, &phase.tasks);
                    change.rebuilt_phases.push(phase.id.clone());
                }
            }
        }
    }

    if change.is_change() {
        doc.touch();
        debug!(
            "Curriculum merge added {} and rebuilt {} phases",
            change.added_phases.len(),
            change.rebuilt_phases.len()
        );
    }

    change
}

/// Last-write-wins at whole-document granularity.
///
/// `local` is replaced by `remote` only if the remote copy is strictly
/// newer. No fields are unioned.
pub fn resolve_remote(local: &mut ProgressDocument, remote: ProgressDocument) -> Resolution {
    if remote.last_updated > local.last_updated {
        debug!(
            "Remote progress ({}) is newer than local ({})",
            remote.last_updated, local.last_updated
        );
        *local = remote;
        Resolution::AdoptedRemote
    } else {
        Resolution::KeptLocal
    }
}
