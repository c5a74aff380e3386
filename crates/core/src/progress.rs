//! Progress document - the user's completion state across all phases.

use std::collections::{BTreeMap, HashSet};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use crate::id::{PhaseId, TaskId};
use crate::task::TaskProgress;
use crate::Time;

/// Completion state for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseProgress {
    /// Phase this entry belongs to
    pub phase_id: PhaseId,

    /// Per-task progress, in curriculum order
    #[serde(default)]
    pub tasks: Vec<TaskProgress>,
}

impl PhaseProgress {
    /// Look up a task entry by id.
    pub fn task(&self, id: &str) -> Option<&TaskProgress> {
        self.tasks.iter().find(|t| t.task.id == id)
    }

    /// Number of completed tasks.
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}

/// The persisted, synced unit of user progress.
///
/// Always replaced wholesale: locally on every write, remotely on every
/// push, and on pull when the remote copy is strictly newer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDocument {
    /// Progress keyed by phase id
    #[serde(default)]
    pub phases: BTreeMap<PhaseId, PhaseProgress>,

    /// Last actual mutation. A missing value reads as the Unix epoch.
    #[serde(default = "epoch", with = "iso8601")]
    pub last_updated: Time,
}

impl Default for ProgressDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressDocument {
    /// An empty document. Creation is not a mutation, so it is stamped with
    /// the epoch and loses to any existing remote copy.
    pub fn new() -> Self {
        Self {
            phases: BTreeMap::new(),
            last_updated: epoch(),
        }
    }

    /// Phase entry by id.
    pub fn phase(&self, id: &str) -> Option<&PhaseProgress> {
        self.phases.get(id)
    }

    /// Completion flag of a task; `false` when the phase or task is unknown.
    pub fn is_task_completed(&self, phase_id: &str, task_id: &str) -> bool {
        self.phase(phase_id)
            .and_then(|p| p.task(task_id))
            .map(|t| t.completed)
            .unwrap_or(false)
    }

    /// Flip a task's completion flag and stamp the document.
    ///
    /// Returns the new flag, or `None` if the phase or task is unknown, in
    /// which case the document is left untouched.
    pub fn toggle_task(&mut self, phase_id: &str, task_id: &str) -> Option<bool> {
        let task = self
            .phases
            .get_mut(phase_id)?
            .tasks
            .iter_mut()
            .find(|t| t.task.id == task_id)?;
        task.completed = !task.completed;
        let completed = task.completed;
        self.touch();
        Some(completed)
    }

    /// Stamp the document as modified now.
    pub fn touch(&mut self) {
        self.last_updated = now();
    }

    /// Check internal consistency of a document received from elsewhere.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (key, phase) in &self.phases {
            if key != &phase.phase_id {
                return Err(ValidationError::PhaseKeyMismatch {
                    key: key.clone(),
                    phase_id: phase.phase_id.clone(),
                });
            }
            let mut seen = HashSet::new();
            for task in &phase.tasks {
                if !seen.insert(task.id()) {
                    return Err(ValidationError::DuplicateTask {
                        phase_id: key.clone(),
                        task_id: task.id().clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Shape errors in a progress document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A phase is stored under a key other than its own id
    #[error("phase stored under key {key} declares id {phase_id}")]
    PhaseKeyMismatch {
        /// Map key
        key: PhaseId,
        /// Declared id
        phase_id: PhaseId,
    },

    /// A task id appears twice within one phase
    #[error("task {task_id} appears more than once in phase {phase_id}")]
    DuplicateTask {
        /// Phase containing the duplicate
        phase_id: PhaseId,
        /// Duplicated task id
        task_id: TaskId,
    },
}

/// Current time at the millisecond precision the wire format carries.
pub fn now() -> Time {
    Utc::now().trunc_subsecs(3)
}

/// The Unix epoch.
pub fn epoch() -> Time {
    DateTime::<Utc>::default()
}

/// `lastUpdated` as an ISO-8601 string with millisecond precision
/// (`2024-05-01T10:00:00.000Z`).
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// A `null` value reads as the epoch, like a missing one.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(serde::de::Error::custom),
            None => Ok(super::epoch()),
        }
    }
}
