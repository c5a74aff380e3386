//! Phase model - curriculum stages and the curriculum itself.

use serde::{Deserialize, Serialize};
use crate::id::{PhaseId, TaskId};
use crate::task::{Resource, TaskDefinition};

/// A phase is a stage of the curriculum with an ordered list of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    /// Unique identifier
    pub id: PhaseId,

    /// Phase title
    #[serde(default)]
    pub title: String,

    /// Academic year the phase targets
    #[serde(default)]
    pub year: String,

    /// Month range the phase spans
    #[serde(default)]
    pub months: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Topics covered
    #[serde(default)]
    pub related_topics: Vec<String>,

    /// Tasks in this phase, in display order
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,

    /// Phase-level resources
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Phase {
    /// Create a phase with a title and tasks.
    pub fn new(id: impl Into<PhaseId>, title: impl Into<String>, tasks: Vec<TaskDefinition>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year: String::new(),
            months: String::new(),
            description: String::new(),
            related_topics: Vec::new(),
            tasks,
            resources: Vec::new(),
        }
    }

    /// Task ids in curriculum order.
    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.tasks.iter().map(|t| &t.id)
    }
}

/// The canonical, externally supplied curriculum.
///
/// Serialized as a bare JSON array of phases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curriculum {
    /// Phases in curriculum order
    pub phases: Vec<Phase>,
}

impl Curriculum {
    /// Create a curriculum from its phases.
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    /// Look up a phase by id.
    pub fn phase(&self, id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    /// Number of phases.
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Whether the curriculum has no phases.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Total number of tasks across all phases.
    pub fn total_tasks(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }
}
