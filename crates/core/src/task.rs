//! Task model - curriculum task definitions and their completion state.

use serde::{Deserialize, Serialize};
use crate::id::TaskId;

/// A task as defined by the curriculum provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    /// Unique identifier within its phase
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Difficulty rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,

    /// Link to a practice problem or exercise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_link: Option<String>,

    /// Free-form note from the curriculum author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Whether the author flags this task for later revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_revision: Option<bool>,

    /// Supporting material
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub helpful_links: Vec<Resource>,
}

impl TaskDefinition {
    /// Create a task with only the required fields.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            difficulty: None,
            practice_link: None,
            note: None,
            needs_revision: None,
            helpful_links: Vec::new(),
        }
    }

    /// Set the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Task difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Warm-up level
    Easy,
    /// Typical interview level
    Medium,
    /// Stretch problem
    Hard,
}

/// An external learning resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Display name
    pub name: String,

    /// Target URL
    pub url: String,

    /// Resource kind (video, article, ...)
    #[serde(rename = "type")]
    pub kind: String,
}

/// A task's definition together with the user's completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Task fields as last reconciled from the curriculum
    #[serde(flatten)]
    pub task: TaskDefinition,

    /// Whether the user has completed this task
    #[serde(default)]
    pub completed: bool,
}

impl TaskProgress {
    /// Fresh, not-yet-completed progress for a task.
    pub fn pending(task: TaskDefinition) -> Self {
        Self { task, completed: false }
    }

    /// Task id.
    pub fn id(&self) -> &TaskId {
        &self.task.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_progress_flattens_definition() {
        let progress = TaskProgress {
            task: TaskDefinition::new("t1", "Arrays").with_difficulty(Difficulty::Easy),
            completed: true,
        };

        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["id"], "t1");
        assert_eq!(json["title"], "Arrays");
        assert_eq!(json["difficulty"], "Easy");
        assert_eq!(json["completed"], true);
        assert!(json.get("task").is_none());
        assert!(json.get("practiceLink").is_none());
    }

    #[test]
    fn test_task_progress_accepts_camel_case_fields() {
        let json = r#"{
            "id": "t2",
            "title": "Graphs",
            "practiceLink": "https://example.com/graphs",
            "needsRevision": true,
            "helpfulLinks": [{"name": "Intro", "url": "https://example.com", "type": "video"}]
        }"#;

        let progress: TaskProgress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.id(), &TaskId::from("t2"));
        assert!(!progress.completed);
        assert_eq!(progress.task.needs_revision, Some(true));
        assert_eq!(progress.task.helpful_links[0].kind, "video");
    }

    #[test]
    fn test_difficulty_wire_names() {
        let parsed: Vec<Difficulty> = serde_json::from_str(r#"["Easy", "Medium", "Hard"]"#).unwrap();
        assert_eq!(parsed, vec![Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]);
        assert!(serde_json::from_str::<Difficulty>(r#""easy""#).is_err());
    }
}
