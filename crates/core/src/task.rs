//! Task domain types.
//!
//! A task is the unit of work an agent executes. Status transitions are
//! one-directional except explicit reassignment (`Blocked → InProgress`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentId;

/// Unique identifier for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Blocked,
    Cancelled,
}

impl TaskStatus {
    /// Whether transitioning from `self` to `to` is a legal move.
    ///
    /// Re-applying the current status is always legal (idempotent update).
    /// `Blocked → InProgress` is the explicit reassignment path; terminal
    /// states (`Completed`, `Cancelled`) accept no further transitions.
    pub fn can_transition(&self, to: TaskStatus) -> bool {
        if *self == to {
            return true;
        }
        matches!(
            (self, to),
            (Self::Todo, Self::InProgress)
                | (Self::Todo, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Blocked)
                | (Self::InProgress, Self::Cancelled)
                | (Self::Blocked, Self::InProgress)
                | (Self::Blocked, Self::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "blocked" => Some(Self::Blocked),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// What kind of work a task represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    Feature,
    Bug,
    Refactor,
    Design,
    Chore,
}

/// Task urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A unit of work, owned by the project and borrowed by the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,

    #[serde(default)]
    pub kind: TaskKind,

    #[serde(default)]
    pub priority: TaskPriority,

    pub status: TaskStatus,

    /// Concrete requirements the implementation must meet.
    #[serde(default)]
    pub requirements: Vec<String>,

    /// Conditions under which the task counts as done.
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,

    /// Expected outputs (files, endpoints, documents).
    #[serde(default)]
    pub deliverables: Vec<String>,

    /// How many runtime iterations have been spent on this task.
    #[serde(default)]
    pub iteration_count: u32,

    /// At most one assigned agent at a time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent: Option<AgentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,

    #[serde(default)]
    pub subtasks: Vec<TaskId>,

    /// Tasks that must complete before this one can proceed.
    #[serde(default)]
    pub depends_on: Vec<TaskId>,

    /// Summary written when the task completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_summary: Option<String>,

    /// Blocker description written when the task blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocker: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task in `Todo` status.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            title: title.into(),
            description: description.into(),
            kind: TaskKind::default(),
            priority: TaskPriority::default(),
            status: TaskStatus::Todo,
            requirements: Vec::new(),
            acceptance_criteria: Vec::new(),
            deliverables: Vec::new(),
            iteration_count: 0,
            assigned_agent: None,
            parent: None,
            subtasks: Vec::new(),
            depends_on: Vec::new(),
            completion_summary: None,
            blocker: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_requirements(mut self, requirements: Vec<String>) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_acceptance_criteria(mut self, criteria: Vec<String>) -> Self {
        self.acceptance_criteria = criteria;
        self
    }

    pub fn with_deliverables(mut self, deliverables: Vec<String>) -> Self {
        self.deliverables = deliverables;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// One entry in a task's status-change log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub task_id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
    pub changed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_starts_todo() {
        let task = Task::new("Build login", "Implement the login endpoint");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.iteration_count, 0);
        assert!(task.assigned_agent.is_none());
    }

    #[test]
    fn forward_transitions_allowed() {
        assert!(TaskStatus::Todo.can_transition(TaskStatus::InProgress));
        assert!(TaskStatus::InProgress.can_transition(TaskStatus::Completed));
        assert!(TaskStatus::InProgress.can_transition(TaskStatus::Blocked));
        assert!(TaskStatus::Blocked.can_transition(TaskStatus::InProgress));
    }

    #[test]
    fn backward_transitions_rejected() {
        assert!(!TaskStatus::Completed.can_transition(TaskStatus::InProgress));
        assert!(!TaskStatus::Completed.can_transition(TaskStatus::Todo));
        assert!(!TaskStatus::Cancelled.can_transition(TaskStatus::InProgress));
        assert!(!TaskStatus::InProgress.can_transition(TaskStatus::Todo));
    }

    #[test]
    fn same_status_transition_is_idempotent() {
        assert!(TaskStatus::InProgress.can_transition(TaskStatus::InProgress));
        assert!(TaskStatus::Completed.can_transition(TaskStatus::Completed));
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Blocked,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("bogus"), None);
    }

    #[test]
    fn task_serialization_roundtrip() {
        let task = Task::new("Title", "Description")
            .with_requirements(vec!["req 1".into()])
            .with_deliverables(vec!["src/login.rs".into()]);
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, "Title");
        assert_eq!(back.requirements.len(), 1);
        assert_eq!(back.deliverables[0], "src/login.rs");
    }
}
