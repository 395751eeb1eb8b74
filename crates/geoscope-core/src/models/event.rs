use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::AnalysisKind;
use super::ids::{DatasetId, ProjectId, TaskId};
use super::task::{AnalysisTask, TaskStatus};

/// Status change notification for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusEvent {
    pub task_id: TaskId,
    pub dataset_id: DatasetId,
    pub project_id: ProjectId,
    pub kind: AnalysisKind,
    /// `None` for the creation event
    pub previous: Option<TaskStatus>,
    pub status: TaskStatus,
    pub error: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TaskStatusEvent {
    /// Event describing the task's current state
    pub fn from_task(task: &AnalysisTask, previous: Option<TaskStatus>) -> Self {
        Self {
            task_id: task.id,
            dataset_id: task.dataset_id,
            project_id: task.project_id,
            kind: task.kind,
            previous,
            status: task.status,
            error: task.error.clone(),
            occurred_at: task.updated_at,
        }
    }

    pub fn matches(&self, scope: &Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Dataset(id) => self.dataset_id == *id,
            Scope::Project(id) => self.project_id == *id,
        }
    }
}

/// Subscription filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Dataset(DatasetId),
    Project(ProjectId),
    All,
}
