//! Analysis task lifecycle.
//!
//! ```text
//! PENDING -> PROCESSING -> COMPLETED   (terminal)
//! PENDING -> PROCESSING -> FAILED      (terminal)
//! PENDING -> CANCELLED                 (terminal)
//! ```
//!
//! Transitions are only ever applied through a compare-and-swap on the ledger,
//! so a task leaves each state at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::analysis::{AnalysisKind, AnalysisOutput, AnalysisParams};
use super::ids::{DatasetId, ProjectId, TaskId};
use crate::error::{GeoscopeError, Result};

/// Lifecycle status of an analysis task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Recorded, not yet picked up
    Pending,
    /// Claimed by exactly one dispatcher
    Processing,
    /// Finished with an output
    Completed,
    /// Finished with an error description
    Failed,
    /// Withdrawn before dispatch
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::Processing,
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }

    /// Whether `self -> next` is an edge of the state machine
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Pending, TaskStatus::Cancelled)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = GeoscopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            other => Err(GeoscopeError::validation(
                "status",
                format!("unknown task status '{}'", other),
            )),
        }
    }
}

/// Tracked unit of requested analysis work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTask {
    pub id: TaskId,
    pub dataset_id: DatasetId,
    /// Copied from the dataset at creation for subscription scoping
    pub project_id: ProjectId,
    pub kind: AnalysisKind,
    pub params: AnalysisParams,
    pub status: TaskStatus,
    /// Present only when COMPLETED
    pub output: Option<AnalysisOutput>,
    /// Present only when FAILED
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisTask {
    /// Fresh PENDING task
    pub fn pending(
        dataset_id: DatasetId,
        project_id: ProjectId,
        params: AnalysisParams,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            dataset_id,
            project_id,
            kind: params.kind(),
            params,
            status: TaskStatus::Pending,
            output: None,
            error: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Check a requested transition against the current status.
    ///
    /// Returns `InvalidTransition` when the current status differs from `from`
    /// or the edge is not part of the state machine.
    pub fn check_transition(&self, from: TaskStatus, to: TaskStatus) -> Result<()> {
        if self.status != from || !from.can_transition_to(to) {
            return Err(GeoscopeError::InvalidTransition {
                task_id: self.id,
                expected: from,
                actual: self.status,
                requested: to,
            });
        }
        Ok(())
    }

    /// Apply an already-checked transition, stamping timestamps
    pub fn apply_transition(&mut self, to: TaskStatus, payload: TransitionPayload, now: DateTime<Utc>) {
        self.status = to;
        self.updated_at = now;
        if to == TaskStatus::Processing {
            self.started_at = Some(now);
        }
        if to.is_terminal() {
            self.completed_at = Some(now);
        }
        match payload {
            TransitionPayload::Output(output) => self.output = Some(output),
            TransitionPayload::Error(error) => self.error = Some(error),
            TransitionPayload::None => {}
        }
    }
}

/// Data attached by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionPayload {
    None,
    Output(AnalysisOutput),
    Error(String),
}

impl TransitionPayload {
    /// The payload must match the target status
    pub fn validate_for(&self, to: TaskStatus) -> Result<()> {
        let ok = match (to, self) {
            (TaskStatus::Completed, TransitionPayload::Output(_)) => true,
            (TaskStatus::Failed, TransitionPayload::Error(_)) => true,
            (TaskStatus::Completed | TaskStatus::Failed, _) => false,
            (_, TransitionPayload::None) => true,
            _ => false,
        };
        if !ok {
            return Err(GeoscopeError::validation(
                "payload",
                format!("{} payload cannot accompany a transition to {}", self.label(), to),
            ));
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        match self {
            TransitionPayload::None => "empty",
            TransitionPayload::Output(_) => "output",
            TransitionPayload::Error(_) => "error",
        }
    }
}

/// Filter for listing tasks; all conditions are ANDed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    pub dataset_id: Option<DatasetId>,
    pub project_id: Option<ProjectId>,
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn for_dataset(dataset_id: DatasetId) -> Self {
        Self { dataset_id: Some(dataset_id), ..Default::default() }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, task: &AnalysisTask) -> bool {
        self.dataset_id.is_none_or(|id| task.dataset_id == id)
            && self.project_id.is_none_or(|id| task.project_id == id)
            && self.status.is_none_or(|status| task.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisKind;

    fn task() -> AnalysisTask {
        AnalysisTask::pending(
            DatasetId::new(),
            ProjectId::new(),
            AnalysisParams::defaults(AnalysisKind::ObjectDetection),
            Utc::now(),
        )
    }

    #[test]
    fn test_state_machine_edges() {
        use TaskStatus::*;
        let legal = [(Pending, Processing), (Pending, Cancelled), (Processing, Completed), (Processing, Failed)];
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                assert_eq!(from.can_transition_to(to), legal.contains(&(from, to)), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for status in TaskStatus::ALL.into_iter().filter(TaskStatus::is_terminal) {
            assert!(TaskStatus::ALL.iter().all(|next| !status.can_transition_to(*next)));
        }
    }

    #[test]
    fn test_check_transition_reports_actual_status() {
        let mut task = task();
        task.apply_transition(TaskStatus::Processing, TransitionPayload::None, Utc::now());

        let err = task.check_transition(TaskStatus::Pending, TaskStatus::Cancelled).unwrap_err();
        match err {
            GeoscopeError::InvalidTransition { expected, actual, requested, .. } => {
                assert_eq!(expected, TaskStatus::Pending);
                assert_eq!(actual, TaskStatus::Processing);
                assert_eq!(requested, TaskStatus::Cancelled);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_timestamps_stamped_by_transition() {
        let mut task = task();
        assert!(task.started_at.is_none());

        task.apply_transition(TaskStatus::Processing, TransitionPayload::None, Utc::now());
        assert!(task.started_at.is_some());
        assert!(task.completed_at.is_none());

        task.apply_transition(TaskStatus::Failed, TransitionPayload::Error("boom".into()), Utc::now());
        assert!(task.completed_at.is_some());
        assert_eq!(task.error.as_deref(), Some("boom"));
        assert!(task.output.is_none());
    }

    #[test]
    fn test_payload_must_match_target() {
        assert!(TransitionPayload::None.validate_for(TaskStatus::Processing).is_ok());
        assert!(TransitionPayload::None.validate_for(TaskStatus::Completed).is_err());
        assert!(TransitionPayload::Error("x".into()).validate_for(TaskStatus::Failed).is_ok());
        assert!(TransitionPayload::Error("x".into()).validate_for(TaskStatus::Cancelled).is_err());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&TaskStatus::Cancelled).unwrap(), "\"cancelled\"");
        assert_eq!("PROCESSING".parse::<TaskStatus>().unwrap(), TaskStatus::Processing);
    }

    #[test]
    fn test_filter_matches() {
        let task = task();
        assert!(TaskFilter::default().matches(&task));
        assert!(TaskFilter::for_dataset(task.dataset_id).matches(&task));
        assert!(!TaskFilter::for_dataset(DatasetId::new()).matches(&task));
        assert!(!TaskFilter::default().with_status(TaskStatus::Failed).matches(&task));
    }
}
