//! Task orchestrator: records analysis requests and dispatches them.
//!
//! Dispatch exclusivity comes from the ledger's PENDING -> PROCESSING
//! compare-and-swap, never from in-process state, so any number of dispatch
//! units (or replicas) may race for the same task and at most one wins.

use chrono::Utc;
use futures::stream::BoxStream;
use geoscope_analysis::{AnalysisRequest, AnalysisService};
use geoscope_core::error::{GeoscopeError, Result};
use geoscope_core::models::{
    AnalysisKind, AnalysisParams, AnalysisTask, DatasetId, Scope, TaskFilter, TaskId,
    TaskStatus, TaskStatusEvent, TransitionPayload,
};
use geoscope_store::{GeometryStore, TaskLedger};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::relay::NotificationRelay;

/// Orchestrator tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorConfig {
    /// Per-attempt deadline for the analysis call
    pub deadline: Duration,
    /// Dispatch units allowed to hold a task in PROCESSING at once
    pub max_concurrent_dispatches: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { deadline: Duration::from_secs(30), max_concurrent_dispatches: 16 }
    }
}

struct Inner {
    store: Arc<dyn GeometryStore>,
    ledger: Arc<dyn TaskLedger>,
    analysis: Arc<dyn AnalysisService>,
    relay: NotificationRelay,
    permits: Arc<Semaphore>,
    config: OrchestratorConfig,
}

/// Coordinates submission, dispatch and cancellation of analysis tasks
#[derive(Clone)]
pub struct TaskOrchestrator {
    inner: Arc<Inner>,
}

impl TaskOrchestrator {
    pub fn new(
        store: Arc<dyn GeometryStore>,
        ledger: Arc<dyn TaskLedger>,
        analysis: Arc<dyn AnalysisService>,
        relay: NotificationRelay,
        config: OrchestratorConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_dispatches.max(1)));
        Self { inner: Arc::new(Inner { store, ledger, analysis, relay, permits, config }) }
    }

    pub fn relay(&self) -> &NotificationRelay {
        &self.inner.relay
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    pub fn subscribe(&self, scope: Scope) -> BoxStream<'static, TaskStatusEvent> {
        self.inner.relay.subscribe(scope)
    }

    /// Record a PENDING task and start dispatching it in the background.
    ///
    /// Returns as soon as the task is recorded. Unknown kinds and invalid
    /// parameters are rejected before anything is written.
    pub async fn submit(
        &self,
        dataset: DatasetId,
        kind: &str,
        params: serde_json::Value,
    ) -> Result<AnalysisTask> {
        let kind: AnalysisKind = kind.parse()?;
        let params = AnalysisParams::from_payload(kind, params)?;

        let task = self.inner.ledger.create_task(dataset, params).await?;
        tracing::info!(task_id = %task.id, dataset_id = %dataset, kind = %kind, "Analysis submitted");
        self.inner.relay.publish(TaskStatusEvent::from_task(&task, None));

        self.dispatch(task.id);
        Ok(task)
    }

    /// Spawn a dispatch unit for `task`.
    ///
    /// The unit aborts quietly if the task is no longer PENDING when it gets
    /// its turn.
    pub fn dispatch(&self, task: TaskId) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.run(task).await })
    }

    /// Withdraw a task that has not been picked up yet
    pub async fn cancel(&self, task: TaskId) -> Result<AnalysisTask> {
        let cancelled = self
            .inner
            .ledger
            .transition(task, TaskStatus::Pending, TaskStatus::Cancelled, TransitionPayload::None)
            .await?;

        tracing::info!(task_id = %task, "Analysis cancelled");
        self.inner
            .relay
            .publish(TaskStatusEvent::from_task(&cancelled, Some(TaskStatus::Pending)));
        Ok(cancelled)
    }

    pub async fn get(&self, task: TaskId) -> Result<AnalysisTask> {
        self.inner.ledger.get_task(task).await
    }

    pub async fn list(&self, filter: TaskFilter) -> Result<Vec<AnalysisTask>> {
        self.inner.ledger.list_tasks(filter).await
    }

    /// Re-dispatch every PENDING task, e.g. after a restart
    pub async fn resume_pending(&self) -> Result<usize> {
        let pending = self
            .inner
            .ledger
            .list_tasks(TaskFilter::default().with_status(TaskStatus::Pending))
            .await?;

        for task in &pending {
            self.dispatch(task.id);
        }

        if !pending.is_empty() {
            tracing::info!(count = pending.len(), "Resumed pending analysis tasks");
        }
        Ok(pending.len())
    }

    /// Fail PROCESSING tasks whose dispatch unit started more than `max_age`
    /// ago and is presumed gone. Such tasks are never re-dispatched.
    pub async fn fail_stale(&self, max_age: Duration) -> Result<usize> {
        let max_age = chrono::Duration::from_std(max_age).map_err(|e| {
            GeoscopeError::validation("max_age", format!("out of range: {}", e))
        })?;
        let cutoff = Utc::now() - max_age;

        let processing = self
            .inner
            .ledger
            .list_tasks(TaskFilter::default().with_status(TaskStatus::Processing))
            .await?;

        let mut failed = 0;
        for task in processing.into_iter().filter(|t| t.started_at.is_none_or(|at| at < cutoff)) {
            let description = format!(
                "interrupted: dispatch did not finish within {} seconds",
                max_age.num_seconds()
            );
            match self
                .inner
                .ledger
                .transition(
                    task.id,
                    TaskStatus::Processing,
                    TaskStatus::Failed,
                    TransitionPayload::Error(description),
                )
                .await
            {
                Ok(updated) => {
                    tracing::warn!(task_id = %task.id, "Stale analysis task failed");
                    self.inner.relay.publish(TaskStatusEvent::from_task(
                        &updated,
                        Some(TaskStatus::Processing),
                    ));
                    failed += 1;
                }
                // Finished in the meantime
                Err(e) if e.is_invalid_transition() => {}
                Err(e) => return Err(e),
            }
        }

        Ok(failed)
    }
}

impl Inner {
    async fn run(&self, task_id: TaskId) {
        let Ok(_permit) = self.permits.clone().acquire_owned().await else {
            return;
        };

        let task = match self
            .ledger
            .transition(task_id, TaskStatus::Pending, TaskStatus::Processing, TransitionPayload::None)
            .await
        {
            Ok(task) => task,
            Err(e) if e.is_invalid_transition() => {
                tracing::debug!(task_id = %task_id, error = %e, "Task already claimed or cancelled");
                return;
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Failed to claim task");
                return;
            }
        };

        tracing::info!(task_id = %task_id, kind = %task.kind, "Analysis dispatched");
        self.relay.publish(TaskStatusEvent::from_task(&task, Some(TaskStatus::Pending)));

        let outcome = match self.store.features_for_dataset(task.dataset_id).await {
            Ok(features) => {
                let request = AnalysisRequest {
                    task_id,
                    dataset_id: task.dataset_id,
                    kind: task.kind,
                    params: task.params.clone(),
                    features,
                };
                self.analysis
                    .invoke(&request, self.config.deadline)
                    .await
                    .map_err(|e| e.to_string())
            }
            Err(e) => Err(format!("failed to load dataset features: {}", e)),
        };

        let (to, payload) = match outcome {
            Ok(output) => (TaskStatus::Completed, TransitionPayload::Output(output)),
            Err(description) => (TaskStatus::Failed, TransitionPayload::Error(description)),
        };

        match self.ledger.transition(task_id, TaskStatus::Processing, to, payload).await {
            Ok(finished) => {
                match &finished.error {
                    Some(error) => tracing::warn!(task_id = %task_id, %error, "Analysis failed"),
                    None => tracing::info!(task_id = %task_id, "Analysis completed"),
                }
                self.relay
                    .publish(TaskStatusEvent::from_task(&finished, Some(TaskStatus::Processing)));
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Failed to record analysis outcome");
            }
        }
    }
}
