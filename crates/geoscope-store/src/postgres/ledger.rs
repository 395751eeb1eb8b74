use async_trait::async_trait;
use chrono::Utc;
use geoscope_core::error::{GeoscopeError, Result};
use geoscope_core::models::{
    AnalysisParams, AnalysisTask, DatasetId, ProjectId, TaskFilter, TaskId, TaskStatus,
    TransitionPayload,
};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{storage_error, PostgresStore};
use crate::ports::TaskLedger;

const TASK_COLUMNS: &str = "id, dataset_id, project_id, kind, params, status, output, error, \
                            created_at, started_at, completed_at, updated_at";

fn task_from_row(row: &PgRow) -> Result<AnalysisTask> {
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    let params: serde_json::Value = row.get("params");
    let output: Option<serde_json::Value> = row.get("output");

    Ok(AnalysisTask {
        id: TaskId(row.get("id")),
        dataset_id: DatasetId(row.get("dataset_id")),
        project_id: ProjectId(row.get("project_id")),
        kind: kind.parse()?,
        params: serde_json::from_value(params)?,
        status: status.parse()?,
        output: output.map(serde_json::from_value).transpose()?,
        error: row.get("error"),
        created_at: row.get("created_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        updated_at: row.get("updated_at"),
    })
}

impl PostgresStore {
    async fn fetch_task(&self, id: TaskId) -> Result<Option<AnalysisTask>> {
        let row = sqlx::query(&format!("SELECT {} FROM analysis_tasks WHERE id = $1", TASK_COLUMNS))
            .bind(id.0)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error("Failed to get task"))?;

        row.as_ref().map(task_from_row).transpose()
    }

    /// Explain why a conditional update matched no row
    async fn rejected_transition(
        &self,
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    ) -> GeoscopeError {
        match self.fetch_task(id).await {
            Ok(Some(task)) => GeoscopeError::InvalidTransition {
                task_id: id,
                expected: from,
                actual: task.status,
                requested: to,
            },
            Ok(None) => GeoscopeError::not_found("Task", id),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl TaskLedger for PostgresStore {
    async fn create_task(
        &self,
        dataset: DatasetId,
        params: AnalysisParams,
    ) -> Result<AnalysisTask> {
        params.validate()?;

        let mut tx = self.pool().begin().await.map_err(storage_error("Failed to begin transaction"))?;

        // Shared lock so a concurrent delete_dataset cannot slip in between
        let project: Option<Uuid> =
            sqlx::query_scalar("SELECT project_id FROM datasets WHERE id = $1 FOR SHARE")
                .bind(dataset.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error("Failed to lock dataset"))?;
        let project = project.ok_or_else(|| GeoscopeError::not_found("Dataset", dataset))?;

        let task = AnalysisTask::pending(dataset, ProjectId(project), params, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO analysis_tasks (id, dataset_id, project_id, kind, params, status,
                                        created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(task.id.0)
        .bind(task.dataset_id.0)
        .bind(task.project_id.0)
        .bind(task.kind.as_str())
        .bind(serde_json::to_value(&task.params)?)
        .bind(task.status.as_str())
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_error("Failed to create task"))?;

        tx.commit().await.map_err(storage_error("Failed to commit transaction"))?;

        tracing::debug!(task_id = %task.id, dataset_id = %dataset, kind = %task.kind, "Task recorded");
        Ok(task)
    }

    async fn transition(
        &self,
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
        payload: TransitionPayload,
    ) -> Result<AnalysisTask> {
        payload.validate_for(to)?;

        if !from.can_transition_to(to) {
            return Err(self.rejected_transition(id, from, to).await);
        }

        let (output, error) = match payload {
            TransitionPayload::Output(output) => (Some(serde_json::to_value(&output)?), None),
            TransitionPayload::Error(error) => (None, Some(error)),
            TransitionPayload::None => (None, None),
        };

        // Single conditional write: only the caller that observes `from` wins
        let row = sqlx::query(&format!(
            r#"
            UPDATE analysis_tasks
            SET status = $3,
                output = COALESCE($4, output),
                error = COALESCE($5, error),
                started_at = CASE WHEN $6 THEN $8 ELSE started_at END,
                completed_at = CASE WHEN $7 THEN $8 ELSE completed_at END,
                updated_at = $8
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(id.0)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(output)
        .bind(error)
        .bind(to == TaskStatus::Processing)
        .bind(to.is_terminal())
        .bind(Utc::now())
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error("Failed to transition task"))?;

        match row {
            Some(row) => task_from_row(&row),
            None => Err(self.rejected_transition(id, from, to).await),
        }
    }

    async fn get_task(&self, id: TaskId) -> Result<AnalysisTask> {
        self.fetch_task(id).await?.ok_or_else(|| GeoscopeError::not_found("Task", id))
    }

    async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<AnalysisTask>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM analysis_tasks
            WHERE ($1::uuid IS NULL OR dataset_id = $1)
              AND ($2::uuid IS NULL OR project_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at, id
            "#,
            TASK_COLUMNS
        ))
        .bind(filter.dataset_id.map(|id| id.0))
        .bind(filter.project_id.map(|id| id.0))
        .bind(filter.status.map(|status| status.as_str()))
        .fetch_all(self.pool())
        .await
        .map_err(storage_error("Failed to list tasks"))?;

        rows.iter().map(task_from_row).collect()
    }

    async fn purge_task(&self, id: TaskId) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM analysis_tasks \
             WHERE id = $1 AND status IN ('completed', 'failed', 'cancelled')",
        )
        .bind(id.0)
        .execute(self.pool())
        .await
        .map_err(storage_error("Failed to purge task"))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.fetch_task(id).await? {
            Some(task) => Err(GeoscopeError::conflict(format!(
                "task {} is {} and cannot be purged until it reaches a terminal state",
                id, task.status
            ))),
            None => Err(GeoscopeError::not_found("Task", id)),
        }
    }
}
