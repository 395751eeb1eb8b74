//! Task commands

use crate::cli::{TaskArgs, TaskCommand};
use crate::client::{ApiClient, TaskView};
use crate::output::{status_label, OutputWriter};
use anyhow::{bail, Result};
use geoscope_core::models::{AnalysisOutput, TaskId, TaskStatus};
use std::time::{Duration, Instant};

pub async fn execute(args: TaskArgs, client: &ApiClient, output: &OutputWriter) -> Result<()> {
    match args.command {
        TaskCommand::Show { id } => {
            let task = client.get_task(id).await?;
            render(&task, output)
        }
        TaskCommand::Cancel { id } => {
            let task = client.cancel_task(id).await?;
            if output.is_json() {
                output.result(&task)
            } else {
                output.success(format!("Cancelled task {}", task.id));
                Ok(())
            }
        }
        TaskCommand::Wait { id, timeout, interval_ms } => {
            let task = wait_for_terminal(
                client,
                id,
                Duration::from_secs(timeout),
                Duration::from_millis(interval_ms.max(10)),
            )
            .await?;
            finish(&task, output)
        }
    }
}

/// Poll until the task reaches a terminal status
pub(super) async fn wait_for_terminal(
    client: &ApiClient,
    id: TaskId,
    timeout: Duration,
    interval: Duration,
) -> Result<TaskView> {
    let started = Instant::now();
    let mut last_status = None;

    loop {
        let task = client.get_task(id).await?;
        if last_status != Some(task.status) {
            tracing::info!(task = %id, status = %task.status, "Task status");
            last_status = Some(task.status);
        }
        if task.status.is_terminal() {
            return Ok(task);
        }
        if started.elapsed() >= timeout {
            bail!(
                "Timed out after {}s waiting for task {} (still {})",
                timeout.as_secs(),
                id,
                task.status
            );
        }
        tokio::time::sleep(interval).await;
    }
}

/// Print a terminal task and turn failure into a non-zero exit
pub(super) fn finish(task: &TaskView, output: &OutputWriter) -> Result<()> {
    render(task, output)?;
    match task.status {
        TaskStatus::Failed => bail!(
            "Task {} failed: {}",
            task.id,
            task.error.as_deref().unwrap_or("no error recorded")
        ),
        TaskStatus::Cancelled => bail!("Task {} was cancelled", task.id),
        _ => Ok(()),
    }
}

fn render(task: &TaskView, output: &OutputWriter) -> Result<()> {
    if output.is_json() {
        return output.result(task);
    }

    output.section(format!("Task {}", task.id));
    output.kv("Dataset", task.dataset_id);
    output.kv("Kind", task.kind);
    output.kv("Status", status_label(task.status));
    output.kv("Created", task.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(started_at) = task.started_at {
        output.kv("Started", started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(completed_at) = task.completed_at {
        output.kv("Finished", completed_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(error) = &task.error {
        output.kv("Error", error);
    }
    if let Some(result) = &task.output {
        output.kv("Result", summarize(result));
    }
    Ok(())
}

fn summarize(output: &AnalysisOutput) -> String {
    let noun = match output {
        AnalysisOutput::ObjectDetection { .. } => "detection",
        AnalysisOutput::Segmentation { .. } => "segment",
        AnalysisOutput::ChangeDetection { .. } => "change",
    };
    match output.len() {
        1 => format!("1 {}", noun),
        n => format!("{} {}s", n, noun),
    }
}
