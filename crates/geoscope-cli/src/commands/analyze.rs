//! Analyze command implementation

use crate::cli::AnalyzeArgs;
use crate::client::ApiClient;
use crate::output::{status_label, OutputWriter};
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub async fn execute(args: AnalyzeArgs, client: &ApiClient, output: &OutputWriter) -> Result<()> {
    let params = super::json_object_arg("params", args.params.as_deref())?.unwrap_or(Value::Null);

    let receipt = client.submit_analysis(args.dataset, &args.kind, params).await?;

    if !args.wait {
        if output.is_json() {
            return output.result(&receipt);
        }
        output.success(format!("Submitted {} task {}", args.kind, receipt.task_id));
        output.kv("Status", status_label(receipt.status));
        output.info(format!("Follow it with 'geoscope task wait {}'", receipt.task_id));
        return Ok(());
    }

    if !output.is_json() {
        output.info(format!("Submitted task {}, waiting for it to finish", receipt.task_id));
    }
    let task = super::task::wait_for_terminal(
        client,
        receipt.task_id,
        Duration::from_secs(args.timeout),
        POLL_INTERVAL,
    )
    .await?;
    super::task::finish(&task, output)
}
