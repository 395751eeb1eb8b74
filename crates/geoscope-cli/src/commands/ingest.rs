//! Ingest command implementation

use crate::cli::IngestArgs;
use crate::client::ApiClient;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;

pub async fn execute(args: IngestArgs, client: &ApiClient, output: &OutputWriter) -> Result<()> {
    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let geojson: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", args.file.display()))?;

    tracing::debug!(file = %args.file.display(), dataset = %args.dataset, "Uploading features");

    let receipt = client.ingest(args.dataset, &geojson).await?;

    if output.is_json() {
        output.result(&receipt)?;
    } else {
        output.success(format!(
            "Ingested {} feature(s) from {}",
            receipt.count,
            args.file.display()
        ));
    }
    Ok(())
}
