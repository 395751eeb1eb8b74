//! Command implementations

mod analyze;
mod dataset;
mod health;
mod ingest;
mod query;
mod task;

use crate::cli::{Cli, Commands};
use crate::client::ApiClient;
use crate::output::OutputWriter;
use anyhow::Result;
use serde_json::Value;

/// Execute a CLI command
pub async fn execute(cli: Cli, output: &OutputWriter) -> Result<()> {
    let client = ApiClient::new(cli.server)?;

    match cli.command {
        Commands::Dataset(args) => dataset::execute(args, &client, output).await,
        Commands::Ingest(args) => ingest::execute(args, &client, output).await,
        Commands::Query(args) => query::execute(args, &client, output).await,
        Commands::Analyze(args) => analyze::execute(args, &client, output).await,
        Commands::Task(args) => task::execute(args, &client, output).await,
        Commands::Health => health::execute(&client, output).await,
    }
}

/// Parse an optional `--flag JSON` argument that must be an object
fn json_object_arg(flag: &str, raw: Option<&str>) -> Result<Option<Value>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("--{} is not valid JSON: {}", flag, e))?;
    if !value.is_object() {
        anyhow::bail!("--{} must be a JSON object", flag);
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_object_arg() {
        assert!(json_object_arg("params", None).unwrap().is_none());

        let value = json_object_arg("params", Some(r#"{"confidence_threshold": 0.4}"#))
            .unwrap()
            .unwrap();
        assert_eq!(value["confidence_threshold"], 0.4);

        let err = json_object_arg("params", Some("[1, 2]")).unwrap_err();
        assert!(err.to_string().contains("--params must be a JSON object"));

        assert!(json_object_arg("metadata", Some("{oops")).is_err());
    }
}
