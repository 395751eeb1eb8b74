//! Dataset commands

use crate::cli::{CreateDatasetArgs, DatasetArgs, DatasetCommand};
use crate::client::{ApiClient, CreateDatasetBody};
use crate::output::{truncate, OutputWriter};
use anyhow::Result;
use geoscope_core::models::{Dataset, DatasetId, ProjectId};
use tabled::Tabled;

pub async fn execute(args: DatasetArgs, client: &ApiClient, output: &OutputWriter) -> Result<()> {
    match args.command {
        DatasetCommand::Create(args) => create(args, client, output).await,
        DatasetCommand::List { project } => list(project, client, output).await,
        DatasetCommand::Show { id } => show(id, client, output).await,
        DatasetCommand::Stats { id } => stats(id, client, output).await,
        DatasetCommand::Delete { id } => delete(id, client, output).await,
    }
}

async fn create(args: CreateDatasetArgs, client: &ApiClient, output: &OutputWriter) -> Result<()> {
    let metadata = super::json_object_arg("metadata", args.metadata.as_deref())?;
    let body = CreateDatasetBody {
        project_id: args.project,
        name: args.name,
        description: args.description,
        source_type: args.source_type,
        metadata,
    };

    let dataset = client.create_dataset(&body).await?;

    if output.is_json() {
        output.result(&dataset)?;
    } else {
        output.success(format!("Created dataset '{}'", dataset.name));
        output.kv("ID", dataset.id);
    }
    Ok(())
}

#[derive(Tabled)]
struct DatasetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Source")]
    source_type: String,
    #[tabled(rename = "Features")]
    feature_count: usize,
    #[tabled(rename = "Updated")]
    updated_at: String,
}

impl From<&Dataset> for DatasetRow {
    fn from(dataset: &Dataset) -> Self {
        Self {
            id: dataset.id.to_string(),
            name: truncate(&dataset.name, 32),
            source_type: dataset.source_type.to_string(),
            feature_count: dataset.feature_count,
            updated_at: dataset.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

async fn list(project: Option<ProjectId>, client: &ApiClient, output: &OutputWriter) -> Result<()> {
    let datasets = client.list_datasets(project).await?;

    if output.is_json() {
        return output.result(&datasets);
    }

    if datasets.is_empty() {
        output.info("No datasets found");
        return Ok(());
    }
    output.section(format!("Datasets ({})", datasets.len()));
    output.table(datasets.iter().map(DatasetRow::from).collect());
    Ok(())
}

async fn show(id: DatasetId, client: &ApiClient, output: &OutputWriter) -> Result<()> {
    let dataset = client.get_dataset(id).await?;

    if output.is_json() {
        return output.result(&dataset);
    }

    output.section(&dataset.name);
    output.kv("ID", dataset.id);
    output.kv("Project", dataset.project_id);
    output.kv("Source", dataset.source_type);
    if let Some(description) = &dataset.description {
        output.kv("Description", description);
    }
    output.kv("Features", dataset.feature_count);
    output.kv("Created", dataset.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    output.kv("Updated", dataset.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if !dataset.metadata.is_empty() {
        output.kv("Metadata", serde_json::to_string(&dataset.metadata)?);
    }
    Ok(())
}

async fn stats(id: DatasetId, client: &ApiClient, output: &OutputWriter) -> Result<()> {
    let stats = client.dataset_stats(id).await?;

    if output.is_json() {
        return output.result(&stats);
    }

    output.section(format!("Dataset {}", stats.dataset_id));
    output.kv("Features", stats.feature_count);
    match stats.bounds {
        Some([min_lon, min_lat, max_lon, max_lat]) => {
            output.kv("Bounds", format!("{},{},{},{}", min_lon, min_lat, max_lon, max_lat))
        }
        None => output.kv("Bounds", "-"),
    }
    output.kv("Total area", format!("{:.6} deg²", stats.total_area));
    if let Some(mean_area) = stats.mean_area {
        output.kv("Mean area", format!("{:.6} deg²", mean_area));
    }
    output.kv("CRS", &stats.crs);
    Ok(())
}

async fn delete(id: DatasetId, client: &ApiClient, output: &OutputWriter) -> Result<()> {
    let receipt = client.delete_dataset(id).await?;

    if output.is_json() {
        output.result(&receipt)?;
    } else {
        output.success(receipt.message);
    }
    Ok(())
}
