use clap::{Parser, Subcommand};
use geoscope_core::models::{DatasetId, ProjectId, TaskId};
use std::path::PathBuf;

/// GeoScope - geospatial datasets and asynchronous analysis
#[derive(Parser, Debug)]
#[command(name = "geoscope")]
#[command(about = "Client for the GeoScope API", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Base URL of the GeoScope API server
    #[arg(long, global = true, default_value = "http://localhost:3001")]
    pub server: String,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage datasets
    Dataset(DatasetArgs),

    /// Ingest a GeoJSON file into a dataset
    Ingest(IngestArgs),

    /// List a dataset's features, optionally within a bounding box
    Query(QueryArgs),

    /// Submit an analysis task for a dataset
    Analyze(AnalyzeArgs),

    /// Inspect or control analysis tasks
    Task(TaskArgs),

    /// Check that the server is reachable
    Health,
}

#[derive(Parser, Debug)]
pub struct DatasetArgs {
    #[command(subcommand)]
    pub command: DatasetCommand,
}

#[derive(Subcommand, Debug)]
pub enum DatasetCommand {
    /// Create a dataset
    Create(CreateDatasetArgs),

    /// List datasets
    List {
        /// Only datasets owned by this project
        #[arg(long)]
        project: Option<ProjectId>,
    },

    /// Show one dataset
    Show { id: DatasetId },

    /// Feature count, bounds and area of a dataset
    Stats { id: DatasetId },

    /// Delete a dataset and its features
    Delete { id: DatasetId },
}

#[derive(Parser, Debug)]
pub struct CreateDatasetArgs {
    /// Owning project
    #[arg(long)]
    pub project: ProjectId,

    #[arg(long)]
    pub name: String,

    /// Acquisition source (satellite, lidar, iot, vector)
    #[arg(long)]
    pub source_type: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Metadata as a JSON object
    #[arg(long, value_name = "JSON")]
    pub metadata: Option<String>,
}

#[derive(Parser, Debug)]
pub struct IngestArgs {
    pub dataset: DatasetId,

    /// GeoJSON file (Feature, FeatureCollection or bare geometry)
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    pub dataset: DatasetId,

    /// Bounding box as minLon,minLat,maxLon,maxLat
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    pub dataset: DatasetId,

    /// Analysis kind (object_detection, segmentation, change_detection)
    #[arg(long)]
    pub kind: String,

    /// Analysis parameters as a JSON object
    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,

    /// Wait for the task to finish
    #[arg(long)]
    pub wait: bool,

    /// Seconds to wait before giving up (with --wait)
    #[arg(long, default_value = "300")]
    pub timeout: u64,
}

#[derive(Parser, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Show a task's status, output or error
    Show { id: TaskId },

    /// Cancel a task that has not been dispatched yet
    Cancel { id: TaskId },

    /// Poll a task until it reaches a terminal status
    Wait {
        id: TaskId,

        /// Seconds to wait before giving up
        #[arg(long, default_value = "300")]
        timeout: u64,

        /// Milliseconds between polls
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
    },
}
