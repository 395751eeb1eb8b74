use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::ids::{DatasetId, ProjectId};
use crate::error::{GeoscopeError, Result};

/// Acquisition source of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Satellite,
    Lidar,
    Iot,
    Vector,
}

impl SourceType {
    pub const ALL: [SourceType; 4] =
        [SourceType::Satellite, SourceType::Lidar, SourceType::Iot, SourceType::Vector];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Satellite => "satellite",
            SourceType::Lidar => "lidar",
            SourceType::Iot => "iot",
            SourceType::Vector => "vector",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = GeoscopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "satellite" => Ok(SourceType::Satellite),
            "lidar" => Ok(SourceType::Lidar),
            "iot" => Ok(SourceType::Iot),
            "vector" => Ok(SourceType::Vector),
            other => Err(GeoscopeError::validation(
                "source_type",
                format!("unknown source type '{}': use satellite, lidar, iot, or vector", other),
            )),
        }
    }
}

/// Full dataset record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Unique identifier
    pub id: DatasetId,

    /// Owning project
    pub project_id: ProjectId,

    /// Dataset name
    pub name: String,

    /// Free-form description
    pub description: Option<String>,

    /// Acquisition source, fixed at creation
    pub source_type: SourceType,

    /// Arbitrary structured metadata (always a JSON object)
    pub metadata: Map<String, Value>,

    /// Number of committed features
    pub feature_count: usize,

    /// When the dataset was created
    pub created_at: DateTime<Utc>,

    /// When name, description, metadata or feature count last changed
    pub updated_at: DateTime<Utc>,
}

/// Request to create a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDataset {
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub source_type: SourceType,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NewDataset {
    pub fn new(project_id: ProjectId, name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            project_id,
            name: name.into(),
            description: None,
            source_type,
            metadata: Map::new(),
        }
    }

    /// Build from boundary input where the source type and metadata are untyped
    pub fn parse(
        project_id: ProjectId,
        name: impl Into<String>,
        source_type: &str,
        metadata: Option<Value>,
    ) -> Result<Self> {
        let source_type = source_type.parse()?;
        let metadata = metadata_object(metadata)?;
        let dataset = Self {
            project_id,
            name: name.into(),
            description: None,
            source_type,
            metadata,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)
    }

    /// Materialize the record with a fresh identifier
    pub fn into_dataset(self, now: DateTime<Utc>) -> Dataset {
        Dataset {
            id: DatasetId::new(),
            project_id: self.project_id,
            name: self.name.trim().to_string(),
            description: self.description,
            source_type: self.source_type,
            metadata: self.metadata,
            feature_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Summary of a dataset's committed features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub dataset_id: DatasetId,
    pub feature_count: usize,
    /// `[minLon, minLat, maxLon, maxLat]` over every feature, absent when empty
    pub bounds: Option<[f64; 4]>,
    /// Planar area in square degrees; points and lines contribute zero
    pub total_area: f64,
    /// Absent when the dataset has no features
    pub mean_area: Option<f64>,
    /// Coordinate reference of `bounds` and the areas, e.g. `EPSG:4326`
    pub crs: String,
}

/// Partial update of the mutable dataset fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl DatasetUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.metadata.is_none()
    }

    /// Apply the update in place
    pub fn apply(&self, dataset: &mut Dataset, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            dataset.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            dataset.description = Some(description.clone());
        }
        if let Some(metadata) = &self.metadata {
            dataset.metadata = metadata.clone();
        }
        dataset.updated_at = now;
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GeoscopeError::validation("name", "dataset name cannot be empty"));
    }
    Ok(())
}

/// Metadata must be absent, null, or a JSON object
pub fn metadata_object(value: Option<Value>) -> Result<Map<String, Value>> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(GeoscopeError::validation(
            "metadata",
            format!("expected a JSON object, found {}", json_type_name(&other)),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
