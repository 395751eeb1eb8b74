use geoscope_core::error::Result;
use geoscope_core::models::dataset::metadata_object;
use geoscope_core::models::{DatasetId, DatasetUpdate, NewDataset, ProjectId};
use serde::Deserialize;
use serde_json::Value;

/// Create dataset request body
#[derive(Debug, Deserialize)]
pub struct CreateDatasetRequest {
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub source_type: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl CreateDatasetRequest {
    pub fn into_new_dataset(self) -> Result<NewDataset> {
        let mut dataset =
            NewDataset::parse(self.project_id, self.name, &self.source_type, self.metadata)?;
        dataset.description = self.description;
        Ok(dataset)
    }
}

/// Partial dataset update body
#[derive(Debug, Deserialize)]
pub struct UpdateDatasetRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl UpdateDatasetRequest {
    pub fn into_update(self) -> Result<DatasetUpdate> {
        let metadata = self.metadata.map(|m| metadata_object(Some(m))).transpose()?;
        let update = DatasetUpdate { name: self.name, description: self.description, metadata };
        update.validate()?;
        Ok(update)
    }
}

/// Submit analysis request body
#[derive(Debug, Deserialize)]
pub struct SubmitAnalysisRequest {
    pub kind: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListDatasetsQuery {
    pub project_id: Option<ProjectId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeatureQuery {
    /// `minLon,minLat,maxLon,maxLat`
    pub bbox: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub dataset_id: Option<DatasetId>,
    pub project_id: Option<ProjectId>,
}
