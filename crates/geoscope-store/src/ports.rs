use async_trait::async_trait;
use geoscope_core::error::Result;
use geoscope_core::models::{
    AnalysisParams, AnalysisTask, Dataset, DatasetId, DatasetUpdate, Envelope, FeatureId,
    NewDataset, NewFeature, ProjectId, SpatialFeature, TaskFilter, TaskId, TaskStatus,
    TransitionPayload,
};

/// Port for dataset and feature storage
#[async_trait]
pub trait GeometryStore: Send + Sync {
    /// Create a dataset; the store assigns id and timestamps
    async fn create_dataset(&self, dataset: NewDataset) -> Result<Dataset>;

    /// Retrieve a dataset by ID
    async fn get_dataset(&self, id: DatasetId) -> Result<Option<Dataset>>;

    /// List datasets, optionally for one project, ordered by creation time
    async fn list_datasets(&self, project: Option<ProjectId>) -> Result<Vec<Dataset>>;

    /// Update the mutable fields of a dataset
    async fn update_dataset(&self, id: DatasetId, update: DatasetUpdate) -> Result<Dataset>;

    /// Delete a dataset and its features.
    ///
    /// Fails with `Conflict` while any task on the dataset is PENDING or
    /// PROCESSING.
    async fn delete_dataset(&self, id: DatasetId) -> Result<()>;

    /// Validate and commit a batch of features atomically.
    ///
    /// Every geometry is validated before anything is written; the first
    /// invalid entry rejects the whole batch with `MalformedGeometry`.
    async fn ingest_features(
        &self,
        dataset: DatasetId,
        features: Vec<NewFeature>,
    ) -> Result<Vec<FeatureId>>;

    /// Every feature of the dataset intersecting the closed envelope, ordered
    /// by feature id
    async fn query_bounding_box(
        &self,
        dataset: DatasetId,
        envelope: &Envelope,
    ) -> Result<Vec<SpatialFeature>>;

    /// All features of a dataset, ordered by feature id
    async fn features_for_dataset(&self, dataset: DatasetId) -> Result<Vec<SpatialFeature>>;

    /// Get a specific feature by ID
    async fn get_feature(&self, id: FeatureId) -> Result<Option<SpatialFeature>>;
}

/// Port for the analysis task ledger.
///
/// `transition` is the only way to change a task's status and is a
/// compare-and-swap at the storage level: of any number of concurrent callers
/// presenting the same `from` status, exactly one succeeds.
#[async_trait]
pub trait TaskLedger: Send + Sync {
    /// Record a PENDING task against an existing dataset
    async fn create_task(&self, dataset: DatasetId, params: AnalysisParams)
        -> Result<AnalysisTask>;

    /// Move a task from `from` to `to` if and only if it is currently `from`
    async fn transition(
        &self,
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
        payload: TransitionPayload,
    ) -> Result<AnalysisTask>;

    /// Current state of a task; `NotFound` when absent
    async fn get_task(&self, id: TaskId) -> Result<AnalysisTask>;

    /// Tasks matching the filter, ordered by creation time
    async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<AnalysisTask>>;

    /// Remove a terminal task; `Conflict` otherwise
    async fn purge_task(&self, id: TaskId) -> Result<()>;
}
