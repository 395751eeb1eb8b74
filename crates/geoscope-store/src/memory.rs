//! In-memory storage implementation for development and testing.
//!
//! All state lives behind a single `RwLock`, so every ledger transition is one
//! conditional write under the lock and dataset deletion sees a consistent
//! view of the tasks that reference it.
//!
//! The lock is acquired with `unwrap()` intentionally. Lock poisoning only
//! occurs when another thread panicked while holding the lock, which is an
//! unrecoverable state. For production workloads, use the PostgreSQL backend.

use async_trait::async_trait;
use chrono::Utc;
use geoscope_core::error::{GeoscopeError, Result};
use geoscope_core::models::{
    AnalysisParams, AnalysisTask, Dataset, DatasetId, DatasetUpdate, Envelope, FeatureId,
    NewDataset, NewFeature, ProjectId, SpatialFeature, TaskFilter, TaskId, TaskStatus,
    TransitionPayload,
};
use geoscope_geo::{validate_batch, SpatialIndex};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::ports::{GeometryStore, TaskLedger};

/// A dataset together with its feature index
#[derive(Clone)]
struct DatasetEntry {
    dataset: Dataset,
    feature_ids: BTreeSet<FeatureId>,
    index: SpatialIndex,
}

#[derive(Default)]
struct State {
    datasets: HashMap<DatasetId, DatasetEntry>,
    features: HashMap<FeatureId, SpatialFeature>,
    tasks: HashMap<TaskId, AnalysisTask>,
}

impl State {
    fn has_active_tasks(&self, dataset: DatasetId) -> bool {
        self.tasks.values().any(|t| t.dataset_id == dataset && !t.status.is_terminal())
    }

    fn collect_features<'a>(&self, ids: impl IntoIterator<Item = &'a FeatureId>) -> Vec<SpatialFeature> {
        ids.into_iter().filter_map(|id| self.features.get(id).cloned()).collect()
    }
}

/// In-memory implementation of both the Geometry Store and the Task Ledger
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GeometryStore for MemoryStore {
    async fn create_dataset(&self, dataset: NewDataset) -> Result<Dataset> {
        dataset.validate()?;
        let dataset = dataset.into_dataset(Utc::now());

        let mut state = self.state.write().unwrap();
        state.datasets.insert(
            dataset.id,
            DatasetEntry {
                dataset: dataset.clone(),
                feature_ids: BTreeSet::new(),
                index: SpatialIndex::new(),
            },
        );

        tracing::debug!(dataset_id = %dataset.id, name = %dataset.name, "Dataset created");
        Ok(dataset)
    }

    async fn get_dataset(&self, id: DatasetId) -> Result<Option<Dataset>> {
        let state = self.state.read().unwrap();
        Ok(state.datasets.get(&id).map(|entry| entry.dataset.clone()))
    }

    async fn list_datasets(&self, project: Option<ProjectId>) -> Result<Vec<Dataset>> {
        let state = self.state.read().unwrap();
        let mut datasets: Vec<Dataset> = state
            .datasets
            .values()
            .filter(|entry| project.is_none_or(|p| entry.dataset.project_id == p))
            .map(|entry| entry.dataset.clone())
            .collect();
        datasets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(datasets)
    }

    async fn update_dataset(&self, id: DatasetId, update: DatasetUpdate) -> Result<Dataset> {
        update.validate()?;

        let mut state = self.state.write().unwrap();
        let entry =
            state.datasets.get_mut(&id).ok_or_else(|| GeoscopeError::not_found("Dataset", id))?;
        update.apply(&mut entry.dataset, Utc::now());
        Ok(entry.dataset.clone())
    }

    async fn delete_dataset(&self, id: DatasetId) -> Result<()> {
        let mut state = self.state.write().unwrap();

        if !state.datasets.contains_key(&id) {
            return Err(GeoscopeError::not_found("Dataset", id));
        }
        if state.has_active_tasks(id) {
            return Err(GeoscopeError::conflict(format!(
                "dataset {} has pending or processing analysis tasks",
                id
            )));
        }

        if let Some(entry) = state.datasets.remove(&id) {
            for feature_id in &entry.feature_ids {
                state.features.remove(feature_id);
            }
            tracing::debug!(
                dataset_id = %id,
                features = entry.feature_ids.len(),
                "Dataset deleted"
            );
        }
        Ok(())
    }

    async fn ingest_features(
        &self,
        dataset: DatasetId,
        features: Vec<NewFeature>,
    ) -> Result<Vec<FeatureId>> {
        if !self.state.read().unwrap().datasets.contains_key(&dataset) {
            return Err(GeoscopeError::not_found("Dataset", dataset));
        }

        // Validate the whole batch before taking the write lock
        let geometries = validate_batch(&features)?;

        let records: Vec<SpatialFeature> = features
            .into_iter()
            .zip(geometries)
            .map(|(feature, geometry)| SpatialFeature {
                id: FeatureId::new(),
                dataset_id: dataset,
                geometry,
                properties: feature.properties,
            })
            .collect();
        let ids: Vec<FeatureId> = records.iter().map(|f| f.id).collect();

        let mut state = self.state.write().unwrap();
        let State { datasets, features: stored, .. } = &mut *state;

        // Deleted between the check and the write
        let entry =
            datasets.get_mut(&dataset).ok_or_else(|| GeoscopeError::not_found("Dataset", dataset))?;

        for record in records {
            entry.index.insert(record.id, record.geometry.clone());
            entry.feature_ids.insert(record.id);
            stored.insert(record.id, record);
        }
        entry.dataset.feature_count += ids.len();
        entry.dataset.updated_at = Utc::now();

        tracing::debug!(dataset_id = %dataset, count = ids.len(), "Features ingested");
        Ok(ids)
    }

    async fn query_bounding_box(
        &self,
        dataset: DatasetId,
        envelope: &Envelope,
    ) -> Result<Vec<SpatialFeature>> {
        envelope.validate()?;

        let state = self.state.read().unwrap();
        let entry =
            state.datasets.get(&dataset).ok_or_else(|| GeoscopeError::not_found("Dataset", dataset))?;

        let ids = entry.index.query_envelope(envelope);
        Ok(state.collect_features(&ids))
    }

    async fn features_for_dataset(&self, dataset: DatasetId) -> Result<Vec<SpatialFeature>> {
        let state = self.state.read().unwrap();
        let entry =
            state.datasets.get(&dataset).ok_or_else(|| GeoscopeError::not_found("Dataset", dataset))?;
        Ok(state.collect_features(&entry.feature_ids))
    }

    async fn get_feature(&self, id: FeatureId) -> Result<Option<SpatialFeature>> {
        let state = self.state.read().unwrap();
        Ok(state.features.get(&id).cloned())
    }
}

#[async_trait]
impl TaskLedger for MemoryStore {
    async fn create_task(
        &self,
        dataset: DatasetId,
        params: AnalysisParams,
    ) -> Result<AnalysisTask> {
        params.validate()?;

        let mut state = self.state.write().unwrap();
        let project_id = state
            .datasets
            .get(&dataset)
            .map(|entry| entry.dataset.project_id)
            .ok_or_else(|| GeoscopeError::not_found("Dataset", dataset))?;

        let task = AnalysisTask::pending(dataset, project_id, params, Utc::now());
        state.tasks.insert(task.id, task.clone());
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

        let mut state = self.state.write().unwrap();
        let task = state.tasks.get_mut(&id).ok_or_else(|| GeoscopeError::not_found("Task", id))?;

        task.check_transition(from, to)?;
        task.apply_transition(to, payload, Utc::now());
        Ok(task.clone())
    }

    async fn get_task(&self, id: TaskId) -> Result<AnalysisTask> {
        let state = self.state.read().unwrap();
        state.tasks.get(&id).cloned().ok_or_else(|| GeoscopeError::not_found("Task", id))
    }

    async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<AnalysisTask>> {
        let state = self.state.read().unwrap();
        let mut tasks: Vec<AnalysisTask> =
            state.tasks.values().filter(|t| filter.matches(t)).cloned().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn purge_task(&self, id: TaskId) -> Result<()> {
        let mut state = self.state.write().unwrap();
        let task = state.tasks.get(&id).ok_or_else(|| GeoscopeError::not_found("Task", id))?;

        if !task.status.is_terminal() {
            return Err(GeoscopeError::conflict(format!(
                "task {} is {} and cannot be purged until it reaches a terminal state",
                id, task.status
            )));
        }

        state.tasks.remove(&id);
        Ok(())
    }
}
