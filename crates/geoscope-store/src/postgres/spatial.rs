use async_trait::async_trait;
use chrono::Utc;
use geoscope_core::error::{GeoscopeError, Result};
use geoscope_core::models::{
    Dataset, DatasetId, DatasetUpdate, Envelope, FeatureId, Geometry, NewDataset, NewFeature,
    ProjectId, SpatialFeature,
};
use geoscope_geo::{intersects_envelope, validate_batch};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{storage_error, PostgresStore};
use crate::ports::GeometryStore;

const DATASET_COLUMNS: &str = "id, project_id, name, description, source_type, metadata, \
                               feature_count, created_at, updated_at";

fn dataset_from_row(row: &PgRow) -> Result<Dataset> {
    let source_type: String = row.get("source_type");
    let metadata: serde_json::Value = row.get("metadata");

    Ok(Dataset {
        id: DatasetId(row.get("id")),
        project_id: ProjectId(row.get("project_id")),
        name: row.get("name"),
        description: row.get("description"),
        source_type: source_type.parse()?,
        metadata: match metadata {
            serde_json::Value::Object(map) => map,
            _ => Default::default(),
        },
        feature_count: row.get::<i64, _>("feature_count") as usize,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn feature_from_row(row: &PgRow) -> Result<SpatialFeature> {
    let id: Uuid = row.get("id");
    let geometry_json: serde_json::Value = row.get("geometry");
    let geometry = Geometry::from_geojson(&geometry_json).ok_or_else(|| {
        GeoscopeError::Storage(format!("Feature {} has an unreadable stored geometry", id))
    })?;
    let properties: serde_json::Value = row.get("properties");

    Ok(SpatialFeature {
        id: FeatureId(id),
        dataset_id: DatasetId(row.get("dataset_id")),
        geometry,
        properties: match properties {
            serde_json::Value::Object(map) => map,
            _ => Default::default(),
        },
    })
}

#[async_trait]
impl GeometryStore for PostgresStore {
    async fn create_dataset(&self, dataset: NewDataset) -> Result<Dataset> {
        dataset.validate()?;
        let dataset = dataset.into_dataset(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO datasets (id, project_id, name, description, source_type, metadata,
                                  feature_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8)
            "#,
        )
        .bind(dataset.id.0)
        .bind(dataset.project_id.0)
        .bind(&dataset.name)
        .bind(&dataset.description)
        .bind(dataset.source_type.as_str())
        .bind(serde_json::Value::Object(dataset.metadata.clone()))
        .bind(dataset.created_at)
        .bind(dataset.updated_at)
        .execute(self.pool())
        .await
        .map_err(storage_error("Failed to create dataset"))?;

        tracing::debug!(dataset_id = %dataset.id, name = %dataset.name, "Dataset created");
        Ok(dataset)
    }

    async fn get_dataset(&self, id: DatasetId) -> Result<Option<Dataset>> {
        let row = sqlx::query(&format!("SELECT {} FROM datasets WHERE id = $1", DATASET_COLUMNS))
            .bind(id.0)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error("Failed to get dataset"))?;

        row.as_ref().map(dataset_from_row).transpose()
    }

    async fn list_datasets(&self, project: Option<ProjectId>) -> Result<Vec<Dataset>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM datasets WHERE ($1::uuid IS NULL OR project_id = $1) \
             ORDER BY created_at, id",
            DATASET_COLUMNS
        ))
        .bind(project.map(|p| p.0))
        .fetch_all(self.pool())
        .await
        .map_err(storage_error("Failed to list datasets"))?;

        rows.iter().map(dataset_from_row).collect()
    }

    async fn update_dataset(&self, id: DatasetId, update: DatasetUpdate) -> Result<Dataset> {
        update.validate()?;

        let mut tx = self.pool().begin().await.map_err(storage_error("Failed to begin transaction"))?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM datasets WHERE id = $1 FOR UPDATE",
            DATASET_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error("Failed to load dataset"))?
        .ok_or_else(|| GeoscopeError::not_found("Dataset", id))?;

        let mut dataset = dataset_from_row(&row)?;
        update.apply(&mut dataset, Utc::now());

        sqlx::query(
            "UPDATE datasets SET name = $2, description = $3, metadata = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(id.0)
        .bind(&dataset.name)
        .bind(&dataset.description)
        .bind(serde_json::Value::Object(dataset.metadata.clone()))
        .bind(dataset.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_error("Failed to update dataset"))?;

        tx.commit().await.map_err(storage_error("Failed to commit transaction"))?;
        Ok(dataset)
    }

    async fn delete_dataset(&self, id: DatasetId) -> Result<()> {
        let mut tx = self.pool().begin().await.map_err(storage_error("Failed to begin transaction"))?;

        // Row lock conflicts with the FOR SHARE taken by create_task
        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM datasets WHERE id = $1 FOR UPDATE")
                .bind(id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error("Failed to lock dataset"))?;
        if exists.is_none() {
            return Err(GeoscopeError::not_found("Dataset", id));
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM analysis_tasks \
             WHERE dataset_id = $1 AND status IN ('pending', 'processing')",
        )
        .bind(id.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error("Failed to count active tasks"))?;

        if active > 0 {
            return Err(GeoscopeError::conflict(format!(
                "dataset {} has {} pending or processing analysis tasks",
                id, active
            )));
        }

        sqlx::query("DELETE FROM datasets WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(storage_error("Failed to delete dataset"))?;

        tx.commit().await.map_err(storage_error("Failed to commit transaction"))?;
        tracing::debug!(dataset_id = %id, "Dataset deleted");
        Ok(())
    }

    async fn ingest_features(
        &self,
        dataset: DatasetId,
        features: Vec<NewFeature>,
    ) -> Result<Vec<FeatureId>> {
        if self.get_dataset(dataset).await?.is_none() {
            return Err(GeoscopeError::not_found("Dataset", dataset));
        }

        let geometries = validate_batch(&features)?;

        let mut tx = self.pool().begin().await.map_err(storage_error("Failed to begin transaction"))?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM datasets WHERE id = $1 FOR UPDATE")
                .bind(dataset.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error("Failed to lock dataset"))?;
        if exists.is_none() {
            return Err(GeoscopeError::not_found("Dataset", dataset));
        }

        let mut ids = Vec::with_capacity(features.len());
        for (feature, geometry) in features.into_iter().zip(geometries) {
            let id = FeatureId::new();
            let geometry_json = geometry.to_geojson();

            sqlx::query(
                r#"
                INSERT INTO features (id, dataset_id, geom, geometry, properties)
                VALUES ($1, $2, ST_SetSRID(ST_GeomFromGeoJSON($3), 4326), $4, $5)
                "#,
            )
            .bind(id.0)
            .bind(dataset.0)
            .bind(geometry_json.to_string())
            .bind(&geometry_json)
            .bind(serde_json::Value::Object(feature.properties))
            .execute(&mut *tx)
            .await
            .map_err(storage_error("Failed to store feature"))?;

            ids.push(id);
        }

        sqlx::query(
            "UPDATE datasets SET feature_count = feature_count + $2, updated_at = $3 WHERE id = $1",
        )
        .bind(dataset.0)
        .bind(ids.len() as i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(storage_error("Failed to update feature count"))?;

        tx.commit().await.map_err(storage_error("Failed to commit transaction"))?;

        tracing::debug!(dataset_id = %dataset, count = ids.len(), "Features ingested");
        Ok(ids)
    }

    async fn query_bounding_box(
        &self,
        dataset: DatasetId,
        envelope: &Envelope,
    ) -> Result<Vec<SpatialFeature>> {
        envelope.validate()?;

        if self.get_dataset(dataset).await?.is_none() {
            return Err(GeoscopeError::not_found("Dataset", dataset));
        }

        // GiST candidate lookup; the exact closed test runs below
        let rows = sqlx::query(
            r#"
            SELECT id, dataset_id, geometry, properties
            FROM features
            WHERE dataset_id = $1
              AND geom && ST_MakeEnvelope($2, $3, $4, $5, 4326)
            ORDER BY id
            "#,
        )
        .bind(dataset.0)
        .bind(envelope.min_lon)
        .bind(envelope.min_lat)
        .bind(envelope.max_lon)
        .bind(envelope.max_lat)
        .fetch_all(self.pool())
        .await
        .map_err(storage_error("Failed to execute bounding box query"))?;

        let mut features = Vec::with_capacity(rows.len());
        for row in &rows {
            let feature = feature_from_row(row)?;
            if intersects_envelope(&feature.geometry, envelope) {
                features.push(feature);
            }
        }
        Ok(features)
    }

    async fn features_for_dataset(&self, dataset: DatasetId) -> Result<Vec<SpatialFeature>> {
        if self.get_dataset(dataset).await?.is_none() {
            return Err(GeoscopeError::not_found("Dataset", dataset));
        }

        let rows = sqlx::query(
            "SELECT id, dataset_id, geometry, properties FROM features \
             WHERE dataset_id = $1 ORDER BY id",
        )
        .bind(dataset.0)
        .fetch_all(self.pool())
        .await
        .map_err(storage_error("Failed to get features for dataset"))?;

        rows.iter().map(feature_from_row).collect()
    }

    async fn get_feature(&self, id: FeatureId) -> Result<Option<SpatialFeature>> {
        let row = sqlx::query(
            "SELECT id, dataset_id, geometry, properties FROM features WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error("Failed to get feature"))?;

        row.as_ref().map(feature_from_row).transpose()
    }
}
