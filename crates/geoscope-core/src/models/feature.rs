use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::geometry::Geometry;
use super::ids::{DatasetId, FeatureId};

/// Spatial feature committed to a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialFeature {
    /// Unique identifier
    pub id: FeatureId,

    /// Owning dataset
    pub dataset_id: DatasetId,

    /// Validated geometry in WGS 84
    pub geometry: Geometry,

    /// Schema-less feature properties
    pub properties: Map<String, Value>,
}

/// Feature submitted for ingestion.
///
/// The geometry is optional here because ingestion boundaries (GeoJSON
/// FeatureCollections) may carry `"geometry": null`; such entries are rejected
/// as malformed before anything is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFeature {
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl NewFeature {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry: Some(geometry), properties: Map::new() }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
