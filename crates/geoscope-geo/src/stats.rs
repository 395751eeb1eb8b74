//! Summary statistics over a dataset's features

use geo::Area;
use geoscope_core::models::geometry::WGS84_EPSG;
use geoscope_core::models::{DatasetId, DatasetStats, SpatialFeature};

use crate::models::to_geo_geometry;

/// Feature count, combined bounds and planar area of a dataset
pub fn dataset_stats(dataset_id: DatasetId, features: &[SpatialFeature]) -> DatasetStats {
    let bounds = features
        .iter()
        .filter_map(|feature| feature.geometry.bounds())
        .reduce(|acc, bounds| acc.union(&bounds));

    let total_area: f64 =
        features.iter().map(|feature| to_geo_geometry(&feature.geometry).unsigned_area()).sum();
    let mean_area = (!features.is_empty()).then(|| total_area / features.len() as f64);

    DatasetStats {
        dataset_id,
        feature_count: features.len(),
        bounds: bounds.map(|envelope| envelope.to_bbox()),
        total_area,
        mean_area,
        crs: format!("EPSG:{}", WGS84_EPSG),
    }
}
