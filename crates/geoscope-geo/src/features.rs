//! GeoJSON FeatureCollection conversion at the store boundary.

use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, JsonObject};
use geoscope_core::error::{GeoscopeError, Result};
use geoscope_core::models::{Geometry, NewFeature, SpatialFeature};

/// Parse GeoJSON text (FeatureCollection, Feature, or bare Geometry) into
/// features ready for ingestion.
///
/// Features with `"geometry": null` are kept with no geometry so the store
/// rejects the batch with their index. Unsupported geometry types such as
/// GeometryCollection are reported as malformed here.
pub fn parse_features(content: &str) -> Result<Vec<NewFeature>> {
    let geojson: GeoJson = content
        .parse()
        .map_err(|e| GeoscopeError::validation("features", format!("invalid GeoJSON: {}", e)))?;
    from_geojson(geojson)
}

/// Parse an already-decoded JSON value
pub fn parse_features_value(value: serde_json::Value) -> Result<Vec<NewFeature>> {
    let geojson = GeoJson::from_json_value(value)
        .map_err(|e| GeoscopeError::validation("features", format!("invalid GeoJSON: {}", e)))?;
    from_geojson(geojson)
}

fn from_geojson(geojson: GeoJson) -> Result<Vec<NewFeature>> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| convert_feature(feature, index))
            .collect(),
        GeoJson::Feature(feature) => Ok(vec![convert_feature(feature, 0)?]),
        GeoJson::Geometry(geom) => {
            let geometry = convert_geometry(&geom, 0)?;
            Ok(vec![NewFeature::new(geometry)])
        }
    }
}

fn convert_feature(feature: Feature, index: usize) -> Result<NewFeature> {
    let geometry = match &feature.geometry {
        Some(geom) => Some(convert_geometry(geom, index)?),
        None => None,
    };

    Ok(NewFeature { geometry, properties: feature.properties.unwrap_or_default() })
}

fn convert_geometry(geom: &geojson::Geometry, index: usize) -> Result<Geometry> {
    let value = serde_json::to_value(geom)?;
    Geometry::from_geojson(&value).ok_or_else(|| GeoscopeError::MalformedGeometry {
        index,
        reason: format!(
            "cannot read {} geometry: only Point, LineString, Polygon and Multi* types are accepted",
            value["type"]
        ),
    })
}

/// Build a FeatureCollection; each feature carries its id, and its dataset
/// id as a `dataset_id` foreign member so user properties pass through intact
pub fn to_feature_collection(features: &[SpatialFeature]) -> FeatureCollection {
    let features = features
        .iter()
        .map(|feature| {
            let mut foreign_members = JsonObject::new();
            foreign_members.insert(
                "dataset_id".to_string(),
                serde_json::Value::from(feature.dataset_id.to_string()),
            );

            Feature {
                bbox: None,
                geometry: to_geojson_geometry(&feature.geometry),
                id: Some(Id::String(feature.id.to_string())),
                properties: Some(feature.properties.clone()),
                foreign_members: Some(foreign_members),
            }
        })
        .collect();

    FeatureCollection { bbox: None, features, foreign_members: None }
}

/// Convert a canonical geometry to a `geojson::Geometry`
pub fn to_geojson_geometry(geometry: &Geometry) -> Option<geojson::Geometry> {
    geojson::Geometry::from_json_value(geometry.to_geojson()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscope_core::models::{DatasetId, FeatureId};
    use serde_json::json;

    #[test]
    fn test_parse_feature_collection() {
        let content = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [115.26, -8.5]},
                    "properties": {"name": "Ubud"}
                },
                {
                    "type": "Feature",
                    "geometry": null,
                    "properties": {}
                }
            ]
        })
        .to_string();

        let features = parse_features(&content).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].geometry, Some(Geometry::point(115.26, -8.5)));
        assert_eq!(features[0].properties["name"], "Ubud");
        assert!(features[1].geometry.is_none());
    }

    #[test]
    fn test_parse_three_dimensional_features() {
        let content = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [106.8, -6.2, 8.0]},
                    "properties": {"name": "mast"}
                },
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[106.8, -6.2, 8.0], [106.9, -6.1, 14.0]]
                    },
                    "properties": {"name": "cable"}
                }
            ]
        })
        .to_string();

        let features = parse_features(&content).unwrap();
        assert_eq!(features[0].geometry, Some(Geometry::point(106.8, -6.2)));
        assert_eq!(
            features[1].geometry,
            Some(Geometry::line_string(vec![[106.8, -6.2], [106.9, -6.1]]))
        );
    }

    #[test]
    fn test_geometry_collection_is_malformed() {
        let content = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}, "properties": null},
                {
                    "type": "Feature",
                    "geometry": {"type": "GeometryCollection", "geometries": []},
                    "properties": null
                }
            ]
        })
        .to_string();

        match parse_features(&content) {
            Err(GeoscopeError::MalformedGeometry { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected malformed geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_is_validation_error() {
        assert!(matches!(parse_features("{not json"), Err(GeoscopeError::Validation { .. })));
    }

    #[test]
    fn test_feature_collection_output() {
        let feature = SpatialFeature {
            id: FeatureId::new(),
            dataset_id: DatasetId::new(),
            geometry: Geometry::point(106.8, -6.2),
            properties: json!({"kind": "sensor"}).as_object().unwrap().clone(),
        };

        let fc = to_feature_collection(std::slice::from_ref(&feature));
        let value = serde_json::to_value(&fc).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["id"], feature.id.to_string());
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
        assert_eq!(value["features"][0]["properties"]["kind"], "sensor");
        assert_eq!(value["features"][0]["dataset_id"], feature.dataset_id.to_string());
    }

    #[test]
    fn test_user_dataset_id_property_survives() {
        let feature = SpatialFeature {
            id: FeatureId::new(),
            dataset_id: DatasetId::new(),
            geometry: Geometry::point(1.0, 2.0),
            properties: json!({"dataset_id": "sensor-7"}).as_object().unwrap().clone(),
        };

        let value = serde_json::to_value(to_feature_collection(&[feature.clone()])).unwrap();
        assert_eq!(value["features"][0]["properties"]["dataset_id"], "sensor-7");
        assert_eq!(value["features"][0]["dataset_id"], feature.dataset_id.to_string());
    }
}
