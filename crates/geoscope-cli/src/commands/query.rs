//! Query command implementation

use crate::cli::QueryArgs;
use crate::client::ApiClient;
use crate::output::{truncate, OutputWriter};
use anyhow::{Context, Result};
use geojson::{feature::Id, Feature};
use geoscope_core::models::Envelope;
use tabled::Tabled;

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Geometry")]
    geometry: &'static str,
    #[tabled(rename = "Properties")]
    properties: String,
}

impl From<&Feature> for FeatureRow {
    fn from(feature: &Feature) -> Self {
        let id = match &feature.id {
            Some(Id::String(id)) => id.clone(),
            Some(Id::Number(n)) => n.to_string(),
            None => "-".to_string(),
        };

        let properties = feature.properties.clone().unwrap_or_default();

        Self {
            id,
            geometry: feature.geometry.as_ref().map_or("-", |g| geometry_name(&g.value)),
            properties: truncate(&serde_json::Value::Object(properties).to_string(), 48),
        }
    }
}

fn geometry_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

pub async fn execute(args: QueryArgs, client: &ApiClient, output: &OutputWriter) -> Result<()> {
    // Reject malformed boxes before going over the wire
    let bbox = args
        .bbox
        .as_deref()
        .map(|raw| {
            let envelope =
                Envelope::parse_bbox(raw).with_context(|| format!("Invalid --bbox '{}'", raw))?;
            Ok::<_, anyhow::Error>(format!(
                "{},{},{},{}",
                envelope.min_lon, envelope.min_lat, envelope.max_lon, envelope.max_lat
            ))
        })
        .transpose()?;

    let collection = client.query_features(args.dataset, bbox.as_deref()).await?;

    if output.is_json() {
        return output.result(&collection);
    }

    let heading = match &bbox {
        Some(bbox) => format!("Features within [{}] ({})", bbox, collection.features.len()),
        None => format!("Features ({})", collection.features.len()),
    };
    output.section(heading);
    output.table(collection.features.iter().map(FeatureRow::from).collect());
    Ok(())
}
