//! Analysis kinds, their parameter shapes, and their results.
//!
//! Parameters and outputs are tagged unions keyed by `kind`. Each parameter
//! variant keeps unrecognised keys in `extra` so that backend-specific options
//! survive the round trip to the analysis service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::geometry::Geometry;
use super::ids::DatasetId;
use crate::error::{GeoscopeError, Result};

/// Requested kind of analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    ObjectDetection,
    Segmentation,
    ChangeDetection,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::ObjectDetection,
        AnalysisKind::Segmentation,
        AnalysisKind::ChangeDetection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::ObjectDetection => "object_detection",
            AnalysisKind::Segmentation => "segmentation",
            AnalysisKind::ChangeDetection => "change_detection",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = GeoscopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "object_detection" => Ok(AnalysisKind::ObjectDetection),
            "segmentation" => Ok(AnalysisKind::Segmentation),
            "change_detection" => Ok(AnalysisKind::ChangeDetection),
            other => Err(GeoscopeError::validation(
                "kind",
                format!(
                    "unknown analysis kind '{}': use object_detection, segmentation, or change_detection",
                    other
                ),
            )),
        }
    }
}

/// Parameters for object detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Minimum score for a detection to be reported
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Restrict detections to these labels (empty = all)
    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_confidence_threshold() -> f64 {
    0.5
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            labels: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Segmentation network family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationArchitecture {
    #[default]
    Unet,
    Deeplabv3,
}

/// Land cover classes produced by segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandCoverClass {
    Water,
    Vegetation,
    Urban,
    BareSoil,
    Clouds,
}

impl LandCoverClass {
    pub const ALL: [LandCoverClass; 5] = [
        LandCoverClass::Water,
        LandCoverClass::Vegetation,
        LandCoverClass::Urban,
        LandCoverClass::BareSoil,
        LandCoverClass::Clouds,
    ];
}

/// Parameters for land cover segmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationParams {
    #[serde(default)]
    pub architecture: SegmentationArchitecture,

    #[serde(default = "default_classes")]
    pub classes: Vec<LandCoverClass>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_classes() -> Vec<LandCoverClass> {
    LandCoverClass::ALL.to_vec()
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            architecture: SegmentationArchitecture::default(),
            classes: default_classes(),
            extra: Map::new(),
        }
    }
}

/// Parameters for change detection between two acquisitions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeDetectionParams {
    /// Dataset holding the "before" acquisition
    #[serde(default)]
    pub baseline_dataset: Option<DatasetId>,

    /// Smallest change area worth reporting, in square meters
    #[serde(default)]
    pub min_area: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Analysis parameters, one shape per analysis kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisParams {
    ObjectDetection(DetectionParams),
    Segmentation(SegmentationParams),
    ChangeDetection(ChangeDetectionParams),
}

impl AnalysisParams {
    /// Build typed parameters from a kind and an opaque JSON payload
    pub fn from_payload(kind: AnalysisKind, payload: Value) -> Result<Self> {
        let mut map = match payload {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => {
                return Err(GeoscopeError::validation("params", "parameters must be a JSON object"))
            }
        };

        // `kind` is the union tag; an echo of the requested kind is dropped
        if let Some(tag) = map.remove("kind") {
            if tag.as_str() != Some(kind.as_str()) {
                return Err(GeoscopeError::validation(
                    "params.kind",
                    format!("conflicts with requested kind '{}': {}", kind, tag),
                ));
            }
        }
        let payload = Value::Object(map);

        let invalid = |e: serde_json::Error| GeoscopeError::validation("params", e.to_string());
        let params = match kind {
            AnalysisKind::ObjectDetection => {
                AnalysisParams::ObjectDetection(serde_json::from_value(payload).map_err(invalid)?)
            }
            AnalysisKind::Segmentation => {
                AnalysisParams::Segmentation(serde_json::from_value(payload).map_err(invalid)?)
            }
            AnalysisKind::ChangeDetection => {
                AnalysisParams::ChangeDetection(serde_json::from_value(payload).map_err(invalid)?)
            }
        };

        params.validate()?;
        Ok(params)
    }

    /// Default parameters for a kind
    pub fn defaults(kind: AnalysisKind) -> Self {
        match kind {
            AnalysisKind::ObjectDetection => AnalysisParams::ObjectDetection(Default::default()),
            AnalysisKind::Segmentation => AnalysisParams::Segmentation(Default::default()),
            AnalysisKind::ChangeDetection => AnalysisParams::ChangeDetection(Default::default()),
        }
    }

    /// Unknown keys forwarded verbatim to the backend
    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            AnalysisParams::ObjectDetection(p) => &p.extra,
            AnalysisParams::Segmentation(p) => &p.extra,
            AnalysisParams::ChangeDetection(p) => &p.extra,
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisParams::ObjectDetection(_) => AnalysisKind::ObjectDetection,
            AnalysisParams::Segmentation(_) => AnalysisKind::Segmentation,
            AnalysisParams::ChangeDetection(_) => AnalysisKind::ChangeDetection,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extra().contains_key("kind") {
            return Err(GeoscopeError::validation(
                "params.kind",
                "reserved for the analysis kind and cannot be an extra parameter",
            ));
        }

        match self {
            AnalysisParams::ObjectDetection(p) => {
                if !(0.0..=1.0).contains(&p.confidence_threshold) {
                    return Err(GeoscopeError::validation(
                        "params.confidence_threshold",
                        format!("must be within [0, 1], got {}", p.confidence_threshold),
                    ));
                }
            }
            AnalysisParams::Segmentation(p) => {
                if p.classes.is_empty() {
                    return Err(GeoscopeError::validation(
                        "params.classes",
                        "at least one land cover class is required",
                    ));
                }
            }
            AnalysisParams::ChangeDetection(p) => {
                if let Some(area) = p.min_area {
                    if !area.is_finite() || area < 0.0 {
                        return Err(GeoscopeError::validation(
                            "params.min_area",
                            format!("must be a non-negative number, got {}", area),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// One detected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
    /// `[minX, minY, maxX, maxY]`
    pub bbox: [f64; 4],
    pub geometry: Geometry,
}

/// One segmented land cover region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRegion {
    pub class: LandCoverClass,
    pub confidence: f64,
    pub geometry: Geometry,
    pub area: f64,
}

/// One detected change between acquisitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRegion {
    pub change_type: String,
    pub confidence: f64,
    pub geometry: Geometry,
    pub area: f64,
}

/// Result payload attached to a completed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutput {
    ObjectDetection { detections: Vec<Detection> },
    Segmentation { segments: Vec<SegmentRegion> },
    ChangeDetection { changes: Vec<ChangeRegion> },
}

impl AnalysisOutput {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisOutput::ObjectDetection { .. } => AnalysisKind::ObjectDetection,
            AnalysisOutput::Segmentation { .. } => AnalysisKind::Segmentation,
            AnalysisOutput::ChangeDetection { .. } => AnalysisKind::ChangeDetection,
        }
    }

    /// Number of result items
    pub fn len(&self) -> usize {
        match self {
            AnalysisOutput::ObjectDetection { detections } => detections.len(),
            AnalysisOutput::Segmentation { segments } => segments.len(),
            AnalysisOutput::ChangeDetection { changes } => changes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn confidences(&self) -> Vec<f64> {
        match self {
            AnalysisOutput::ObjectDetection { detections } => {
                detections.iter().map(|d| d.confidence).collect()
            }
            AnalysisOutput::Segmentation { segments } => {
                segments.iter().map(|s| s.confidence).collect()
            }
            AnalysisOutput::ChangeDetection { changes } => {
                changes.iter().map(|c| c.confidence).collect()
            }
        }
    }

    /// Check the output against the kind that was requested
    pub fn validate_for(&self, expected: AnalysisKind) -> Result<()> {
        if self.kind() != expected {
            return Err(GeoscopeError::validation(
                "output.kind",
                format!("expected {} result, received {}", expected, self.kind()),
            ));
        }
        if let Some((index, confidence)) = self
            .confidences()
            .into_iter()
            .enumerate()
            .find(|(_, c)| !(0.0..=1.0).contains(c))
        {
            return Err(GeoscopeError::validation(
                "output.confidence",
                format!("item {} has confidence {} outside [0, 1]", index, confidence),
            ));
        }
        Ok(())
    }
}
