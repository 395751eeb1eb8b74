pub mod analysis;
pub mod dataset;
pub mod event;
pub mod feature;
pub mod geometry;
pub mod ids;
pub mod task;

pub use analysis::{
    AnalysisKind, AnalysisOutput, AnalysisParams, ChangeDetectionParams, ChangeRegion, Detection,
    DetectionParams, LandCoverClass, SegmentRegion, SegmentationArchitecture, SegmentationParams,
};
pub use dataset::{Dataset, DatasetStats, DatasetUpdate, NewDataset, SourceType};
pub use event::{Scope, TaskStatusEvent};
pub use feature::{NewFeature, SpatialFeature};
pub use geometry::{Envelope, Geometry, GeometryType};
pub use ids::{DatasetId, FeatureId, ProjectId, TaskId};
pub use task::{AnalysisTask, TaskFilter, TaskStatus, TransitionPayload};
