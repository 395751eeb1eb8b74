//! GeoScope Geo - Geometry validation and spatial operations
//!
//! This crate handles the geometric side of the store: validating incoming
//! geometries, closed-envelope intersection tests, the R-tree index used for
//! bounding-box queries, dataset summary statistics, and GeoJSON
//! FeatureCollection conversion.

pub mod features;
pub mod index;
pub mod models;
pub mod spatial;
pub mod stats;
pub mod validation;

pub use index::SpatialIndex;
pub use spatial::intersects_envelope;
pub use stats::dataset_stats;
pub use validation::{validate_batch, validate_geometry};
