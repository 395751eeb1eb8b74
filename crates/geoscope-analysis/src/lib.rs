//! GeoScope Analysis - Client for the external AI analysis service
//!
//! This crate defines the `AnalysisService` port used by the orchestrator,
//! a retrying `AnalysisClient` over any `AnalysisBackend`, and the reqwest
//! based HTTP backend.

pub mod client;
pub mod error;
pub mod http;
pub mod retry;

pub use client::{AnalysisBackend, AnalysisClient, AnalysisRequest, AnalysisService};
pub use error::{AnalysisError, BackendError};
pub use http::HttpAnalysisBackend;
pub use retry::RetryPolicy;
