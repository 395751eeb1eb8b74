//! GeoScope Core - Domain models, error taxonomy, and configuration
//!
//! This crate contains the domain types shared by the geometry store, the task
//! ledger, the analysis client, and the orchestrator.

pub mod config;
pub mod error;
pub mod models;

pub use error::{GeoscopeError, Result};
