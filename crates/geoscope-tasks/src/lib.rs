//! GeoScope Tasks - Analysis orchestration and status notifications
//!
//! This crate implements the task orchestrator that drives analysis tasks
//! through the ledger's state machine, and the relay that pushes status
//! changes to subscribers.

pub mod orchestrator;
pub mod relay;

pub use orchestrator::{OrchestratorConfig, TaskOrchestrator};
pub use relay::NotificationRelay;
