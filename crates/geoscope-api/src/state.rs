use geoscope_store::ports::{GeometryStore, TaskLedger};
use geoscope_tasks::TaskOrchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GeometryStore>,
    pub ledger: Arc<dyn TaskLedger>,
    pub orchestrator: TaskOrchestrator,
    /// Reported by the health endpoint
    pub storage_backend: &'static str,
}

impl AppState {
    pub fn new(
        store: Arc<dyn GeometryStore>,
        ledger: Arc<dyn TaskLedger>,
        orchestrator: TaskOrchestrator,
        storage_backend: &'static str,
    ) -> Self {
        Self { store, ledger, orchestrator, storage_backend }
    }
}
