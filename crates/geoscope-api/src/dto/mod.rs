mod request;
mod response;

pub use request::{
    CreateDatasetRequest, EventsQuery, FeatureQuery, ListDatasetsQuery, ListTasksQuery,
    SubmitAnalysisRequest, UpdateDatasetRequest,
};
pub use response::{
    DeleteResponse, HealthResponse, IngestResponse, SubmitAnalysisResponse, TaskResponse,
};
