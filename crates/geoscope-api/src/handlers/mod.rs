mod analyses;
mod datasets;
mod events;
mod features;
mod health;
mod tasks;

pub use analyses::{list_analyses, submit_analysis};
pub use datasets::{
    create_dataset, delete_dataset, get_dataset, get_dataset_stats, list_datasets, update_dataset,
};
pub use events::stream_events;
pub use features::{ingest_features, query_features};
pub use health::health_check;
pub use tasks::{cancel_task, get_task, purge_task};
