//! GeoScope Store - Storage ports and adapters
//!
//! This crate defines the Geometry Store and Task Ledger ports and provides
//! an in-memory adapter plus a PostgreSQL/PostGIS adapter.

pub mod memory;
pub mod ports;
pub mod postgres;

pub use memory::MemoryStore;
pub use ports::{GeometryStore, TaskLedger};
pub use postgres::PostgresStore;
