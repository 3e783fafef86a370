// src/lib.rs
pub mod api;
pub mod config;
pub mod engine;
pub mod extract;
pub mod scanner;
pub mod schema;
pub mod search;
pub mod service;
pub mod sync;

pub use api::{SearchRequest, SearchResponse};
pub use config::AppConfig;
pub use engine::{IndexError, IndexStore, IndexTransaction, WriteAccess};
pub use schema::{DocumentSummary, IndexedDocument, Snapshot};
pub use search::{QueryEngine, QueryError};
pub use service::{ErrorClass, NotebookIndex, ServiceError};
pub use sync::{SyncEngine, SyncError, SyncOutcome, SyncStats};
