pub mod ident;
pub mod ingest;
pub mod store;

pub use ingest::{CommitMode, IngestOptions, IngestReport, SchemaInferringIngester};
pub use store::{QueryRows, Store, TableSchema, RESULT_ID_COLUMN};
