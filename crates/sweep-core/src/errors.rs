use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SweepError>;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("no cases found in {source_desc}")]
    EmptyCaseSet { source_desc: String },

    #[error("no cases to expand into runs")]
    NoCasesToExpand,

    #[error("missing dependency path: {what} ({detail})")]
    MissingDependencyPath { what: String, detail: String },

    #[error("external build failed: {0}")]
    ExternalBuildFailed(String),

    #[error("run {run_id} failed with exit code {code:?}")]
    ExecutionFailed { run_id: u64, code: Option<i32> },

    #[error("no result documents found in {0}")]
    NoResultsFound(String),

    #[error(
        "schema mismatch in {document}: table '{table}' expects {expected:?}, document has {found:?}"
    )]
    SchemaMismatch {
        table: String,
        document: String,
        expected: BTreeSet<String>,
        found: BTreeSet<String>,
    },

    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("invalid identifier '{0}' (expected [A-Za-z_][A-Za-z0-9_]*)")]
    InvalidIdentifier(String),

    #[error("invalid result document {path}: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl SweepError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SweepError::Io {
            path: path.into(),
            source,
        }
    }

    /// A mismatching document can be skipped; every other kind aborts the operation.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, SweepError::SchemaMismatch { .. })
    }
}
