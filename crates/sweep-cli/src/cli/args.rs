use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use sweep_core::model::RunKind;
use sweep_core::query::Category;

#[derive(Parser)]
#[command(
    name = "sweep",
    version,
    about = "Generate, run and ingest solver benchmark batches"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,

    /// Log output format (filter with SWEEP_LOG)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a sample sweep.yaml
    Init(InitArgs),
    /// Stage run packages (and optionally execute them)
    Generate(GenerateArgs),
    /// Load result documents into the results database
    Ingest(IngestArgs),
    /// Analysis queries over ingested tables
    Query(QueryArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "sweep.yaml")]
    pub config: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long, default_value = "sweep.yaml")]
    pub config: PathBuf,

    /// Run kinds to generate, e.g. `--kind exhaustive --kind simple`
    #[arg(long = "kind", required = true, num_args = 1..)]
    pub kinds: Vec<RunKind>,

    /// Do not build or copy the solver artifact into the package
    #[arg(long)]
    pub no_artifact: bool,

    /// Native solver library directory (overrides config and gradle.properties)
    #[arg(long, env = "SWEEP_LIBRARY_PATH")]
    pub library_path: Option<PathBuf>,

    /// Execute every generated run after staging, stopping at the first failure
    #[arg(long)]
    pub execute: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = "sweep.yaml")]
    pub config: PathBuf,

    /// Destination table (default: ingest.table from config)
    #[arg(long)]
    pub table: Option<String>,

    /// Directory of results_<id>.yaml documents (default: paths.results_dir,
    /// or the package's results/ with --expected-from)
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Ingest only the runs listed by this package manifest (batch.json)
    #[arg(long, value_name = "BATCH_JSON")]
    pub expected_from: Option<PathBuf>,

    /// Run ids known to have failed; their missing documents are not reported
    #[arg(long, value_delimiter = ',', requires = "expected_from")]
    pub known_failed: Vec<u64>,

    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Record mismatching documents as skipped instead of aborting
    #[arg(long)]
    pub skip_mismatched: bool,

    /// Commit after every document instead of once per batch
    #[arg(long)]
    pub per_document_commit: bool,

    /// Fail when the table does not exist yet
    #[arg(long)]
    pub require_table: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug, Clone)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub cmd: QuerySub,
}

#[derive(Subcommand, Debug, Clone)]
pub enum QuerySub {
    /// Count runs of one outcome category at one discretization level
    Count(CountArgs),
    /// Per-instance metrics side by side for several discretization levels
    Pivot(PivotArgs),
    /// Relative improvement of one table over another on a metric
    Compare(CompareArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct QueryCommon {
    #[arg(long, default_value = "sweep.yaml")]
    pub config: PathBuf,

    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Only keep instances whose path contains this text
    #[arg(long)]
    pub group: Option<String>,

    /// Print the statement and its parameters without running it
    #[arg(long)]
    pub sql_only: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CountArgs {
    #[arg(long)]
    pub table: String,

    /// optimal | infeasible | timed-out
    #[arg(long)]
    pub category: Category,

    #[arg(long)]
    pub discretization: u32,

    #[command(flatten)]
    pub common: QueryCommon,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PivotArgs {
    #[arg(long)]
    pub table: String,

    #[arg(long, value_delimiter = ',', default_value = "2,4,6")]
    pub levels: Vec<u32>,

    #[command(flatten)]
    pub common: QueryCommon,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long)]
    pub baseline: String,

    #[arg(long)]
    pub variant: String,

    #[arg(long, default_value = sweep_core::query::SOLUTION_TIME)]
    pub metric: String,

    #[command(flatten)]
    pub common: QueryCommon,
}
