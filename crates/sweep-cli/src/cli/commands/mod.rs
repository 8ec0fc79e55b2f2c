use super::args::*;
use anyhow::Context;
use std::path::Path;
use sweep_core::config::SweepConfig;
use sweep_core::SweepError;

pub mod generate;
pub mod ingest;
pub mod init;
pub mod query;

pub mod exit_codes {
    use sweep_core::SweepError;

    pub const OK: i32 = 0;
    pub const RUN_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;

    /// Setup problems (bad config, missing paths, unsafe names) are config
    /// errors; anything that fails while doing the work is a run failure.
    pub fn for_error(err: &anyhow::Error) -> i32 {
        match err.downcast_ref::<SweepError>() {
            Some(
                SweepError::Config(_)
                | SweepError::Yaml(_)
                | SweepError::MissingDependencyPath { .. }
                | SweepError::InvalidIdentifier(_)
                | SweepError::TableNotFound(_),
            ) => CONFIG_ERROR,
            _ => RUN_FAILED,
        }
    }
}

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => init::run(args),
        Command::Generate(args) => generate::run(args),
        Command::Ingest(args) => ingest::run(args),
        Command::Query(args) => query::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Loads `path`, or falls back to defaults anchored at the current directory
/// when the file does not exist.
pub(crate) fn load_config_or_default(path: &Path) -> anyhow::Result<SweepConfig> {
    if path.exists() {
        return sweep_core::config::load_config(path)
            .with_context(|| format!("loading {}", path.display()));
    }
    let cwd = std::env::current_dir().context("resolving current directory")?;
    tracing::warn!(
        config = %path.display(),
        "config file not found; using defaults relative to {}",
        cwd.display()
    );
    Ok(SweepConfig::with_base_dir(&cwd))
}

/// Config must exist for commands that touch the filesystem layout.
pub(crate) fn load_config_required(path: &Path) -> anyhow::Result<SweepConfig> {
    if !path.exists() {
        return Err(SweepError::Config(format!(
            "{} not found (run `sweep init` to create one)",
            path.display()
        ))
        .into());
    }
    Ok(sweep_core::config::load_config(path)?)
}
