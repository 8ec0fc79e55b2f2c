use super::command::CommandTemplate;
use crate::errors::{Result, SweepError};
use crate::model::RunDescriptor;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Runs descriptors one at a time inside a run package.
pub struct ExecutionDriver<'a> {
    template: &'a CommandTemplate,
    working_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub completed: usize,
}

impl<'a> ExecutionDriver<'a> {
    pub fn new(template: &'a CommandTemplate, working_dir: &Path) -> Self {
        Self {
            template,
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Blocks until the solver exits. A spawn failure is an error; a non-zero
    /// exit is reported through the returned status.
    pub fn execute(&self, run: &RunDescriptor) -> Result<ExitStatus> {
        tracing::debug!(run_id = run.run_id, instance = %run.instance(), "starting run");
        self.template
            .command(run, &self.working_dir)
            .status()
            .map_err(|e| SweepError::io(&self.working_dir, e))
    }

    /// Executes `runs` in order and stops at the first non-zero exit.
    pub fn execute_batch(&self, runs: &[RunDescriptor]) -> Result<BatchOutcome> {
        let total = runs.len();
        for (i, run) in runs.iter().enumerate() {
            let status = self.execute(run)?;
            if !status.success() {
                tracing::error!(
                    event = "sweep.execute.run_failed",
                    run_id = run.run_id,
                    code = ?status.code(),
                    remaining = total - i - 1,
                    "aborting batch"
                );
                return Err(SweepError::ExecutionFailed {
                    run_id: run.run_id,
                    code: status.code(),
                });
            }
            tracing::info!(run_id = run.run_id, "completed {} out of {}", i + 1, total);
        }
        Ok(BatchOutcome { completed: total })
    }
}
