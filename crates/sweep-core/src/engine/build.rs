use crate::errors::{Result, SweepError};
use std::path::Path;
use std::process::Command;

/// Runs the configured build command (if any) in `working_dir`, then checks
/// the artifact exists.
pub fn verify_artifact(build_command: Option<&[String]>, artifact: &Path, working_dir: &Path) -> Result<()> {
    let built = match build_command {
        Some([program, args @ ..]) => {
            tracing::info!(program = %program, args = ?args, "building solver artifact");
            let status = Command::new(program)
                .args(args)
                .current_dir(working_dir)
                .status()
                .map_err(|e| SweepError::ExternalBuildFailed(format!("failed to start {}: {}", program, e)))?;
            if !status.success() {
                return Err(SweepError::ExternalBuildFailed(format!(
                    "{} exited with {:?}",
                    program,
                    status.code()
                )));
            }
            true
        }
        _ => false,
    };

    if artifact.is_file() {
        tracing::info!(artifact = %artifact.display(), "prepared solver artifact");
        return Ok(());
    }
    if built {
        Err(SweepError::ExternalBuildFailed(format!(
            "build finished but {} is missing",
            artifact.display()
        )))
    } else {
        Err(SweepError::MissingDependencyPath {
            what: "solver artifact".into(),
            detail: format!("not found at {}", artifact.display()),
        })
    }
}
