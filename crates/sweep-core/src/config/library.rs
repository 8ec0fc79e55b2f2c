use crate::errors::{Result, SweepError};
use std::path::{Path, PathBuf};

const GRADLE_PROPERTY_KEY: &str = "cplexLibPath=";

/// Native solver library directory: explicit setting first, then the
/// `cplexLibPath` entry of `<home>/.gradle/gradle.properties`.
pub fn resolve_library_path(explicit: Option<&Path>, home: Option<&Path>) -> Result<PathBuf> {
    let candidate = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let home = home.ok_or_else(|| SweepError::MissingDependencyPath {
                what: "solver library path".into(),
                detail: "not configured and no home directory to search".into(),
            })?;
            let props = home.join(".gradle").join("gradle.properties");
            guess_from_gradle_properties(&props)?.ok_or_else(|| {
                SweepError::MissingDependencyPath {
                    what: "solver library path".into(),
                    detail: format!("no {} entry in {}", GRADLE_PROPERTY_KEY, props.display()),
                }
            })?
        }
    };

    if !candidate.is_dir() {
        return Err(SweepError::MissingDependencyPath {
            what: "solver library path".into(),
            detail: format!("not a directory: {}", candidate.display()),
        });
    }
    tracing::debug!(library_path = %candidate.display(), "located solver library path");
    Ok(candidate)
}

pub fn guess_from_gradle_properties(props: &Path) -> Result<Option<PathBuf>> {
    if !props.is_file() {
        tracing::warn!(path = %props.display(), "gradle.properties not available");
        return Ok(None);
    }
    let content = std::fs::read_to_string(props).map_err(|e| SweepError::io(props, e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(GRADLE_PROPERTY_KEY))
        .map(|v| PathBuf::from(v.trim()))
        .filter(|p| !p.as_os_str().is_empty()))
}

pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
