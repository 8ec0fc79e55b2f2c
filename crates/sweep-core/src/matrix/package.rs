use crate::errors::{Result, SweepError};
use crate::model::ProblemInstance;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATA_DIR: &str = "data";
pub const OUTPUT_DIR: &str = "output";
pub const RESULTS_DIR: &str = "results";
pub const MANIFEST_FILE: &str = "batch.json";

/// A staged, self-contained directory that can run a batch without the source tree.
#[derive(Debug, Clone)]
pub struct RunPackage {
    pub root: PathBuf,
    pub run_file: PathBuf,
    pub manifest_path: PathBuf,
    pub fingerprint: String,
}

impl RunPackage {
    pub fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchManifest {
    pub schema_version: u32,
    pub kind: String,
    pub package: String,
    pub runs: usize,
    pub run_file: String,
    pub fingerprint: String,
    pub created_at: String,
    pub sweep_version: String,
}

impl BatchManifest {
    pub fn new(kind: &str, package: &str, runs: usize, fingerprint: &str) -> Self {
        Self {
            schema_version: 1,
            kind: kind.to_string(),
            package: package.to_string(),
            runs,
            run_file: format!("{}_runs.txt", package),
            fingerprint: fingerprint.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            sweep_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| SweepError::io(path, e))?;
        Ok(serde_json::from_reader(file)?)
    }
}

pub(crate) struct PackageLayout {
    root: PathBuf,
    name: String,
}

impl PackageLayout {
    pub(crate) fn new(root: PathBuf, name: &str) -> Self {
        Self {
            root,
            name: name.to_string(),
        }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn run_file_name(&self) -> String {
        format!("{}_runs.txt", self.name)
    }

    pub(crate) fn create_tree(&self) -> Result<()> {
        for sub in [DATA_DIR, OUTPUT_DIR, RESULTS_DIR] {
            let p = self.root.join(sub);
            std::fs::create_dir_all(&p).map_err(|e| SweepError::io(&p, e))?;
        }
        tracing::debug!(package = %self.root.display(), "created package tree");
        Ok(())
    }

    pub(crate) fn stage_instance(&self, data_root: &Path, instance: &ProblemInstance) -> Result<()> {
        let src = instance.source_path(data_root);
        let dst = instance.source_path(&self.root.join(DATA_DIR));
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SweepError::io(parent, e))?;
        }
        copy_atomic(&src, &dst)?;
        tracing::debug!(src = %src.display(), dst = %dst.display(), "staged {}", instance);
        Ok(())
    }

    pub(crate) fn stage_artifact(&self, artifact: &Path, artifact_name: &str) -> Result<()> {
        if !artifact.is_file() {
            return Err(SweepError::MissingDependencyPath {
                what: "solver artifact".into(),
                detail: format!("not found at {}", artifact.display()),
            });
        }
        copy_atomic(artifact, &self.root.join(artifact_name))
    }

    pub(crate) fn bundle_run_file(&self, scratch: &Path) -> Result<PathBuf> {
        let dst = self.root.join(self.run_file_name());
        copy_atomic(scratch, &dst)?;
        Ok(dst)
    }

    pub(crate) fn bundle_file(&self, src: &Path) -> Result<()> {
        let name = src.file_name().ok_or_else(|| SweepError::MissingDependencyPath {
            what: "bundle file".into(),
            detail: format!("no file name in {}", src.display()),
        })?;
        if !src.is_file() {
            return Err(SweepError::MissingDependencyPath {
                what: "bundle file".into(),
                detail: format!("not found at {}", src.display()),
            });
        }
        copy_atomic(src, &self.root.join(name))
    }

    pub(crate) fn write_manifest(&self, manifest: &BatchManifest) -> Result<PathBuf> {
        let path = self.root.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(manifest)?;
        std::fs::write(&path, json).map_err(|e| SweepError::io(&path, e))?;
        Ok(path)
    }
}

/// Copies through a sibling temp file so `dst` is either absent or complete.
fn copy_atomic(src: &Path, dst: &Path) -> Result<()> {
    let mut tmp = dst.as_os_str().to_owned();
    tmp.push(".partial");
    let tmp = PathBuf::from(tmp);
    std::fs::copy(src, &tmp).map_err(|e| SweepError::io(src, e))?;
    std::fs::rename(&tmp, dst).map_err(|e| SweepError::io(dst, e))?;
    Ok(())
}
