use crate::errors::{Result, SweepError};
use crate::on_error::MismatchPolicy;
use crate::storage::ingest::CommitMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod library;
pub mod path_resolver;

use path_resolver::PathResolver;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Everything the pipeline needs, loaded once at start-up and passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_version", rename = "configVersion", alias = "version")]
    pub version: u32,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub ingest: IngestSettings,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            paths: PathSettings::default(),
            solver: SolverSettings::default(),
            catalog: CatalogSettings::default(),
            ingest: IngestSettings::default(),
        }
    }
}

fn default_version() -> u32 {
    SUPPORTED_CONFIG_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Root of the instance tree (`<data_dir>/<group>/<file>`).
    pub data_dir: PathBuf,
    /// Parent directory for generated run packages.
    pub package_root: PathBuf,
    /// Generator working directory; run-files are drafted here and removed.
    pub scratch_dir: PathBuf,
    pub instance_manifest: PathBuf,
    pub artifact: PathBuf,
    /// Copied into every run package next to the run-file (e.g. batch submit scripts).
    pub bundle_files: Vec<PathBuf>,
    pub results_dir: PathBuf,
    pub database: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            package_root: PathBuf::from("."),
            scratch_dir: PathBuf::from(".sweep"),
            instance_manifest: PathBuf::from("final-results/instances.csv"),
            artifact: PathBuf::from("build/libs/uber.jar"),
            bundle_files: Vec::new(),
            results_dir: PathBuf::from("results"),
            database: PathBuf::from("final-results/results.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub program: String,
    pub min_heap: String,
    pub max_heap: String,
    /// Native library directory; guessed from gradle.properties when unset.
    pub library_path: Option<PathBuf>,
    /// File name of the artifact inside a run package.
    pub artifact_name: String,
    /// Optional command that produces the artifact, e.g. `[gradle, clean, uberjar]`.
    pub build_command: Option<Vec<String>>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            program: "java".into(),
            min_heap: "32m".into(),
            max_heap: "32g".into(),
            library_path: None,
            artifact_name: "uber.jar".into(),
            build_command: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub extension: String,
    pub exclude_groups: Vec<String>,
    pub discretizations: Vec<u32>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            extension: "txt".into(),
            exclude_groups: vec!["_100_".into(), "_102_".into()],
            discretizations: vec![2, 4, 6],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub table: String,
    pub on_mismatch: MismatchPolicy,
    pub commit: CommitMode,
    pub create_missing_table: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            table: "search_comparison".into(),
            on_mismatch: MismatchPolicy::default(),
            commit: CommitMode::default(),
            create_missing_table: true,
        }
    }
}

impl SweepConfig {
    /// Defaults with relative paths anchored at `base_dir`.
    pub fn with_base_dir(base_dir: &Path) -> Self {
        let mut cfg = Self::default();
        cfg.normalize_paths(&PathResolver::with_base_dir(base_dir));
        cfg
    }

    fn normalize_paths(&mut self, r: &PathResolver) {
        let p = &mut self.paths;
        r.resolve(&mut p.data_dir);
        r.resolve(&mut p.package_root);
        r.resolve(&mut p.scratch_dir);
        r.resolve(&mut p.instance_manifest);
        r.resolve(&mut p.artifact);
        r.resolve(&mut p.results_dir);
        r.resolve(&mut p.database);
        for f in &mut p.bundle_files {
            r.resolve(f);
        }
        r.resolve_opt(&mut self.solver.library_path);
    }
}

pub fn load_config(path: &Path) -> Result<SweepConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SweepError::Config(format!("failed to read config {}: {}", path.display(), e)))?;

    let mut ignored_keys = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(&raw);
    let mut cfg: SweepConfig = serde_ignored::deserialize(deserializer, |p| {
        ignored_keys.insert(p.to_string());
    })
    .map_err(|e| SweepError::Config(format!("failed to parse YAML {}: {}", path.display(), e)))?;

    if !ignored_keys.is_empty() {
        tracing::warn!(
            config = %path.display(),
            keys = ?ignored_keys,
            "ignored unknown config fields"
        );
    }

    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(SweepError::Config(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }

    if cfg.catalog.discretizations.is_empty() {
        return Err(SweepError::Config("catalog.discretizations must not be empty".into()));
    }
    let ext = cfg.catalog.extension.trim_start_matches('.').to_string();
    cfg.catalog.extension = ext;

    cfg.normalize_paths(&PathResolver::new(path));
    Ok(cfg)
}

pub const SAMPLE_CONFIG: &str = r#"configVersion: 1
paths:
  data_dir: data
  package_root: .
  scratch_dir: .sweep
  instance_manifest: final-results/instances.csv
  artifact: build/libs/uber.jar
  bundle_files: []
  results_dir: results
  database: final-results/results.db
solver:
  program: java
  min_heap: 32m
  max_heap: 32g
  # library_path: /opt/ibm/ILOG/CPLEX_Studio/cplex/bin/x86-64_linux
  artifact_name: uber.jar
catalog:
  extension: txt
  exclude_groups: ["_100_", "_102_"]
  discretizations: [2, 4, 6]
ingest:
  table: search_comparison
  on_mismatch: abort
  commit: batch
  create_missing_table: true
"#;

pub fn write_sample_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SweepError::io(parent, e))?;
    }
    std::fs::write(path, SAMPLE_CONFIG).map_err(|e| SweepError::io(path, e))
}
