//! On-disk result documents: one flat YAML mapping per completed run, named
//! `results_<run_id>.yaml`.

use crate::errors::{Result, SweepError};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub fn document_name(run_id: u64) -> String {
    format!("results_{}.yaml", run_id)
}

/// Output argument handed to the solver, relative to the run package.
pub fn package_output_path(run_id: u64) -> String {
    format!("./results/{}", document_name(run_id))
}

/// The run id is the second `_`-separated token of the file stem.
pub fn parse_run_id(file_name: &str) -> Option<u64> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    stem.split('_').nth(1)?.parse().ok()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultDocument {
    pub run_id: u64,
    pub path: PathBuf,
    /// Metric name -> textual value; `None` for an explicit null.
    pub values: BTreeMap<String, Option<String>>,
}

impl ResultDocument {
    pub fn keys(&self) -> BTreeSet<String> {
        self.values.keys().cloned().collect()
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let run_id = parse_run_id(&name).ok_or_else(|| SweepError::InvalidDocument {
            path: path.to_path_buf(),
            reason: "file name does not encode a run id (expected results_<id>.yaml)".into(),
        })?;

        let text = std::fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
        let values = parse_values(&text).map_err(|reason| SweepError::InvalidDocument {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(Self {
            run_id,
            path: path.to_path_buf(),
            values,
        })
    }
}

fn parse_values(text: &str) -> std::result::Result<BTreeMap<String, Option<String>>, String> {
    let doc: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    let map = match doc {
        serde_yaml::Value::Mapping(m) => m,
        serde_yaml::Value::Null => return Err("document is empty".into()),
        _ => return Err("document is not a mapping".into()),
    };

    let mut out = BTreeMap::new();
    for (k, v) in map {
        let key = match k {
            serde_yaml::Value::String(s) => s,
            other => return Err(format!("non-string key {:?}", other)),
        };
        let value = scalar_text(&v).ok_or_else(|| format!("value of '{}' is not a scalar", key))?;
        out.insert(key, value);
    }
    Ok(out)
}

/// Booleans keep the `True`/`False` spelling the analysis queries compare against.
fn scalar_text(v: &serde_yaml::Value) -> Option<Option<String>> {
    use serde_yaml::Value;
    match v {
        Value::Null => Some(None),
        Value::Bool(true) => Some(Some("True".into())),
        Value::Bool(false) => Some(Some("False".into())),
        Value::Number(n) => Some(Some(n.to_string())),
        Value::String(s) => Some(Some(s.clone())),
        Value::Tagged(t) => scalar_text(&t.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// A directory of result documents, usually `<package>/results`.
#[derive(Debug, Clone)]
pub struct ResultDocumentStore {
    dir: PathBuf,
}

impl ResultDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, run_id: u64) -> PathBuf {
        self.dir.join(document_name(run_id))
    }

    /// YAML files in the directory, ordered by run id (unparseable names last, by name).
    pub fn list_documents(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| SweepError::io(&self.dir, e))? {
            let entry = entry.map_err(|e| SweepError::io(&self.dir, e))?;
            let path = entry.path();
            let is_yaml = path
                .extension()
                .map(|e| e == "yaml" || e == "yml")
                .unwrap_or(false);
            if is_yaml && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort_by_key(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (parse_run_id(&name).unwrap_or(u64::MAX), name)
        });
        Ok(paths)
    }

    /// Every document in the directory. Zero documents is `NoResultsFound`.
    pub fn load_all(&self) -> Result<Vec<ResultDocument>> {
        let paths = self.list_documents()?;
        if paths.is_empty() {
            return Err(SweepError::NoResultsFound(self.dir.display().to_string()));
        }
        paths.iter().map(|p| ResultDocument::load(p)).collect()
    }

    /// Documents for the `expected` runs. A missing document for a run in
    /// `known_failed` is expected; any other gap is logged.
    pub fn collect(&self, expected: &[u64], known_failed: &BTreeSet<u64>) -> Result<Vec<ResultDocument>> {
        let mut docs = Vec::new();
        for run_id in expected {
            let path = self.path_for(*run_id);
            if path.is_file() {
                docs.push(ResultDocument::load(&path)?);
            } else if known_failed.contains(run_id) {
                tracing::debug!(run_id, "no result for failed run (skipped)");
            } else {
                tracing::warn!(run_id, path = %path.display(), "result document missing");
            }
        }
        if docs.is_empty() {
            return Err(SweepError::NoResultsFound(self.dir.display().to_string()));
        }
        Ok(docs)
    }
}
