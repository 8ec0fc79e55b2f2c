//! Problem-instance discovery.
//!
//! Cases come either from walking an instance tree (every matching file,
//! expanded against a list of discretization counts) or from a manifest that
//! names each instance together with its discretization count.

use crate::config::{CatalogSettings, SweepConfig};
use crate::errors::{Result, SweepError};
use crate::model::Case;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub enum CaseSource {
    Directory(DirectorySource),
    Manifest(PathBuf),
}

#[derive(Debug, Clone)]
pub struct DirectorySource {
    pub root: PathBuf,
    pub extension: String,
    /// Groups whose relative path contains any of these substrings are skipped.
    pub exclude_groups: Vec<String>,
    pub discretizations: Vec<u32>,
}

impl DirectorySource {
    pub fn from_settings(root: &Path, settings: &CatalogSettings) -> Self {
        Self {
            root: root.to_path_buf(),
            extension: settings.extension.clone(),
            exclude_groups: settings.exclude_groups.clone(),
            discretizations: settings.discretizations.clone(),
        }
    }

    pub fn from_config(cfg: &SweepConfig) -> Self {
        Self::from_settings(&cfg.paths.data_dir, &cfg.catalog)
    }

    fn is_excluded(&self, group: &str) -> bool {
        self.exclude_groups
            .iter()
            .filter(|s| !s.is_empty())
            .any(|s| group.contains(s.as_str()))
    }
}

impl CaseSource {
    fn describe(&self) -> String {
        match self {
            CaseSource::Directory(d) => d.root.display().to_string(),
            CaseSource::Manifest(p) => p.display().to_string(),
        }
    }
}

/// Ordered, de-duplicated cases for `source`. Never returns an empty list.
pub fn discover(source: &CaseSource) -> Result<Vec<Case>> {
    let found = match source {
        CaseSource::Directory(d) => walk_directory(d)?,
        CaseSource::Manifest(p) => read_manifest(p)?,
    };
    let cases = dedup(found);

    if cases.is_empty() {
        return Err(SweepError::EmptyCaseSet {
            source_desc: source.describe(),
        });
    }
    tracing::info!(source = %source.describe(), cases = cases.len(), "discovered cases");
    Ok(cases)
}

fn walk_directory(src: &DirectorySource) -> Result<Vec<Case>> {
    if !src.root.is_dir() {
        return Err(SweepError::MissingDependencyPath {
            what: "data folder".into(),
            detail: format!("not found at {}", src.root.display()),
        });
    }

    let walker = WalkDir::new(&src.root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            !src.is_excluded(&relative_group(&src.root, e.path()))
        });

    let mut out = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches_ext = path
            .extension()
            .map(|e| e.to_string_lossy() == src.extension.as_str())
            .unwrap_or(false);
        if !matches_ext {
            continue;
        }

        let group = path
            .parent()
            .map(|p| relative_group(&src.root, p))
            .unwrap_or_default();
        if src.is_excluded(&group) {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        for d in &src.discretizations {
            out.push(Case::new(group.clone(), file_name.clone(), *d));
        }
    }
    Ok(out)
}

fn relative_group(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_manifest(path: &Path) -> Result<Vec<Case>> {
    let text = std::fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
    parse_manifest(&text, &path.display().to_string())
}

/// Parses `group_path,file_name,discretization` rows after a header row.
pub fn parse_manifest(text: &str, origin: &str) -> Result<Vec<Case>> {
    let mut rows = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    // header
    rows.next();

    let mut out = Vec::new();
    for (idx, line) in rows {
        let fields: Vec<&str> = line.split(',').map(clean_field).collect();
        if fields.len() < 3 {
            return Err(SweepError::Config(format!(
                "{}:{}: expected 3 fields (group, file, discretization), found {}",
                origin,
                idx + 1,
                fields.len()
            )));
        }
        let discretization: u32 = fields[2].parse().map_err(|_| {
            SweepError::Config(format!(
                "{}:{}: invalid discretization count '{}'",
                origin,
                idx + 1,
                fields[2]
            ))
        })?;
        out.push(Case::new(normalize_group(fields[0]), fields[1], discretization));
    }
    Ok(out)
}

fn clean_field(f: &str) -> &str {
    f.trim().trim_matches('"').trim()
}

/// `./data/set_21_a/` -> `set_21_a`
fn normalize_group(raw: &str) -> String {
    let mut g = raw.trim();
    g = g.strip_prefix("./").unwrap_or(g);
    g = g.strip_prefix("data/").unwrap_or(g);
    g.trim_matches('/').to_string()
}

fn dedup(cases: Vec<Case>) -> Vec<Case> {
    let mut seen = HashSet::new();
    cases.into_iter().filter(|c| seen.insert(c.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, "3\n0 0\n").unwrap();
    }

    fn dir_source(root: &Path, exclude: &[&str], discs: &[u32]) -> CaseSource {
        CaseSource::Directory(DirectorySource {
            root: root.to_path_buf(),
            extension: "txt".into(),
            exclude_groups: exclude.iter().map(|s| s.to_string()).collect(),
            discretizations: discs.to_vec(),
        })
    }

    #[test]
    fn excluded_groups_are_skipped() -> anyhow::Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), "run_100_x/a.txt");
        touch(dir.path(), "run_050_x/b.txt");

        let cases = discover(&dir_source(dir.path(), &["_100_"], &[2]))?;
        let groups: Vec<_> = cases.iter().map(|c| c.instance.group.as_str()).collect();
        assert_eq!(groups, vec!["run_050_x"]);
        Ok(())
    }

    #[test]
    fn walk_filters_extension_and_expands_discretizations() -> anyhow::Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), "g1/b.txt");
        touch(dir.path(), "g1/a.txt");
        touch(dir.path(), "g1/notes.md");

        let cases = discover(&dir_source(dir.path(), &[], &[2, 4]))?;
        let got: Vec<_> = cases
            .iter()
            .map(|c| (c.instance.file_name.as_str(), c.discretization))
            .collect();
        assert_eq!(got, vec![("a.txt", 2), ("a.txt", 4), ("b.txt", 2), ("b.txt", 4)]);
        Ok(())
    }

    #[test]
    fn nested_groups_use_slash_paths() -> anyhow::Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), "outer/inner/x.txt");
        let cases = discover(&dir_source(dir.path(), &[], &[6]))?;
        assert_eq!(cases[0].instance.group, "outer/inner");
        Ok(())
    }

    #[test]
    fn empty_walk_is_an_error() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "run_100_x/a.txt");
        let err = discover(&dir_source(dir.path(), &["_100_"], &[2])).unwrap_err();
        assert!(matches!(err, SweepError::EmptyCaseSet { .. }));
    }

    #[test]
    fn missing_data_root_is_reported() {
        let err = discover(&dir_source(Path::new("/no/such/data"), &[], &[2])).unwrap_err();
        assert!(matches!(err, SweepError::MissingDependencyPath { .. }));
    }

    #[test]
    fn manifest_rows_keep_order_and_normalize_groups() -> anyhow::Result<()> {
        let text = "instance_path,instance_name,num_discretizations\n\
                    ./data/g1/,a.txt,2\n\
                    \n\
                    ./data/g1/,b.txt,4\n\
                    ./data/g1/,a.txt,2\n";
        let cases = parse_manifest(text, "instances.csv")?;
        assert_eq!(cases, vec![Case::new("g1", "a.txt", 2), Case::new("g1", "b.txt", 4), Case::new("g1", "a.txt", 2)]);
        assert_eq!(dedup(cases).len(), 2);
        Ok(())
    }

    #[test]
    fn manifest_bad_discretization_names_line() {
        let err = parse_manifest("h1,h2,h3\ng,a.txt,two\n", "m.csv").unwrap_err();
        assert!(err.to_string().contains("m.csv:2"));
    }

    #[test]
    fn header_only_manifest_is_empty_case_set() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let p = dir.path().join("instances.csv");
        std::fs::write(&p, "instance_path,instance_name,num_discretizations\n")?;
        let err = discover(&CaseSource::Manifest(p)).unwrap_err();
        assert!(matches!(err, SweepError::EmptyCaseSet { .. }));
        Ok(())
    }
}
