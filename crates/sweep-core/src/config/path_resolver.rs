use std::path::{Component, Path, PathBuf};

/// Resolves config-relative paths against the directory holding the config file.
#[derive(Clone, Debug)]
pub struct PathResolver {
    base_dir: PathBuf,
}

impl PathResolver {
    pub fn new(config_path: &Path) -> Self {
        let base_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        Self { base_dir }
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve(&self, p: &mut PathBuf) {
        if p.as_os_str().is_empty() || p.is_absolute() {
            return;
        }
        *p = self.join_clean(p);
    }

    pub fn resolve_opt(&self, p: &mut Option<PathBuf>) {
        if let Some(inner) = p.as_mut() {
            self.resolve(inner);
        }
    }

    fn join_clean(&self, rel: &Path) -> PathBuf {
        let joined = self.base_dir.join(rel);

        let mut out = PathBuf::new();
        for c in joined.components() {
            match c {
                Component::CurDir => {}
                // `..` cancels a normal segment, stops at the root and
                // otherwise stacks
                Component::ParentDir => match out.components().next_back() {
                    Some(Component::Normal(_)) => {
                        out.pop();
                    }
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    _ => out.push(".."),
                },
                Component::RootDir | Component::Prefix(_) | Component::Normal(_) => {
                    out.push(c.as_os_str())
                }
            }
        }
        if out.as_os_str().is_empty() {
            out.push(".");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_config_dir() {
        let r = PathResolver::new(Path::new("/work/exp/sweep.yaml"));
        let mut p = PathBuf::from("../data/./sets");
        r.resolve(&mut p);
        assert_eq!(p, PathBuf::from("/work/data/sets"));
    }

    #[test]
    fn leading_parent_dirs_are_kept() {
        let r = PathResolver::new(Path::new("sweep.yaml"));
        let mut p = PathBuf::from("../../shared/data");
        r.resolve(&mut p);
        assert_eq!(p, PathBuf::from("../../shared/data"));

        let r = PathResolver::new(Path::new("exp/sweep.yaml"));
        let mut p = PathBuf::from("../../../shared/./data");
        r.resolve(&mut p);
        assert_eq!(p, PathBuf::from("../../shared/data"));
    }

    #[test]
    fn parent_dirs_stop_at_root() {
        let r = PathResolver::new(Path::new("/sweep.yaml"));
        let mut p = PathBuf::from("../../data");
        r.resolve(&mut p);
        assert_eq!(p, PathBuf::from("/data"));
    }

    #[test]
    fn absolute_paths_are_untouched() {
        let r = PathResolver::new(Path::new("sweep.yaml"));
        let mut p = PathBuf::from("/opt/cplex/lib");
        r.resolve(&mut p);
        assert_eq!(p, PathBuf::from("/opt/cplex/lib"));
    }

    #[test]
    fn bare_config_name_resolves_against_cwd() {
        let r = PathResolver::new(Path::new("sweep.yaml"));
        let mut p = PathBuf::from("results");
        r.resolve(&mut p);
        assert_eq!(p, PathBuf::from("results"));
    }
}
