use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A problem instance file, addressed by its group directory (relative to the
/// data root, `/`-separated) and its file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProblemInstance {
    pub group: String,
    pub file_name: String,
}

impl ProblemInstance {
    pub fn new(group: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            file_name: file_name.into(),
        }
    }

    /// Location of the instance file below a data root.
    pub fn source_path(&self, data_root: &std::path::Path) -> PathBuf {
        let mut p = data_root.to_path_buf();
        for part in self.group.split('/').filter(|s| !s.is_empty()) {
            p.push(part);
        }
        p.push(&self.file_name);
        p
    }

    /// Instance directory as the solver sees it from inside a run package.
    pub fn package_dir_arg(&self) -> String {
        if self.group.is_empty() {
            "./data/".to_string()
        } else {
            format!("./data/{}/", self.group)
        }
    }
}

impl fmt::Display for ProblemInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.file_name)
        } else {
            write!(f, "{}/{}", self.group, self.file_name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Case {
    pub instance: ProblemInstance,
    pub discretization: u32,
}

impl Case {
    pub fn new(group: impl Into<String>, file_name: impl Into<String>, discretization: u32) -> Self {
        Self {
            instance: ProblemInstance::new(group, file_name),
            discretization,
        }
    }
}

/// One flag/value pair passed to the solver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagArg {
    pub flag: String,
    pub value: String,
}

impl FlagArg {
    pub fn new(flag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for FlagArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.flag, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    pub name: String,
    #[serde(default)]
    pub args: Vec<FlagArg>,
}

impl VariantSet {
    pub fn new(name: impl Into<String>, pairs: &[(&str, &str)]) -> Self {
        Self {
            name: name.into(),
            args: pairs.iter().map(|(f, v)| FlagArg::new(*f, *v)).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            name: "default".into(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDescriptor {
    pub run_id: u64,
    pub case: Case,
    pub variant: String,
    /// Discretization pair first, then the variant set's pairs.
    pub variant_args: Vec<FlagArg>,
    /// Relative to the run package root.
    pub output_path: String,
}

impl RunDescriptor {
    pub fn instance(&self) -> &ProblemInstance {
        &self.case.instance
    }

    /// Solver arguments following the command template.
    pub fn solver_args(&self) -> Vec<String> {
        let mut out = vec![
            "-n".to_string(),
            self.case.instance.file_name.clone(),
            "-p".to_string(),
            self.case.instance.package_dir_arg(),
        ];
        for a in &self.variant_args {
            out.push(a.flag.clone());
            out.push(a.value.clone());
        }
        out.push("-o".to_string());
        out.push(self.output_path.clone());
        out
    }
}

/// The experiment families a batch can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunKind {
    Exhaustive,
    BangForBuck,
    Dominance,
    Simple,
    OneThread,
}

impl RunKind {
    pub const ALL: [RunKind; 5] = [
        RunKind::Exhaustive,
        RunKind::BangForBuck,
        RunKind::Dominance,
        RunKind::Simple,
        RunKind::OneThread,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Exhaustive => "exhaustive",
            RunKind::BangForBuck => "bang-for-buck",
            RunKind::Dominance => "dominance",
            RunKind::Simple => "simple",
            RunKind::OneThread => "one-thread",
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exhaustive" => Ok(RunKind::Exhaustive),
            "bang-for-buck" | "bangforbuck" => Ok(RunKind::BangForBuck),
            "dominance" => Ok(RunKind::Dominance),
            "simple" => Ok(RunKind::Simple),
            "one-thread" | "onethread" | "threading" => Ok(RunKind::OneThread),
            other => Err(format!(
                "unknown run kind '{}' (expected one of: {})",
                other,
                RunKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}
