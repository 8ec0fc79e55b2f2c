use crate::config::SolverSettings;
use crate::model::RunDescriptor;
use std::path::Path;
use std::process::Command;

/// Fixed prefix of every solver invocation: interpreter, resource limits,
/// native library path and artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `java -Xms.. -Xmx.. [-Djava.library.path=..] -jar ./<artifact_name>`,
    /// with the artifact addressed relative to the run package.
    pub fn from_settings(solver: &SolverSettings, library_path: Option<&Path>) -> Self {
        let mut args = vec![
            format!("-Xms{}", solver.min_heap),
            format!("-Xmx{}", solver.max_heap),
        ];
        if let Some(lib) = library_path {
            args.push(format!("-Djava.library.path={}", lib.display()));
        }
        args.push("-jar".into());
        args.push(format!("./{}", solver.artifact_name));
        Self::new(solver.program.clone(), args)
    }

    pub fn argv(&self, run: &RunDescriptor) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.args.len() + 12);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv.extend(run.solver_args());
        argv
    }

    /// One run-file line. Arguments are space-joined without quoting, so paths
    /// containing spaces do not survive a round trip through a shell.
    pub fn render_line(&self, run: &RunDescriptor) -> String {
        self.argv(run).join(" ")
    }

    pub fn command(&self, run: &RunDescriptor, working_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(run.solver_args())
            .current_dir(working_dir);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Case, FlagArg};
    use std::path::PathBuf;

    fn run() -> RunDescriptor {
        RunDescriptor {
            run_id: 0,
            case: Case::new("g1", "a.txt", 2),
            variant: "v".into(),
            variant_args: vec![FlagArg::new("-d", "2")],
            output_path: "./results/results_0.yaml".into(),
        }
    }

    #[test]
    fn default_template_matches_solver_contract() {
        let lib = PathBuf::from("/opt/cplex/bin");
        let t = CommandTemplate::from_settings(&SolverSettings::default(), Some(&lib));
        assert_eq!(
            t.render_line(&run()),
            "java -Xms32m -Xmx32g -Djava.library.path=/opt/cplex/bin -jar ./uber.jar \
             -n a.txt -p ./data/g1/ -d 2 -o ./results/results_0.yaml"
        );
    }

    #[test]
    fn library_flag_is_omitted_without_path() {
        let t = CommandTemplate::from_settings(&SolverSettings::default(), None);
        assert!(!t.args.iter().any(|a| a.starts_with("-Djava.library.path")));
    }
}
