use super::{GenerateOptions, GeneratedBatch, RunMatrixGenerator};
use crate::catalog::{self, CaseSource, DirectorySource};
use crate::config::SweepConfig;
use crate::engine::command::CommandTemplate;
use crate::errors::Result;
use crate::model::{RunKind, VariantSet};

/// How one run kind builds its batch.
#[derive(Debug, Clone)]
pub struct Strategy {
    pub kind: RunKind,
    pub source: CaseSource,
    pub variant_sets: Vec<VariantSet>,
    pub package_name: &'static str,
}

pub fn strategy_for(kind: RunKind, cfg: &SweepConfig) -> Strategy {
    let manifest = || CaseSource::Manifest(cfg.paths.instance_manifest.clone());
    let walk = |discretizations: Vec<u32>| {
        let mut d = DirectorySource::from_config(cfg);
        d.discretizations = discretizations;
        CaseSource::Directory(d)
    };

    match kind {
        RunKind::Exhaustive => Strategy {
            kind,
            source: walk(cfg.catalog.discretizations.clone()),
            variant_sets: vec![VariantSet::new("exhaustive", &[("-i", "1")])],
            package_name: "exhaustive",
        },
        RunKind::BangForBuck => Strategy {
            kind,
            source: walk(vec![2, 4]),
            variant_sets: vec![
                VariantSet::new("bang_for_buck", &[("-i", "1"), ("-b", "1")]),
                VariantSet::new("no_bang_for_buck", &[("-i", "1"), ("-b", "0")]),
            ],
            package_name: "bangforbuck",
        },
        RunKind::Dominance => Strategy {
            kind,
            source: manifest(),
            variant_sets: vec![VariantSet::new(
                "dominance",
                &[("-s", "1"), ("-i", "1"), ("-rd", "0")],
            )],
            package_name: "dominance",
        },
        RunKind::Simple => Strategy {
            kind,
            source: manifest(),
            variant_sets: vec![VariantSet::new("simple", &[("-s", "1"), ("-i", "0")])],
            package_name: "simple",
        },
        RunKind::OneThread => Strategy {
            kind,
            source: manifest(),
            variant_sets: vec![VariantSet::new("onethread", &[("-s", "1"), ("-i", "1")])],
            package_name: "onethread",
        },
    }
}

/// Discover, expand and stage the batch for `kind`.
pub fn generate_kind(
    kind: RunKind,
    cfg: &SweepConfig,
    template: &CommandTemplate,
    copy_artifact: bool,
) -> Result<GeneratedBatch> {
    let strategy = strategy_for(kind, cfg);
    let cases = catalog::discover(&strategy.source)?;

    let options = GenerateOptions {
        name: strategy.package_name.to_string(),
        kind: kind.as_str().to_string(),
        package_root: cfg.paths.package_root.clone(),
        data_dir: cfg.paths.data_dir.clone(),
        scratch_dir: cfg.paths.scratch_dir.clone(),
        artifact: copy_artifact.then(|| cfg.paths.artifact.clone()),
        artifact_name: cfg.solver.artifact_name.clone(),
        bundle_files: cfg.paths.bundle_files.clone(),
    };
    tracing::info!(kind = %kind, cases = cases.len(), "generating batch");
    RunMatrixGenerator::new(template, options).generate(&cases, &strategy.variant_sets)
}
