//! Expansion of cases × variant sets into run descriptors, and staging of the
//! run package those descriptors execute in.

pub mod package;
pub mod strategy;

use crate::engine::command::CommandTemplate;
use crate::errors::{Result, SweepError};
use crate::model::{Case, FlagArg, ProblemInstance, RunDescriptor, VariantSet};
use crate::results;
use package::{BatchManifest, PackageLayout, RunPackage};
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

/// Assigns run ids 0.. over cases (outer) and variant sets (inner).
///
/// An empty variant-set list counts as one empty set so every case still runs once.
pub fn expand(cases: &[Case], variant_sets: &[VariantSet]) -> Result<Vec<RunDescriptor>> {
    if cases.is_empty() {
        return Err(SweepError::NoCasesToExpand);
    }
    let fallback = [VariantSet::empty()];
    let sets = if variant_sets.is_empty() {
        &fallback[..]
    } else {
        variant_sets
    };

    let mut out = Vec::with_capacity(cases.len() * sets.len());
    let mut run_id: u64 = 0;
    for case in cases {
        for set in sets {
            let mut variant_args = Vec::with_capacity(set.args.len() + 1);
            variant_args.push(FlagArg::new("-d", case.discretization.to_string()));
            variant_args.extend(set.args.iter().cloned());

            out.push(RunDescriptor {
                run_id,
                case: case.clone(),
                variant: set.name.clone(),
                variant_args,
                output_path: results::package_output_path(run_id),
            });
            run_id += 1;
        }
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Package directory name, also the run-file prefix.
    pub name: String,
    /// Label recorded in the batch manifest and fingerprint.
    pub kind: String,
    pub package_root: PathBuf,
    pub data_dir: PathBuf,
    pub scratch_dir: PathBuf,
    /// Copied into the package as `artifact_name` when set.
    pub artifact: Option<PathBuf>,
    pub artifact_name: String,
    pub bundle_files: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct GeneratedBatch {
    pub descriptors: Vec<RunDescriptor>,
    pub package: RunPackage,
}

pub struct RunMatrixGenerator<'a> {
    template: &'a CommandTemplate,
    options: GenerateOptions,
}

impl<'a> RunMatrixGenerator<'a> {
    pub fn new(template: &'a CommandTemplate, options: GenerateOptions) -> Self {
        Self { template, options }
    }

    pub fn generate(&self, cases: &[Case], variant_sets: &[VariantSet]) -> Result<GeneratedBatch> {
        let descriptors = expand(cases, variant_sets)?;
        let opts = &self.options;
        let layout = PackageLayout::new(opts.package_root.join(&opts.name), &opts.name);

        // 1. package tree
        layout.create_tree()?;

        // 2. instance data
        let mut staged: HashSet<ProblemInstance> = HashSet::new();
        for d in &descriptors {
            if staged.contains(d.instance()) {
                continue;
            }
            layout.stage_instance(&opts.data_dir, d.instance())?;
            staged.insert(d.instance().clone());
        }

        // 3. artifact
        if let Some(artifact) = &opts.artifact {
            layout.stage_artifact(artifact, &opts.artifact_name)?;
        }

        // 4. run-file, drafted in the scratch dir and bundled once complete
        let scratch = opts.scratch_dir.join(layout.run_file_name());
        let lines = self.write_scratch_run_file(&scratch, &descriptors, &staged)?;
        let run_file = layout.bundle_run_file(&scratch)?;
        for extra in &opts.bundle_files {
            layout.bundle_file(extra)?;
        }

        // 5. scratch cleanup
        std::fs::remove_file(&scratch).map_err(|e| SweepError::io(&scratch, e))?;

        let fp = crate::fingerprint::compute(&opts.kind, &lines);
        let manifest = BatchManifest::new(&opts.kind, &opts.name, descriptors.len(), &fp.hex);
        let manifest_path = layout.write_manifest(&manifest)?;

        tracing::info!(
            event = "sweep.generate.completed",
            package = %layout.root().display(),
            runs = descriptors.len(),
            instances = staged.len(),
            fingerprint = %fp.hex,
            "wrote runs to {}", run_file.display()
        );

        Ok(GeneratedBatch {
            descriptors,
            package: RunPackage {
                root: layout.root().to_path_buf(),
                run_file,
                manifest_path,
                fingerprint: fp.hex,
            },
        })
    }

    fn write_scratch_run_file(
        &self,
        scratch: &std::path::Path,
        descriptors: &[RunDescriptor],
        staged: &HashSet<ProblemInstance>,
    ) -> Result<Vec<String>> {
        if let Some(parent) = scratch.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SweepError::io(parent, e))?;
        }
        let file = std::fs::File::create(scratch).map_err(|e| SweepError::io(scratch, e))?;
        let mut out = std::io::BufWriter::new(file);

        let mut lines = Vec::with_capacity(descriptors.len());
        for d in descriptors {
            if !staged.contains(d.instance()) {
                return Err(SweepError::MissingDependencyPath {
                    what: "staged instance".into(),
                    detail: format!("run {} references unstaged {}", d.run_id, d.instance()),
                });
            }
            let line = self.template.render_line(d);
            writeln!(out, "{}", line).map_err(|e| SweepError::io(scratch, e))?;
            lines.push(line);
        }
        out.flush().map_err(|e| SweepError::io(scratch, e))?;
        Ok(lines)
    }
}
