use super::{exit_codes, load_config_required};
use crate::cli::args::GenerateArgs;
use anyhow::Context;
use sweep_core::config::library::{home_dir, resolve_library_path};
use sweep_core::config::path_resolver::PathResolver;
use sweep_core::engine::build::verify_artifact;
use sweep_core::engine::{CommandTemplate, ExecutionDriver};
use sweep_core::matrix::strategy::generate_kind;

pub fn run(args: GenerateArgs) -> anyhow::Result<i32> {
    let cfg = load_config_required(&args.config)?;
    let project_dir = PathResolver::new(&args.config).base_dir().to_path_buf();

    let explicit = args.library_path.as_deref().or(cfg.solver.library_path.as_deref());
    let library_path = resolve_library_path(explicit, home_dir().as_deref())?;
    let template = CommandTemplate::from_settings(&cfg.solver, Some(&library_path));

    let copy_artifact = !args.no_artifact;
    if copy_artifact {
        verify_artifact(cfg.solver.build_command.as_deref(), &cfg.paths.artifact, &project_dir)?;
    }

    for kind in &args.kinds {
        let batch = generate_kind(*kind, &cfg, &template, copy_artifact)
            .with_context(|| format!("generating {} batch", kind))?;
        println!(
            "{}: {} runs -> {}",
            kind,
            batch.descriptors.len(),
            batch.package.run_file.display()
        );

        if args.execute {
            let outcome = ExecutionDriver::new(&template, &batch.package.root)
                .execute_batch(&batch.descriptors)
                .with_context(|| format!("executing {} batch", kind))?;
            println!("{}: completed {} runs", kind, outcome.completed);
        }
    }
    Ok(exit_codes::OK)
}
