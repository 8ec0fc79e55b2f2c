use super::{exit_codes, load_config_or_default};
use crate::cli::args::{IngestArgs, OutputFormat};
use anyhow::Context;
use std::collections::BTreeSet;
use std::path::Path;
use sweep_core::matrix::package::{BatchManifest, RESULTS_DIR};
use sweep_core::on_error::MismatchPolicy;
use sweep_core::results::{ResultDocument, ResultDocumentStore};
use sweep_core::storage::{CommitMode, IngestOptions, SchemaInferringIngester, Store};

pub fn run(args: IngestArgs) -> anyhow::Result<i32> {
    let cfg = load_config_or_default(&args.config)?;

    let table = args.table.clone().unwrap_or_else(|| cfg.ingest.table.clone());
    let db = args.db.clone().unwrap_or_else(|| cfg.paths.database.clone());

    let mut options = IngestOptions::from(&cfg.ingest);
    if args.skip_mismatched {
        options.on_mismatch = MismatchPolicy::Skip;
    }
    if args.per_document_commit {
        options.commit = CommitMode::PerDocument;
    }
    if args.require_table {
        options.create_missing_table = false;
    }

    let documents = load_documents(&args, &cfg.paths.results_dir)?;
    let mut store = Store::open(&db).with_context(|| format!("opening {}", db.display()))?;
    let report = SchemaInferringIngester::new(&mut store, options).ingest(&table, &documents)?;
    store.close()?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!(
                "{}: inserted {} rows{}",
                report.table,
                report.inserted,
                if report.created { " (table created)" } else { "" }
            );
            for s in &report.skipped {
                println!("skipped {}: {}", s.document, s.reason);
            }
        }
    }
    Ok(exit_codes::OK)
}

/// Every document in the results directory, or with `--expected-from` only
/// those of the runs the package manifest lists.
fn load_documents(args: &IngestArgs, default_results: &Path) -> anyhow::Result<Vec<ResultDocument>> {
    let Some(manifest_path) = &args.expected_from else {
        let dir = args.results.clone().unwrap_or_else(|| default_results.to_path_buf());
        return Ok(ResultDocumentStore::new(&dir).load_all()?);
    };

    let manifest =
        BatchManifest::load(manifest_path).with_context(|| format!("reading {}", manifest_path.display()))?;
    let dir = match &args.results {
        Some(dir) => dir.clone(),
        None => manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(RESULTS_DIR),
    };
    let expected: Vec<u64> = (0..manifest.runs as u64).collect();
    let known_failed: BTreeSet<u64> = args.known_failed.iter().copied().collect();
    tracing::debug!(
        package = %manifest.package,
        runs = manifest.runs,
        known_failed = known_failed.len(),
        "collecting results listed by manifest"
    );
    Ok(ResultDocumentStore::new(&dir).collect(&expected, &known_failed)?)
}
