use super::{exit_codes, load_config_or_default};
use crate::cli::args::{OutputFormat, QueryArgs, QueryCommon, QuerySub};
use anyhow::Context;
use sweep_core::query::{comparison_query, count_query, pivot_query, Query};
use sweep_core::storage::{QueryRows, Store};

pub fn run(args: QueryArgs) -> anyhow::Result<i32> {
    let (query, common) = match args.cmd {
        QuerySub::Count(a) => (
            count_query(&a.table, a.category, a.discretization, a.common.group.as_deref())?,
            a.common,
        ),
        QuerySub::Pivot(a) => (pivot_query(&a.table, &a.levels, a.common.group.as_deref())?, a.common),
        QuerySub::Compare(a) => (
            comparison_query(&a.baseline, &a.variant, &a.metric, a.common.group.as_deref())?,
            a.common,
        ),
    };

    if common.sql_only {
        print_sql(&query, common.format)?;
        return Ok(exit_codes::OK);
    }

    let cfg = load_config_or_default(&common.config)?;
    let db = common.db.clone().unwrap_or_else(|| cfg.paths.database.clone());
    if !db.is_file() {
        return Err(sweep_core::SweepError::Config(format!("database {} does not exist", db.display())).into());
    }
    let store = Store::open(&db).with_context(|| format!("opening {}", db.display()))?;
    let rows = store.run_query(&query)?;
    print_rows(&rows, &common)?;
    Ok(exit_codes::OK)
}

fn print_sql(query: &Query, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let v = serde_json::json!({ "sql": query.sql, "params": query.param_texts() });
            println!("{}", serde_json::to_string_pretty(&v)?);
        }
        OutputFormat::Text => {
            println!("{}", query.sql);
            for (i, p) in query.param_texts().iter().enumerate() {
                println!("-- ?{} = {}", i + 1, p);
            }
        }
    }
    Ok(())
}

fn print_rows(rows: &QueryRows, common: &QueryCommon) -> anyhow::Result<()> {
    match common.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Text => {
            println!("{}", rows.columns.join("\t"));
            for row in &rows.rows {
                let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("")).collect();
                println!("{}", cells.join("\t"));
            }
        }
    }
    Ok(())
}
