//! SQL builders for the analysis queries run against ingested result tables.
//!
//! Builders are pure: identifiers are validated and quoted, every value is a
//! bound parameter. Execution lives in [`crate::storage::Store::run_query`].

use crate::errors::{Result, SweepError};
use crate::storage::ident;
use rusqlite::types::Value;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const INSTANCE_NAME: &str = "instance_name";
pub const INSTANCE_PATH: &str = "instance_path";
pub const DISCRETIZATIONS: &str = "number_of_discretizations";
pub const OPTIMALITY_REACHED: &str = "optimality_reached";
pub const ROOT_LOWER_BOUND: &str = "root_lower_bound";
pub const ROOT_UPPER_BOUND: &str = "root_upper_bound";
pub const FINAL_LOWER_BOUND: &str = "final_lower_bound";
pub const NODES_SOLVED: &str = "number_of_nodes_solved";
pub const SOLUTION_TIME: &str = "solution_time_in_seconds";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub sql: String,
    #[serde(skip)]
    pub params: Vec<Value>,
}

impl Query {
    /// Bound parameters rendered for display (`--sql-only`).
    pub fn param_texts(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|v| match v {
                Value::Null => "NULL".to_string(),
                Value::Integer(i) => i.to_string(),
                Value::Real(f) => f.to_string(),
                Value::Text(s) => format!("'{}'", s),
                Value::Blob(b) => format!("<{} bytes>", b.len()),
            })
            .collect()
    }
}

/// Outcome class of a single solved run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Proved optimal with a positive root lower bound.
    Optimal,
    /// Proved optimal at zero: nothing reachable.
    Infeasible,
    TimedOut,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Optimal => "optimal",
            Category::Infeasible => "infeasible",
            Category::TimedOut => "timed-out",
        }
    }

    fn predicate(&self, alias: &str) -> String {
        let reached = format!("{}.{}", alias, OPTIMALITY_REACHED);
        let rlb = format!("CAST({}.{} AS REAL)", alias, ROOT_LOWER_BOUND);
        match self {
            Category::Optimal => format!("({} = 'True' AND {} > 0.0)", reached, rlb),
            Category::Infeasible => format!("({} = 'True' AND {} = 0.0)", reached, rlb),
            Category::TimedOut => format!("({} = 'False')", reached),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimal" => Ok(Category::Optimal),
            "infeasible" => Ok(Category::Infeasible),
            "timed-out" | "timed_out" | "timeout" => Ok(Category::TimedOut),
            other => Err(SweepError::Config(format!(
                "unknown category '{}' (expected optimal, infeasible or timed-out)",
                other
            ))),
        }
    }
}

#[derive(Default)]
struct Params {
    values: Vec<Value>,
}

impl Params {
    fn push(&mut self, v: Value) -> String {
        self.values.push(v);
        format!("?{}", self.values.len())
    }
}

fn group_clause(params: &mut Params, alias: &str, group_filter: Option<&str>) -> Option<String> {
    group_filter.map(|g| {
        let p = params.push(Value::Text(format!("%{}%", g)));
        format!("{}.{} LIKE {}", alias, INSTANCE_PATH, p)
    })
}

pub fn count_query(
    table: &str,
    category: Category,
    discretization: u32,
    group_filter: Option<&str>,
) -> Result<Query> {
    let table = ident::quote(table)?;
    let mut params = Params::default();
    let mut clauses = vec![format!(
        "CAST(t.{} AS INTEGER) = {}",
        DISCRETIZATIONS,
        params.push(Value::Integer(discretization as i64))
    )];
    clauses.extend(group_clause(&mut params, "t", group_filter));
    clauses.push(category.predicate("t"));

    Ok(Query {
        sql: format!(
            "SELECT COUNT(*) AS count FROM {} AS t WHERE {}",
            table,
            clauses.join(" AND ")
        ),
        params: params.values,
    })
}

/// One row per instance with the per-level metrics side by side; rows where
/// no level reached a positive optimum are dropped.
pub fn pivot_query(table: &str, discretizations: &[u32], group_filter: Option<&str>) -> Result<Query> {
    if discretizations.is_empty() {
        return Err(SweepError::Config("pivot needs at least one discretization level".into()));
    }
    let table = ident::quote(table)?;
    let aliases: Vec<String> = (1..=discretizations.len()).map(|i| format!("ex_{}", i)).collect();
    let mut params = Params::default();

    let mut select = vec![format!("ex_1.{}", INSTANCE_NAME)];
    for (alias, d) in aliases.iter().zip(discretizations) {
        select.push(format!("printf('%.2f', {}.{}) AS rub_{}", alias, ROOT_UPPER_BOUND, d));
        select.push(format!("printf('%.2f', {}.{}) AS opt_{}", alias, FINAL_LOWER_BOUND, d));
        select.push(format!("printf('%d', {}.{}) AS nodes_{}", alias, NODES_SOLVED, d));
        select.push(format!("printf('%.2f', {}.{}) AS time_{}", alias, SOLUTION_TIME, d));
        select.push(format!("printf('%.2f', {}.{}) AS rlb_{}", alias, ROOT_LOWER_BOUND, d));
    }

    let mut from = format!("{} AS ex_1", table);
    for alias in aliases.iter().skip(1) {
        from.push_str(&format!(
            " INNER JOIN {} AS {} ON ex_1.{} = {}.{}",
            table, alias, INSTANCE_NAME, alias, INSTANCE_NAME
        ));
    }

    let any_optimal = aliases
        .iter()
        .map(|a| Category::Optimal.predicate(a))
        .collect::<Vec<_>>()
        .join(" OR ");
    let mut clauses = vec![format!("({})", any_optimal)];
    let group = group_filter.map(|g| params.push(Value::Text(format!("%{}%", g))));
    for (alias, d) in aliases.iter().zip(discretizations) {
        let p = params.push(Value::Integer(*d as i64));
        clauses.push(format!("CAST({}.{} AS INTEGER) = {}", alias, DISCRETIZATIONS, p));
        if let Some(g) = &group {
            clauses.push(format!("{}.{} LIKE {}", alias, INSTANCE_PATH, g));
        }
    }

    Ok(Query {
        sql: format!(
            "SELECT {} FROM {} WHERE {} ORDER BY ex_1.{}",
            select.join(", "),
            from,
            clauses.join(" AND "),
            INSTANCE_NAME
        ),
        params: params.values,
    })
}

/// Relative improvement of `variant` over `baseline` on a numeric metric,
/// matched per instance and discretization level.
pub fn comparison_query(baseline: &str, variant: &str, metric: &str, group_filter: Option<&str>) -> Result<Query> {
    let baseline = ident::quote(baseline)?;
    let variant = ident::quote(variant)?;
    let metric = ident::quote(metric)?;
    let mut params = Params::default();

    let b = format!("CAST(b.{} AS REAL)", metric);
    let v = format!("CAST(v.{} AS REAL)", metric);
    let mut clauses = vec![format!("{} <> 0.0", b)];
    clauses.extend(group_clause(&mut params, "b", group_filter));

    Ok(Query {
        sql: format!(
            "SELECT b.{name}, b.{disc}, {b} AS baseline, {v} AS variant, ({b} - {v}) / {b} AS improvement \
             FROM {baseline} AS b INNER JOIN {variant} AS v \
             ON b.{name} = v.{name} AND b.{disc} = v.{disc} \
             WHERE {where_} ORDER BY b.{name}, CAST(b.{disc} AS INTEGER)",
            name = INSTANCE_NAME,
            disc = DISCRETIZATIONS,
            b = b,
            v = v,
            baseline = baseline,
            variant = variant,
            where_ = clauses.join(" AND "),
        ),
        params: params.values,
    })
}
