use super::ident;
use super::store::{self, Store, TableSchema, RESULT_ID_COLUMN};
use crate::config::IngestSettings;
use crate::errors::{Result, SweepError};
use crate::on_error::{MismatchPolicy, SkippedDocument};
use crate::results::ResultDocument;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// One transaction for the whole ingestion; any abort rolls everything back.
    #[default]
    Batch,
    /// Each row commits on its own.
    PerDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub on_mismatch: MismatchPolicy,
    pub commit: CommitMode,
    pub create_missing_table: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            on_mismatch: MismatchPolicy::default(),
            commit: CommitMode::default(),
            create_missing_table: true,
        }
    }
}

impl From<&IngestSettings> for IngestOptions {
    fn from(s: &IngestSettings) -> Self {
        Self {
            on_mismatch: s.on_mismatch,
            commit: s.commit,
            create_missing_table: s.create_missing_table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub table: String,
    pub created: bool,
    pub inserted: usize,
    pub skipped: Vec<SkippedDocument>,
    pub columns: Vec<String>,
}

/// Loads result documents into a table whose columns are inferred from the
/// first document when the table does not exist yet.
///
/// Every document must carry exactly the table's columns (minus `result_id`).
/// Columns are never added, renamed or dropped.
pub struct SchemaInferringIngester<'a> {
    store: &'a mut Store,
    options: IngestOptions,
}

impl<'a> SchemaInferringIngester<'a> {
    pub fn new(store: &'a mut Store, options: IngestOptions) -> Self {
        Self { store, options }
    }

    pub fn ingest(&mut self, table: &str, documents: &[ResultDocument]) -> Result<IngestReport> {
        ident::validate(table)?;
        let first = documents
            .first()
            .ok_or_else(|| SweepError::NoResultsFound(format!("documents for table '{}'", table)))?;

        let report = match self.options.commit {
            CommitMode::Batch => {
                let tx = self.store.conn.transaction()?;
                let report = ingest_into(&tx, table, first, documents, &self.options)?;
                tx.commit()?;
                report
            }
            CommitMode::PerDocument => ingest_into(&self.store.conn, table, first, documents, &self.options)?,
        };

        tracing::info!(
            event = "sweep.ingest.completed",
            table,
            created = report.created,
            inserted = report.inserted,
            skipped = report.skipped.len(),
            "ingested {} of {} documents",
            report.inserted,
            documents.len()
        );
        Ok(report)
    }
}

fn ingest_into(
    conn: &Connection,
    table: &str,
    first: &ResultDocument,
    documents: &[ResultDocument],
    options: &IngestOptions,
) -> Result<IngestReport> {
    let schema = match store::table_columns(conn, table)? {
        Some(columns) => TableSchema {
            columns,
            created: false,
        },
        None if options.create_missing_table => {
            reject_reserved_key(first)?;
            let keys: Vec<String> = first.values.keys().cloned().collect();
            store::ensure_table(conn, table, &keys)?
        }
        None => return Err(SweepError::TableNotFound(table.to_string())),
    };

    if !schema.columns.iter().any(|c| c == RESULT_ID_COLUMN) {
        return Err(SweepError::Config(format!(
            "table '{}' exists but has no {} column",
            table, RESULT_ID_COLUMN
        )));
    }
    let expected: BTreeSet<String> = schema
        .columns
        .iter()
        .filter(|c| *c != RESULT_ID_COLUMN)
        .cloned()
        .collect();

    let mut stmt = conn.prepare(&insert_sql(table, &schema.columns)?)?;
    let mut report = IngestReport {
        table: table.to_string(),
        created: schema.created,
        inserted: 0,
        skipped: Vec::new(),
        columns: schema.columns.clone(),
    };

    for doc in documents {
        reject_reserved_key(doc)?;
        let found = doc.keys();
        if found != expected {
            let mismatch = SweepError::SchemaMismatch {
                table: table.to_string(),
                document: doc.name(),
                expected: expected.clone(),
                found,
            };
            report.skipped.push(options.on_mismatch.apply(mismatch)?);
            continue;
        }

        let values: Vec<Option<String>> = schema
            .columns
            .iter()
            .map(|c| {
                if c == RESULT_ID_COLUMN {
                    Some(doc.run_id.to_string())
                } else {
                    doc.values.get(c).cloned().flatten()
                }
            })
            .collect();
        stmt.execute(rusqlite::params_from_iter(values.iter()))?;
        report.inserted += 1;
        tracing::debug!(document = %doc.name(), run_id = doc.run_id, "inserted row");
    }

    Ok(report)
}

fn insert_sql(table: &str, columns: &[String]) -> Result<String> {
    let quoted = columns
        .iter()
        .map(|c| ident::quote(c))
        .collect::<Result<Vec<_>>>()?;
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        ident::quote(table)?,
        quoted.join(", "),
        placeholders.join(", ")
    ))
}

fn reject_reserved_key(doc: &ResultDocument) -> Result<()> {
    if doc.values.contains_key(RESULT_ID_COLUMN) {
        return Err(SweepError::InvalidDocument {
            path: doc.path.clone(),
            reason: format!("key '{}' is reserved", RESULT_ID_COLUMN),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn doc(run_id: u64, pairs: &[(&str, &str)]) -> ResultDocument {
        ResultDocument {
            run_id,
            path: PathBuf::from(format!("results/results_{}.yaml", run_id)),
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn rows(store: &Store, table: &str) -> Vec<(String, String, String)> {
        let mut stmt = store
            .connection()
            .prepare(&format!(
                "SELECT result_id, status, time FROM {} ORDER BY CAST(result_id AS INTEGER)",
                table
            ))
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn infers_table_from_first_document() -> anyhow::Result<()> {
        let mut store = Store::memory()?;
        let docs = vec![
            doc(0, &[("time", "1.23"), ("status", "True")]),
            doc(1, &[("time", "4.56"), ("status", "False")]),
        ];
        let report = SchemaInferringIngester::new(&mut store, IngestOptions::default()).ingest("t", &docs)?;

        assert!(report.created);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.columns, vec!["result_id", "status", "time"]);
        assert_eq!(
            rows(&store, "t"),
            vec![
                ("0".into(), "True".into(), "1.23".into()),
                ("1".into(), "False".into(), "4.56".into())
            ]
        );
        Ok(())
    }

    #[test]
    fn appends_to_existing_table() -> anyhow::Result<()> {
        let mut store = Store::memory()?;
        store.ensure_table("t", &["status".to_string(), "time".to_string()])?;
        let docs = vec![
            doc(12, &[("time", "1.23"), ("status", "True")]),
            doc(13, &[("time", "4.56"), ("status", "False")]),
        ];
        let report = SchemaInferringIngester::new(&mut store, IngestOptions::default()).ingest("t", &docs)?;
        assert!(!report.created);
        assert_eq!(store.count_rows("t")?, 2);
        let ids: Vec<String> = rows(&store, "t").into_iter().map(|r| r.0).collect();
        assert_eq!(ids, vec!["12", "13"]);
        Ok(())
    }

    #[test]
    fn validates_against_table_named_in_other_case() -> anyhow::Result<()> {
        let mut store = Store::memory()?;
        store
            .connection()
            .execute("CREATE TABLE Exhaustive (result_id TEXT, status TEXT, time TEXT)", [])?;
        let docs = vec![doc(0, &[("time", "1")])];

        let skip = IngestOptions {
            on_mismatch: MismatchPolicy::Skip,
            ..IngestOptions::default()
        };
        let report = SchemaInferringIngester::new(&mut store, skip).ingest("exhaustive", &docs)?;
        assert!(!report.created);
        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.columns, vec!["result_id", "status", "time"]);

        let err = SchemaInferringIngester::new(&mut store, IngestOptions::default())
            .ingest("exhaustive", &docs)
            .unwrap_err();
        match err {
            SweepError::SchemaMismatch { expected, .. } => {
                let want: BTreeSet<String> = ["status", "time"].iter().map(|s| s.to_string()).collect();
                assert_eq!(expected, want);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.count_rows("Exhaustive")?, 0);
        Ok(())
    }

    #[test]
    fn appends_to_externally_created_table() -> anyhow::Result<()> {
        let mut store = Store::memory()?;
        store
            .connection()
            .execute("CREATE TABLE t (time TEXT, status TEXT, result_id TEXT)", [])?;
        let docs = vec![doc(3, &[("time", "2.5"), ("status", "True")])];
        let report = SchemaInferringIngester::new(&mut store, IngestOptions::default()).ingest("t", &docs)?;
        assert!(!report.created);
        assert_eq!(report.inserted, 1);
        assert_eq!(rows(&store, "t"), vec![("3".into(), "True".into(), "2.5".into())]);
        Ok(())
    }

    #[test]
    fn null_values_are_stored_as_sql_null() -> anyhow::Result<()> {
        let mut store = Store::memory()?;
        let mut with_null = doc(0, &[("time", "1")]);
        with_null.values.insert("status".to_string(), None);
        SchemaInferringIngester::new(&mut store, IngestOptions::default()).ingest("t", &[with_null])?;

        let nulls: i64 = store
            .connection()
            .query_row("SELECT count(*) FROM t WHERE status IS NULL", [], |r| r.get(0))?;
        assert_eq!(nulls, 1);
        Ok(())
    }

    #[test]
    fn mismatch_aborts_without_partial_insert() -> anyhow::Result<()> {
        let mut store = Store::memory()?;
        store.ensure_table("t", &["status".to_string(), "time".to_string()])?;
        let docs = vec![doc(0, &[("time", "1"), ("status", "True")]), doc(1, &[("time", "2")])];

        let err = SchemaInferringIngester::new(&mut store, IngestOptions::default())
            .ingest("t", &docs)
            .unwrap_err();
        assert!(err.is_schema_mismatch());
        assert_eq!(store.count_rows("t")?, 0);
        Ok(())
    }

    #[test]
    fn skip_policy_keeps_going() -> anyhow::Result<()> {
        let mut store = Store::memory()?;
        let opts = IngestOptions {
            on_mismatch: MismatchPolicy::Skip,
            ..IngestOptions::default()
        };
        let docs = vec![
            doc(0, &[("time", "1"), ("status", "True")]),
            doc(1, &[("time", "2")]),
            doc(2, &[("time", "3"), ("status", "False")]),
        ];
        let report = SchemaInferringIngester::new(&mut store, opts).ingest("t", &docs)?;
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].document, "results_1.yaml");
        Ok(())
    }

    #[test]
    fn per_document_commit_keeps_rows_before_failure() -> anyhow::Result<()> {
        let mut store = Store::memory()?;
        let opts = IngestOptions {
            commit: CommitMode::PerDocument,
            ..IngestOptions::default()
        };
        let docs = vec![doc(0, &[("time", "1"), ("status", "True")]), doc(1, &[("status", "x")])];
        assert!(SchemaInferringIngester::new(&mut store, opts).ingest("t", &docs).is_err());
        assert_eq!(store.count_rows("t")?, 1);
        Ok(())
    }

    #[test]
    fn missing_table_can_be_required() {
        let mut store = Store::memory().unwrap();
        let opts = IngestOptions {
            create_missing_table: false,
            ..IngestOptions::default()
        };
        let err = SchemaInferringIngester::new(&mut store, opts)
            .ingest("t", &[doc(0, &[("time", "1")])])
            .unwrap_err();
        assert!(matches!(err, SweepError::TableNotFound(_)));
    }

    #[test]
    fn reserved_and_unsafe_names_are_rejected() {
        let mut store = Store::memory().unwrap();
        let mut ingester = SchemaInferringIngester::new(&mut store, IngestOptions::default());

        let err = ingester.ingest("t", &[doc(0, &[("result_id", "9")])]).unwrap_err();
        assert!(matches!(err, SweepError::InvalidDocument { .. }));

        let err = ingester.ingest("t", &[doc(0, &[("bad key", "1")])]).unwrap_err();
        assert!(matches!(err, SweepError::InvalidIdentifier(_)));

        let err = ingester.ingest("t;x", &[doc(0, &[("a", "1")])]).unwrap_err();
        assert!(matches!(err, SweepError::InvalidIdentifier(_)));
    }

    #[test]
    fn empty_input_is_no_results() {
        let mut store = Store::memory().unwrap();
        let err = SchemaInferringIngester::new(&mut store, IngestOptions::default())
            .ingest("t", &[])
            .unwrap_err();
        assert!(matches!(err, SweepError::NoResultsFound(_)));
    }
}
