use super::ident;
use crate::errors::{Result, SweepError};
use crate::query::Query;
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::path::Path;

pub const RESULT_ID_COLUMN: &str = "result_id";

/// Single-connection handle on the results database.
pub struct Store {
    pub(crate) conn: Connection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<String>,
    pub created: bool,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SweepError::io(parent, e))?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(db = %path.display(), "opened results database");
        Ok(Self { conn })
    }

    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        table_exists(&self.conn, table)
    }

    /// Column names in declaration order, or `None` when the table is absent.
    pub fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>> {
        table_columns(&self.conn, table)
    }

    /// Creates `table` with `result_id` plus `columns` unless it already
    /// exists; an existing table is returned as-is.
    pub fn ensure_table(&self, table: &str, columns: &[String]) -> Result<TableSchema> {
        ensure_table(&self.conn, table, columns)
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", ident::quote(table)?);
        Ok(self.conn.query_row(&sql, [], |r| r.get(0))?)
    }

    pub fn run_query(&self, query: &Query) -> Result<QueryRows> {
        let mut stmt = self.conn.prepare(&query.sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let mut rows = stmt.query(rusqlite::params_from_iter(query.params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(cell_text(row.get::<_, Value>(i)?));
            }
            out.push(cells);
        }
        Ok(QueryRows { columns, rows: out })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| SweepError::Sqlite(e))
    }
}

fn cell_text(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// SQLite resolves table names case-insensitively, so the lookup does too.
pub(crate) fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT count(name) FROM sqlite_master WHERE type='table' AND name = ?1 COLLATE NOCASE",
        params![table],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}

/// Reads the columns the database itself resolves for `table`; an empty
/// `table_info` means the table is absent.
pub(crate) fn table_columns(conn: &Connection, table: &str) -> Result<Option<Vec<String>>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", ident::quote(table)?))?;
    let cols = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(if cols.is_empty() { None } else { Some(cols) })
}

pub(crate) fn ensure_table(conn: &Connection, table: &str, columns: &[String]) -> Result<TableSchema> {
    if let Some(existing) = table_columns(conn, table)? {
        return Ok(TableSchema {
            columns: existing,
            created: false,
        });
    }

    let mut all = Vec::with_capacity(columns.len() + 1);
    all.push(RESULT_ID_COLUMN.to_string());
    all.extend(columns.iter().filter(|c| *c != RESULT_ID_COLUMN).cloned());

    let defs = all
        .iter()
        .map(|c| ident::quote(c).map(|q| format!("{} TEXT", q)))
        .collect::<Result<Vec<_>>>()?
        .join(", ");
    conn.execute(
        &format!("CREATE TABLE IF NOT EXISTS {} ({})", ident::quote(table)?, defs),
        [],
    )?;
    tracing::info!(table, columns = all.len(), "created table");

    let columns =
        table_columns(conn, table)?.ok_or_else(|| SweepError::TableNotFound(table.to_string()))?;
    Ok(TableSchema {
        columns,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ensure_table_is_idempotent() -> anyhow::Result<()> {
        let store = Store::memory()?;
        let first = store.ensure_table("exhaustive", &cols(&["status", "time"]))?;
        assert!(first.created);
        assert_eq!(first.columns, cols(&["result_id", "status", "time"]));

        let second = store.ensure_table("exhaustive", &cols(&["other"]))?;
        assert!(!second.created);
        assert_eq!(second.columns, first.columns);
        assert_eq!(store.table_columns("exhaustive")?, Some(first.columns));
        Ok(())
    }

    #[test]
    fn missing_table_has_no_columns() -> anyhow::Result<()> {
        let store = Store::memory()?;
        assert_eq!(store.table_columns("nope")?, None);
        assert!(!store.table_exists("nope")?);
        Ok(())
    }

    #[test]
    fn table_lookup_ignores_case() -> anyhow::Result<()> {
        let store = Store::memory()?;
        store
            .connection()
            .execute("CREATE TABLE Exhaustive (result_id TEXT, status TEXT, time TEXT)", [])?;

        assert!(store.table_exists("exhaustive")?);
        assert_eq!(
            store.table_columns("EXHAUSTIVE")?,
            Some(cols(&["result_id", "status", "time"]))
        );
        let schema = store.ensure_table("exhaustive", &cols(&["time"]))?;
        assert!(!schema.created);
        assert_eq!(schema.columns, cols(&["result_id", "status", "time"]));
        Ok(())
    }

    #[test]
    fn rejects_unsafe_table_names() {
        let store = Store::memory().unwrap();
        let err = store.ensure_table("x; DROP TABLE y", &cols(&["a"])).unwrap_err();
        assert!(matches!(err, SweepError::InvalidIdentifier(_)));
        assert!(store.count_rows("a b").is_err());
    }

    #[test]
    fn run_query_binds_parameters() -> anyhow::Result<()> {
        let store = Store::memory()?;
        store.ensure_table("t", &cols(&["name"]))?;
        store
            .connection()
            .execute("INSERT INTO t (result_id, name) VALUES ('1', 'a'), ('2', 'b')", [])?;

        let q = Query {
            sql: "SELECT name, count(*) AS n FROM t WHERE result_id = ?1".into(),
            params: vec![Value::Text("2".into())],
        };
        let rows = store.run_query(&q)?;
        assert_eq!(rows.columns, cols(&["name", "n"]));
        assert_eq!(rows.rows, vec![vec![Some("b".to_string()), Some("1".to_string())]]);
        Ok(())
    }
}
