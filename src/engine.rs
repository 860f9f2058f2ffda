//! In-memory SQLite database for one loaded challenge.
//!
//! The rest of the crate only sees the `QueryEngine` trait: run a script, get the
//! first result set back or an `ExecutionError` with SQLite's message.
//!
//! Learner SQL is untrusted, so every `execute` runs under `QueryLimits`: a
//! wall-clock budget enforced through SQLite's progress handler and a cap on
//! the rows collected per statement.

use std::time::{Duration, Instant};

use rusqlite::{types::ValueRef, Batch, Connection, ErrorCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

/// VM instructions between two deadline checks.
const PROGRESS_STEPS: i32 = 1_000;

/// 2^63: whole reals below this in magnitude fit an `i64` exactly.
const I64_EDGE: f64 = 9_223_372_036_854_775_808.0;

/// A learner's SQL failed to prepare or run.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

impl From<rusqlite::Error> for ExecutionError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref f, _) if f.code == ErrorCode::OperationInterrupted => {
                Self { message: "Query interrupted: time limit exceeded".into() }
            }
            e => Self { message: e.to_string() },
        }
    }
}

/// Bounds applied to every script a learner runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryLimits {
    pub timeout: Duration,
    pub max_rows: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(2), max_rows: 10_000 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Contents of one table, shown next to the challenge.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableSnapshot {
    pub name: String,
    #[serde(flatten)]
    pub data: ResultSet,
}

pub trait QueryEngine {
    /// Runs every statement of `sql` in order. Returns the first statement that
    /// produced at least one row, or `None` when no statement did.
    fn execute(&mut self, sql: &str) -> Result<Option<ResultSet>, ExecutionError>;
}

pub struct SqliteEngine {
    conn: Connection,
    limits: QueryLimits,
}

impl SqliteEngine {
    /// Fresh in-memory database with the challenge schema applied.
    #[instrument(level = "debug", skip(schema), fields(schema_len = schema.len()))]
    pub fn open(schema: &str, limits: QueryLimits) -> Result<Self, ExecutionError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema)?;
        Ok(Self { conn, limits })
    }

    /// Every table that currently holds rows, in `sqlite_master` order.
    #[instrument(level = "debug", skip(self))]
    pub fn tables(&mut self) -> Result<Vec<TableSnapshot>, ExecutionError> {
        let names: Vec<String> = {
            let mut stmt = self.conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let mut out = Vec::with_capacity(names.len());
        for name in names {
            match self.execute(&format!("SELECT * FROM {}", quote_ident(&name)))? {
                Some(data) => out.push(TableSnapshot { name, data }),
                None => debug!(target: "sql_trainer", table = %name, "Skipping empty table"),
            }
        }
        Ok(out)
    }
}

impl SqliteEngine {
    fn run_script(&self, sql: &str) -> Result<Option<ResultSet>, ExecutionError> {
        let mut first = None;
        let mut batch = Batch::new(&self.conn, sql);
        while let Some(mut stmt) = batch.next()? {
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query([])?;
            let mut values = Vec::new();
            while let Some(row) = rows.next()? {
                if values.len() == self.limits.max_rows {
                    return Err(ExecutionError {
                        message: format!("Query returned more than {} rows", self.limits.max_rows),
                    });
                }
                let mut cells = Vec::with_capacity(columns.len());
                for i in 0..columns.len() {
                    cells.push(to_json(row.get_ref(i)?));
                }
                values.push(cells);
            }
            if first.is_none() && !values.is_empty() {
                first = Some(ResultSet { columns, rows: values });
            }
        }
        Ok(first)
    }
}

impl QueryEngine for SqliteEngine {
    fn execute(&mut self, sql: &str) -> Result<Option<ResultSet>, ExecutionError> {
        let deadline = Instant::now() + self.limits.timeout;
        self.conn.progress_handler(PROGRESS_STEPS, Some(move || Instant::now() >= deadline));
        let result = self.run_script(sql);
        self.conn.progress_handler(0, None::<fn() -> bool>);
        if let Err(e) = &result {
            debug!(target: "sql_trainer", error = %e, "Query rejected");
        }
        result
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A real as JSON. Whole values within `i64` range become integers, so `7.0`
/// prints as `7`; non-finite values become `null`.
pub fn real_to_json(f: f64) -> Value {
    if f.fract() == 0.0 && (-I64_EDGE..I64_EDGE).contains(&f) {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

fn to_json(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => real_to_json(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::from(b.to_vec()),
    }
}
