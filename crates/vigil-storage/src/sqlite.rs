//! Embedded SQLite implementation of the execution interface.
//!
//! One writer + N read-only connections in WAL mode, round-robin reader
//! selection with writer fallback when the pool is empty (in-memory mode).
//! Every connection gets the production PRAGMA set and the two SQL helper
//! functions the reporting query uses (`find_in_set`, `REGEXP`).

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Null, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags, ToSql};
use vigil_core::{Database, Row, RowCallback, StoreConfig, StoreError, StoreResult, Value};

/// Map a driver error into the interface's execution-error form.
fn sqe(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database {
        message: e.to_string(),
    }
}

/// Bind wrapper; `Value` lives in vigil-core, which does not know the
/// driver.
struct Bind<'a>(&'a Value);

impl ToSql for Bind<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::from(Null),
            Value::Int(v) => ToSqlOutput::from(*v),
            Value::Float(v) => ToSqlOutput::from(*v),
            Value::Bool(v) => ToSqlOutput::from(*v),
            Value::Text(v) => ToSqlOutput::from(v.as_str()),
        })
    }
}

/// SQLite-backed [`Database`]: 1 writer + N readers sharing one file.
pub struct SqliteDatabase {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    read_index: AtomicUsize,
    prefix: String,
    charset: Option<String>,
}

impl SqliteDatabase {
    /// Open a file-backed database with `config.read_pool_size` readers.
    pub fn open(path: &Path, config: &StoreConfig) -> StoreResult<Self> {
        let writer = Connection::open(path)
            .map_err(|e| StoreError::Config(format!("failed to open writer: {e}")))?;
        configure_connection(&writer)?;

        let mut readers = Vec::with_capacity(config.read_pool_size);
        for i in 0..config.read_pool_size {
            let reader = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| StoreError::Config(format!("failed to open reader {i}: {e}")))?;
            configure_readonly_connection(&reader)?;
            readers.push(Mutex::new(reader));
        }

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            read_index: AtomicUsize::new(0),
            prefix: config.table_prefix.clone(),
            charset: config.charset.clone(),
        })
    }

    /// Open per `config`: file-backed when `db_path` is set, in-memory
    /// otherwise.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        match &config.db_path {
            Some(path) => Self::open(path, config),
            None => Self::open_in_memory(config),
        }
    }

    /// Open an in-memory database. The reader pool stays empty and reads
    /// fall back to the writer, so every operation shares the single
    /// connection.
    pub fn open_in_memory(config: &StoreConfig) -> StoreResult<Self> {
        let writer = Connection::open_in_memory()
            .map_err(|e| StoreError::Config(format!("failed to open in-memory writer: {e}")))?;
        configure_connection(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            read_index: AtomicUsize::new(0),
            prefix: config.table_prefix.clone(),
            charset: config.charset.clone(),
        })
    }

    fn with_writer<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self
            .writer
            .lock()
            .map_err(|e| sqe(format!("writer lock poisoned: {e}")))?;
        f(&conn)
    }

    /// Round-robin over the reader pool; writer fallback when empty.
    fn with_reader<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        if self.readers.is_empty() {
            return self.with_writer(f);
        }
        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[index]
            .lock()
            .map_err(|e| sqe(format!("reader lock poisoned: {e}")))?;
        f(&conn)
    }
}

impl Database for SqliteDatabase {
    fn execute(&self, sql: &str) -> StoreResult<usize> {
        self.with_writer(|conn| conn.execute(sql, []).map_err(sqe))
    }

    fn execute_params(&self, sql: &str, args: &[Value]) -> StoreResult<usize> {
        self.with_writer(|conn| {
            let mut stmt = conn.prepare_cached(sql).map_err(sqe)?;
            stmt.execute(params_from_iter(args.iter().map(Bind)))
                .map_err(sqe)
        })
    }

    fn fetch_row(&self, sql: &str, args: &[Value]) -> StoreResult<Option<Row>> {
        self.with_reader(|conn| {
            let mut stmt = conn.prepare(sql).map_err(sqe)?;
            let names = column_names(&stmt);
            let mut rows = stmt
                .query(params_from_iter(args.iter().map(Bind)))
                .map_err(sqe)?;
            match rows.next().map_err(sqe)? {
                Some(row) => Ok(Some(row_from(&names, row)?)),
                None => Ok(None),
            }
        })
    }

    fn fetch_rows(&self, sql: &str, args: &[Value]) -> StoreResult<Vec<Row>> {
        self.with_reader(|conn| {
            let mut stmt = conn.prepare(sql).map_err(sqe)?;
            let names = column_names(&stmt);
            let mut rows = stmt
                .query(params_from_iter(args.iter().map(Bind)))
                .map_err(sqe)?;
            let mut out = Vec::new();
            while let Some(row) = rows.next().map_err(sqe)? {
                out.push(row_from(&names, row)?);
            }
            Ok(out)
        })
    }

    fn fetch_each(
        &self,
        sql: &str,
        args: &[Value],
        callback: &mut RowCallback<'_>,
    ) -> StoreResult<()> {
        self.with_reader(|conn| {
            let mut stmt = conn.prepare(sql).map_err(sqe)?;
            let names = column_names(&stmt);
            let mut rows = stmt
                .query(params_from_iter(args.iter().map(Bind)))
                .map_err(sqe)?;
            while let Some(row) = rows.next().map_err(sqe)? {
                callback(row_from(&names, row)?)?;
            }
            Ok(())
        })
    }

    fn fetch_scalar(&self, sql: &str, args: &[Value]) -> StoreResult<Option<Value>> {
        self.with_reader(|conn| {
            let mut stmt = conn.prepare(sql).map_err(sqe)?;
            let mut rows = stmt
                .query(params_from_iter(args.iter().map(Bind)))
                .map_err(sqe)?;
            match rows.next().map_err(sqe)? {
                Some(row) => Ok(Some(value_from(row.get_ref(0).map_err(sqe)?))),
                None => Ok(None),
            }
        })
    }

    fn last_insert_id(&self) -> StoreResult<Option<i64>> {
        self.with_writer(|conn| {
            let id = conn.last_insert_rowid();
            Ok((id != 0).then_some(id))
        })
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().iter().map(|s| s.to_string()).collect()
}

fn row_from(names: &[String], row: &rusqlite::Row<'_>) -> StoreResult<Row> {
    let mut out = Row::new();
    for (i, name) in names.iter().enumerate() {
        out.push(name.clone(), value_from(row.get_ref(i).map_err(sqe)?));
    }
    Ok(out)
}

fn value_from(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
    }
}

/// Production PRAGMA set, applied to every connection on open.
fn configure_connection(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(sqe)?;
    register_sql_functions(conn)
}

/// Same PRAGMAs plus `query_only` to keep accidental writes off reader
/// connections.
fn configure_readonly_connection(conn: &Connection) -> StoreResult<()> {
    configure_connection(conn)?;
    conn.execute_batch("PRAGMA query_only = ON;").map_err(sqe)
}

fn text_of(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(v) => Some(v.to_string()),
        ValueRef::Real(v) => Some(v.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

/// SQL helpers the reporting query relies on and SQLite lacks natively.
fn register_sql_functions(conn: &Connection) -> StoreResult<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    // find_in_set(needle, csv): 1-based position in the comma-separated
    // list, 0 when absent, NULL when either argument is NULL.
    conn.create_scalar_function("find_in_set", 2, flags, |ctx| {
        let needle = text_of(ctx.get_raw(0));
        let haystack = text_of(ctx.get_raw(1));
        Ok(match (needle, haystack) {
            (Some(needle), Some(haystack)) => {
                let position = haystack
                    .split(',')
                    .position(|item| item.trim() == needle.trim());
                Some(position.map(|p| p as i64 + 1).unwrap_or(0))
            }
            _ => None,
        })
    })
    .map_err(sqe)?;

    // `expr REGEXP pattern` arrives as regexp(pattern, expr).
    conn.create_scalar_function("regexp", 2, flags, |ctx| {
        let pattern = text_of(ctx.get_raw(0));
        let text = text_of(ctx.get_raw(1));
        match (pattern, text) {
            (Some(pattern), Some(text)) => {
                let re = Regex::new(&pattern)
                    .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
                Ok(Some(re.is_match(&text)))
            }
            _ => Ok(None),
        }
    })
    .map_err(sqe)
}
