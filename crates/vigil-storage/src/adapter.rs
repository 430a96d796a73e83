//! `RecordAdapter` — CRUD for one record type against one connection.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::info;
use vigil_core::{Database, Record, Row, StoreResult, Value};

use crate::schema;

/// Active-record adapter: persistence operations for one record type,
/// scoped to one table and one injected connection.
///
/// Holds no state beyond the connection and the cached persisted-column
/// list. Safe to reuse across operations, but it performs no locking of
/// its own; concurrent use of one connection is governed by the
/// connection's own contract.
pub struct RecordAdapter<R: Record> {
    db: Arc<dyn Database>,
    columns: Vec<&'static str>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> std::fmt::Debug for RecordAdapter<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordAdapter")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl<R: Record> RecordAdapter<R> {
    /// Build an adapter over `db`, validating the record type's
    /// descriptor up front.
    pub fn new(db: Arc<dyn Database>) -> StoreResult<Self> {
        let desc = R::descriptor();
        desc.validate()?;
        let columns = desc.persisted_columns().collect();
        Ok(Self {
            db,
            columns,
            _record: PhantomData,
        })
    }

    /// Fully prefixed table name.
    pub fn table(&self) -> String {
        format!("{}{}", self.db.table_prefix(), R::descriptor().table)
    }

    /// Persisted column names, cached at construction.
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Idempotently create this adapter's table.
    pub fn install(&self) -> StoreResult<()> {
        let sql = schema::create_table(R::descriptor(), &self.table(), self.db.charset())?;
        self.db.execute(&sql)?;
        info!(table = %self.table(), "installed table");
        Ok(())
    }

    /// Drop this adapter's table.
    pub fn uninstall(&self) -> StoreResult<()> {
        self.db.execute(&schema::drop_table(&self.table()))?;
        info!(table = %self.table(), "dropped table");
        Ok(())
    }

    /// Upsert `record`, keyed on its identity.
    ///
    /// A zero identity is omitted from the value list so the engine
    /// assigns a fresh one; a nonzero identity replaces that row. Any
    /// identity the engine reports afterwards is written back onto
    /// `record`. Returns the affected-row count; execution failures are
    /// `Err`, never `Ok(0)`.
    pub fn save(&self, record: &mut R) -> StoreResult<usize> {
        let row = record.to_row()?;
        let identity = R::descriptor().identity;
        let fresh = record.id() == 0;

        let mut columns = Vec::with_capacity(row.len());
        let mut args = Vec::with_capacity(row.len());
        for (name, value) in row.iter() {
            if fresh && name == identity {
                continue;
            }
            columns.push(name);
            args.push(value.clone());
        }

        let sql = schema::replace_into(&self.table(), &columns);
        let affected = self.db.execute_params(&sql, &args)?;
        if let Some(id) = self.db.last_insert_id()? {
            if id != 0 {
                record.set_id(id);
            }
        }
        Ok(affected)
    }

    /// Load at most one raw row matching `cond`.
    ///
    /// Returns the unhydrated column→value mapping; hydration is the
    /// caller's job. The asymmetry with [`load_multi`] is intentional
    /// legacy behavior; existing callers consume the raw row directly.
    ///
    /// [`load_multi`]: RecordAdapter::load_multi
    pub fn load(&self, cond: &str, args: &[Value]) -> StoreResult<Option<Row>> {
        self.db
            .fetch_row(&schema::select_where(&self.table(), cond), args)
    }

    /// Load every record matching `cond`, in result-set order.
    ///
    /// With an empty `args` slice the condition executes verbatim
    /// (trusted internal SQL); otherwise every argument binds by
    /// placeholder.
    pub fn load_multi(&self, cond: &str, args: &[Value]) -> StoreResult<Vec<R>> {
        let rows = self
            .db
            .fetch_rows(&schema::select_where(&self.table(), cond), args)?;
        rows.iter().map(R::from_row).collect()
    }

    /// As [`load_multi`], over a caller-supplied full query.
    ///
    /// [`load_multi`]: RecordAdapter::load_multi
    pub fn load_multi_from_query(&self, query: &str, args: &[Value]) -> StoreResult<Vec<R>> {
        let rows = self.db.fetch_rows(query, args)?;
        rows.iter().map(R::from_row).collect()
    }

    /// Invoke `callback` once per matching record, in the order
    /// [`load_multi`] would return them, without materializing the result
    /// set.
    ///
    /// [`load_multi`]: RecordAdapter::load_multi
    pub fn load_and_call_for_each(
        &self,
        cond: &str,
        args: &[Value],
        mut callback: impl FnMut(R) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let sql = schema::select_where(&self.table(), cond);
        self.db
            .fetch_each(&sql, args, &mut |row| callback(R::from_row(&row)?))
    }

    /// Count records matching `cond`.
    pub fn count(&self, cond: &str, args: &[Value]) -> StoreResult<i64> {
        let scalar = self
            .db
            .fetch_scalar(&schema::count_where(&self.table(), cond), args)?;
        Ok(scalar_count(scalar))
    }

    /// Count via a caller-supplied full query.
    pub fn count_from_query(&self, query: &str, args: &[Value]) -> StoreResult<i64> {
        Ok(scalar_count(self.db.fetch_scalar(query, args)?))
    }

    /// Delete by `record`'s identity. Returns the affected-row count.
    pub fn delete(&self, record: &R) -> StoreResult<usize> {
        let cond = format!("{} = ?", R::descriptor().identity);
        self.db.execute_params(
            &schema::delete_where(&self.table(), &cond),
            &[Value::Int(record.id())],
        )
    }

    /// Delete by a caller-supplied full query. An empty `args` slice
    /// executes the literal string.
    pub fn delete_by_query(&self, query: &str, args: &[Value]) -> StoreResult<usize> {
        if args.is_empty() {
            self.db.execute(query)
        } else {
            self.db.execute_params(query, args)
        }
    }
}

fn scalar_count(value: Option<Value>) -> i64 {
    match value {
        Some(Value::Int(n)) => n,
        Some(Value::Float(f)) => f as i64,
        _ => 0,
    }
}
