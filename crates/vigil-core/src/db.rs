//! The narrow query-execution interface the engine consumes.

use std::sync::Arc;

use crate::errors::StoreResult;
use crate::value::{Row, Value};

/// Callback for streaming row iteration. Returning an error stops the
/// iteration and propagates.
pub type RowCallback<'a> = dyn FnMut(Row) -> StoreResult<()> + 'a;

/// Execution interface over the underlying database driver.
///
/// Every operation is one synchronous call; the driver owns threading,
/// pooling, and blocking semantics, and this layer opens no transactions.
/// A statement submitted with an empty `args` slice is executed verbatim:
/// the escape hatch for trusted internal literal SQL. Non-empty `args` are
/// always bound by placeholder, never interpolated.
pub trait Database: Send + Sync {
    /// Execute a literal statement, returning the affected-row count.
    fn execute(&self, sql: &str) -> StoreResult<usize>;

    /// Execute a parameterized statement.
    fn execute_params(&self, sql: &str, args: &[Value]) -> StoreResult<usize>;

    /// Fetch at most one row.
    fn fetch_row(&self, sql: &str, args: &[Value]) -> StoreResult<Option<Row>>;

    /// Fetch all rows, in result-set order.
    fn fetch_rows(&self, sql: &str, args: &[Value]) -> StoreResult<Vec<Row>>;

    /// Stream rows through `callback` without materializing the set beyond
    /// the driver's own cursor buffering.
    fn fetch_each(
        &self,
        sql: &str,
        args: &[Value],
        callback: &mut RowCallback<'_>,
    ) -> StoreResult<()>;

    /// Fetch a single scalar: first column of the first row.
    fn fetch_scalar(&self, sql: &str, args: &[Value]) -> StoreResult<Option<Value>>;

    /// Identifier assigned by the most recent insert through this
    /// connection, when the engine reports one.
    fn last_insert_id(&self) -> StoreResult<Option<i64>>;

    /// Prefix prepended to every logical table name.
    fn table_prefix(&self) -> &str;

    /// Character set emitted on CREATE TABLE, when the connection
    /// specifies one.
    fn charset(&self) -> Option<&str>;
}

impl<T: Database + ?Sized> Database for Arc<T> {
    fn execute(&self, sql: &str) -> StoreResult<usize> {
        (**self).execute(sql)
    }
    fn execute_params(&self, sql: &str, args: &[Value]) -> StoreResult<usize> {
        (**self).execute_params(sql, args)
    }
    fn fetch_row(&self, sql: &str, args: &[Value]) -> StoreResult<Option<Row>> {
        (**self).fetch_row(sql, args)
    }
    fn fetch_rows(&self, sql: &str, args: &[Value]) -> StoreResult<Vec<Row>> {
        (**self).fetch_rows(sql, args)
    }
    fn fetch_each(
        &self,
        sql: &str,
        args: &[Value],
        callback: &mut RowCallback<'_>,
    ) -> StoreResult<()> {
        (**self).fetch_each(sql, args, callback)
    }
    fn fetch_scalar(&self, sql: &str, args: &[Value]) -> StoreResult<Option<Value>> {
        (**self).fetch_scalar(sql, args)
    }
    fn last_insert_id(&self) -> StoreResult<Option<i64>> {
        (**self).last_insert_id()
    }
    fn table_prefix(&self) -> &str {
        (**self).table_prefix()
    }
    fn charset(&self) -> Option<&str> {
        (**self).charset()
    }
}
