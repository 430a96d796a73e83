//! # vigil-storage
//!
//! The Vigil persistence engine: SQL rendering, the generic
//! [`RecordAdapter`], the concrete audit-log record types, the reporting
//! query assembler, retention, and an embedded SQLite implementation of
//! the execution interface.

pub mod adapter;
pub mod models;
pub mod reporting;
pub mod retention;
pub mod schema;
pub mod sqlite;

pub use adapter::RecordAdapter;
pub use models::{Alert, Metadata, Occurrence};
pub use reporting::{report, ReportFilter, ReportRow};
pub use retention::apply_retention;
pub use sqlite::SqliteDatabase;
