//! # vigil-core
//!
//! Core types for the Vigil audit-trail store: the scalar [`Value`] and
//! dynamic [`Row`], the [`Record`] contract with its static
//! [`TableDescriptor`], the narrow [`Database`] execution interface, the
//! error taxonomy, and store configuration.

pub mod config;
pub mod db;
pub mod errors;
pub mod record;
pub mod value;

pub use config::StoreConfig;
pub use db::{Database, RowCallback};
pub use errors::{StoreError, StoreResult};
pub use record::{ColumnDef, ColumnType, Record, TableDescriptor};
pub use value::{Row, Value};
