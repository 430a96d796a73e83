//! Statically declared table descriptors and the record contract.

use crate::errors::{StoreError, StoreResult};
use crate::value::Row;

/// Declared SQL type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit integer.
    BigInt,
    /// Double-precision float.
    Double,
    /// Single bit, holding a boolean.
    Bit,
    /// Unbounded text.
    Text,
    /// Length-bounded text.
    VarChar(u32),
    /// Unbounded text holding a serialized structured value.
    LongText,
}

/// One declared column of a record type.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    /// Bookkeeping columns opt out of persistence.
    pub persisted: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            persisted: true,
        }
    }

    /// A declared-but-not-persisted column.
    pub const fn transient(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            persisted: false,
        }
    }
}

/// Static description of a record type's table: logical name (the
/// connection's prefix is prepended at runtime), identity column, and the
/// ordered column list.
#[derive(Debug)]
pub struct TableDescriptor {
    pub table: &'static str,
    pub identity: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDescriptor {
    /// Persisted column definitions, in declaration order. Blank names are
    /// skipped along with explicit opt-outs.
    pub fn persisted_defs(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns
            .iter()
            .filter(|def| def.persisted && !def.name.trim().is_empty())
    }

    /// Persisted column names, in declaration order.
    pub fn persisted_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.persisted_defs().map(|def| def.name)
    }

    /// Configuration check: at least one persisted column, and the identity
    /// column among them. Surfaced before any SQL is generated.
    pub fn validate(&self) -> StoreResult<()> {
        let mut count = 0;
        let mut has_identity = false;
        for name in self.persisted_columns() {
            count += 1;
            if name == self.identity {
                has_identity = true;
            }
        }
        if count == 0 {
            return Err(StoreError::NoColumns {
                table: self.table.to_string(),
            });
        }
        if !has_identity {
            return Err(StoreError::MissingIdentity {
                table: self.table.to_string(),
                column: self.identity.to_string(),
            });
        }
        Ok(())
    }
}

/// A persisted row value type.
///
/// Implementations declare their schema statically through [`descriptor`]
/// and convert to and from the dynamic [`Row`] representation at the
/// storage boundary. The identity field is zero until the engine assigns
/// one.
///
/// [`descriptor`]: Record::descriptor
pub trait Record: Default {
    fn descriptor() -> &'static TableDescriptor;

    /// Current identity value; zero means not yet persisted.
    fn id(&self) -> i64;

    /// Called by the adapter once the engine reports an assigned identity.
    fn set_id(&mut self, id: i64);

    /// Column→value list over the persisted columns, in declaration order.
    /// Structured fields serialize to their text encoding here.
    fn to_row(&self) -> StoreResult<Row>;

    /// Hydrate from a fetched row.
    fn from_row(row: &Row) -> StoreResult<Self>;
}
