//! Occurrence records — one row per logged event.

use vigil_core::{ColumnDef, ColumnType, Record, Row, StoreResult, TableDescriptor, Value};

pub static OCCURRENCE: TableDescriptor = TableDescriptor {
    table: "occurrences",
    identity: "id",
    columns: &[
        ColumnDef::new("id", ColumnType::BigInt),
        ColumnDef::new("site_id", ColumnType::BigInt),
        ColumnDef::new("alert_id", ColumnType::BigInt),
        ColumnDef::new("created_on", ColumnType::Double),
        ColumnDef::new("is_read", ColumnType::Bit),
        ColumnDef::new("is_migrated", ColumnType::Bit),
    ],
};

/// One logged event: which alert fired, on which site, and when.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Occurrence {
    pub id: i64,
    pub site_id: i64,
    pub alert_id: i64,
    /// Seconds since the epoch, fractional.
    pub created_on: f64,
    pub is_read: bool,
    pub is_migrated: bool,
}

impl Record for Occurrence {
    fn descriptor() -> &'static TableDescriptor {
        &OCCURRENCE
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn to_row(&self) -> StoreResult<Row> {
        let mut row = Row::new();
        row.push("id", Value::Int(self.id));
        row.push("site_id", Value::Int(self.site_id));
        row.push("alert_id", Value::Int(self.alert_id));
        row.push("created_on", Value::Float(self.created_on));
        row.push("is_read", Value::Bool(self.is_read));
        row.push("is_migrated", Value::Bool(self.is_migrated));
        Ok(row)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.get_i64("id")?,
            site_id: row.get_i64("site_id")?,
            alert_id: row.get_i64("alert_id")?,
            created_on: row.get_f64("created_on")?,
            is_read: row.get_bool("is_read")?,
            is_migrated: row.get_bool("is_migrated")?,
        })
    }
}
