//! Metadata records — key/value pairs attached to an occurrence.

use vigil_core::{ColumnDef, ColumnType, Record, Row, StoreResult, TableDescriptor, Value};

/// Metadata keys the reporting query projects.
pub mod keys {
    pub const CURRENT_USER_ROLES: &str = "CurrentUserRoles";
    pub const CLIENT_IP: &str = "ClientIP";
    pub const USER_AGENT: &str = "UserAgent";
    pub const USERNAME: &str = "Username";
    pub const CURRENT_USER_ID: &str = "CurrentUserID";
}

pub static METADATA: TableDescriptor = TableDescriptor {
    table: "metadata",
    identity: "id",
    columns: &[
        ColumnDef::new("id", ColumnType::BigInt),
        ColumnDef::new("occurrence_id", ColumnType::BigInt),
        ColumnDef::new("name", ColumnType::VarChar(100)),
        ColumnDef::new("value", ColumnType::LongText),
    ],
};

/// One key/value pair of an occurrence. The value is an arbitrary
/// structured payload, stored as JSON text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub id: i64,
    pub occurrence_id: i64,
    pub name: String,
    pub value: serde_json::Value,
}

impl Record for Metadata {
    fn descriptor() -> &'static TableDescriptor {
        &METADATA
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
        row.push("occurrence_id", Value::Int(self.occurrence_id));
        row.push("name", Value::Text(self.name.clone()));
        row.push("value", Value::Text(serde_json::to_string(&self.value)?));
        Ok(row)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.get_i64("id")?,
            occurrence_id: row.get_i64("occurrence_id")?,
            name: row.get_str("name")?.to_string(),
            value: serde_json::from_str(row.get_str("value")?)?,
        })
    }
}
