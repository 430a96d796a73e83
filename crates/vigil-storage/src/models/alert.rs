//! Alert catalog records.

use vigil_core::{ColumnDef, ColumnType, Record, Row, StoreResult, TableDescriptor, Value};

pub static ALERT: TableDescriptor = TableDescriptor {
    table: "alerts",
    identity: "id",
    columns: &[
        ColumnDef::new("id", ColumnType::BigInt),
        ColumnDef::new("code", ColumnType::BigInt),
        ColumnDef::new("severity", ColumnType::BigInt),
        ColumnDef::new("category", ColumnType::VarChar(64)),
        ColumnDef::new("description", ColumnType::Text),
        ColumnDef::new("tags", ColumnType::LongText),
    ],
};

/// One entry of the alert catalog. `code` is the stable identifier
/// occurrences reference through their `alert_id` column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alert {
    pub id: i64,
    pub code: i64,
    pub severity: i64,
    pub category: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl Record for Alert {
    fn descriptor() -> &'static TableDescriptor {
        &ALERT
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
        row.push("code", Value::Int(self.code));
        row.push("severity", Value::Int(self.severity));
        row.push("category", Value::Text(self.category.clone()));
        row.push("description", Value::Text(self.description.clone()));
        row.push("tags", Value::Text(serde_json::to_string(&self.tags)?));
        Ok(row)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.get_i64("id")?,
            code: row.get_i64("code")?,
            severity: row.get_i64("severity")?,
            category: row.get_str("category")?.to_string(),
            description: row.get_str("description")?.to_string(),
            tags: serde_json::from_str(row.get_str("tags")?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip_by_value() {
        let alert = Alert {
            id: 0,
            code: 4000,
            severity: 3,
            category: "content".to_string(),
            description: "Post published".to_string(),
            tags: vec!["post".to_string(), "publish".to_string()],
        };
        let row = alert.to_row().unwrap();
        assert_eq!(Alert::from_row(&row).unwrap(), alert);
    }
}
