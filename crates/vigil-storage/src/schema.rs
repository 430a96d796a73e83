//! SQL rendering: schema DDL and the parameterized statement shapes the
//! adapter executes. Pure functions over validated descriptors; nothing
//! here touches a connection.

use vigil_core::{ColumnType, StoreResult, TableDescriptor};

/// Render the idempotent CREATE TABLE statement for `desc`.
///
/// The identity column renders as `BIGINT NOT NULL AUTO_INCREMENT` with a
/// trailing `PRIMARY KEY` constraint; `charset`, when present and
/// non-empty, appends a `DEFAULT CHARACTER SET` clause. `table` is the
/// fully prefixed name.
pub fn create_table(
    desc: &TableDescriptor,
    table: &str,
    charset: Option<&str>,
) -> StoreResult<String> {
    desc.validate()?;

    let mut sql = format!("CREATE TABLE IF NOT EXISTS {table} (\n");
    for def in desc.persisted_defs() {
        if def.name == desc.identity {
            sql.push_str(&format!("    {} BIGINT NOT NULL AUTO_INCREMENT,\n", def.name));
        } else {
            sql.push_str(&format!("    {} {} NOT NULL,\n", def.name, sql_type(def.ty)));
        }
    }
    sql.push_str(&format!("    PRIMARY KEY ({})\n)", desc.identity));

    match charset {
        Some(cs) if !cs.is_empty() => sql.push_str(&format!(" DEFAULT CHARACTER SET {cs}")),
        _ => {}
    }
    Ok(sql)
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE {table}")
}

pub fn select_where(table: &str, cond: &str) -> String {
    format!("SELECT * FROM {table} WHERE {cond}")
}

/// `REPLACE INTO` upsert over the given columns, one placeholder per
/// column. Caller chooses whether the identity column participates.
pub fn replace_into(table: &str, columns: &[&str]) -> String {
    let marks = vec!["?"; columns.len()].join(", ");
    format!(
        "REPLACE INTO {table} ({}) VALUES ({marks})",
        columns.join(", ")
    )
}

pub fn delete_where(table: &str, cond: &str) -> String {
    format!("DELETE FROM {table} WHERE {cond}")
}

pub fn count_where(table: &str, cond: &str) -> String {
    format!("SELECT COUNT(*) FROM {table} WHERE {cond}")
}

fn sql_type(ty: ColumnType) -> String {
    match ty {
        ColumnType::BigInt => "BIGINT".to_string(),
        ColumnType::Double => "DOUBLE".to_string(),
        ColumnType::Bit => "BIT".to_string(),
        ColumnType::Text => "TEXT".to_string(),
        ColumnType::VarChar(n) => format!("VARCHAR({n})"),
        ColumnType::LongText => "LONGTEXT".to_string(),
    }
}
