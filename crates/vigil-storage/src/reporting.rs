//! The denormalized audit report: occurrences joined to their metadata,
//! filtered by six optional dimensions, with a user-identity resolution
//! pass over the result.

use tracing::debug;
use vigil_core::{Database, StoreResult, Value};

use crate::models::metadata::keys;

/// Optional filter dimensions for [`report`]. A `None` dimension is
/// unconditionally true; it restricts nothing.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub site_ids: Option<Vec<i64>>,
    pub user_ids: Option<Vec<i64>>,
    /// Regular-expression containment test against the stored role list;
    /// an empty pattern matches every role row.
    pub role: Option<String>,
    pub alert_codes: Option<Vec<i64>>,
    /// Inclusive lower bound on `created_on`.
    pub start: Option<f64>,
    /// Inclusive upper bound on `created_on`.
    pub end: Option<f64>,
}

/// One row of the denormalized report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub id: i64,
    pub alert_id: i64,
    pub site_id: i64,
    pub created_on: f64,
    pub roles: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    /// Canonical user id, when the metadata identity resolved.
    pub user_id: Option<i64>,
}

/// Assemble and run the report.
///
/// Each optional dimension compiles to a `(? IS NULL OR …)` predicate, so
/// one statement shape serves every filter combination; list dimensions
/// bind as comma-separated text matched by `find_in_set`. Results are
/// distinct per occurrence, ordered by site then creation time descending.
///
/// The metadata-derived identity projection may hold a login name or a raw
/// id; each row is resolved against the user table afterwards, login
/// first, then id. Known N+1 shape: one or two extra queries per result
/// row.
pub fn report(db: &dyn Database, filter: &ReportFilter) -> StoreResult<Vec<ReportRow>> {
    let prefix = db.table_prefix();
    let occ = format!("{prefix}occurrences");
    let meta = format!("{prefix}metadata");
    let users = format!("{prefix}users");

    let site_csv = csv(&filter.site_ids);
    let user_csv = csv(&filter.user_ids);
    let alert_csv = csv(&filter.alert_codes);
    let role = filter
        .role
        .clone()
        .map(Value::Text)
        .unwrap_or(Value::Null);
    let start = filter.start.map(Value::Float).unwrap_or(Value::Null);
    let end = filter.end.map(Value::Float).unwrap_or(Value::Null);

    // Resolve login names up front so the Username metadata branch can
    // match by literal login.
    let mut logins: Vec<String> = Vec::new();
    if let Value::Text(ids) = &user_csv {
        let sql = format!("SELECT user_login FROM {users} WHERE find_in_set(ID, ?) > 0");
        for row in db.fetch_rows(&sql, &[Value::Text(ids.clone())])? {
            if let Some(Value::Text(login)) = row.get("user_login") {
                logins.push(login.clone());
            }
        }
    }
    let login_marks = if logins.is_empty() {
        "?".to_string()
    } else {
        vec!["?"; logins.len()].join(", ")
    };

    let sql = format!(
        "SELECT DISTINCT\n\
            occ.id,\n\
            occ.alert_id,\n\
            occ.site_id,\n\
            occ.created_on,\n\
            replace(replace(replace((SELECT t1.value FROM {meta} AS t1 WHERE t1.name = '{roles_key}' AND t1.occurrence_id = occ.id), '[', ''), ']', ''), '\"', '') AS roles,\n\
            (SELECT replace(t2.value, '\"', '') FROM {meta} AS t2 WHERE t2.name = '{ip_key}' AND t2.occurrence_id = occ.id) AS ip,\n\
            (SELECT replace(t3.value, '\"', '') FROM {meta} AS t3 WHERE t3.name = '{ua_key}' AND t3.occurrence_id = occ.id) AS ua,\n\
            COALESCE(\n\
                (SELECT replace(t4.value, '\"', '') FROM {meta} AS t4 WHERE t4.name = '{username_key}' AND t4.occurrence_id = occ.id),\n\
                (SELECT replace(t5.value, '\"', '') FROM {meta} AS t5 WHERE t5.name = '{userid_key}' AND t5.occurrence_id = occ.id)\n\
            ) AS user_id\n\
         FROM {occ} AS occ\n\
         JOIN {meta} AS meta ON meta.occurrence_id = occ.id\n\
         WHERE\n\
            (? IS NULL OR find_in_set(occ.site_id, ?) > 0)\n\
            AND (? IS NULL OR (\n\
                (meta.name = '{userid_key}' AND find_in_set(meta.value, ?) > 0)\n\
                OR (meta.name = '{username_key}' AND replace(meta.value, '\"', '') IN ({login_marks}))\n\
            ))\n\
            AND (? IS NULL OR (meta.name = '{roles_key}'\n\
                AND replace(replace(replace(meta.value, ']', ''), '[', ''), '\"', '') REGEXP ?))\n\
            AND (? IS NULL OR find_in_set(occ.alert_id, ?) > 0)\n\
            AND (? IS NULL OR occ.created_on >= ?)\n\
            AND (? IS NULL OR occ.created_on <= ?)\n\
         ORDER BY site_id, created_on DESC",
        roles_key = keys::CURRENT_USER_ROLES,
        ip_key = keys::CLIENT_IP,
        ua_key = keys::USER_AGENT,
        username_key = keys::USERNAME,
        userid_key = keys::CURRENT_USER_ID,
    );

    let mut args: Vec<Value> = vec![
        site_csv.clone(),
        site_csv,
        user_csv.clone(),
        user_csv,
    ];
    if logins.is_empty() {
        args.push(Value::Null);
    } else {
        args.extend(logins.into_iter().map(Value::Text));
    }
    args.push(role.clone());
    args.push(role);
    args.push(alert_csv.clone());
    args.push(alert_csv);
    args.push(start.clone());
    args.push(start);
    args.push(end.clone());
    args.push(end);

    let rows = db.fetch_rows(&sql, &args)?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let identity = row.get("user_id").cloned().unwrap_or(Value::Null);
        out.push(ReportRow {
            id: row.get_i64("id")?,
            alert_id: row.get_i64("alert_id")?,
            site_id: row.get_i64("site_id")?,
            created_on: row.get_f64("created_on")?,
            roles: text_or_none(row.get("roles")),
            ip: text_or_none(row.get("ip")),
            user_agent: text_or_none(row.get("ua")),
            user_id: resolve_user(db, &users, &identity)?,
        });
    }
    Ok(out)
}

/// Comma-separated bind for a list dimension; `Null` when absent.
fn csv(ids: &Option<Vec<i64>>) -> Value {
    match ids {
        Some(ids) if !ids.is_empty() => Value::Text(
            ids.iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        _ => Value::Null,
    }
}

fn text_or_none(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Text(text)) => Some(text.clone()),
        _ => None,
    }
}

/// Fallback identity lookup: login name first, then raw id. Both failing
/// leaves the identity unresolved rather than failing the report.
fn resolve_user(db: &dyn Database, users: &str, identity: &Value) -> StoreResult<Option<i64>> {
    let text = match identity {
        Value::Text(text) if !text.is_empty() => text.clone(),
        Value::Int(id) => id.to_string(),
        _ => return Ok(None),
    };

    let by_login = format!("SELECT ID FROM {users} WHERE user_login = ?");
    if let Some(value) = db.fetch_scalar(&by_login, &[Value::Text(text.clone())])? {
        if let Some(id) = scalar_id(&value) {
            return Ok(Some(id));
        }
    }

    if let Ok(raw_id) = text.parse::<i64>() {
        let by_id = format!("SELECT ID FROM {users} WHERE ID = ?");
        if let Some(value) = db.fetch_scalar(&by_id, &[Value::Int(raw_id)])? {
            if let Some(id) = scalar_id(&value) {
                return Ok(Some(id));
            }
        }
    }

    debug!(identity = %text, "report user identity did not resolve");
    Ok(None)
}

fn scalar_id(value: &Value) -> Option<i64> {
    match value {
        Value::Int(id) => Some(*id),
        Value::Text(text) => text.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_list_binds_null() {
        assert_eq!(csv(&None), Value::Null);
        assert_eq!(csv(&Some(Vec::new())), Value::Null);
    }

    #[test]
    fn list_binds_as_comma_separated_text() {
        assert_eq!(
            csv(&Some(vec![1, 5, 9])),
            Value::Text("1,5,9".to_string())
        );
    }

    #[test]
    fn scalar_id_parses_both_forms() {
        assert_eq!(scalar_id(&Value::Int(4)), Some(4));
        assert_eq!(scalar_id(&Value::Text("4".to_string())), Some(4));
        assert_eq!(scalar_id(&Value::Text("ghost".to_string())), None);
        assert_eq!(scalar_id(&Value::Null), None);
    }
}
