use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

use crate::error::AppError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `allowed` may appear in `payload`; column names are
/// never taken from the request unchecked.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: SqlValue,
) -> Result<SqlUpdate, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::bad_request("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(AppError::bad_request("No fields provided for update"));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(AppError::bad_request(format!("Field cannot be updated: {}", unknown)));
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);

    for value in obj.values() {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(AppError::bad_request("Unsupported JSON value type")),
        }
    }

    values.push(id_value);

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
