// ==========================================
// mHealth Barangay San Cristobal - SQLite Record Store
// ==========================================
// Responsibility: RecordStore over rusqlite; pure data access, no
//                 reconciliation rules
// ==========================================

use crate::db;
use crate::domain::PersistedRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_store::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Open (or create) the database at `db_path` and ensure the schema.
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = db::open_connection(db_path)
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;
        db::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;
        db::configure_connection(&conn)?;
        db::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn fetch_by_id(conn: &Connection, table: &str, id: i64) -> RepositoryResult<PersistedRecord> {
        let sql = format!("SELECT * FROM {} WHERE id = ?1", table);
        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut rows = stmt.query(rusqlite::params![id])?;
        match rows.next()? {
            Some(row) => record_from_row(row, &columns, table),
            None => Err(RepositoryError::NotFound {
                table: table.to_string(),
                id,
            }),
        }
    }
}

/// Table and column names are interpolated into SQL, so they must be
/// plain snake_case identifiers.
fn validate_identifier(name: &str) -> RepositoryResult<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidIdentifier(name.to_string()))
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                SqlValue::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|n| Utc.from_utc_datetime(&n))
        })
}

fn record_from_row(
    row: &rusqlite::Row<'_>,
    columns: &[String],
    table: &str,
) -> RepositoryResult<PersistedRecord> {
    let mut fields = Map::new();
    for (idx, name) in columns.iter().enumerate() {
        fields.insert(name.clone(), from_sql_ref(row.get_ref(idx)?));
    }
    let id = fields
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| RepositoryError::QueryError(format!("{}: row without numeric id", table)))?;
    let created_at = fields
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(parse_timestamp_str)
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());
    Ok(PersistedRecord {
        id,
        created_at,
        fields,
    })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn query_by_field(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> RepositoryResult<Vec<PersistedRecord>> {
        validate_identifier(table)?;
        validate_identifier(field)?;
        let conn = self.lock()?;
        let sql = format!("SELECT * FROM {} WHERE {} = ?1", table, field);
        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut rows = stmt.query(rusqlite::params![value])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(record_from_row(row, &columns, table)?);
        }
        Ok(records)
    }

    async fn query_max_id(&self, table: &str, field: &str) -> RepositoryResult<Option<i64>> {
        validate_identifier(table)?;
        validate_identifier(field)?;
        let conn = self.lock()?;
        let sql = format!("SELECT MAX({}) FROM {}", field, table);
        let max: Option<i64> = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(max)
    }

    async fn query_all(&self, table: &str) -> RepositoryResult<Vec<PersistedRecord>> {
        validate_identifier(table)?;
        let conn = self.lock()?;
        let sql = format!("SELECT * FROM {} ORDER BY created_at DESC, id DESC", table);
        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(record_from_row(row, &columns, table)?);
        }
        Ok(records)
    }

    async fn insert(
        &self,
        table: &str,
        fields: &Map<String, Value>,
    ) -> RepositoryResult<PersistedRecord> {
        validate_identifier(table)?;
        for key in fields.keys() {
            validate_identifier(key)?;
        }
        let conn = self.lock()?;
        let columns: Vec<&str> = fields.keys().map(String::as_str).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );
        let values: Vec<SqlValue> = fields.values().map(to_sql_value).collect();
        conn.execute(&sql, params_from_iter(values))?;
        let id = fields
            .get("id")
            .and_then(Value::as_i64)
            .unwrap_or_else(|| conn.last_insert_rowid());
        Self::fetch_by_id(&conn, table, id)
    }

    async fn update(
        &self,
        table: &str,
        id: i64,
        fields: &Map<String, Value>,
    ) -> RepositoryResult<PersistedRecord> {
        validate_identifier(table)?;
        for key in fields.keys() {
            validate_identifier(key)?;
        }
        let conn = self.lock()?;
        if fields.is_empty() {
            return Self::fetch_by_id(&conn, table, id);
        }
        let assignments: Vec<String> = fields
            .keys()
            .enumerate()
            .map(|(i, key)| format!("{} = ?{}", key, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            assignments.join(", "),
            fields.len() + 1
        );
        let mut values: Vec<SqlValue> = fields.values().map(to_sql_value).collect();
        values.push(SqlValue::Integer(id));
        let affected = conn.execute(&sql, params_from_iter(values))?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                table: table.to_string(),
                id,
            });
        }
        Self::fetch_by_id(&conn, table, id)
    }

    async fn delete(&self, table: &str, id: i64) -> RepositoryResult<()> {
        validate_identifier(table)?;
        let conn = self.lock()?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", table);
        let affected = conn.execute(&sql, rusqlite::params![id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                table: table.to_string(),
                id,
            });
        }
        Ok(())
    }
}
