//! Preference repository implementation

use crate::error::{Error, Result};
use crate::models::{FieldValue, StoredRow, UserId};
use crate::translate::is_known_column;
use libsql::{params_from_iter, Connection, Value};

/// Trait for preference storage operations (async)
///
/// Rows are exchanged untyped; callers go through [`crate::translate`] to get a
/// typed record.
#[allow(async_fn_in_trait)]
pub trait PreferenceRepository {
    /// Stored row for a user, or `None` when nothing was ever saved
    async fn find(&self, user_id: &UserId) -> Result<Option<StoredRow>>;

    /// Insert or replace the given columns for a user
    async fn upsert(&self, user_id: &UserId, row: &StoredRow) -> Result<()>;

    /// Delete one user's row; returns whether a row existed
    async fn delete(&self, user_id: &UserId) -> Result<bool>;

    /// Delete the rows of several users; returns the number removed
    async fn delete_many(&self, user_ids: &[UserId]) -> Result<u64>;

    /// Delete every row; returns the number removed
    async fn delete_all(&self) -> Result<u64>;

    /// Users that have a stored row, sorted
    async fn list_user_ids(&self) -> Result<Vec<UserId>>;
}

/// libSQL implementation of `PreferenceRepository`
pub struct LibSqlPreferenceRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlPreferenceRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn to_value(value: &FieldValue) -> Value {
        match value {
            FieldValue::Integer(value) => Value::Integer(*value),
            FieldValue::Real(value) => Value::Real(*value),
            FieldValue::Text(text) => Value::Text(text.clone()),
        }
    }

    fn from_value(value: Value) -> Option<FieldValue> {
        match value {
            Value::Integer(value) => Some(FieldValue::Integer(value)),
            Value::Real(value) => Some(FieldValue::Real(value)),
            Value::Text(text) => Some(FieldValue::Text(text)),
            Value::Null | Value::Blob(_) => None,
        }
    }
}

impl PreferenceRepository for LibSqlPreferenceRepository<'_> {
    async fn find(&self, user_id: &UserId) -> Result<Option<StoredRow>> {
        let mut rows = self
            .conn
            .query(
                "SELECT * FROM aguia_preferences WHERE user_id = ?1",
                [user_id.as_str()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let mut stored = StoredRow::new();
        for idx in 0..row.column_count() {
            let Some(name) = row.column_name(idx).map(str::to_string) else {
                continue;
            };
            if name == "user_id" {
                continue;
            }
            if let Some(value) = Self::from_value(row.get_value(idx)?) {
                stored.insert(name, value);
            }
        }
        Ok(Some(stored))
    }

    async fn upsert(&self, user_id: &UserId, row: &StoredRow) -> Result<()> {
        if let Some((column, _)) = row.iter().find(|(column, _)| !is_known_column(column)) {
            return Err(Error::InvalidInput(format!(
                "Unknown preference column: {column}"
            )));
        }

        let columns: Vec<&str> = row.iter().map(|(column, _)| column).collect();
        let mut values = vec![Value::Text(user_id.to_string())];
        values.extend(row.iter().map(|(_, value)| Self::to_value(value)));

        let sql = if row.is_empty() {
            "INSERT INTO aguia_preferences (user_id) VALUES (?1)
             ON CONFLICT(user_id) DO NOTHING"
                .to_string()
        } else {
            let placeholders: Vec<String> =
                (2..=columns.len() + 1).map(|idx| format!("?{idx}")).collect();
            let updates: Vec<String> = columns
                .iter()
                .map(|column| format!("{column} = excluded.{column}"))
                .collect();
            format!(
                "INSERT INTO aguia_preferences (user_id, {}) VALUES (?1, {})
                 ON CONFLICT(user_id) DO UPDATE SET {}",
                columns.join(", "),
                placeholders.join(", "),
                updates.join(", ")
            )
        };

        self.conn.execute(&sql, params_from_iter(values)).await?;
        tracing::debug!(columns = columns.len(), "Upserted preference row");
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM aguia_preferences WHERE user_id = ?1",
                [user_id.as_str()],
            )
            .await?;
        Ok(removed > 0)
    }

    async fn delete_many(&self, user_ids: &[UserId]) -> Result<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let placeholders: Vec<String> = (1..=user_ids.len()).map(|idx| format!("?{idx}")).collect();
        let sql = format!(
            "DELETE FROM aguia_preferences WHERE user_id IN ({})",
            placeholders.join(", ")
        );
        let removed = self
            .conn
            .execute(&sql, params_from_iter(user_ids.iter().map(UserId::to_string)))
            .await?;
        Ok(removed)
    }

    async fn delete_all(&self) -> Result<u64> {
        let removed = self.conn.execute("DELETE FROM aguia_preferences", ()).await?;
        Ok(removed)
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>> {
        let mut rows = self
            .conn
            .query("SELECT user_id FROM aguia_preferences ORDER BY user_id", ())
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0)?;
            match raw.parse() {
                Ok(id) => ids.push(id),
                Err(_) => tracing::warn!("Skipping preference row with a blank user id"),
            }
        }
        Ok(ids)
    }
}
