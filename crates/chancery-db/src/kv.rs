//! Scalar key/value tables.
//!
//! A [`KvTable`] is a degenerate [`Table`] with exactly two columns:
//! `key TEXT PRIMARY KEY` and a `value` of the declared scalar type. Every
//! write is an upsert -- callers can never observe a duplicate-key failure,
//! and there is exactly one row per logical key.

use std::collections::BTreeSet;

use sqlx::Postgres;

use crate::error::DbError;
use crate::table::Table;
use crate::value::SqlValue;

/// A two-column scalar map stored in `PostgreSQL`.
#[derive(Clone)]
pub struct KvTable {
    table: Table,
}

impl KvTable {
    pub(crate) const fn new(table: Table) -> Self {
        Self { table }
    }

    /// The underlying table name.
    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// Read the value stored under `key`, or `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Propagates driver errors unchanged.
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, DbError>
    where
        T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
    {
        self.table
            .select_val("value")
            .and_where(vec![("key", key.into())])
            .fetch_val::<T>()
            .await
    }

    /// Read the value stored under `key`, or `default` when the key is
    /// absent. Errors are still propagated -- only absence is defaulted.
    ///
    /// # Errors
    ///
    /// Propagates driver errors unchanged.
    pub async fn get_or<T>(&self, key: &str, default: T) -> Result<T, DbError>
    where
        T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
    {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Propagates driver errors unchanged.
    pub async fn set(&self, key: &str, value: impl Into<SqlValue>) -> Result<(), DbError> {
        self.table
            .insert(vec![("key", key.into()), ("value", value.into())])
            .on_conflict_update(&["key"], "value = EXCLUDED.value")
            .run()
            .await?;
        Ok(())
    }

    /// Store every `(key, value)` entry inside a single transaction; each
    /// write is the same upsert as [`KvTable::set`].
    ///
    /// # Errors
    ///
    /// A driver failure on any entry rolls back the entire batch.
    pub async fn set_many(&self, entries: Vec<(String, SqlValue)>) -> Result<(), DbError> {
        if entries.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "INSERT INTO {} (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
            self.table.name()
        );
        let rows: Vec<Vec<SqlValue>> = entries
            .into_iter()
            .map(|(key, value)| vec![SqlValue::Text(key), value])
            .collect();
        self.table.pool().execute_batch(&sql, rows, None).await?;
        Ok(())
    }

    /// `true` when `key` has a stored value.
    ///
    /// # Errors
    ///
    /// Propagates driver errors unchanged.
    pub async fn is_set(&self, key: &str) -> Result<bool, DbError> {
        self.table.exists(vec![("key", key.into())]).await
    }

    /// `true` only when every one of `keys` has a stored value.
    ///
    /// Duplicate keys in the probe list are counted once. An empty probe
    /// list is vacuously `true`.
    ///
    /// # Errors
    ///
    /// Propagates driver errors unchanged.
    pub async fn all_set(&self, keys: &[&str]) -> Result<bool, DbError> {
        let distinct: BTreeSet<&str> = keys.iter().copied().collect();
        if distinct.is_empty() {
            return Ok(true);
        }
        let expected = i64::try_from(distinct.len()).unwrap_or(i64::MAX);
        let probe: Vec<String> = distinct.into_iter().map(str::to_owned).collect();
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE key = ANY($1)",
            self.table.name()
        );
        let count: Option<i64> = self
            .table
            .pool()
            .fetch_val(&sql, vec![SqlValue::TextArray(probe)], None)
            .await?;
        Ok(count.unwrap_or(0) >= expected)
    }

    /// Delete the row for `key`; a no-op when the key is absent.
    ///
    /// # Errors
    ///
    /// Propagates driver errors unchanged.
    pub async fn unset(&self, key: &str) -> Result<(), DbError> {
        self.table
            .delete()
            .and_where(vec![("key", key.into())])
            .run()
            .await?;
        Ok(())
    }
}
