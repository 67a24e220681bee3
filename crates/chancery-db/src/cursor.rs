//! Server-side, transaction-scoped result cursors.
//!
//! A [`Cursor`] wraps a native `PostgreSQL` cursor: the `SELECT` is
//! declared once inside an open transaction and rows are pulled in chunks
//! with `FETCH FORWARD`, so large result sets are paged without ever being
//! materialized in full. The cursor is destroyed with its transaction;
//! visibility of concurrently committed writes is whatever the store's
//! isolation level provides.

use std::sync::atomic::{AtomicU64, Ordering};

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Transaction};

use crate::error::DbError;
use crate::value::{SqlValue, bind_values};

/// Process-wide counter for unique cursor names.
static CURSOR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A declared server-side cursor.
///
/// Every [`Cursor::fetch`] and [`Cursor::close`] call must be issued on
/// the transaction the cursor was declared in; the cursor does not exist
/// outside of it.
pub struct Cursor {
    name: String,
    exhausted: bool,
}

impl Cursor {
    /// Declare a cursor for `select_sql` with bound parameters.
    pub(crate) async fn declare(
        tx: &mut Transaction<'_, Postgres>,
        select_sql: &str,
        args: Vec<SqlValue>,
    ) -> Result<Self, DbError> {
        let name = format!(
            "chancery_cur_{}",
            CURSOR_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let sql = format!("DECLARE {name} NO SCROLL CURSOR FOR {select_sql}");
        bind_values(sqlx::query(&sql), args)
            .execute(&mut **tx)
            .await?;
        Ok(Self {
            name,
            exhausted: false,
        })
    }

    /// The server-side cursor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch the next chunk of at most `count` rows.
    ///
    /// An empty chunk signals exhaustion; once a chunk comes back short,
    /// subsequent calls return empty without another round-trip.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the fetch fails -- including when
    /// `tx` is not the transaction the cursor was declared in.
    pub async fn fetch(
        &mut self,
        tx: &mut Transaction<'_, Postgres>,
        count: u32,
    ) -> Result<Vec<PgRow>, DbError> {
        if self.exhausted || count == 0 {
            return Ok(Vec::new());
        }
        let sql = format!("FETCH FORWARD {count} FROM {}", self.name);
        let rows = sqlx::query(&sql).fetch_all(&mut **tx).await?;
        if rows.len() < usize::try_from(count).unwrap_or(usize::MAX) {
            self.exhausted = true;
        }
        Ok(rows)
    }

    /// Close the cursor early, releasing its server-side resources before
    /// the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the close fails.
    pub async fn close(self, tx: &mut Transaction<'_, Postgres>) -> Result<(), DbError> {
        let sql = format!("CLOSE {}", self.name);
        sqlx::query(&sql).execute(&mut **tx).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_names_are_unique() {
        let first = CURSOR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let second = CURSOR_COUNTER.fetch_add(1, Ordering::Relaxed);
        assert!(second > first);
    }
}
