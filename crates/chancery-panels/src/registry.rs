//! The database-backed panel registry.
//!
//! One row per live panel: `(id BIGINT PRIMARY KEY, data BYTEA NOT NULL)`.
//! Ids are allocated from a dedicated sequence -- never derived from
//! `MAX(id)` -- so allocation is race-free under concurrent callers and an
//! id is never reused after its panel is removed, including for panels
//! created while a restart's rehydration pass is still running.
//!
//! Bulk loading walks the table through a transaction-scoped server-side
//! cursor and decodes row by row; a row that fails to decode is logged
//! and skipped without aborting the rest of the load.

use std::collections::VecDeque;

use chancery_db::{Cursor, Database, DatabaseBuilder, DbError, Order, Table};
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};

use crate::codec::{PanelCodecs, encode_panel};
use crate::error::PanelError;
use crate::panel::{Panel, PanelId};

/// Table holding serialized panels.
const PANEL_TABLE: &str = "panels";

/// Sequence that is the sole authority for the next unused panel id.
const PANEL_SEQUENCE: &str = "panel_id_seq";

/// Rows pulled per cursor round-trip during a bulk load.
const SCAN_CHUNK: u32 = 50;

/// Stores, loads, and identifies panels.
pub struct PanelRegistry {
    db: Database,
    table: Table,
    codecs: PanelCodecs,
}

impl PanelRegistry {
    /// Declare the registry's table and id sequence on a database builder.
    ///
    /// Call once during schema declaration, before
    /// [`Database::initialise`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Schema`] if the table name is already taken.
    pub fn declare(builder: &mut DatabaseBuilder) -> Result<(), DbError> {
        builder.table(
            PANEL_TABLE,
            &[("id", "BIGINT PRIMARY KEY"), ("data", "BYTEA NOT NULL")],
        )?;
        builder.pre_init(&format!("CREATE SEQUENCE IF NOT EXISTS {PANEL_SEQUENCE}"));
        Ok(())
    }

    /// Bind a registry to the database and the codec set built at startup.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Db`] if the registry table was not declared.
    pub fn new(db: &Database, codecs: PanelCodecs) -> Result<Self, PanelError> {
        let table = db.table(PANEL_TABLE)?;
        Ok(Self {
            db: db.clone(),
            table,
            codecs,
        })
    }

    /// The registered codec set.
    pub const fn codecs(&self) -> &PanelCodecs {
        &self.codecs
    }

    /// Allocate a fresh panel id by advancing the dedicated sequence.
    ///
    /// Safe under concurrent callers; failed work after allocation leaves
    /// a gap rather than ever handing the same id out twice.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Db`] if the sequence cannot be advanced.
    pub async fn next_id(&self) -> Result<PanelId, PanelError> {
        let value: Option<i64> = self
            .db
            .pool()
            .fetch_val(
                &format!("SELECT nextval('{PANEL_SEQUENCE}')"),
                Vec::new(),
                None,
            )
            .await
            .map_err(PanelError::Db)?;
        value.map(PanelId::new).ok_or(PanelError::SequenceEmpty)
    }

    /// Serialize `panel` and insert it under its id.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::DuplicateId`] when the id is already stored --
    /// a logic error surfaced immediately, never an overwrite.
    pub async fn add(&self, panel: &dyn Panel) -> Result<(), PanelError> {
        let blob = encode_panel(panel)?;
        let inserted = self
            .table
            .insert(vec![
                ("id", panel.id().into_inner().into()),
                ("data", blob.into()),
            ])
            .run()
            .await;
        match inserted {
            Ok(_) => {
                tracing::debug!(id = %panel.id(), tag = panel.type_tag(), "Stored panel");
                Ok(())
            }
            Err(DbError::Postgres(sqlx::Error::Database(ref db_err)))
                if db_err.is_unique_violation() =>
            {
                Err(PanelError::DuplicateId(panel.id()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete the row for `id`; a no-op when the panel is already gone.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Db`] if the delete fails.
    pub async fn remove(&self, id: PanelId) -> Result<(), PanelError> {
        let removed = self
            .table
            .delete()
            .and_where(vec![("id", id.into_inner().into())])
            .run()
            .await
            .map_err(PanelError::Db)?;
        tracing::debug!(%id, removed, "Removed panel");
        Ok(())
    }

    /// Load and decode the panel stored under `id`, or `None` when no
    /// such row exists -- absence is explicit, never a default panel.
    ///
    /// # Errors
    ///
    /// Returns the codec error when the row exists but does not decode.
    pub async fn get(&self, id: PanelId) -> Result<Option<Box<dyn Panel>>, PanelError> {
        let blob: Option<Vec<u8>> = self
            .table
            .select_val("data")
            .and_where(vec![("id", id.into_inner().into())])
            .fetch_val()
            .await
            .map_err(PanelError::Db)?;
        match blob {
            Some(blob) => Ok(Some(self.codecs.decode(&blob)?)),
            None => Ok(None),
        }
    }

    /// `true` when a row is stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Db`] if the probe fails.
    pub async fn contains(&self, id: PanelId) -> Result<bool, PanelError> {
        Ok(self
            .table
            .exists(vec![("id", id.into_inner().into())])
            .await?)
    }

    /// The number of stored panels.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Db`] if the count fails.
    pub async fn count(&self) -> Result<i64, PanelError> {
        Ok(self.table.count().await?)
    }

    /// Start a lazy walk over every stored panel.
    ///
    /// The walk holds one transaction (and its server-side cursor) for
    /// its whole lifetime; the registry is paged, never materialized.
    /// Each call starts a fresh walk from the first row.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Db`] if the transaction or cursor cannot be
    /// opened.
    pub async fn scan(&self) -> Result<PanelScan<'_>, PanelError> {
        let mut tx = self.db.begin().await?;
        let cursor = self
            .table
            .select(&["id", "data"])
            .order_by("id", Order::Asc)
            .cursor(&mut tx)
            .await?;
        Ok(PanelScan {
            tx,
            cursor,
            codecs: &self.codecs,
            buffer: VecDeque::new(),
        })
    }

    /// Rehydrate every stored panel into memory.
    ///
    /// Convenience over [`PanelRegistry::scan`] for startup, where the
    /// result is immediately re-attached to the gateway. Undecodable rows
    /// are skipped, exactly as in the lazy walk.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Db`] if the underlying walk fails.
    pub async fn load_all(&self) -> Result<Vec<Box<dyn Panel>>, PanelError> {
        let mut scan = self.scan().await?;
        let mut panels = Vec::new();
        while let Some(panel) = scan.next().await? {
            panels.push(panel);
        }
        scan.finish().await?;
        tracing::info!(count = panels.len(), "Rehydrated panels from registry");
        Ok(panels)
    }
}

/// An in-progress lazy walk over the registry.
///
/// Rows stream through a server-side cursor inside the walk's own
/// transaction; [`PanelScan::next`] decodes one panel at a time, skipping
/// (with a warning) any row whose blob no registered codec accepts.
pub struct PanelScan<'r> {
    tx: Transaction<'static, Postgres>,
    cursor: Cursor,
    codecs: &'r PanelCodecs,
    buffer: VecDeque<PgRow>,
}

impl PanelScan<'_> {
    /// Decode and return the next stored panel, or `None` once the table
    /// is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Db`] if a cursor fetch fails. Decode
    /// failures are not errors here: the row is logged and skipped so one
    /// corrupt blob cannot abort a startup load.
    pub async fn next(&mut self) -> Result<Option<Box<dyn Panel>>, PanelError> {
        loop {
            while let Some(row) = self.buffer.pop_front() {
                let id: i64 = row.try_get("id").map_err(DbError::from)?;
                let blob: Vec<u8> = row.try_get("data").map_err(DbError::from)?;
                match self.codecs.decode(&blob) {
                    Ok(panel) => return Ok(Some(panel)),
                    Err(err) => {
                        tracing::warn!(id, error = %err, "Skipping undecodable panel row");
                    }
                }
            }
            let rows = self.cursor.fetch(&mut self.tx, SCAN_CHUNK).await?;
            if rows.is_empty() {
                return Ok(None);
            }
            self.buffer.extend(rows);
        }
    }

    /// End the walk, committing its (read-only) transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Db`] if the commit fails. Dropping the walk
    /// without calling this rolls the transaction back instead, which is
    /// equally safe for a read-only scan.
    pub async fn finish(self) -> Result<(), PanelError> {
        self.tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }
}
