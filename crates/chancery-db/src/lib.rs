//! Relational data-access layer for the Chancery assistant.
//!
//! `PostgreSQL` is the single persistent store: member records, bank
//! state, and every interactive panel that must survive a restart all live
//! behind the tables declared through this crate. There is no ORM -- tables
//! are declared as explicit column schemas, queries are assembled from
//! typed fragments with positional parameters, and large reads page
//! through native server-side cursors inside one transaction.
//!
//! # Modules
//!
//! - [`pool`] -- `PostgreSQL` connection pool and raw execute/fetch
//!   primitives with optional per-call timeouts.
//! - [`value`] -- [`SqlValue`]: dynamic positional parameters with typed
//!   `NULL`s.
//! - [`query`] -- the single-use fluent [`Query`] builder.
//! - [`cursor`] -- transaction-scoped `DECLARE`/`FETCH` cursors.
//! - [`table`] -- schema-declared [`Table`]s and their CRUD surface.
//! - [`kv`] -- [`KvTable`], a two-column scalar key/value map.
//! - [`database`] -- the schema registry and two-phase idempotent
//!   bootstrap.
//! - [`error`] -- shared [`DbError`] type.

pub mod cursor;
pub mod database;
pub mod error;
pub mod kv;
pub mod pool;
pub mod query;
pub mod table;
pub mod value;

// Re-export primary types for convenience.
pub use cursor::Cursor;
pub use database::{Database, DatabaseBuilder};
pub use error::DbError;
pub use kv::KvTable;
pub use pool::{PgConfig, Pool};
pub use query::{Order, Query};
pub use table::{ColumnDef, Table, TableSchema};
pub use value::{SqlType, SqlTyped, SqlValue};
