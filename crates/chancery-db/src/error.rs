//! Error types for the data-access layer.
//!
//! All fallible operations in this crate return [`DbError`]. Driver errors
//! are wrapped once and otherwise propagated unchanged -- this layer never
//! retries and never masks a failure with a default value.

/// Errors that can occur in the data-access layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed. Constraint violations, syntax
    /// errors, and connectivity failures all surface through this variant
    /// exactly as the driver reported them.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A configuration error, such as an unparsable database URL.
    #[error("configuration error: {0}")]
    Config(String),

    /// A malformed schema declaration: duplicate table names, invalid
    /// column identifiers, or an empty column list. Fatal at startup.
    #[error("schema error: {0}")]
    Schema(String),

    /// A query referenced a column that is not declared on the table it
    /// is bound to. Column names are never passed through unchecked.
    #[error("unknown column `{column}` on table `{table}`")]
    UnknownColumn {
        /// The undeclared column name.
        column: String,
        /// The table the query was bound to.
        table: String,
    },

    /// The operation did not complete within its caller-supplied timeout.
    /// The underlying connection is returned to the pool in a clean state.
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}
