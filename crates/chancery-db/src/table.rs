//! Schema-declared tables and their typed CRUD surface.
//!
//! A [`TableSchema`] is declared once at process start -- an ordered list of
//! `(column, DDL fragment)` pairs plus an optional trailing constraint --
//! and re-applied idempotently (`CREATE TABLE IF NOT EXISTS`) on every
//! boot. Column identifiers are validated at declaration time and never
//! derived from untrusted input; every read/write operation checks its
//! column names against the declaration before any SQL is assembled.

use std::sync::Arc;

use crate::error::DbError;
use crate::pool::Pool;
use crate::query::Query;
use crate::value::SqlValue;

/// What shape of table a declaration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TableKind {
    /// An ordinary entity table.
    Plain,
    /// A two-column `(key, value)` scalar map.
    KeyValue,
}

/// One declared column: its identifier and the DDL fragment that follows
/// it in `CREATE TABLE` (type plus constraints, e.g. `BIGINT PRIMARY KEY`).
#[derive(Debug, Clone)]
pub struct ColumnDef {
    name: String,
    decl: String,
}

impl ColumnDef {
    /// The column identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The DDL fragment after the identifier.
    pub fn decl(&self) -> &str {
        &self.decl
    }
}

/// A named table schema: ordered columns and an optional raw constraint
/// suffix (e.g. a composite foreign key).
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnDef>,
    constraint: Option<String>,
    kind: TableKind,
}

impl TableSchema {
    /// Declare a table from `(column, DDL fragment)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Schema`] if the table or a column identifier is
    /// malformed, the column list is empty, or a column repeats.
    pub fn new(name: &str, columns: &[(&str, &str)]) -> Result<Self, DbError> {
        Self::build(name, columns, None, TableKind::Plain)
    }

    /// Declare a table with a trailing constraint clause appended after
    /// the column list, e.g. `"FOREIGN KEY (a, b) REFERENCES other (a, b)"`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Schema`] as for [`TableSchema::new`].
    pub fn with_constraint(
        name: &str,
        columns: &[(&str, &str)],
        constraint: &str,
    ) -> Result<Self, DbError> {
        Self::build(name, columns, Some(constraint.to_owned()), TableKind::Plain)
    }

    /// Declare a key/value table: `key TEXT PRIMARY KEY` plus a `value`
    /// column of the given declared type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Schema`] if the table name is malformed.
    pub(crate) fn new_kv(name: &str, value_decl: &str) -> Result<Self, DbError> {
        Self::build(
            name,
            &[("key", "TEXT PRIMARY KEY"), ("value", value_decl)],
            None,
            TableKind::KeyValue,
        )
    }

    fn build(
        name: &str,
        columns: &[(&str, &str)],
        constraint: Option<String>,
        kind: TableKind,
    ) -> Result<Self, DbError> {
        if !valid_identifier(name) {
            return Err(DbError::Schema(format!("invalid table name `{name}`")));
        }
        if columns.is_empty() {
            return Err(DbError::Schema(format!(
                "table `{name}` declares no columns"
            )));
        }

        let mut defs: Vec<ColumnDef> = Vec::with_capacity(columns.len());
        for (column, decl) in columns {
            if !valid_identifier(column) {
                return Err(DbError::Schema(format!(
                    "invalid column name `{column}` on table `{name}`"
                )));
            }
            if defs.iter().any(|d| d.name == *column) {
                return Err(DbError::Schema(format!(
                    "duplicate column `{column}` on table `{name}`"
                )));
            }
            defs.push(ColumnDef {
                name: (*column).to_owned(),
                decl: (*decl).to_owned(),
            });
        }

        Ok(Self {
            name: name.to_owned(),
            columns: defs,
            constraint,
            kind,
        })
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared columns, in declaration order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Whether `column` is declared on this table.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|d| d.name == column)
    }

    pub(crate) const fn kind(&self) -> TableKind {
        self.kind
    }

    /// The idempotent DDL statement for this table.
    pub fn create_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|d| format!("{} {}", d.name, d.decl))
            .collect();
        if let Some(extra) = &self.constraint {
            parts.push(extra.clone());
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            parts.join(", ")
        )
    }
}

/// `true` when `name` is a safe lowercase SQL identifier.
fn valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// A handle to one declared table, bound to the connection pool.
///
/// Cheap to clone; all operations build a single-use [`Query`] that is
/// consumed by its terminal call.
#[derive(Clone)]
pub struct Table {
    schema: Arc<TableSchema>,
    pool: Pool,
}

impl Table {
    pub(crate) const fn new(schema: Arc<TableSchema>, pool: Pool) -> Self {
        Self { schema, pool }
    }

    /// The table name.
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// The declared schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub(crate) const fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Start a `SELECT` over the given columns (empty list selects `*`),
    /// intended to be finished with [`Query::fetch_all`] or a cursor.
    pub fn select(&self, columns: &[&str]) -> Query {
        let mut query = self.query(String::from("SELECT "));
        query.push_columns(columns);
        query.push_raw(&format!(" FROM {}", self.name()));
        query
    }

    /// Start a `SELECT` expected to match at most one row, intended to be
    /// finished with [`Query::fetch_row`].
    pub fn select_row(&self, columns: &[&str]) -> Query {
        self.select(columns)
    }

    /// Start a `SELECT` of a single column, intended to be finished with
    /// [`Query::fetch_val`].
    pub fn select_val(&self, column: &str) -> Query {
        self.select(&[column])
    }

    /// `true` when a row matches every equality condition.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UnknownColumn`] for an undeclared column,
    /// otherwise propagates driver errors.
    pub async fn exists(&self, conditions: Vec<(&str, SqlValue)>) -> Result<bool, DbError> {
        let row = self
            .probe()
            .and_where(conditions)
            .limit(1)
            .fetch_row()
            .await?;
        Ok(row.is_some())
    }

    /// `true` when a row matches at least one of the equality conditions
    /// (disjunction instead of conjunction).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UnknownColumn`] for an undeclared column,
    /// otherwise propagates driver errors.
    pub async fn exists_any(&self, conditions: Vec<(&str, SqlValue)>) -> Result<bool, DbError> {
        let row = self
            .probe()
            .or_where(conditions)
            .limit(1)
            .fetch_row()
            .await?;
        Ok(row.is_some())
    }

    /// Start an `INSERT` of one row from `(column, value)` pairs.
    ///
    /// Returns a [`Query`] so the caller can chain `ON CONFLICT` or
    /// `RETURNING` clauses before running it.
    pub fn insert(&self, values: Vec<(&str, SqlValue)>) -> Query {
        let mut query = self.query(format!("INSERT INTO {} (", self.name()));
        if values.is_empty() {
            query.poison(DbError::Schema(format!(
                "insert into `{}` requires at least one column",
                self.name()
            )));
            return query;
        }
        let columns: Vec<&str> = values.iter().map(|(column, _)| *column).collect();
        query.push_columns(&columns);
        query.push_raw(") VALUES (");
        query.push_placeholders(values.into_iter().map(|(_, value)| value).collect());
        query.push_raw(")");
        query
    }

    /// Insert many rows with the same column list inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UnknownColumn`] for an undeclared column;
    /// a driver failure on any row rolls back the entire batch.
    pub async fn insert_many(
        &self,
        columns: &[&str],
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<u64, DbError> {
        if columns.is_empty() {
            return Err(DbError::Schema(format!(
                "insert_many into `{}` requires at least one column",
                self.name()
            )));
        }
        let mut query = self.query(format!("INSERT INTO {} (", self.name()));
        query.push_columns(columns);
        query.push_raw(") VALUES (");
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
        query.push_raw(&placeholders.join(", "));
        query.push_raw(")");
        let sql = query.into_sql()?;

        if let Some(bad) = rows.iter().find(|args| args.len() != columns.len()) {
            return Err(DbError::Schema(format!(
                "insert_many into `{}`: row arity {} does not match {} columns",
                self.name(),
                bad.len(),
                columns.len()
            )));
        }

        self.pool.execute_batch(&sql, rows, None).await
    }

    /// Start an `UPDATE` assigning each `(column, value)` pair.
    ///
    /// Without a subsequent `and_where`, every row is updated -- that is
    /// intentional and the caller is responsible for the guard.
    pub fn update(&self, assignments: Vec<(&str, SqlValue)>) -> Query {
        let mut query = self.query(format!("UPDATE {} SET ", self.name()));
        if assignments.is_empty() {
            query.poison(DbError::Schema(format!(
                "update of `{}` requires at least one assignment",
                self.name()
            )));
            return query;
        }
        query.push_assignments(assignments);
        query
    }

    /// Start an `UPDATE` with a raw `SET` clause, e.g.
    /// `"balance = balance + $1"`, binding `args` positionally from `$1`.
    ///
    /// The clause is appended verbatim: trusted, internally constructed
    /// expressions only, never user input.
    pub fn update_expr(&self, set_clause: &str, args: Vec<SqlValue>) -> Query {
        let mut query = self.query(format!("UPDATE {} SET ", self.name()));
        query.push_raw(set_clause);
        query.absorb_args(args);
        query
    }

    /// Start a `DELETE`. Without a subsequent `and_where`, every row is
    /// deleted -- that is intentional and the caller is responsible for
    /// the guard.
    pub fn delete(&self) -> Query {
        self.query(format!("DELETE FROM {}", self.name()))
    }

    /// Count all rows in the table.
    ///
    /// # Errors
    ///
    /// Propagates driver errors unchanged.
    pub async fn count(&self) -> Result<i64, DbError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.name());
        let count: Option<i64> = self.pool.fetch_val(&sql, Vec::new(), None).await?;
        Ok(count.unwrap_or(0))
    }

    /// `SELECT TRUE FROM t` existence probe.
    fn probe(&self) -> Query {
        self.query(format!("SELECT TRUE FROM {}", self.name()))
    }

    fn query(&self, sql: String) -> Query {
        Query::new(self.pool.clone(), Arc::clone(&self.schema), sql)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn users_schema() -> TableSchema {
        TableSchema::new(
            "users",
            &[
                ("discord_id", "BIGINT PRIMARY KEY"),
                ("nation_id", "INTEGER UNIQUE NOT NULL"),
            ],
        )
        .expect("valid declaration")
    }

    #[test]
    fn create_sql_lists_columns_in_order() {
        let schema = users_schema();
        assert_eq!(
            schema.create_sql(),
            "CREATE TABLE IF NOT EXISTS users \
             (discord_id BIGINT PRIMARY KEY, nation_id INTEGER UNIQUE NOT NULL)"
        );
    }

    #[test]
    fn create_sql_appends_constraint_suffix() {
        let schema = TableSchema::with_constraint(
            "loans",
            &[("bank_id", "BIGINT"), ("nation_id", "INTEGER")],
            "PRIMARY KEY (bank_id, nation_id)",
        );
        assert!(schema.is_ok());
        assert_eq!(
            schema.ok().map(|s| s.create_sql()),
            Some(
                "CREATE TABLE IF NOT EXISTS loans \
                 (bank_id BIGINT, nation_id INTEGER, PRIMARY KEY (bank_id, nation_id))"
                    .to_owned()
            )
        );
    }

    #[test]
    fn rejects_uppercase_identifiers() {
        let schema = TableSchema::new("Users", &[("id", "BIGINT")]);
        assert!(matches!(schema, Err(DbError::Schema(_))));
    }

    #[test]
    fn rejects_injection_shaped_identifiers() {
        let schema = TableSchema::new("users; drop table users", &[("id", "BIGINT")]);
        assert!(matches!(schema, Err(DbError::Schema(_))));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let schema = TableSchema::new("users", &[("id", "BIGINT"), ("id", "INTEGER")]);
        assert!(matches!(schema, Err(DbError::Schema(_))));
    }

    #[test]
    fn rejects_empty_column_list() {
        let schema = TableSchema::new("users", &[]);
        assert!(matches!(schema, Err(DbError::Schema(_))));
    }

    #[test]
    fn kv_schema_is_two_fixed_columns() {
        let schema = TableSchema::new_kv("settings", "TEXT NOT NULL");
        assert!(schema.is_ok());
        let schema = schema.ok();
        assert_eq!(
            schema.as_ref().map(TableSchema::create_sql),
            Some(
                "CREATE TABLE IF NOT EXISTS settings (key TEXT PRIMARY KEY, value TEXT NOT NULL)"
                    .to_owned()
            )
        );
        assert_eq!(schema.map(|s| s.kind()), Some(TableKind::KeyValue));
    }
}
