//! Dynamic SQL parameter values.
//!
//! Queries in this crate are assembled at runtime from typed fragments, so
//! positional parameters are carried as [`SqlValue`] variants rather than
//! generics. Every variant maps onto exactly one `PostgreSQL` wire type;
//! `NULL` carries its [`SqlType`] so the parameter is still typed correctly
//! on the wire.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;

/// The `PostgreSQL` type of a parameter, used to keep `NULL` values typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// `BOOLEAN`
    Bool,
    /// `INTEGER`
    Int,
    /// `BIGINT`
    BigInt,
    /// `DOUBLE PRECISION`
    Double,
    /// `NUMERIC`
    Numeric,
    /// `TEXT`
    Text,
    /// `BYTEA`
    Bytes,
    /// `TIMESTAMPTZ`
    Timestamp,
    /// `JSONB`
    Json,
}

/// A positional SQL parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// A `BOOLEAN` value.
    Bool(bool),
    /// An `INTEGER` value.
    Int(i32),
    /// A `BIGINT` value.
    BigInt(i64),
    /// A `DOUBLE PRECISION` value.
    Double(f64),
    /// A `NUMERIC` value (exact decimal, used for money columns).
    Numeric(Decimal),
    /// A `TEXT` value.
    Text(String),
    /// A `BYTEA` value.
    Bytes(Vec<u8>),
    /// A `TIMESTAMPTZ` value.
    Timestamp(DateTime<Utc>),
    /// A `JSONB` value.
    Json(serde_json::Value),
    /// A `TEXT[]` value, e.g. for `= ANY($1)` probes.
    TextArray(Vec<String>),
    /// A `BIGINT[]` value, e.g. for id-list filters.
    BigIntArray(Vec<i64>),
    /// A typed `NULL`.
    Null(SqlType),
}

/// Types with a canonical [`SqlType`], so `Option<T>` can convert into a
/// typed `NULL` when the value is absent.
pub trait SqlTyped {
    /// The SQL type an absent value of this Rust type binds as.
    const SQL_TYPE: SqlType;
}

impl SqlTyped for bool {
    const SQL_TYPE: SqlType = SqlType::Bool;
}
impl SqlTyped for i32 {
    const SQL_TYPE: SqlType = SqlType::Int;
}
impl SqlTyped for i64 {
    const SQL_TYPE: SqlType = SqlType::BigInt;
}
impl SqlTyped for f64 {
    const SQL_TYPE: SqlType = SqlType::Double;
}
impl SqlTyped for Decimal {
    const SQL_TYPE: SqlType = SqlType::Numeric;
}
impl SqlTyped for String {
    const SQL_TYPE: SqlType = SqlType::Text;
}
impl SqlTyped for &'_ str {
    const SQL_TYPE: SqlType = SqlType::Text;
}
impl SqlTyped for Vec<u8> {
    const SQL_TYPE: SqlType = SqlType::Bytes;
}
impl SqlTyped for DateTime<Utc> {
    const SQL_TYPE: SqlType = SqlType::Timestamp;
}
impl SqlTyped for serde_json::Value {
    const SQL_TYPE: SqlType = SqlType::Json;
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}
impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::BigInt(value)
    }
}
impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}
impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        Self::Numeric(value)
    }
}
impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}
impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}
impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}
impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}
impl From<Vec<String>> for SqlValue {
    fn from(value: Vec<String>) -> Self {
        Self::TextArray(value)
    }
}
impl From<Vec<i64>> for SqlValue {
    fn from(value: Vec<i64>) -> Self {
        Self::BigIntArray(value)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<Self> + SqlTyped,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null(T::SQL_TYPE), Into::into)
    }
}

/// Bind a list of [`SqlValue`] parameters onto a runtime query, in order.
pub(crate) fn bind_values<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    values: Vec<SqlValue>,
) -> Query<'q, Postgres, PgArguments> {
    for value in values {
        query = bind_value(query, value);
    }
    query
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Int(v) => query.bind(v),
        SqlValue::BigInt(v) => query.bind(v),
        SqlValue::Double(v) => query.bind(v),
        SqlValue::Numeric(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Bytes(v) => query.bind(v),
        SqlValue::Timestamp(v) => query.bind(v),
        SqlValue::Json(v) => query.bind(v),
        SqlValue::TextArray(v) => query.bind(v),
        SqlValue::BigIntArray(v) => query.bind(v),
        SqlValue::Null(ty) => bind_null(query, ty),
    }
}

fn bind_null<'q>(
    query: Query<'q, Postgres, PgArguments>,
    ty: SqlType,
) -> Query<'q, Postgres, PgArguments> {
    match ty {
        SqlType::Bool => query.bind(Option::<bool>::None),
        SqlType::Int => query.bind(Option::<i32>::None),
        SqlType::BigInt => query.bind(Option::<i64>::None),
        SqlType::Double => query.bind(Option::<f64>::None),
        SqlType::Numeric => query.bind(Option::<Decimal>::None),
        SqlType::Text => query.bind(Option::<String>::None),
        SqlType::Bytes => query.bind(Option::<Vec<u8>>::None),
        SqlType::Timestamp => query.bind(Option::<DateTime<Utc>>::None),
        SqlType::Json => query.bind(Option::<serde_json::Value>::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_becomes_typed_null() {
        let value: SqlValue = Option::<i64>::None.into();
        assert_eq!(value, SqlValue::Null(SqlType::BigInt));
    }

    #[test]
    fn option_some_unwraps_to_value() {
        let value: SqlValue = Some("alpha").into();
        assert_eq!(value, SqlValue::Text("alpha".to_owned()));
    }

    #[test]
    fn integer_widths_stay_distinct() {
        assert_eq!(SqlValue::from(7_i32), SqlValue::Int(7));
        assert_eq!(SqlValue::from(7_i64), SqlValue::BigInt(7));
    }
}
