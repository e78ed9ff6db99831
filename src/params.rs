//! Conversion of `sea-query` values into `may_postgres` parameters.
//!
//! Statements are built with `.build(PostgresQueryBuilder)`, which yields
//! `$n` placeholders plus the values to bind. The values are copied into owned,
//! typed slots first; the `&dyn ToSql` references handed to the executor borrow
//! from those slots and are only valid inside the closure.
//!
//! NULLs keep their column type so the server accepts them for `DATE` and
//! `NUMERIC` columns.

use chrono::NaiveDate;
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use sea_query::{Value, Values};

use crate::executor::SqlError;

#[derive(Debug, Clone, PartialEq)]
enum Param {
    Bool(Option<bool>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Text(Option<String>),
    Date(Option<NaiveDate>),
    Decimal(Option<Decimal>),
}

impl Param {
    fn from_value(value: &Value) -> Result<Self, SqlError> {
        let param = match value {
            Value::Bool(b) => Param::Bool(*b),
            Value::TinyInt(i) => Param::Int(i.map(i32::from)),
            Value::SmallInt(i) => Param::Int(i.map(i32::from)),
            Value::Int(i) => Param::Int(*i),
            Value::BigInt(i) => Param::BigInt(*i),
            Value::TinyUnsigned(u) => Param::Int(u.map(i32::from)),
            Value::SmallUnsigned(u) => Param::Int(u.map(i32::from)),
            Value::Unsigned(u) => Param::BigInt(u.map(i64::from)),
            Value::String(s) => Param::Text(s.as_ref().map(|s| String::clone(s))),
            Value::ChronoDate(d) => Param::Date(d.as_ref().map(|d| NaiveDate::clone(d))),
            Value::Decimal(d) => Param::Decimal(d.as_ref().map(|d| Decimal::clone(d))),
            other => {
                return Err(SqlError::Other(format!(
                    "Unsupported value type in statement: {other:?}"
                )))
            }
        };
        Ok(param)
    }

    fn as_sql(&self) -> &dyn ToSql {
        match self {
            Param::Bool(v) => v as &dyn ToSql,
            Param::Int(v) => v as &dyn ToSql,
            Param::BigInt(v) => v as &dyn ToSql,
            Param::Text(v) => v as &dyn ToSql,
            Param::Date(v) => v as &dyn ToSql,
            Param::Decimal(v) => v as &dyn ToSql,
        }
    }
}

/// Convert `values` and run `f` with the bound parameters, in placeholder order.
///
/// # Errors
///
/// Returns `SqlError::Other` for a value type the cylinders table never uses,
/// or whatever `f` returns.
pub fn with_converted_params<F, R>(values: &Values, f: F) -> Result<R, SqlError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, SqlError>,
{
    let owned = values
        .iter()
        .map(Param::from_value)
        .collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(Param::as_sql).collect();
    f(&params)
}
