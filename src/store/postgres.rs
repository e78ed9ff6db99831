//! PostgreSQL record store.
//!
//! Reads use `row_to_json` so each row arrives as the same JSON object a
//! hosted REST client would return. Writes are built with `sea-query` and
//! bound as `$n` parameters.

use sea_query::{Alias, Expr, ExprTrait, PostgresQueryBuilder, Query, Values};
use serde_json::Value;

use crate::config::InventoryConfig;
use crate::connection::connect;
use crate::error::{ConnectivityError, InventoryError, StoreOperation};
use crate::executor::{MayPostgresExecutor, StoreExecutor};
use crate::model::CylinderRecord;
use crate::params::with_converted_params;
use crate::schema::{column, create_table_sql};
use crate::store::{RecordStore, ReturnUpdate};

/// `SELECT` returning one JSON object per row.
#[must_use]
pub fn select_all_sql(table: &str) -> String {
    Query::select()
        .expr(Expr::cust("row_to_json(c)::text"))
        .from_as(Alias::new(table), Alias::new("c"))
        .to_string(PostgresQueryBuilder)
}

/// `UPDATE` applied by the return workflow.
#[must_use]
pub fn update_statement(table: &str, cylinder_id: &str, update: &ReturnUpdate) -> (String, Values) {
    Query::update()
        .table(Alias::new(table))
        .value(Alias::new(column::STATUS), update.status.as_str())
        .value(Alias::new(column::FILL_PERCENT), i32::from(update.fill_percent))
        .and_where(Expr::col(Alias::new(column::CYLINDER_ID)).eq(cylinder_id))
        .build(PostgresQueryBuilder)
}

/// `INSERT` for a newly registered record.
#[must_use]
pub fn insert_statement(table: &str, record: &CylinderRecord) -> (String, Values) {
    Query::insert()
        .into_table(Alias::new(table))
        .columns(column::ALL.map(Alias::new))
        .values_panic([
            Expr::val(record.cylinder_id.as_str()),
            Expr::val(record.customer_name.as_str()),
            Expr::val(record.pin_number()),
            Expr::val(record.capacity_kg),
            Expr::val(i32::from(record.fill_percent)),
            Expr::val(record.status.as_str()),
            Expr::val(record.last_fill_date),
            Expr::val(record.last_test_date),
            Expr::val(record.next_test_due),
            Expr::val(record.overdue),
        ])
        .build(PostgresQueryBuilder)
}

/// Record store over a `StoreExecutor`.
pub struct PostgresStore<E: StoreExecutor = MayPostgresExecutor> {
    executor: E,
    table: String,
}

impl PostgresStore<MayPostgresExecutor> {
    /// Connect using `config.database_url` and `config.table`.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Config` for an invalid table name and
    /// `InventoryError::Connectivity` if the connection fails.
    pub fn connect(config: &InventoryConfig) -> Result<Self, InventoryError> {
        config.validate()?;
        let client = connect(&config.database_url)?;
        Ok(Self::new(MayPostgresExecutor::new(client), config.table.clone()))
    }
}

impl<E: StoreExecutor> PostgresStore<E> {
    pub fn new(executor: E, table: impl Into<String>) -> Self {
        Self {
            executor,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Create the cylinders table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ConnectivityError` if the DDL fails.
    pub fn ensure_schema(&self) -> Result<(), ConnectivityError> {
        self.executor
            .execute(&create_table_sql(&self.table), &[])
            .map(|_| ())
            .map_err(|e| ConnectivityError::new(StoreOperation::Schema, e.to_string()))
    }

    fn execute_statement(
        &self,
        (sql, values): (String, Values),
        operation: StoreOperation,
    ) -> Result<u64, ConnectivityError> {
        with_converted_params(&values, |params| self.executor.execute(&sql, params))
            .map_err(|e| ConnectivityError::new(operation, e.to_string()))
    }
}

impl<E: StoreExecutor> RecordStore for PostgresStore<E> {
    fn fetch_all(&self) -> Result<Vec<Value>, ConnectivityError> {
        let texts = self
            .executor
            .query_text(&select_all_sql(&self.table), &[])
            .map_err(|e| ConnectivityError::new(StoreOperation::Load, e.to_string()))?;

        Ok(texts
            .into_iter()
            .map(|text| {
                serde_json::from_str::<Value>(&text).unwrap_or_else(|e| {
                    log::warn!("Malformed row JSON from {}: {}", self.table, e);
                    Value::String(text)
                })
            })
            .collect())
    }

    fn update_by_id(&self, cylinder_id: &str, update: &ReturnUpdate) -> Result<u64, ConnectivityError> {
        self.execute_statement(
            update_statement(&self.table, cylinder_id, update),
            StoreOperation::Update,
        )
    }

    fn insert(&self, record: &CylinderRecord) -> Result<(), ConnectivityError> {
        self.execute_statement(insert_statement(&self.table, record), StoreOperation::Insert)
            .map(|_| ())
    }
}
