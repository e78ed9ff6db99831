//! Layout of the `cylinders` table.
//!
//! Column names keep the capitalisation of the hosted table, so every
//! identifier is emitted quoted.

use sea_query::{Alias, ColumnDef, PostgresQueryBuilder, Table};

/// Default table name.
pub const DEFAULT_TABLE: &str = "cylinders";

/// Store column names.
pub mod column {
    pub const CYLINDER_ID: &str = "Cylinder_ID";
    pub const CUSTOMER_NAME: &str = "Customer_Name";
    pub const LOCATION_PIN: &str = "Location_PIN";
    pub const CAPACITY_KG: &str = "Capacity_kg";
    pub const FILL_PERCENT: &str = "Fill_Percent";
    pub const STATUS: &str = "Status";
    pub const LAST_FILL_DATE: &str = "Last_Fill_Date";
    pub const LAST_TEST_DATE: &str = "Last_Test_Date";
    pub const NEXT_TEST_DUE: &str = "Next_Test_Due";
    pub const OVERDUE: &str = "Overdue";

    /// Insert order.
    pub const ALL: [&str; 10] = [
        CYLINDER_ID,
        CUSTOMER_NAME,
        LOCATION_PIN,
        CAPACITY_KG,
        FILL_PERCENT,
        STATUS,
        LAST_FILL_DATE,
        LAST_TEST_DATE,
        NEXT_TEST_DUE,
        OVERDUE,
    ];
}

/// `CREATE TABLE IF NOT EXISTS` for the cylinders table.
#[must_use]
pub fn create_table_sql(table: &str) -> String {
    Table::create()
        .table(Alias::new(table))
        .if_not_exists()
        .col(ColumnDef::new(Alias::new(column::CYLINDER_ID)).text().not_null().primary_key())
        .col(ColumnDef::new(Alias::new(column::CUSTOMER_NAME)).text().not_null().default(""))
        .col(ColumnDef::new(Alias::new(column::LOCATION_PIN)).big_integer().not_null().default(0))
        .col(ColumnDef::new(Alias::new(column::CAPACITY_KG)).decimal_len(6, 2).not_null())
        .col(ColumnDef::new(Alias::new(column::FILL_PERCENT)).small_integer().not_null().default(100))
        .col(ColumnDef::new(Alias::new(column::STATUS)).text().not_null().default("Full"))
        .col(ColumnDef::new(Alias::new(column::LAST_FILL_DATE)).date())
        .col(ColumnDef::new(Alias::new(column::LAST_TEST_DATE)).date())
        .col(ColumnDef::new(Alias::new(column::NEXT_TEST_DUE)).date())
        .col(ColumnDef::new(Alias::new(column::OVERDUE)).boolean().not_null().default(false))
        .to_owned()
        .build(PostgresQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_quotes_mixed_case_columns() {
        let sql = create_table_sql(DEFAULT_TABLE);
        assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "cylinders""#), "{sql}");
        for name in column::ALL {
            assert!(sql.contains(&format!("\"{name}\"")), "missing {name} in {sql}");
        }
        assert!(sql.contains("PRIMARY KEY"));
    }
}
