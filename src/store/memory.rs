//! In-memory record store.
//!
//! Holds rows as the same JSON objects the PostgreSQL store returns, so load
//! parsing is exercised end to end. Failures can be injected per operation.

use serde_json::Value;
use std::cell::{Cell, RefCell};

use crate::error::{ConnectivityError, StoreOperation};
use crate::ingest::{to_raw_row, RawRow};
use crate::model::CylinderRecord;
use crate::schema::column;
use crate::store::{RecordStore, ReturnUpdate};

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RefCell<Vec<RawRow>>,
    offline: Cell<bool>,
    fail_next: Cell<Option<StoreOperation>>,
    calls: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with raw rows (may be malformed).
    pub fn with_rows(rows: Vec<RawRow>) -> Self {
        Self {
            rows: RefCell::new(rows),
            ..Self::default()
        }
    }

    /// Store pre-populated with records.
    pub fn with_records<'a>(records: impl IntoIterator<Item = &'a CylinderRecord>) -> Self {
        Self::with_rows(records.into_iter().map(to_raw_row).collect())
    }

    /// Fail every operation until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Fail the next call of `operation` only.
    pub fn fail_next(&self, operation: StoreOperation) {
        self.fail_next.set(Some(operation));
    }

    /// Copy of the stored rows.
    pub fn rows(&self) -> Vec<RawRow> {
        self.rows.borrow().clone()
    }

    /// Number of store calls made, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn check(&self, operation: StoreOperation) -> Result<(), ConnectivityError> {
        self.calls.set(self.calls.get() + 1);
        if self.offline.get() {
            return Err(ConnectivityError::new(operation, "store is offline"));
        }
        if self.fail_next.get() == Some(operation) {
            self.fail_next.set(None);
            return Err(ConnectivityError::new(operation, "injected failure"));
        }
        Ok(())
    }
}

fn row_id(row: &RawRow) -> Option<&str> {
    row.get(column::CYLINDER_ID).and_then(|v| v.as_str())
}

impl RecordStore for MemoryStore {
    fn fetch_all(&self) -> Result<Vec<Value>, ConnectivityError> {
        self.check(StoreOperation::Load)?;
        Ok(self.rows().into_iter().map(Value::Object).collect())
    }

    fn update_by_id(&self, cylinder_id: &str, update: &ReturnUpdate) -> Result<u64, ConnectivityError> {
        self.check(StoreOperation::Update)?;
        let mut affected = 0;
        for row in self.rows.borrow_mut().iter_mut() {
            if row_id(row) == Some(cylinder_id) {
                row.insert(column::STATUS.to_string(), update.status.as_str().into());
                row.insert(column::FILL_PERCENT.to_string(), update.fill_percent.into());
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn insert(&self, record: &CylinderRecord) -> Result<(), ConnectivityError> {
        self.check(StoreOperation::Insert)?;
        let mut rows = self.rows.borrow_mut();
        if rows.iter().any(|row| row_id(row) == Some(record.cylinder_id.as_str())) {
            return Err(ConnectivityError::new(
                StoreOperation::Insert,
                format!("duplicate key value violates unique constraint: {}", record.cylinder_id),
            ));
        }
        rows.push(to_raw_row(record));
        Ok(())
    }
}
