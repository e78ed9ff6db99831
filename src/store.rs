//! Record store gateway.
//!
//! The store is the single writer of truth. The inventory core only needs a
//! bulk read, a keyed point update and a single-row insert; it never locks, so
//! two operators returning the same cylinder resolve as last write wins.

pub mod memory;
pub mod postgres;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConnectivityError;
use crate::model::{CylinderRecord, CylinderStatus};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Fields written by the return workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnUpdate {
    pub status: CylinderStatus,
    pub fill_percent: u8,
}

/// Access to the table of cylinder rows.
pub trait RecordStore {
    /// Read every row as JSON; well-formed rows are objects keyed by column name.
    ///
    /// A malformed row is returned as-is and flagged during ingestion, so it
    /// never fails the whole load.
    ///
    /// # Errors
    ///
    /// Returns `ConnectivityError` if the store cannot be read.
    fn fetch_all(&self) -> Result<Vec<Value>, ConnectivityError>;

    /// Apply `update` to the row with `cylinder_id`, returning the rows affected.
    ///
    /// # Errors
    ///
    /// Returns `ConnectivityError` if the statement fails.
    fn update_by_id(&self, cylinder_id: &str, update: &ReturnUpdate) -> Result<u64, ConnectivityError>;

    /// Insert a newly registered record.
    ///
    /// # Errors
    ///
    /// Returns `ConnectivityError` if the statement fails, including primary key conflicts.
    fn insert(&self, record: &CylinderRecord) -> Result<(), ConnectivityError>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn fetch_all(&self) -> Result<Vec<Value>, ConnectivityError> {
        (**self).fetch_all()
    }

    fn update_by_id(&self, cylinder_id: &str, update: &ReturnUpdate) -> Result<u64, ConnectivityError> {
        (**self).update_by_id(cylinder_id, update)
    }

    fn insert(&self, record: &CylinderRecord) -> Result<(), ConnectivityError> {
        (**self).insert(record)
    }
}
