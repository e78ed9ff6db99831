//! # Leogas
//!
//! Inventory rules for a refillable gas-cylinder fleet: hydrostatic-test
//! overdue evaluation, return penalties, inventory search and registration of
//! new cylinders, over a PostgreSQL record store.
//!
//! The [`session::Inventory`] type wires the rules to a [`store::RecordStore`]
//! and an injected [`clock::Clock`].

pub mod clock;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod export;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod overdue;
pub mod params;
pub mod penalty;
pub mod query;
pub mod registration;
pub mod schema;
pub mod session;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::InventoryConfig;
pub use error::{ConnectivityError, InventoryError, ValidationError};
pub use model::{CylinderRecord, CylinderStatus, ReturnCondition};
pub use query::{InventoryQuery, StatusFilter};
pub use registration::NewCylinder;
pub use session::{Inventory, ReturnReceipt, SessionContext};
pub use store::{MemoryStore, PostgresStore, RecordStore};
