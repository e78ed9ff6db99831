//! Error types for inventory operations.
//!
//! Every operation is terminal on error: nothing is retried automatically and
//! the snapshot held by the session is never left half-updated.

use std::fmt;

/// Store operation that failed, used to word connectivity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    /// Bulk read of every cylinder row
    Load,
    /// Point update after a return
    Update,
    /// Insert of a newly registered cylinder
    Insert,
    /// Schema creation
    Schema,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOperation::Load => "load",
            StoreOperation::Update => "update",
            StoreOperation::Insert => "insert",
            StoreOperation::Schema => "schema",
        };
        f.write_str(name)
    }
}

/// The record store could not be reached or rejected the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityError {
    pub operation: StoreOperation,
    pub message: String,
}

impl ConnectivityError {
    pub fn new(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Database {} failed: {}", self.operation, self.message)
    }
}

impl std::error::Error for ConnectivityError {}

/// Input rejected before any store call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Cylinder ID empty after trimming
    MissingIdentifier,
    /// Cylinder ID already present in the snapshot (exact, case-sensitive match)
    DuplicateIdentifier(String),
    /// Capacity outside the enumerated set
    InvalidCapacity(String),
    /// Return condition label not in the closed condition set
    UnknownCondition(String),
    /// Status label not one of Full, Empty, Damaged (or All where a filter is accepted)
    UnknownStatus(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingIdentifier => write!(f, "Please provide a Cylinder ID"),
            ValidationError::DuplicateIdentifier(id) => {
                write!(f, "Cylinder {} is already registered", id)
            }
            ValidationError::InvalidCapacity(capacity) => {
                write!(f, "Capacity {} kg is not a stocked cylinder size", capacity)
            }
            ValidationError::UnknownCondition(label) => {
                write!(f, "Unknown physical condition: {}", label)
            }
            ValidationError::UnknownStatus(label) => write!(f, "Unknown status: {}", label),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Top-level error for the inventory handlers.
#[derive(Debug)]
pub enum InventoryError {
    /// Store failure; the snapshot stays at its last-known-good state
    Connectivity(ConnectivityError),
    /// Rejected input
    Validation(ValidationError),
    /// Return requested for an ID that is not in the loaded snapshot
    UnknownCylinder(String),
    /// Configuration could not be loaded or is invalid
    Config(String),
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryError::Connectivity(e) => write!(f, "{e}"),
            InventoryError::Validation(e) => write!(f, "{e}"),
            InventoryError::UnknownCylinder(id) => {
                write!(f, "Cylinder {} is not in the current inventory", id)
            }
            InventoryError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for InventoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InventoryError::Connectivity(e) => Some(e),
            InventoryError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConnectivityError> for InventoryError {
    fn from(err: ConnectivityError) -> Self {
        InventoryError::Connectivity(err)
    }
}

impl From<ValidationError> for InventoryError {
    fn from(err: ValidationError) -> Self {
        InventoryError::Validation(err)
    }
}

impl From<config::ConfigError> for InventoryError {
    fn from(err: config::ConfigError) -> Self {
        InventoryError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_error_display() {
        let err = ConnectivityError::new(StoreOperation::Update, "connection refused");
        assert_eq!(err.to_string(), "Database update failed: connection refused");
    }

    #[test]
    fn test_inventory_error_wraps_validation() {
        let err: InventoryError = ValidationError::DuplicateIdentifier("LEO-001".to_string()).into();
        assert!(matches!(err, InventoryError::Validation(ValidationError::DuplicateIdentifier(_))));
        assert!(err.to_string().contains("LEO-001"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
