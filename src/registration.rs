//! Registration of new cylinders.
//!
//! [`build_record`] is pure: it validates form input against the IDs already in
//! the snapshot and produces the record to insert. The insert itself belongs to
//! the record store.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ValidationError;
use crate::model::{
    is_stocked_capacity, normalize_pin, CylinderRecord, CylinderStatus, FULL_FILL_PERCENT,
    TEST_INTERVAL_DAYS,
};

/// Raw "Add New Cylinder" form input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCylinder {
    pub cylinder_id: String,
    pub customer_name: String,
    /// Up to six digits; anything else is stored as `0`
    pub location_pin: String,
    pub capacity_kg: Decimal,
}

impl NewCylinder {
    pub fn new(
        cylinder_id: impl Into<String>,
        customer_name: impl Into<String>,
        location_pin: impl Into<String>,
        capacity_kg: Decimal,
    ) -> Self {
        Self {
            cylinder_id: cylinder_id.into(),
            customer_name: customer_name.into(),
            location_pin: location_pin.into(),
            capacity_kg,
        }
    }
}

/// Date of the next mandatory test for a cylinder tested on `tested_on`.
///
/// Saturates at the latest representable date instead of overflowing.
#[must_use]
pub fn next_test_due(tested_on: NaiveDate) -> NaiveDate {
    tested_on
        .checked_add_signed(Duration::days(TEST_INTERVAL_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// Validate `input` and build the record to insert.
///
/// Checks run in order: identifier present, identifier unused (exact,
/// case-sensitive), PIN of at most six digits (lossy fallback to `0`, never
/// rejected), capacity stocked.
///
/// # Errors
///
/// Returns `ValidationError::MissingIdentifier`, `ValidationError::DuplicateIdentifier`
/// or `ValidationError::InvalidCapacity`.
pub fn build_record(
    input: &NewCylinder,
    creation_date: NaiveDate,
    existing_ids: &HashSet<String>,
) -> Result<CylinderRecord, ValidationError> {
    let cylinder_id = input.cylinder_id.trim();
    if cylinder_id.is_empty() {
        return Err(ValidationError::MissingIdentifier);
    }
    if existing_ids.contains(cylinder_id) {
        return Err(ValidationError::DuplicateIdentifier(cylinder_id.to_string()));
    }

    let location_pin = match normalize_pin(&input.location_pin) {
        Some(pin) => pin,
        None => {
            log::warn!(
                "Cylinder {}: location PIN {:?} is not a six-digit number, storing 0",
                cylinder_id,
                input.location_pin
            );
            normalize_pin("0").unwrap_or_default()
        }
    };

    if !is_stocked_capacity(input.capacity_kg) {
        return Err(ValidationError::InvalidCapacity(input.capacity_kg.to_string()));
    }

    Ok(CylinderRecord {
        cylinder_id: cylinder_id.to_string(),
        customer_name: input.customer_name.clone(),
        location_pin,
        capacity_kg: Some(input.capacity_kg),
        fill_percent: FULL_FILL_PERCENT,
        status: CylinderStatus::Full,
        last_fill_date: Some(creation_date),
        last_test_date: Some(creation_date),
        next_test_due: Some(next_test_due(creation_date)),
        overdue: false,
        degraded: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> HashSet<String> {
        ["LEO-001".to_string()].into_iter().collect()
    }

    fn jan_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    #[test]
    fn test_build_record_success() {
        let input = NewCylinder::new("LEO-099", "Acme", "500001", Decimal::new(142, 1));
        let record = build_record(&input, jan_first(), &existing()).unwrap();

        assert_eq!(record.cylinder_id, "LEO-099");
        assert_eq!(record.status, CylinderStatus::Full);
        assert_eq!(record.fill_percent, 100);
        assert_eq!(record.location_pin, "500001");
        assert_eq!(record.last_fill_date, Some(jan_first()));
        assert_eq!(record.last_test_date, Some(jan_first()));
        assert_eq!(record.next_test_due, NaiveDate::from_ymd_opt(2030, 12, 31));
        assert!(!record.overdue);
    }

    #[test]
    fn test_duplicate_identifier() {
        let input = NewCylinder::new("LEO-001", "Acme", "500001", Decimal::new(142, 1));
        assert_eq!(
            build_record(&input, jan_first(), &existing()),
            Err(ValidationError::DuplicateIdentifier("LEO-001".to_string()))
        );
    }

    #[test]
    fn test_duplicate_check_is_case_sensitive() {
        // Near-duplicates differing only in case are accepted, matching the store.
        let input = NewCylinder::new("leo-001", "Acme", "500001", Decimal::new(142, 1));
        assert!(build_record(&input, jan_first(), &existing()).is_ok());
    }

    #[test]
    fn test_duplicate_check_uses_trimmed_id() {
        let input = NewCylinder::new("  LEO-001 ", "Acme", "500001", Decimal::new(142, 1));
        assert!(matches!(
            build_record(&input, jan_first(), &existing()),
            Err(ValidationError::DuplicateIdentifier(_))
        ));
    }

    #[test]
    fn test_missing_identifier() {
        for id in ["", "   "] {
            let input = NewCylinder::new(id, "Acme", "500001", Decimal::new(142, 1));
            assert_eq!(
                build_record(&input, jan_first(), &existing()),
                Err(ValidationError::MissingIdentifier)
            );
        }
    }

    #[test]
    fn test_missing_identifier_checked_before_capacity() {
        let input = NewCylinder::new("", "Acme", "x", Decimal::new(13, 0));
        assert_eq!(
            build_record(&input, jan_first(), &existing()),
            Err(ValidationError::MissingIdentifier)
        );
    }

    #[test]
    fn test_invalid_capacity() {
        let input = NewCylinder::new("LEO-100", "Acme", "500001", Decimal::new(13, 0));
        assert_eq!(
            build_record(&input, jan_first(), &existing()),
            Err(ValidationError::InvalidCapacity("13".to_string()))
        );
    }

    #[test]
    fn test_non_numeric_pin_falls_back_to_zero() {
        let input = NewCylinder::new("LEO-101", "", "50-001", Decimal::new(50, 1));
        let record = build_record(&input, jan_first(), &existing()).unwrap();
        assert_eq!(record.location_pin, "000000");
        assert_eq!(record.pin_number(), 0);
        assert_eq!(record.customer_name, "");
    }

    #[test]
    fn test_overlong_pin_falls_back_to_zero() {
        let input = NewCylinder::new("LEO-102", "A", "12345678901234567890", Decimal::new(142, 1));
        let record = build_record(&input, jan_first(), &existing()).unwrap();
        assert_eq!(record.location_pin, "000000");
        assert_eq!(record.pin_number(), 0);

        let input = NewCylinder::new("LEO-103", "A", "5000012", Decimal::new(142, 1));
        let record = build_record(&input, jan_first(), &existing()).unwrap();
        assert_eq!(record.location_pin, "000000");
    }
}
