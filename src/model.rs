//! Cylinder record model.
//!
//! `CylinderRecord` mirrors one row of the `cylinders` table. Dates are optional
//! because rows loaded from the store may carry unparseable values; records built
//! by the registration validator always have all three dates set.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Days between mandatory safety tests (5 years).
pub const TEST_INTERVAL_DAYS: i64 = 1825;

/// Width of a normalized location PIN.
pub const PIN_WIDTH: usize = 6;

/// Fill level of a freshly registered cylinder.
pub const FULL_FILL_PERCENT: u8 = 100;

/// Fill level recorded when a cylinder comes back.
pub const RETURNED_FILL_PERCENT: u8 = 0;

/// Cylinder sizes stocked, in kilograms.
#[must_use]
pub fn capacity_options() -> [Decimal; 5] {
    [
        Decimal::new(50, 1),
        Decimal::new(100, 1),
        Decimal::new(142, 1),
        Decimal::new(190, 1),
        Decimal::new(475, 1),
    ]
}

/// Returns `true` when `capacity_kg` is one of [`capacity_options`].
#[must_use]
pub fn is_stocked_capacity(capacity_kg: Decimal) -> bool {
    capacity_options().contains(&capacity_kg)
}

/// Cylinder status as stored in the `Status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CylinderStatus {
    Full,
    Empty,
    Damaged,
}

impl CylinderStatus {
    /// Label stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CylinderStatus::Full => "Full",
            CylinderStatus::Empty => "Empty",
            CylinderStatus::Damaged => "Damaged",
        }
    }
}

impl fmt::Display for CylinderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CylinderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(CylinderStatus::Full),
            "empty" => Ok(CylinderStatus::Empty),
            "damaged" => Ok(CylinderStatus::Damaged),
            _ => Err(ValidationError::UnknownStatus(s.to_string())),
        }
    }
}

/// Physical condition recorded when a cylinder is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnCondition {
    Good,
    Dented,
    Leaking,
    ValveDamage,
    Broken,
}

impl ReturnCondition {
    /// All conditions in form order.
    pub const ALL: [ReturnCondition; 5] = [
        ReturnCondition::Good,
        ReturnCondition::Dented,
        ReturnCondition::Leaking,
        ReturnCondition::ValveDamage,
        ReturnCondition::Broken,
    ];

    /// Label shown on the return form.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ReturnCondition::Good => "Good",
            ReturnCondition::Dented => "Dented",
            ReturnCondition::Leaking => "Leaking",
            ReturnCondition::ValveDamage => "Broken Valve",
            ReturnCondition::Broken => "Broken",
        }
    }
}

impl fmt::Display for ReturnCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReturnCondition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "good" => Ok(ReturnCondition::Good),
            "dented" => Ok(ReturnCondition::Dented),
            "leaking" => Ok(ReturnCondition::Leaking),
            "brokenvalve" | "valvedamage" => Ok(ReturnCondition::ValveDamage),
            "broken" => Ok(ReturnCondition::Broken),
            _ => Err(ValidationError::UnknownCondition(s.to_string())),
        }
    }
}

/// One row of the `cylinders` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CylinderRecord {
    pub cylinder_id: String,
    pub customer_name: String,
    /// Digits only, zero padded to [`PIN_WIDTH`]
    pub location_pin: String,
    /// `None` when the stored value was missing or not a number
    pub capacity_kg: Option<Decimal>,
    pub fill_percent: u8,
    pub status: CylinderStatus,
    pub last_fill_date: Option<NaiveDate>,
    pub last_test_date: Option<NaiveDate>,
    pub next_test_due: Option<NaiveDate>,
    /// Flag as stored; decisions recompute it from the reference date
    pub overdue: bool,
    /// Set when ingestion raised a data-quality warning for this row
    #[serde(skip)]
    pub degraded: bool,
}

impl CylinderRecord {
    /// Location PIN as the integer stored in the BIGINT column.
    ///
    /// Non-numeric or overflowing PINs map to `0`, the same fallback used at registration.
    #[must_use]
    pub fn pin_number(&self) -> i64 {
        self.location_pin.parse::<i64>().unwrap_or(0)
    }
}

/// Normalize a PIN to a fixed-width digit string.
///
/// Returns `None` when `raw` is empty, contains anything other than ASCII digits,
/// or is longer than [`PIN_WIDTH`].
#[must_use]
pub fn normalize_pin(raw: &str) -> Option<String> {
    let digits = raw.trim();
    if digits.is_empty() || digits.len() > PIN_WIDTH || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{:0>width$}", digits, width = PIN_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_options_match_decimal_scale() {
        assert!(is_stocked_capacity(Decimal::new(1420, 2)));
        assert!(is_stocked_capacity(Decimal::new(5, 0)));
        assert!(!is_stocked_capacity(Decimal::new(13, 0)));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Full".parse::<CylinderStatus>(), Ok(CylinderStatus::Full));
        assert_eq!(" damaged ".parse::<CylinderStatus>(), Ok(CylinderStatus::Damaged));
        assert_eq!(
            "Lost".parse::<CylinderStatus>(),
            Err(ValidationError::UnknownStatus("Lost".to_string()))
        );
    }

    #[test]
    fn test_condition_labels_round_trip() {
        for condition in ReturnCondition::ALL {
            assert_eq!(condition.label().parse::<ReturnCondition>(), Ok(condition));
        }
        assert_eq!("ValveDamage".parse::<ReturnCondition>(), Ok(ReturnCondition::ValveDamage));
    }

    #[test]
    fn test_unknown_condition_rejected() {
        assert_eq!(
            "Rusty".parse::<ReturnCondition>(),
            Err(ValidationError::UnknownCondition("Rusty".to_string()))
        );
        assert!("".parse::<ReturnCondition>().is_err());
    }

    #[test]
    fn test_normalize_pin() {
        assert_eq!(normalize_pin("500001"), Some("500001".to_string()));
        assert_eq!(normalize_pin("42"), Some("000042".to_string()));
        assert_eq!(normalize_pin("0"), Some("000000".to_string()));
        assert_eq!(normalize_pin("50OO01"), None);
        assert_eq!(normalize_pin(""), None);
        assert_eq!(normalize_pin("5000012"), None);
        assert_eq!(normalize_pin("12345678901234567890"), None);
    }
}
