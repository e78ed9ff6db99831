//! Overdue detection for safety tests.

use chrono::NaiveDate;

use crate::model::CylinderRecord;

/// Result of checking a possibly-missing due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverdueCheck {
    /// Reference date is on or after the due date
    Overdue,
    /// Test not yet due
    Current,
    /// Due date missing or unparseable; counted as not overdue
    Unknown,
}

impl OverdueCheck {
    #[must_use]
    pub fn is_overdue(self) -> bool {
        matches!(self, OverdueCheck::Overdue)
    }
}

/// A cylinder is overdue from its due date onwards (due today counts).
#[must_use]
pub fn is_overdue(next_test_due: NaiveDate, reference_date: NaiveDate) -> bool {
    reference_date >= next_test_due
}

/// Total version of [`is_overdue`] over optional due dates.
#[must_use]
pub fn evaluate(next_test_due: Option<NaiveDate>, reference_date: NaiveDate) -> OverdueCheck {
    match next_test_due {
        Some(due) if is_overdue(due, reference_date) => OverdueCheck::Overdue,
        Some(_) => OverdueCheck::Current,
        None => OverdueCheck::Unknown,
    }
}

/// Evaluate a record against `reference_date`, ignoring its stored `overdue` flag.
#[must_use]
pub fn evaluate_record(record: &CylinderRecord, reference_date: NaiveDate) -> OverdueCheck {
    evaluate(record.next_test_due, reference_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_today_is_overdue() {
        let due = date(2030, 12, 30);
        assert!(is_overdue(due, due));
    }

    #[test]
    fn test_day_before_due_is_current() {
        assert!(!is_overdue(date(2030, 12, 30), date(2030, 12, 29)));
        assert!(is_overdue(date(2030, 12, 30), date(2030, 12, 31)));
    }

    #[test]
    fn test_matches_date_comparison_over_a_range() {
        let reference = date(2026, 10, 16);
        let mut due = date(2026, 9, 1);
        while due < date(2026, 12, 1) {
            assert_eq!(is_overdue(due, reference), reference >= due, "due {due}");
            due = due.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_missing_due_date_is_unknown_and_not_overdue() {
        let check = evaluate(None, date(2026, 1, 1));
        assert_eq!(check, OverdueCheck::Unknown);
        assert!(!check.is_overdue());
    }

    #[test]
    fn test_evaluate() {
        assert_eq!(evaluate(Some(date(2026, 1, 1)), date(2026, 1, 1)), OverdueCheck::Overdue);
        assert_eq!(evaluate(Some(date(2026, 1, 2)), date(2026, 1, 1)), OverdueCheck::Current);
    }
}
