//! In-memory search over a loaded snapshot.
//!
//! All filters are conjunctive. Results are always ordered by ascending
//! `next_test_due` with missing dates last; ties keep load order. The input
//! slice is never mutated.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::model::{CylinderRecord, CylinderStatus};
use crate::overdue::{evaluate_record, OverdueCheck};

/// Status filter with an `All` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(CylinderStatus),
}

impl StatusFilter {
    #[must_use]
    pub fn matches(&self, status: CylinderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All"),
            StatusFilter::Only(status) => write!(f, "{status}"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<CylinderStatus>().map(StatusFilter::Only)
    }
}

/// Finder form input. Empty or absent substrings match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryQuery {
    pub id_substring: Option<String>,
    pub name_substring: Option<String>,
    pub status: StatusFilter,
}

impl InventoryQuery {
    /// Query matching every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id(mut self, id_substring: impl Into<String>) -> Self {
        self.id_substring = Some(id_substring.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name_substring: impl Into<String>) -> Self {
        self.name_substring = Some(name_substring.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Returns `true` if `record` passes every filter.
    #[must_use]
    pub fn matches(&self, record: &CylinderRecord) -> bool {
        let id_needle = needle(self.id_substring.as_deref());
        let name_needle = needle(self.name_substring.as_deref());
        matches_with(record, id_needle.as_deref(), name_needle.as_deref(), self.status)
    }
}

fn needle(filter: Option<&str>) -> Option<String> {
    filter
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains_ci(haystack: &str, lowered_needle: Option<&str>) -> bool {
    match lowered_needle {
        None => true,
        Some(n) => haystack.to_lowercase().contains(n),
    }
}

fn matches_with(
    record: &CylinderRecord,
    id_needle: Option<&str>,
    name_needle: Option<&str>,
    status: StatusFilter,
) -> bool {
    status.matches(record.status)
        && contains_ci(&record.cylinder_id, id_needle)
        && contains_ci(&record.customer_name, name_needle)
}

/// Filter `records` and return the matches ordered by due date.
#[must_use]
pub fn search(records: &[CylinderRecord], query: &InventoryQuery) -> Vec<CylinderRecord> {
    let id_needle = needle(query.id_substring.as_deref());
    let name_needle = needle(query.name_substring.as_deref());

    let mut found: Vec<CylinderRecord> = records
        .iter()
        .filter(|r| matches_with(r, id_needle.as_deref(), name_needle.as_deref(), query.status))
        .cloned()
        .collect();
    sort_by_due_date(&mut found);
    found
}

/// Stable sort: earliest `next_test_due` first, missing dates last.
pub fn sort_by_due_date(records: &mut [CylinderRecord]) {
    records.sort_by_key(|r| (r.next_test_due.is_none(), r.next_test_due));
}

/// Headline counters for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total: usize,
    /// Overdue against the reference date, not the stored flag
    pub overdue: usize,
    /// Rows whose due date is missing or unparseable
    pub unknown_due: usize,
    pub full: usize,
    pub empty: usize,
    pub damaged: usize,
    pub degraded: usize,
}

/// Count the dashboard metrics over `records`.
#[must_use]
pub fn summarize(records: &[CylinderRecord], reference_date: NaiveDate) -> DashboardSummary {
    let mut summary = DashboardSummary {
        total: records.len(),
        ..DashboardSummary::default()
    };
    for record in records {
        match evaluate_record(record, reference_date) {
            OverdueCheck::Overdue => summary.overdue += 1,
            OverdueCheck::Unknown => summary.unknown_due += 1,
            OverdueCheck::Current => {}
        }
        match record.status {
            CylinderStatus::Full => summary.full += 1,
            CylinderStatus::Empty => summary.empty += 1,
            CylinderStatus::Damaged => summary.damaged += 1,
        }
        if record.degraded {
            summary.degraded += 1;
        }
    }
    summary
}

/// Unique cylinder IDs in load order, for the return picker.
#[must_use]
pub fn return_candidates(records: &[CylinderRecord]) -> Vec<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| r.cylinder_id.as_str())
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn record(id: &str, name: &str, status: CylinderStatus, due: Option<(i32, u32, u32)>) -> CylinderRecord {
        CylinderRecord {
            cylinder_id: id.to_string(),
            customer_name: name.to_string(),
            location_pin: "500001".to_string(),
            capacity_kg: Some(Decimal::new(142, 1)),
            fill_percent: 100,
            status,
            last_fill_date: None,
            last_test_date: None,
            next_test_due: due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            overdue: false,
            degraded: false,
        }
    }

    fn fleet() -> Vec<CylinderRecord> {
        vec![
            record("LEO-003", "Ali Khan", CylinderStatus::Full, Some((2029, 5, 1))),
            record("LEO-001", "Acme Foods", CylinderStatus::Empty, Some((2027, 1, 1))),
            record("LEO-002", "ali traders", CylinderStatus::Damaged, None),
            record("HYD-100", "Ravi", CylinderStatus::Full, Some((2027, 1, 1))),
        ]
    }

    fn ids(records: &[CylinderRecord]) -> Vec<&str> {
        records.iter().map(|r| r.cylinder_id.as_str()).collect()
    }

    #[test]
    fn test_unfiltered_returns_everything_sorted_by_due_date() {
        let records = fleet();
        let found = search(&records, &InventoryQuery::all());
        assert_eq!(found.len(), records.len());
        // Equal due dates keep load order; missing dates sort last.
        assert_eq!(ids(&found), vec!["LEO-001", "HYD-100", "LEO-003", "LEO-002"]);
    }

    #[test]
    fn test_empty_strings_and_all_sentinel_match_everything() {
        let records = fleet();
        let query = InventoryQuery::all()
            .with_id("")
            .with_name("")
            .with_status("All".parse().unwrap());
        assert_eq!(search(&records, &query).len(), records.len());
    }

    #[test]
    fn test_id_search_is_case_insensitive() {
        let records = fleet();
        let found = search(&records, &InventoryQuery::all().with_id("leo"));
        assert_eq!(ids(&found), vec!["LEO-001", "LEO-003", "LEO-002"]);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let records = fleet();
        let query = InventoryQuery::all()
            .with_name("ALI")
            .with_status(StatusFilter::Only(CylinderStatus::Damaged));
        assert_eq!(ids(&search(&records, &query)), vec!["LEO-002"]);

        let none = InventoryQuery::all().with_id("HYD").with_name("ali");
        assert!(search(&records, &none).is_empty());
    }

    #[test]
    fn test_search_is_idempotent_and_leaves_input_untouched() {
        let records = fleet();
        let before = records.clone();
        let query = InventoryQuery::all().with_name("a");
        let once = search(&records, &query);
        let twice = search(&once, &query);
        assert_eq!(once, twice);
        assert_eq!(records, before);
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!("Empty".parse::<StatusFilter>(), Ok(StatusFilter::Only(CylinderStatus::Empty)));
        assert!("Missing".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_summarize_recomputes_overdue() {
        let mut records = fleet();
        // Stored flag is stale; the summary must ignore it.
        records[0].overdue = true;
        records[2].degraded = true;
        let summary = summarize(&records, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.overdue, 2);
        assert_eq!(summary.unknown_due, 1);
        assert_eq!(summary.full, 2);
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.damaged, 1);
        assert_eq!(summary.degraded, 1);
    }

    #[test]
    fn test_return_candidates_are_unique_in_load_order() {
        let mut records = fleet();
        records.push(records[1].clone());
        assert_eq!(return_candidates(&records), vec!["LEO-003", "LEO-001", "LEO-002", "HYD-100"]);
    }
}
