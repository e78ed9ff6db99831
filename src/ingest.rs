//! Parsing of raw store rows into records.
//!
//! Rows come back as JSON objects keyed by column name. A bad date, PIN,
//! capacity or fill level degrades the row but keeps it in the snapshot, so the
//! dashboard counts match the visible rows. Rows that are not objects, have no
//! identifier or carry an unknown status are dropped, because they cannot be
//! represented at all; the IDs of such rows are still reported so they are not
//! handed out again.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;

use crate::model::{normalize_pin, CylinderRecord, CylinderStatus};
use crate::schema::column;

/// One well-formed row: a JSON object keyed by column name.
pub type RawRow = Map<String, Value>;

/// What was wrong with a loaded row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataQualityIssue {
    /// Row was not a JSON object; row dropped
    MalformedRow(String),
    /// No `Cylinder_ID`; row dropped
    MissingIdentifier,
    /// `Status` not one of Full, Empty, Damaged; row dropped
    UnknownStatus(String),
    /// A date column was missing or unparseable
    UnparseableDate { column: &'static str, value: String },
    /// `Location_PIN` was not a number of at most six digits; stored as `000000`
    InvalidPin(String),
    /// `Capacity_kg` missing or not a number
    InvalidCapacity(String),
    /// `Fill_Percent` missing or outside 0..=100; read as 0
    InvalidFillPercent(String),
}

impl DataQualityIssue {
    /// Returns `true` when the row could not be kept.
    #[must_use]
    pub fn drops_row(&self) -> bool {
        matches!(
            self,
            DataQualityIssue::MalformedRow(_)
                | DataQualityIssue::MissingIdentifier
                | DataQualityIssue::UnknownStatus(_)
        )
    }
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityIssue::MalformedRow(v) => write!(f, "malformed row {v}"),
            DataQualityIssue::MissingIdentifier => write!(f, "missing cylinder ID"),
            DataQualityIssue::UnknownStatus(v) => write!(f, "unknown status {v:?}"),
            DataQualityIssue::UnparseableDate { column, value } => {
                write!(f, "unparseable {column} {value:?}")
            }
            DataQualityIssue::InvalidPin(v) => write!(f, "invalid location PIN {v:?}"),
            DataQualityIssue::InvalidCapacity(v) => write!(f, "invalid capacity {v:?}"),
            DataQualityIssue::InvalidFillPercent(v) => write!(f, "invalid fill percent {v:?}"),
        }
    }
}

/// A data-quality problem found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQualityWarning {
    /// Position of the row in the store response
    pub row_index: usize,
    pub cylinder_id: Option<String>,
    pub issue: DataQualityIssue,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cylinder_id {
            Some(id) => write!(f, "row {} ({}): {}", self.row_index, id, self.issue),
            None => write!(f, "row {}: {}", self.row_index, self.issue),
        }
    }
}

/// Records and warnings produced from one store response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub records: Vec<CylinderRecord>,
    pub warnings: Vec<DataQualityWarning>,
    /// IDs present in the store whose rows were dropped
    pub unloaded_ids: Vec<String>,
}

impl Ingested {
    fn warn(&mut self, row_index: usize, cylinder_id: Option<String>, issue: DataQualityIssue) {
        log::warn!("Degraded cylinder row {}: {}", row_index, issue);
        self.warnings.push(DataQualityWarning {
            row_index,
            cylinder_id,
            issue,
        });
    }

    /// Number of store rows that did not make it into `records`.
    #[must_use]
    pub fn dropped_rows(&self) -> usize {
        dropped_rows(&self.warnings)
    }
}

/// Count the rows dropped according to `warnings`.
#[must_use]
pub fn dropped_rows(warnings: &[DataQualityWarning]) -> usize {
    warnings.iter().filter(|w| w.issue.drops_row()).count()
}

/// Parse every row, keeping load order.
#[must_use]
pub fn ingest_rows(rows: &[Value]) -> Ingested {
    let mut ingested = Ingested::default();
    for (row_index, row) in rows.iter().enumerate() {
        let Value::Object(row) = row else {
            ingested.warn(row_index, None, DataQualityIssue::MalformedRow(describe(Some(row))));
            continue;
        };

        let mut issues = Vec::new();
        let parsed = parse_row(row, &mut issues);
        let cylinder_id = text(row.get(column::CYLINDER_ID)).filter(|id| !id.trim().is_empty());

        for issue in issues {
            ingested.warn(row_index, cylinder_id.clone(), issue);
        }
        match parsed {
            Some(record) => ingested.records.push(record),
            None => ingested.unloaded_ids.extend(cylinder_id),
        }
    }
    ingested
}

/// Parse a single row, pushing any issues found.
///
/// Returns `None` when the row had to be dropped.
pub fn parse_row(row: &RawRow, issues: &mut Vec<DataQualityIssue>) -> Option<CylinderRecord> {
    let Some(cylinder_id) = text(row.get(column::CYLINDER_ID)).filter(|id| !id.trim().is_empty())
    else {
        issues.push(DataQualityIssue::MissingIdentifier);
        return None;
    };

    let raw_status = text(row.get(column::STATUS)).unwrap_or_default();
    let Ok(status) = raw_status.parse::<CylinderStatus>() else {
        issues.push(DataQualityIssue::UnknownStatus(raw_status));
        return None;
    };

    let before = issues.len();

    let customer_name = text(row.get(column::CUSTOMER_NAME)).unwrap_or_default();

    let raw_pin = text(row.get(column::LOCATION_PIN)).unwrap_or_default();
    let location_pin = normalize_pin(&raw_pin).unwrap_or_else(|| {
        issues.push(DataQualityIssue::InvalidPin(raw_pin.clone()));
        normalize_pin("0").unwrap_or_default()
    });

    let capacity_kg = parse_decimal(row.get(column::CAPACITY_KG));
    if capacity_kg.is_none() {
        issues.push(DataQualityIssue::InvalidCapacity(describe(row.get(column::CAPACITY_KG))));
    }

    let fill_percent = parse_fill(row.get(column::FILL_PERCENT)).unwrap_or_else(|| {
        issues.push(DataQualityIssue::InvalidFillPercent(describe(row.get(column::FILL_PERCENT))));
        0
    });

    let mut date = |name: &'static str| {
        let parsed = parse_date(row.get(name));
        if parsed.is_none() {
            issues.push(DataQualityIssue::UnparseableDate {
                column: name,
                value: describe(row.get(name)),
            });
        }
        parsed
    };
    let last_fill_date = date(column::LAST_FILL_DATE);
    let last_test_date = date(column::LAST_TEST_DATE);
    let next_test_due = date(column::NEXT_TEST_DUE);

    let overdue = matches!(row.get(column::OVERDUE), Some(Value::Bool(true)));

    let degraded = issues.len() > before;
    Some(CylinderRecord {
        cylinder_id,
        customer_name,
        location_pin,
        capacity_kg,
        fill_percent,
        status,
        last_fill_date,
        last_test_date,
        next_test_due,
        overdue,
        degraded,
    })
}

/// Render a record as the row the store would hold.
///
/// PIN and capacity are numbers, dates are `YYYY-MM-DD` strings.
#[must_use]
pub fn to_raw_row(record: &CylinderRecord) -> RawRow {
    let date = |d: Option<NaiveDate>| d.map_or(Value::Null, |d| Value::String(d.to_string()));
    let capacity = record
        .capacity_kg
        .and_then(|c| Number::from_str(&c.normalize().to_string()).ok())
        .map_or(Value::Null, Value::Number);

    let mut row = Map::new();
    row.insert(column::CYLINDER_ID.to_string(), Value::String(record.cylinder_id.clone()));
    row.insert(column::CUSTOMER_NAME.to_string(), Value::String(record.customer_name.clone()));
    row.insert(column::LOCATION_PIN.to_string(), Value::from(record.pin_number()));
    row.insert(column::CAPACITY_KG.to_string(), capacity);
    row.insert(column::FILL_PERCENT.to_string(), Value::from(record.fill_percent));
    row.insert(column::STATUS.to_string(), Value::String(record.status.as_str().to_string()));
    row.insert(column::LAST_FILL_DATE.to_string(), date(record.last_fill_date));
    row.insert(column::LAST_TEST_DATE.to_string(), date(record.last_test_date));
    row.insert(column::NEXT_TEST_DUE.to_string(), date(record.next_test_due));
    row.insert(column::OVERDUE.to_string(), Value::Bool(record.overdue));
    row
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn parse_decimal(value: Option<&Value>) -> Option<Decimal> {
    let raw = text(value)?;
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn parse_fill(value: Option<&Value>) -> Option<u8> {
    let fill = parse_decimal(value)?;
    if fill < Decimal::ZERO || fill > Decimal::ONE_HUNDRED || !fill.fract().is_zero() {
        return None;
    }
    fill.to_u8()
}

/// Accepts `YYYY-MM-DD` and the timestamp forms PostgreSQL and JSON clients emit.
fn parse_date(value: Option<&Value>) -> Option<NaiveDate> {
    let Some(Value::String(raw)) = value else {
        return None;
    };
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date())
}
