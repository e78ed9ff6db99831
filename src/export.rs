//! CSV rendering of inventory records, using the store's column names.

use std::io::Write;

use crate::model::CylinderRecord;
use crate::schema::column;

fn date_field(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Write `records` with a header row.
///
/// Unknown dates and capacities are written as empty fields.
///
/// # Errors
///
/// Returns `csv::Error` if the writer fails.
pub fn write_csv<W: Write>(records: &[CylinderRecord], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(column::ALL)?;
    for record in records {
        wtr.write_record([
            record.cylinder_id.clone(),
            record.customer_name.clone(),
            record.location_pin.clone(),
            record
                .capacity_kg
                .map(|c| c.normalize().to_string())
                .unwrap_or_default(),
            record.fill_percent.to_string(),
            record.status.as_str().to_string(),
            date_field(record.last_fill_date),
            date_field(record.last_test_date),
            date_field(record.next_test_due),
            record.overdue.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render `records` to a CSV string.
///
/// # Errors
///
/// Returns `csv::Error` if a record cannot be written.
pub fn to_csv_string(records: &[CylinderRecord]) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CylinderStatus;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn record(id: &str, name: &str) -> CylinderRecord {
        CylinderRecord {
            cylinder_id: id.to_string(),
            customer_name: name.to_string(),
            location_pin: "034567".to_string(),
            capacity_kg: Some(Decimal::new(1420, 2)),
            fill_percent: 100,
            status: CylinderStatus::Full,
            last_fill_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            last_test_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            next_test_due: None,
            overdue: false,
            degraded: false,
        }
    }

    #[test]
    fn test_header_and_rows() {
        let csv = to_csv_string(&[record("LEO-001", "Asha")]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Cylinder_ID,Customer_Name,Location_PIN,Capacity_kg,Fill_Percent,Status,Last_Fill_Date,Last_Test_Date,Next_Test_Due,Overdue"
        );
        assert_eq!(
            lines.next().unwrap(),
            "LEO-001,Asha,034567,14.2,100,Full,2026-01-01,2026-01-01,,false"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_quotes_fields_with_commas() {
        let csv = to_csv_string(&[record("LEO-002", "Rao, Sons & Co")]).unwrap();
        assert!(csv.contains("\"Rao, Sons & Co\""));
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let csv = to_csv_string(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
