//! Session state and handlers for the four inventory views.
//!
//! The presentation layer owns an [`Inventory`]; each user interaction calls one
//! handler, which reads the current [`SessionContext`] and returns new values.
//! The snapshot is replaced wholesale on refresh and never edited in place.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use rust_decimal::prelude::ToPrimitive;

use crate::clock::{Clock, SystemClock};
use crate::config::InventoryConfig;
use crate::error::{InventoryError, ValidationError};
use crate::ingest::{dropped_rows, ingest_rows, DataQualityWarning};
use crate::model::{CylinderRecord, CylinderStatus, ReturnCondition, RETURNED_FILL_PERCENT};
use crate::overdue::evaluate_record;
use crate::penalty::PenaltyPolicy;
use crate::query::{self, DashboardSummary, InventoryQuery};
use crate::registration::{build_record, NewCylinder};
use crate::store::{RecordStore, ReturnUpdate};

/// Records loaded from the store at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub records: Vec<CylinderRecord>,
    pub warnings: Vec<DataQualityWarning>,
    /// IDs of store rows that could not be loaded
    pub unloaded_ids: Vec<String>,
}

impl Snapshot {
    #[must_use]
    pub fn find(&self, cylinder_id: &str) -> Option<&CylinderRecord> {
        self.records.iter().find(|r| r.cylinder_id == cylinder_id)
    }

    /// IDs taken in the store, including rows that failed to load (exact match).
    #[must_use]
    pub fn ids(&self) -> HashSet<String> {
        self.records
            .iter()
            .map(|r| r.cylinder_id.clone())
            .chain(self.unloaded_ids.iter().cloned())
            .collect()
    }
}

/// Explicit per-session state: snapshot, when it was loaded, and the timezone.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub snapshot: Snapshot,
    /// `None` before the first successful load or after a write invalidated it
    pub loaded_at: Option<DateTime<Utc>>,
    pub timezone: FixedOffset,
    pub refresh_interval: Duration,
}

impl SessionContext {
    pub fn new(timezone: FixedOffset, refresh_interval: Duration) -> Self {
        Self {
            snapshot: Snapshot::default(),
            loaded_at: None,
            timezone,
            refresh_interval,
        }
    }

    /// Returns `true` when the snapshot must be reloaded before use.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.loaded_at {
            None => true,
            Some(loaded_at) => match (now - loaded_at).to_std() {
                Ok(age) => age >= self.refresh_interval,
                // Clock went backwards; trust the snapshot.
                Err(_) => false,
            },
        }
    }

    /// Force a reload on next use; the current records stay visible until then.
    pub fn invalidate(&mut self) {
        self.loaded_at = None;
    }
}

/// Dashboard view: metric row plus every record ordered by due date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub reference_date: NaiveDate,
    pub summary: DashboardSummary,
    /// Store rows left out of `records` and `summary`
    pub dropped_rows: usize,
    pub records: Vec<CylinderRecord>,
}

/// Outcome of a recorded return.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnReceipt {
    pub cylinder_id: String,
    pub condition: ReturnCondition,
    /// Recomputed from the reference date at the time of the return
    pub was_overdue: bool,
    pub penalty: Decimal,
    pub previous_status: CylinderStatus,
    pub new_status: CylinderStatus,
    pub fill_percent: u8,
    pub rows_affected: u64,
}

/// Inventory handlers over a record store.
pub struct Inventory<S: RecordStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    policy: PenaltyPolicy,
    table: String,
    context: SessionContext,
}

impl<S: RecordStore> Inventory<S, SystemClock> {
    /// Build from configuration with the wall clock.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Config` if the configuration is invalid.
    pub fn from_config(store: S, config: &InventoryConfig) -> Result<Self, InventoryError> {
        config.validate()?;
        let clock = config.clock()?;
        Ok(Self::new(store, clock, config.penalty_policy(), config.refresh_interval())
            .with_table_label(config.table.clone()))
    }
}

impl<S: RecordStore, C: Clock> Inventory<S, C> {
    pub fn new(store: S, clock: C, policy: PenaltyPolicy, refresh_interval: Duration) -> Self {
        let context = SessionContext::new(clock.offset(), refresh_interval);
        Self {
            store,
            clock,
            policy,
            table: crate::schema::DEFAULT_TABLE.to_string(),
            context,
        }
    }

    /// Name used in logs and spans for the backing table.
    #[must_use]
    pub fn with_table_label(mut self, table: String) -> Self {
        self.table = table;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.context.snapshot
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Today in the session timezone.
    #[must_use]
    pub fn reference_date(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Reload the snapshot from the store.
    ///
    /// On failure the previous snapshot is kept (empty if none was ever loaded).
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Connectivity` if the store cannot be read.
    pub fn refresh(&mut self) -> Result<&Snapshot, InventoryError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::load_snapshot_span(&self.table).entered();

        let rows = match self.store.fetch_all() {
            Ok(rows) => rows,
            Err(e) => {
                #[cfg(feature = "metrics")]
                METRICS.record_snapshot_failure();
                log::error!("Database Connection Error: {}", e);
                return Err(e.into());
            }
        };

        let ingested = ingest_rows(&rows);
        let degraded = ingested.records.iter().filter(|r| r.degraded).count();
        #[cfg(feature = "metrics")]
        METRICS.record_snapshot_load(degraded);
        log::info!(
            "Loaded {} cylinder(s) from {} ({} degraded, {} dropped)",
            ingested.records.len(),
            self.table,
            degraded,
            ingested.dropped_rows()
        );

        self.context.snapshot = Snapshot {
            records: ingested.records,
            warnings: ingested.warnings,
            unloaded_ids: ingested.unloaded_ids,
        };
        self.context.loaded_at = Some(self.clock.now());
        Ok(&self.context.snapshot)
    }

    /// Reload only if the snapshot is older than the refresh interval.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Connectivity` if a needed reload fails.
    pub fn ensure_fresh(&mut self) -> Result<&Snapshot, InventoryError> {
        if self.context.is_stale(self.clock.now()) {
            return self.refresh();
        }
        Ok(&self.context.snapshot)
    }

    /// Dashboard: counters and all records by due date.
    #[must_use]
    pub fn dashboard(&self) -> DashboardView {
        let reference_date = self.reference_date();
        let snapshot = &self.context.snapshot;
        let records = &snapshot.records;
        DashboardView {
            reference_date,
            summary: query::summarize(records, reference_date),
            dropped_rows: dropped_rows(&snapshot.warnings),
            records: query::search(records, &InventoryQuery::all()),
        }
    }

    /// Cylinder finder.
    #[must_use]
    pub fn search(&self, query: &InventoryQuery) -> Vec<CylinderRecord> {
        query::search(&self.context.snapshot.records, query)
    }

    /// IDs offered on the return form.
    #[must_use]
    pub fn return_candidates(&self) -> Vec<&str> {
        query::return_candidates(&self.context.snapshot.records)
    }

    /// Record a returned cylinder: compute the penalty and write status and fill.
    ///
    /// Overdue is recomputed from today's date; the stored flag is ignored. Test
    /// and fill dates are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::UnknownCylinder` if the ID is not in the snapshot
    /// and `InventoryError::Connectivity` if the update fails.
    pub fn return_cylinder(
        &mut self,
        cylinder_id: &str,
        condition: ReturnCondition,
    ) -> Result<ReturnReceipt, InventoryError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::return_cylinder_span(cylinder_id).entered();

        let record = self
            .context
            .snapshot
            .find(cylinder_id)
            .ok_or_else(|| InventoryError::UnknownCylinder(cylinder_id.to_string()))?;

        let was_overdue = evaluate_record(record, self.clock.today()).is_overdue();
        let outcome = self.policy.compute_return(condition, was_overdue);
        let previous_status = record.status;
        let update = ReturnUpdate {
            status: outcome.new_status,
            fill_percent: RETURNED_FILL_PERCENT,
        };

        let rows_affected = self.store.update_by_id(cylinder_id, &update).map_err(|e| {
            log::error!("Update Failed: {}", e);
            InventoryError::from(e)
        })?;
        if rows_affected == 0 {
            log::warn!("Return of {} matched no rows in {}", cylinder_id, self.table);
        }

        #[cfg(feature = "metrics")]
        METRICS.record_return(outcome.penalty.to_f64().unwrap_or_default());
        log::info!(
            "Cylinder {} returned {} ({}): penalty {}, status {} -> {}",
            cylinder_id,
            condition,
            if was_overdue { "overdue" } else { "on time" },
            outcome.penalty,
            previous_status,
            outcome.new_status
        );

        self.context.invalidate();
        Ok(ReturnReceipt {
            cylinder_id: cylinder_id.to_string(),
            condition,
            was_overdue,
            penalty: outcome.penalty,
            previous_status,
            new_status: outcome.new_status,
            fill_percent: update.fill_percent,
            rows_affected,
        })
    }

    /// Same as [`Inventory::return_cylinder`] with the condition given as a form label.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownCondition` for labels outside the condition set,
    /// before any store call.
    pub fn return_cylinder_labelled(
        &mut self,
        cylinder_id: &str,
        condition: &str,
    ) -> Result<ReturnReceipt, InventoryError> {
        let condition = condition.parse::<ReturnCondition>().map_err(|e| self.rejected(e))?;
        self.return_cylinder(cylinder_id, condition)
    }

    /// Register a new cylinder and insert it.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` before any store call if the input is
    /// rejected, and `InventoryError::Connectivity` if the insert fails.
    pub fn register(&mut self, input: &NewCylinder) -> Result<CylinderRecord, InventoryError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::register_cylinder_span(input.cylinder_id.trim()).entered();

        let existing = self.context.snapshot.ids();
        let record = build_record(input, self.clock.today(), &existing).map_err(|e| self.rejected(e))?;

        self.store.insert(&record).map_err(|e| {
            log::error!("Database Error: {}", e);
            InventoryError::from(e)
        })?;

        #[cfg(feature = "metrics")]
        METRICS.record_registration();
        log::info!(
            "Cylinder {} registered, next test due {}",
            record.cylinder_id,
            record
                .next_test_due
                .map_or_else(|| "unknown".to_string(), |d| d.to_string())
        );

        self.context.invalidate();
        Ok(record)
    }

    fn rejected(&self, err: ValidationError) -> InventoryError {
        #[cfg(feature = "metrics")]
        METRICS.record_rejection();
        log::warn!("Rejected input: {}", err);
        InventoryError::Validation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn context(interval_secs: u64) -> SessionContext {
        SessionContext::new(FixedOffset::east_opt(19_800).unwrap(), Duration::from_secs(interval_secs))
    }

    #[test]
    fn test_context_staleness() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let mut ctx = context(60);
        assert!(ctx.is_stale(t0));

        ctx.loaded_at = Some(t0);
        assert!(!ctx.is_stale(t0 + chrono::Duration::seconds(59)));
        assert!(ctx.is_stale(t0 + chrono::Duration::seconds(60)));
        assert!(!ctx.is_stale(t0 - chrono::Duration::seconds(5)));

        ctx.invalidate();
        assert!(ctx.is_stale(t0));
    }

    #[test]
    fn test_snapshot_lookup_is_exact() {
        let snapshot = Snapshot {
            records: vec![CylinderRecord {
                cylinder_id: "LEO-001".to_string(),
                customer_name: String::new(),
                location_pin: "000000".to_string(),
                capacity_kg: None,
                fill_percent: 0,
                status: CylinderStatus::Empty,
                last_fill_date: None,
                last_test_date: None,
                next_test_due: None,
                overdue: false,
                degraded: true,
            }],
            warnings: Vec::new(),
            unloaded_ids: vec!["LEO-002".to_string()],
        };
        assert!(snapshot.find("LEO-001").is_some());
        assert!(snapshot.find("leo-001").is_none());
        assert!(snapshot.find("LEO-002").is_none());
        let ids = snapshot.ids();
        assert!(ids.contains("LEO-001"));
        assert!(ids.contains("LEO-002"));
    }

    #[test]
    fn test_reference_date_comes_from_clock() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let inventory = Inventory::new(
            crate::store::MemoryStore::new(),
            FixedClock::on_date(date),
            PenaltyPolicy::default(),
            Duration::from_secs(60),
        );
        assert_eq!(inventory.reference_date(), date);
        assert_eq!(inventory.context().timezone.local_minus_utc(), 19_800);
    }
}
