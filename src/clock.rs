//! Reference-date source.
//!
//! Rule code never reads the wall clock; it takes a `reference_date` computed
//! here in one fixed timezone so evaluation and storage agree on day boundaries.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Offset of Asia/Kolkata (IST has no daylight saving).
pub const KOLKATA_OFFSET_MINUTES: i32 = 330;

/// Source of the current instant and its local date.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Timezone used to derive calendar dates.
    fn offset(&self) -> FixedOffset;

    /// Calendar date of [`Clock::now`] in [`Clock::offset`].
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset()).date_naive()
    }
}

/// Build a fixed offset from minutes east of UTC, `None` if out of range.
#[must_use]
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

fn kolkata() -> FixedOffset {
    offset_from_minutes(KOLKATA_OFFSET_MINUTES).unwrap_or_else(|| Utc.fix())
}

/// Wall clock in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(kolkata())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Clock frozen at a given instant; used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    /// Clock whose local date (Asia/Kolkata) is `date`, at local noon.
    #[must_use]
    pub fn on_date(date: NaiveDate) -> Self {
        let offset = kolkata();
        let local_noon = date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc();
        let now = local_noon
            .checked_sub_signed(chrono::Duration::seconds(i64::from(offset.local_minus_utc())))
            .unwrap_or(local_noon);
        Self { now, offset }
    }

    /// Move the clock forward.
    pub fn advance(&mut self, by: chrono::Duration) {
        self.now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}
