//! Clock port for obtaining the current time and calendar date.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};

/// Provides the current time and the calendar it is read in.
///
/// Ranking and recurrence are pure functions of "today"; taking the clock as a
/// parameter keeps them deterministic under test.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Offset of the calendar dates are read in.
    fn offset(&self) -> FixedOffset {
        Utc.fix()
    }

    /// Returns the calendar date tasks are judged against.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset()).date_naive()
    }
}

/// Clock backed by the system time, read in the machine's local calendar.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        Local::now().offset().fix()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    /// Freeze the clock at noon UTC on `date`.
    pub fn on(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        Self { now: noon.and_utc(), offset: Utc.fix() }
    }

    /// Read the frozen instant in another calendar.
    pub fn with_offset(self, offset: FixedOffset) -> Self {
        Self { offset, ..self }
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
