use chrono::NaiveDate;
use thiserror::Error;

/// Longest range accepted for a stay or an inventory edit.
pub const MAX_NIGHTS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StayRangeError {
    #[error("check-out must be after check-in")]
    Empty,

    #[error("date range cannot exceed {MAX_NIGHTS} nights")]
    TooLong,
}

/// A half-open range of calendar nights, `[start, end)`.
///
/// The end date is the check-out day and is never itself a night of the stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl StayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, StayRangeError> {
        let nights = nights_between(start, end);
        if nights <= 0 {
            return Err(StayRangeError::Empty);
        }
        if nights > MAX_NIGHTS {
            return Err(StayRangeError::TooLong);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn nights(&self) -> i64 {
        nights_between(self.start, self.end)
    }

    /// Every night of the range, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }
}

/// Calendar-day difference between two dates. Negative when `to` precedes `from`.
pub fn nights_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}
