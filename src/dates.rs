// Closed-interval date ranges and the overlap predicate shared by search
// filtering and booking admission.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Reservation;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid date range: {start} is after {end}")]
pub struct InvalidRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A closed interval of calendar dates. Touching endpoints count as overlap:
/// a stay ending on the 15th conflicts with one starting on the 15th.
///
/// Deserialization goes through [`DateRange::new`], so a wire payload cannot
/// materialize an inverted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange", into = "RawDateRange")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Serialize, Deserialize)]
struct RawDateRange {
    #[serde(rename = "startDate")]
    start: NaiveDate,
    #[serde(rename = "endDate")]
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = InvalidRange;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl From<DateRange> for RawDateRange {
    fn from(range: DateRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRange> {
        if start > end {
            return Err(InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Symmetric closed-interval overlap.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// True when any of the given reservations overlaps this range.
    pub fn conflicts_with_any<'a, I>(&self, reservations: I) -> bool
    where
        I: IntoIterator<Item = &'a Reservation>,
    {
        reservations.into_iter().any(|r| self.overlaps(&r.range))
    }
}
