//! # Date-Range Bucketing
//!
//! Historical caches group rows by the date bucket a ticketing date falls
//! into, so every "as of" query inside one bucket shares a single DB load.
//! Buckets are pure functions of `(ticket_date, granularity)`: the same
//! ticket date always lands in the same half-open `[start, end)` interval.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Earliest bucket boundary used by [`BucketGranularity::AllDates`].
pub const MIN_BUCKET_DATE: NaiveDate = NaiveDate::MIN;

/// Latest bucket boundary; also the fallback when month arithmetic would
/// leave the supported range.
pub const MAX_BUCKET_DATE: NaiveDate = NaiveDate::MAX;

/// Half-open `[start, end)` date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// How wide a historical cache's date buckets are.
///
/// Configured per deployment; wider buckets trade memory for fewer DB round
/// trips across a spread of ticketing dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketGranularity {
    Daily,
    Weekly,
    HalfMonthly,
    Monthly,
    Quarterly,
    Yearly,
    /// One bucket covering every representable date; used where per-date
    /// bucketing is disabled and the whole table history is cached at once.
    AllDates,
}

impl BucketGranularity {
    /// The unique bucket containing `ticket_date`.
    pub fn bucket_for(self, ticket_date: NaiveDate) -> DateRange {
        match self {
            BucketGranularity::Daily => DateRange::new(ticket_date, next_day(ticket_date)),
            BucketGranularity::Weekly => {
                let start = ticket_date
                    - chrono::Days::new(u64::from(ticket_date.weekday().num_days_from_monday()));
                DateRange::new(start, start + chrono::Days::new(7))
            }
            BucketGranularity::HalfMonthly => {
                let first = first_of_month(ticket_date);
                let mid = with_day(first, 16);
                if ticket_date < mid {
                    DateRange::new(first, mid)
                } else {
                    DateRange::new(mid, first_of_next_month(ticket_date))
                }
            }
            BucketGranularity::Monthly => DateRange::new(
                first_of_month(ticket_date),
                first_of_next_month(ticket_date),
            ),
            BucketGranularity::Quarterly => {
                let quarter_month = 1 + 3 * ((ticket_date.month() - 1) / 3);
                let start = ymd(ticket_date.year(), quarter_month, 1);
                let end = if quarter_month == 10 {
                    ymd(ticket_date.year() + 1, 1, 1)
                } else {
                    ymd(ticket_date.year(), quarter_month + 3, 1)
                };
                DateRange::new(start, end)
            }
            BucketGranularity::Yearly => DateRange::new(
                ymd(ticket_date.year(), 1, 1),
                ymd(ticket_date.year() + 1, 1, 1),
            ),
            BucketGranularity::AllDates => DateRange::new(MIN_BUCKET_DATE, MAX_BUCKET_DATE),
        }
    }
}

impl FromStr for BucketGranularity {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "daily" => Ok(BucketGranularity::Daily),
            "weekly" => Ok(BucketGranularity::Weekly),
            "half_monthly" | "halfmonthly" => Ok(BucketGranularity::HalfMonthly),
            "monthly" => Ok(BucketGranularity::Monthly),
            "quarterly" => Ok(BucketGranularity::Quarterly),
            "yearly" => Ok(BucketGranularity::Yearly),
            "all_dates" | "alldates" | "nodates" => Ok(BucketGranularity::AllDates),
            other => Err(format!("unknown bucket granularity: {other}")),
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(MAX_BUCKET_DATE)
}

fn with_day(date: NaiveDate, day: u32) -> NaiveDate {
    date.with_day(day).unwrap_or(MAX_BUCKET_DATE)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    with_day(date, 1)
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    if date.month() == 12 {
        ymd(date.year() + 1, 1, 1)
    } else {
        ymd(date.year(), date.month() + 1, 1)
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(MAX_BUCKET_DATE)
}
