//! Planning horizon entity module
//!
//! The planning horizon is the closed date interval a roster is generated
//! for, plus the set of public holidays inside it. Dates are local civil
//! dates; no timezone offset exists inside the core.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A closed local-date interval
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Number of days in the closed interval
    pub fn num_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Iterates the dates of the interval in chronological order
    pub fn iter_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let days = self.num_days().max(0) as usize;
        (0..days).map(move |offset| self.start_date + Duration::days(offset as i64))
    }
}

/// The planning horizon of a roster run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanningHorizon {
    pub range: DateRange,
    pub public_holidays: BTreeSet<NaiveDate>,
}

impl PlanningHorizon {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            range: DateRange::new(start_date, end_date),
            public_holidays: BTreeSet::new(),
        }
    }

    pub fn with_public_holiday(mut self, date: NaiveDate) -> Self {
        self.public_holidays.insert(date);
        self
    }

    pub fn start(&self) -> NaiveDate {
        self.range.start_date
    }

    pub fn end(&self) -> NaiveDate {
        self.range.end_date
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.range.contains(date)
    }

    pub fn is_public_holiday(&self, date: NaiveDate) -> bool {
        self.public_holidays.contains(&date)
    }

    pub fn iter_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.range.iter_dates()
    }

    pub fn num_days(&self) -> i64 {
        self.range.num_days()
    }

    /// Distinct (year, month) pairs the horizon touches, in order
    pub fn months(&self) -> Vec<(i32, u32)> {
        let mut months = Vec::new();
        for date in self.iter_dates() {
            let key = (date.year(), date.month());
            if months.last() != Some(&key) {
                months.push(key);
            }
        }
        months
    }
}

/// Number of days in the given calendar month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month");
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid month");
    (next - first).num_days() as u32
}
