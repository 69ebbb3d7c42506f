//! Shift definition entity module
//!
//! A shift definition is identified by a short code (e.g. `D`, `N`) and
//! carries its start-of-day and end-of-day times plus optional rank and
//! product restrictions. A shift whose end time is not after its start
//! time crosses midnight; applying it to a date produces concrete local
//! start and end instants, with the end landing on the following day.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A rosterable shift definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDefinition {
    /// Short shift code, unique within a run (e.g. `D`, `N`)
    pub code: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Ranks allowed to work this shift; empty means unrestricted
    #[serde(default)]
    pub ranks: Vec<String>,
    /// Product types allowed to work this shift; empty means unrestricted
    #[serde(default)]
    pub product_types: Vec<String>,
}

impl ShiftDefinition {
    pub fn new(code: impl Into<String>, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            code: code.into(),
            start_time,
            end_time,
            ranks: Vec::new(),
            product_types: Vec::new(),
        }
    }

    /// Whether the shift's end instant falls on the day after its start
    pub fn crosses_midnight(&self) -> bool {
        self.end_time <= self.start_time
    }

    /// Gross duration of the shift, crossing midnight when end <= start
    ///
    /// # Returns
    ///
    /// The duration in hours
    pub fn duration_hours(&self) -> f64 {
        let minutes = if self.crosses_midnight() {
            (self.end_time - self.start_time).num_minutes() + 24 * 60
        } else {
            (self.end_time - self.start_time).num_minutes()
        };
        minutes as f64 / 60.0
    }

    /// Concrete start and end instants of this shift on the given date
    ///
    /// The hour breakdown of a midnight-crossing shift is attributed to
    /// its start date; only the end instant moves to the next day.
    ///
    /// # Arguments
    ///
    /// * `date` - The civil date the shift starts on
    ///
    /// # Returns
    ///
    /// The (start, end) instants of the shift on that date
    pub fn instants_on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = date.and_time(self.start_time);
        let end = if self.crosses_midnight() {
            (date + Duration::days(1)).and_time(self.end_time)
        } else {
            date.and_time(self.end_time)
        };
        (start, end)
    }

    /// Whether the given rank may work this shift
    pub fn allows_rank(&self, rank: &str) -> bool {
        self.ranks.is_empty() || self.ranks.iter().any(|r| r == rank)
    }

    /// Whether the given product type may work this shift
    pub fn allows_product(&self, product_type: &str) -> bool {
        self.product_types.is_empty() || self.product_types.iter().any(|p| p == product_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_shift_duration() {
        let shift = ShiftDefinition::new("D", time(8, 0), time(20, 0));
        assert!(!shift.crosses_midnight());
        assert_eq!(shift.duration_hours(), 12.0);
    }

    #[test]
    fn test_night_shift_crosses_midnight() {
        let shift = ShiftDefinition::new("N", time(20, 0), time(8, 0));
        assert!(shift.crosses_midnight());
        assert_eq!(shift.duration_hours(), 12.0);

        let (start, end) = shift.instants_on(date(2026, 3, 15));
        assert_eq!(start, date(2026, 3, 15).and_time(time(20, 0)));
        assert_eq!(end, date(2026, 3, 16).and_time(time(8, 0)));
    }

    #[test]
    fn test_instants_on_same_day() {
        let shift = ShiftDefinition::new("A", time(9, 0), time(13, 0));
        let (start, end) = shift.instants_on(date(2026, 3, 15));
        assert_eq!(start.date(), end.date());
        assert_eq!(shift.duration_hours(), 4.0);
    }

    #[test]
    fn test_rank_and_product_restrictions() {
        let mut shift = ShiftDefinition::new("D", time(8, 0), time(20, 0));
        assert!(shift.allows_rank("SGT"));
        shift.ranks = vec!["SGT".to_string()];
        assert!(shift.allows_rank("SGT"));
        assert!(!shift.allows_rank("CPL"));
        shift.product_types = vec!["APO".to_string()];
        assert!(shift.allows_product("APO"));
        assert!(!shift.allows_product("SO"));
    }
}
