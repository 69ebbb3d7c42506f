//! Work pattern entity module
//!
//! A work pattern is an ordered cycle of shift codes and off markers of
//! length L, repeated across the horizon. Applied to a date with an
//! employee rotation offset `k`, the pattern position for date `d` is
//! `(days_from_anchor(d) + k) mod L`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reserved pattern marker (and output shift code) for an off day.
pub const OFF_MARKER: &str = "O";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkPatternError {
    #[error("work pattern is empty")]
    Empty,
    #[error("work pattern has no working day")]
    AllOff,
}

/// One position in a work pattern cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PatternSlot {
    /// Off day, written `O` in pattern notation
    Off,
    /// A working day on the shift with this code
    Shift(String),
}

impl PatternSlot {
    pub fn is_work(&self) -> bool {
        matches!(self, PatternSlot::Shift(_))
    }
}

/// An ordered cycle of shift codes and off markers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkPattern {
    slots: Vec<PatternSlot>,
}

impl WorkPattern {
    /// Builds a pattern from cycle entries, `"O"` marking off days
    ///
    /// # Errors
    ///
    /// Fails when the cycle is empty or contains no working day.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Result<Self, WorkPatternError> {
        if codes.is_empty() {
            return Err(WorkPatternError::Empty);
        }
        let slots: Vec<PatternSlot> = codes
            .iter()
            .map(|c| {
                let code = c.as_ref().trim();
                if code.eq_ignore_ascii_case(OFF_MARKER) {
                    PatternSlot::Off
                } else {
                    PatternSlot::Shift(code.to_string())
                }
            })
            .collect();
        if slots.iter().all(|s| !s.is_work()) {
            return Err(WorkPatternError::AllOff);
        }
        Ok(Self { slots })
    }

    /// Cycle length L
    pub fn cycle_len(&self) -> usize {
        self.slots.len()
    }

    /// Number of working days in one cycle
    pub fn work_days_per_cycle(&self) -> usize {
        self.slots.iter().filter(|s| s.is_work()).count()
    }

    /// Pattern position for `date` with rotation offset `offset`
    ///
    /// The anchor is the first date of the range the pattern applies to;
    /// dates before the anchor wrap around the cycle.
    ///
    /// # Arguments
    ///
    /// * `anchor` - First date the pattern applies to
    /// * `date` - The date to position
    /// * `offset` - The employee's rotation offset
    ///
    /// # Returns
    ///
    /// The cycle position `(days_from_anchor + offset) mod L`
    pub fn position_for(&self, anchor: NaiveDate, date: NaiveDate, offset: usize) -> usize {
        let len = self.slots.len() as i64;
        let days = (date - anchor).num_days() + offset as i64;
        (days.rem_euclid(len)) as usize
    }

    /// Pattern slot prescribed for `date` with rotation offset `offset`
    pub fn slot_on(&self, anchor: NaiveDate, date: NaiveDate, offset: usize) -> &PatternSlot {
        &self.slots[self.position_for(anchor, date, offset)]
    }

    /// Shift code prescribed for `date`
    ///
    /// # Arguments
    ///
    /// * `anchor` - First date the pattern applies to
    /// * `date` - The date to read
    /// * `offset` - The employee's rotation offset
    ///
    /// # Returns
    ///
    /// The prescribed shift code, or None on an off day
    pub fn shift_on(&self, anchor: NaiveDate, date: NaiveDate, offset: usize) -> Option<&str> {
        match self.slot_on(anchor, date, offset) {
            PatternSlot::Off => None,
            PatternSlot::Shift(code) => Some(code.as_str()),
        }
    }

    /// Whether the pattern prescribes work on `date`
    pub fn is_work_day(&self, anchor: NaiveDate, date: NaiveDate, offset: usize) -> bool {
        self.slot_on(anchor, date, offset).is_work()
    }

    pub fn slots(&self) -> &[PatternSlot] {
        &self.slots
    }
}

impl fmt::Display for WorkPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self
            .slots
            .iter()
            .map(|s| match s {
                PatternSlot::Off => OFF_MARKER,
                PatternSlot::Shift(code) => code.as_str(),
            })
            .collect();
        write!(f, "[{}]", codes.join(","))
    }
}
