//! Scheme value object module
//!
//! This module defines the labour-law work regime classification (scheme)
//! that bounds an employee's daily and weekly hours, together with the
//! gender classification used by requirement-level filters.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Product type that qualifies a scheme-A employee for the APGD-D10 exemption.
pub const APO_PRODUCT_TYPE: &str = "APO";

/// Error returned when a raw scheme string cannot be normalized
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown scheme '{raw}' (expected A, B or P)")]
pub struct SchemeParseError {
    pub raw: String,
}

/// Labour-law work regime classification
///
/// Scheme A is the full-time long-shift regime, scheme B the full-time
/// moderate-shift regime and scheme P the part-time regime. The scheme
/// bounds daily gross hours, weekly normal hours and the number of shifts
/// an employee may hold per day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scheme {
    A,
    B,
    P,
}

impl Scheme {
    /// Normalizes a raw scheme string into a Scheme
    ///
    /// Accepts the bare letter in any case (`"a"`, `"A"`) as well as the
    /// long form (`"Scheme A"`). Unknown values are an input error.
    ///
    /// # Arguments
    ///
    /// * `raw` - The raw scheme string from the input document
    ///
    /// # Returns
    ///
    /// The normalized Scheme, or a SchemeParseError for unknown values
    pub fn parse(raw: &str) -> Result<Self, SchemeParseError> {
        let trimmed = raw.trim();
        let letter = trimmed
            .strip_prefix("Scheme ")
            .or_else(|| trimmed.strip_prefix("scheme "))
            .or_else(|| trimmed.strip_prefix("SCHEME "))
            .unwrap_or(trimmed);

        match letter.to_ascii_uppercase().as_str() {
            "A" => Ok(Scheme::A),
            "B" => Ok(Scheme::B),
            "P" => Ok(Scheme::P),
            _ => Err(SchemeParseError {
                raw: raw.to_string(),
            }),
        }
    }

    /// Returns the daily gross-hour cap for this scheme
    ///
    /// # Returns
    ///
    /// The cap in hours: 14 for scheme A, 13 for B, 9 for P
    pub fn daily_gross_cap(&self) -> f64 {
        match self {
            Scheme::A => 14.0,
            Scheme::B => 13.0,
            Scheme::P => 9.0,
        }
    }

    /// Returns the weekly normal-hour cap for this scheme
    ///
    /// Scheme P differentiates by the number of work days in the pattern
    /// cycle: a 4-day pattern allows up to 34.98 normal hours per rolling
    /// week, 5-to-7-day patterns allow 29.98.
    ///
    /// # Arguments
    ///
    /// * `work_days_per_cycle` - Work days in the employee's pattern cycle
    ///
    /// # Returns
    ///
    /// The weekly normal-hour cap in hours
    pub fn weekly_normal_cap(&self, work_days_per_cycle: usize) -> f64 {
        match self {
            Scheme::A | Scheme::B => 44.0,
            Scheme::P => {
                if work_days_per_cycle <= 4 {
                    34.98
                } else {
                    29.98
                }
            }
        }
    }

    /// Returns the maximum number of shifts per day for this scheme
    ///
    /// Part-timers may hold two shifts per day with at least one hour
    /// between them; full-time schemes hold at most one.
    ///
    /// # Returns
    ///
    /// The maximum number of same-day shifts
    pub fn max_shifts_per_day(&self) -> usize {
        match self {
            Scheme::A | Scheme::B => 1,
            Scheme::P => 2,
        }
    }

    /// Minimum gap between two same-day shifts (scheme P only)
    ///
    /// # Returns
    ///
    /// The minimum gap in hours
    pub fn same_day_gap_hours(&self) -> f64 {
        1.0
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::A => write!(f, "A"),
            Scheme::B => write!(f, "B"),
            Scheme::P => write!(f, "P"),
        }
    }
}

/// Employee gender classification
///
/// `Any` is accepted on input for records that do not declare a gender and
/// satisfies both Male and Female requirement filters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "Any")]
    Any,
}

impl Gender {
    /// Parses a raw gender string
    ///
    /// Accepts single letters and full words in any case; an empty
    /// string reads as `Any`.
    ///
    /// # Arguments
    ///
    /// * `raw` - The raw gender string from the input document
    ///
    /// # Returns
    ///
    /// The parsed Gender, or None for unknown values
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "M" | "MALE" => Some(Gender::Male),
            "F" | "FEMALE" => Some(Gender::Female),
            "ANY" | "" => Some(Gender::Any),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "M"),
            Gender::Female => write!(f, "F"),
            Gender::Any => write!(f, "Any"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_long_and_short_forms() {
        assert_eq!(Scheme::parse("A").unwrap(), Scheme::A);
        assert_eq!(Scheme::parse("a").unwrap(), Scheme::A);
        assert_eq!(Scheme::parse("Scheme A").unwrap(), Scheme::A);
        assert_eq!(Scheme::parse("scheme b").unwrap(), Scheme::B);
        assert_eq!(Scheme::parse(" P ").unwrap(), Scheme::P);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = Scheme::parse("Scheme X").unwrap_err();
        assert_eq!(err.raw, "Scheme X");
    }

    #[test]
    fn test_daily_caps() {
        assert_eq!(Scheme::A.daily_gross_cap(), 14.0);
        assert_eq!(Scheme::B.daily_gross_cap(), 13.0);
        assert_eq!(Scheme::P.daily_gross_cap(), 9.0);
    }

    #[test]
    fn test_part_time_weekly_cap_depends_on_cycle() {
        assert_eq!(Scheme::P.weekly_normal_cap(4), 34.98);
        assert_eq!(Scheme::P.weekly_normal_cap(5), 29.98);
        assert_eq!(Scheme::P.weekly_normal_cap(7), 29.98);
        assert_eq!(Scheme::A.weekly_normal_cap(5), 44.0);
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!(Gender::parse("M"), Some(Gender::Male));
        assert_eq!(Gender::parse("female"), Some(Gender::Female));
        assert_eq!(Gender::parse(""), Some(Gender::Any));
        assert_eq!(Gender::parse("x"), None);
    }
}
