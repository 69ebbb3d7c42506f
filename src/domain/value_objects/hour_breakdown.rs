//! Hour breakdown value object module
//!
//! This module defines the per-assignment hour accounting record: gross,
//! lunch, normal, overtime, rest-day pay and paid hours.

use serde::{Deserialize, Serialize};

/// Tolerance for floating-point hour comparisons.
pub const HOUR_EPSILON: f64 = 1e-6;

/// Hours credited for one accrued rest-day-pay unit.
pub const REST_DAY_PAY_HOURS: f64 = 8.0;

/// Per-assignment hour breakdown
///
/// All fields are non-negative hours. Two identities hold for every
/// assignment: `gross = lunch + normal + ot` and
/// `paid = normal + ot + rest_day_pay`. Rest-day pay is stored in hours
/// (8 hours per accrued unit).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HourBreakdown {
    pub gross: f64,
    pub lunch: f64,
    pub normal: f64,
    pub ot: f64,
    pub rest_day_pay: f64,
    pub paid: f64,
}

impl HourBreakdown {
    /// Creates a breakdown from its components, deriving the paid total
    ///
    /// # Arguments
    ///
    /// * `gross` - Gross shift hours
    /// * `lunch` - Lunch deduction in hours
    /// * `normal` - Normal hours
    /// * `ot` - Overtime hours
    /// * `rest_day_pay` - Rest-day pay in hours (8 per accrued unit)
    ///
    /// # Returns
    ///
    /// A new HourBreakdown with `paid = normal + ot + rest_day_pay`
    pub fn new(gross: f64, lunch: f64, normal: f64, ot: f64, rest_day_pay: f64) -> Self {
        Self {
            gross,
            lunch,
            normal,
            ot,
            rest_day_pay,
            paid: normal + ot + rest_day_pay,
        }
    }

    /// An all-zero breakdown, used for UNASSIGNED and OFF_DAY rows
    pub fn zero() -> Self {
        Self::default()
    }

    /// Recomputes the paid total from normal, overtime and rest-day pay
    pub fn recompute_paid(&mut self) {
        self.paid = self.normal + self.ot + self.rest_day_pay;
    }

    /// Checks both accounting identities within floating-point tolerance
    ///
    /// # Returns
    ///
    /// `true` when `gross = lunch + normal + ot`,
    /// `paid = normal + ot + rest_day_pay` and no field is negative
    pub fn is_consistent(&self) -> bool {
        let gross_ok = (self.gross - (self.lunch + self.normal + self.ot)).abs() < HOUR_EPSILON;
        let paid_ok = (self.paid - (self.normal + self.ot + self.rest_day_pay)).abs() < HOUR_EPSILON;
        let non_negative = self.gross >= 0.0
            && self.lunch >= 0.0
            && self.normal >= 0.0
            && self.ot >= 0.0
            && self.rest_day_pay >= 0.0
            && self.paid >= 0.0;
        gross_ok && paid_ok && non_negative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_paid() {
        let hours = HourBreakdown::new(12.0, 1.0, 8.8, 2.2, 0.0);
        assert!((hours.paid - 11.0).abs() < HOUR_EPSILON);
        assert!(hours.is_consistent());
    }

    #[test]
    fn test_rest_day_pay_counts_into_paid() {
        let hours = HourBreakdown::new(12.0, 1.0, 0.0, 11.0, REST_DAY_PAY_HOURS);
        assert!((hours.paid - 19.0).abs() < HOUR_EPSILON);
        assert!(hours.is_consistent());
    }

    #[test]
    fn test_zero_is_consistent() {
        assert!(HourBreakdown::zero().is_consistent());
    }

    #[test]
    fn test_inconsistent_breakdown_detected() {
        let mut hours = HourBreakdown::new(12.0, 1.0, 8.8, 2.2, 0.0);
        hours.gross = 10.0;
        assert!(!hours.is_consistent());
    }
}
