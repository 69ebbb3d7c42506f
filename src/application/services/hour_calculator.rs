//! Hour calculation service module
//!
//! Scheme- and product-aware hour-splitting formulas. Every ASSIGNED row
//! is routed through exactly one policy, selected once per employee:
//! MOM accounting, the APGD-D10 exemption, or scheme-B SO daily
//! contractual accounting. All formulas share the lunch rule: a shift of
//! 8 or more gross hours deducts exactly one hour of lunch before the
//! normal/overtime split.

use serde::{Deserialize, Serialize};

use crate::application::services::constraint_resolver::ConstraintResolver;
use crate::domain::entities::Employee;
use crate::domain::value_objects::hour_breakdown::{HourBreakdown, REST_DAY_PAY_HOURS};
use crate::domain::value_objects::Scheme;

/// Gross hours at and above which the mandatory lunch hour is deducted.
pub const LUNCH_THRESHOLD_HOURS: f64 = 8.0;

/// Lunch deduction in hours.
pub const LUNCH_HOURS: f64 = 1.0;

/// Product type using daily contractual accounting under scheme B.
pub const SO_PRODUCT_TYPE: &str = "SO";

/// Hour-splitting policy, selected once per employee
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HourPolicy {
    /// Standard MOM accounting with pattern-derived daily normal cap
    Mom,
    /// APGD-D10 exemption with rest-day-pay accrual on the 6th/7th
    /// consecutive work day
    ApgdD10,
    /// Scheme-B SO accounting: normal hours follow the monthly
    /// contractual minimum spread over the month's work days
    DailyContractual,
}

impl HourPolicy {
    /// Selects the policy for an employee
    ///
    /// # Arguments
    ///
    /// * `employee` - The employee to route
    /// * `resolver` - Resolver carrying the monthly-limit configuration
    ///
    /// # Returns
    ///
    /// The policy every one of the employee's assignments routes through
    pub fn select(employee: &Employee, resolver: &ConstraintResolver) -> Self {
        if employee.is_apgd_d10() {
            HourPolicy::ApgdD10
        } else if employee.scheme == Scheme::B
            && employee.product_type == SO_PRODUCT_TYPE
            && resolver.uses_daily_contractual()
        {
            HourPolicy::DailyContractual
        } else {
            HourPolicy::Mom
        }
    }

    /// Computes the breakdown for one assignment under this policy
    ///
    /// # Arguments
    ///
    /// * `gross` - Gross shift hours
    /// * `params` - Per-employee parameters for the current month
    /// * `state` - Running accounting state, threaded chronologically
    ///
    /// # Returns
    ///
    /// The six-field hour breakdown of the assignment
    pub fn hours(&self, gross: f64, params: &HourParams, state: &HourState) -> HourBreakdown {
        match self {
            HourPolicy::Mom => calculate_mom_hours(
                gross,
                params.daily_gross_cap,
                params.work_days_per_cycle,
                state.cumulative_weekly_normal,
                params.weekly_normal_cap,
            ),
            HourPolicy::ApgdD10 => calculate_apgd_d10_hours(
                gross,
                params.daily_gross_cap,
                params.work_days_per_cycle,
                state.consecutive_day_index,
                state.cumulative_monthly_normal,
                params.monthly_contractual,
            ),
            HourPolicy::DailyContractual => calculate_daily_contractual_hours(
                gross,
                state.cumulative_monthly_normal,
                params.monthly_contractual,
                params.work_days_in_month,
            ),
        }
    }
}

/// Per-employee parameters shared by all assignments in a month
#[derive(Debug, Clone, PartialEq)]
pub struct HourParams {
    pub daily_gross_cap: f64,
    pub weekly_normal_cap: f64,
    pub work_days_per_cycle: usize,
    pub monthly_contractual: f64,
    pub work_days_in_month: usize,
}

/// Running per-employee accounting state, threaded chronologically
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HourState {
    /// Normal hours accrued in the current 7-day window
    pub cumulative_weekly_normal: f64,
    /// Normal hours accrued in the current calendar month
    pub cumulative_monthly_normal: f64,
    /// 1-based index of the current consecutive work-day run
    pub consecutive_day_index: usize,
}

/// Lunch deduction for a shift of the given gross hours
///
/// # Arguments
///
/// * `gross` - Gross shift hours
///
/// # Returns
///
/// One hour at and above the 8 h threshold, zero below it
pub fn lunch_for(gross: f64) -> f64 {
    if gross >= LUNCH_THRESHOLD_HOURS {
        LUNCH_HOURS
    } else {
        0.0
    }
}

/// Per-day normal cap derived from the active work pattern
///
/// For a pattern with `w` work days per cycle the cap is
/// `min(44 / w, daily_scheme_cap - 1)`; the minus one reflects the
/// mandatory lunch hour of a full-length shift.
///
/// # Arguments
///
/// * `daily_gross_cap` - The scheme's daily gross-hour cap
/// * `work_days_per_cycle` - Work days in the active pattern cycle
///
/// # Returns
///
/// The daily normal-hour cap
pub fn per_day_normal_cap(daily_gross_cap: f64, work_days_per_cycle: usize) -> f64 {
    let from_pattern = 44.0 / work_days_per_cycle.max(1) as f64;
    from_pattern.min(daily_gross_cap - LUNCH_HOURS)
}

/// Standard MOM breakdown
///
/// Net hours after lunch fill normal up to the pattern-derived daily cap
/// and the remaining weekly allowance; the remainder is overtime.
///
/// # Arguments
///
/// * `gross` - Gross shift hours
/// * `daily_gross_cap` - The scheme's daily gross-hour cap
/// * `work_days_per_cycle` - Work days in the active pattern cycle
/// * `cumulative_weekly_normal` - Normal hours already accrued this week
/// * `weekly_normal_cap` - The scheme's weekly normal-hour cap
///
/// # Returns
///
/// The six-field hour breakdown of the assignment
pub fn calculate_mom_hours(
    gross: f64,
    daily_gross_cap: f64,
    work_days_per_cycle: usize,
    cumulative_weekly_normal: f64,
    weekly_normal_cap: f64,
) -> HourBreakdown {
    let lunch = lunch_for(gross);
    let net = (gross - lunch).max(0.0);
    let day_cap = per_day_normal_cap(daily_gross_cap, work_days_per_cycle);
    let weekly_remaining = (weekly_normal_cap - cumulative_weekly_normal).max(0.0);
    let normal = net.min(day_cap).min(weekly_remaining);
    let ot = net - normal;
    HourBreakdown::new(gross, lunch, normal, ot, 0.0)
}

/// APGD-D10 breakdown
///
/// Days 1-5 of a consecutive run follow MOM accounting, clamped against
/// the monthly contractual allowance instead of the weekly cap (the
/// weekly 44 h cap does not bind APGD-D10). The 6th consecutive work day
/// accrues one rest-day-pay unit (8 h) with zero normal hours, the 7th
/// accrues two; net hours on those days are all overtime.
///
/// # Arguments
///
/// * `gross` - Gross shift hours
/// * `daily_gross_cap` - The scheme's daily gross-hour cap
/// * `work_days_per_cycle` - Work days in the active pattern cycle
/// * `consecutive_day_index` - 1-based index in the consecutive run
/// * `cumulative_monthly_normal` - Normal hours accrued this month
/// * `monthly_contractual` - Monthly contractual normal-hour allowance
///
/// # Returns
///
/// The six-field hour breakdown of the assignment
pub fn calculate_apgd_d10_hours(
    gross: f64,
    daily_gross_cap: f64,
    work_days_per_cycle: usize,
    consecutive_day_index: usize,
    cumulative_monthly_normal: f64,
    monthly_contractual: f64,
) -> HourBreakdown {
    let lunch = lunch_for(gross);
    let net = (gross - lunch).max(0.0);
    match consecutive_day_index {
        0..=5 => {
            let day_cap = per_day_normal_cap(daily_gross_cap, work_days_per_cycle);
            let monthly_remaining = (monthly_contractual - cumulative_monthly_normal).max(0.0);
            let normal = net.min(day_cap).min(monthly_remaining);
            let ot = net - normal;
            HourBreakdown::new(gross, lunch, normal, ot, 0.0)
        }
        6 => HourBreakdown::new(gross, lunch, 0.0, net, REST_DAY_PAY_HOURS),
        _ => HourBreakdown::new(gross, lunch, 0.0, net, 2.0 * REST_DAY_PAY_HOURS),
    }
}

/// Scheme-B SO daily contractual breakdown
///
/// Normal hours per day equal the monthly contractual minimum divided by
/// the month's work days; the excess is overtime. Once the cumulative
/// monthly normal reaches the contractual minimum, entire net hours
/// become overtime.
///
/// # Arguments
///
/// * `gross` - Gross shift hours
/// * `cumulative_monthly_normal` - Normal hours accrued this month
/// * `minimum_contractual` - Monthly contractual minimum in hours
/// * `work_days_in_month` - Work days the pattern gives in the month
///
/// # Returns
///
/// The six-field hour breakdown of the assignment
pub fn calculate_daily_contractual_hours(
    gross: f64,
    cumulative_monthly_normal: f64,
    minimum_contractual: f64,
    work_days_in_month: usize,
) -> HourBreakdown {
    let lunch = lunch_for(gross);
    let net = (gross - lunch).max(0.0);
    if cumulative_monthly_normal >= minimum_contractual {
        return HourBreakdown::new(gross, lunch, 0.0, net, 0.0);
    }
    let per_day = minimum_contractual / work_days_in_month.max(1) as f64;
    let monthly_remaining = minimum_contractual - cumulative_monthly_normal;
    let normal = net.min(per_day).min(monthly_remaining);
    let ot = net - normal;
    HourBreakdown::new(gross, lunch, normal, ot, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ConstraintCatalog;
    use crate::domain::value_objects::hour_breakdown::HOUR_EPSILON;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < HOUR_EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_lunch_threshold() {
        assert_eq!(lunch_for(7.99), 0.0);
        assert_eq!(lunch_for(8.0), 1.0);
        assert_eq!(lunch_for(12.0), 1.0);
    }

    #[test]
    fn test_per_day_normal_cap_five_day_pattern() {
        // 44 / 5 = 8.8 is below the scheme-A net cap of 13.
        assert_close(per_day_normal_cap(14.0, 5), 8.8);
        // A short cycle pushes the pattern cap above the scheme net cap.
        assert_close(per_day_normal_cap(14.0, 3), 13.0);
    }

    #[test]
    fn test_mom_twelve_hour_day_shift() {
        let hours = calculate_mom_hours(12.0, 14.0, 5, 0.0, 44.0);
        assert_close(hours.gross, 12.0);
        assert_close(hours.lunch, 1.0);
        assert_close(hours.normal, 8.8);
        assert_close(hours.ot, 2.2);
        assert_close(hours.rest_day_pay, 0.0);
        assert!(hours.is_consistent());
    }

    #[test]
    fn test_mom_weekly_allowance_tips_to_ot() {
        // 43.0 of 44.0 already accrued: only one normal hour left.
        let hours = calculate_mom_hours(12.0, 14.0, 5, 43.0, 44.0);
        assert_close(hours.normal, 1.0);
        assert_close(hours.ot, 10.0);
    }

    #[test]
    fn test_apgd_five_consecutive_days_match_mom() {
        let mut weekly_normal = 0.0;
        let mut weekly_ot = 0.0;
        for day in 1..=5 {
            let hours = calculate_apgd_d10_hours(12.0, 14.0, 5, day, weekly_normal, 44.0 * 31.0 / 7.0);
            assert_close(hours.normal, 8.8);
            assert_close(hours.ot, 2.2);
            weekly_normal += hours.normal;
            weekly_ot += hours.ot;
        }
        assert_close(weekly_normal, 44.0);
        assert_close(weekly_ot, 11.0);
    }

    #[test]
    fn test_apgd_sixth_and_seventh_day_accrue_rest_day_pay() {
        let sixth = calculate_apgd_d10_hours(12.0, 14.0, 5, 6, 44.0, 200.0);
        assert_close(sixth.normal, 0.0);
        assert_close(sixth.ot, 11.0);
        assert_close(sixth.rest_day_pay, 8.0);
        assert_close(sixth.paid, 19.0);

        let seventh = calculate_apgd_d10_hours(12.0, 14.0, 5, 7, 44.0, 200.0);
        assert_close(seventh.rest_day_pay, 16.0);
        assert!(seventh.is_consistent());
    }

    #[test]
    fn test_daily_contractual_splits_at_per_day_rate() {
        // 176 contractual hours over 22 work days: 8 normal per day.
        let hours = calculate_daily_contractual_hours(12.0, 0.0, 176.0, 22);
        assert_close(hours.normal, 8.0);
        assert_close(hours.ot, 3.0);
    }

    #[test]
    fn test_daily_contractual_all_ot_once_minimum_met() {
        let hours = calculate_daily_contractual_hours(12.0, 176.0, 176.0, 22);
        assert_close(hours.normal, 0.0);
        assert_close(hours.ot, 11.0);
    }

    #[test]
    fn test_policy_selection() {
        let resolver = ConstraintResolver::new(ConstraintCatalog::default());
        let apgd = Employee::new("E1", Scheme::A, "APO", "SGT", "OU1");
        assert_eq!(HourPolicy::select(&apgd, &resolver), HourPolicy::ApgdD10);

        // Daily contractual needs the catalog to ask for it.
        let so = Employee::new("E2", Scheme::B, "SO", "SGT", "OU1");
        assert_eq!(HourPolicy::select(&so, &resolver), HourPolicy::Mom);

        let mut catalog = ConstraintCatalog::default();
        catalog.monthly_hour_limits.calculation_method =
            crate::domain::entities::OtCalculationMethod::Daily;
        let daily_resolver = ConstraintResolver::new(catalog);
        assert_eq!(
            HourPolicy::select(&so, &daily_resolver),
            HourPolicy::DailyContractual
        );
    }

    proptest! {
        /// The two accounting identities hold for any shift length and
        /// accrued state under every policy.
        #[test]
        fn prop_breakdowns_are_consistent(
            gross in 0.0f64..16.0,
            accrued in 0.0f64..60.0,
            day_index in 1usize..9,
        ) {
            let mom = calculate_mom_hours(gross, 14.0, 5, accrued, 44.0);
            prop_assert!(mom.is_consistent());

            let apgd = calculate_apgd_d10_hours(gross, 14.0, 5, day_index, accrued, 194.857);
            prop_assert!(apgd.is_consistent());

            let daily = calculate_daily_contractual_hours(gross, accrued, 176.0, 22);
            prop_assert!(daily.is_consistent());
        }

        /// Normal never exceeds net hours and overtime is never negative.
        #[test]
        fn prop_normal_bounded_by_net(gross in 0.0f64..16.0, accrued in 0.0f64..60.0) {
            let hours = calculate_mom_hours(gross, 14.0, 5, accrued, 44.0);
            let net = gross - hours.lunch;
            prop_assert!(hours.normal <= net + 1e-9);
            prop_assert!(hours.ot >= -1e-9);
        }
    }
}
