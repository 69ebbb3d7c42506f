//! Constraint configuration resolver service module
//!
//! This service resolves the effective numeric limit of each constraint
//! for a given employee: the catalog record's default value, refined by
//! per-scheme overrides (scalar, or an ordered first-match rule list
//! filtered by product type and rank), falling back to built-in
//! labour-law defaults when the catalog is silent. Monthly hour limits
//! are keyed additionally by calendar month length.

use crate::domain::entities::{ConstraintCatalog, ConstraintId, OtCalculationMethod, SchemeOverride};
use crate::domain::entities::Employee;
use crate::domain::value_objects::Scheme;

/// Standard monthly overtime cap in hours.
pub const STANDARD_MONTHLY_OT_CAP: f64 = 72.0;

/// Monthly overtime cap for APGD-D10 employees in a 31-day month.
pub const APGD_D10_MONTHLY_OT_CAP_31: f64 = 124.0;

/// Standard minimum inter-shift rest in hours.
pub const STANDARD_REST_HOURS: f64 = 11.0;

/// Minimum inter-shift rest for APGD-D10 employees.
pub const APGD_D10_REST_HOURS: f64 = 8.0;

/// Standard consecutive working day limit.
pub const STANDARD_CONSECUTIVE_LIMIT: f64 = 12.0;

/// Consecutive working day limit for APGD-D10 employees (one worked
/// off-day included).
pub const APGD_D10_CONSECUTIVE_LIMIT: f64 = 8.0;

/// Effective per-employee limits, resolved once per employee
///
/// The solve engine and the replication validator read these instead of
/// calling back into the resolver, so override lookup stays in one place.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeLimits {
    pub daily_gross_cap: f64,
    pub weekly_normal_cap: f64,
    pub consecutive_day_limit: usize,
    pub rest_hours: f64,
    pub min_off_days_per_week: usize,
    pub max_shifts_per_day: usize,
    pub apgd_d10: bool,
}

/// Service resolving effective constraint values per employee
pub struct ConstraintResolver {
    catalog: ConstraintCatalog,
}

impl ConstraintResolver {
    /// Creates a resolver over the run's constraint catalog
    ///
    /// # Arguments
    ///
    /// * `catalog` - The labour-law rule configuration of the run
    ///
    /// # Returns
    ///
    /// A new ConstraintResolver
    pub fn new(catalog: ConstraintCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ConstraintCatalog {
        &self.catalog
    }

    /// Resolves the effective value of a constraint for an employee
    ///
    /// Lookup is deterministic: the catalog record's scheme override wins
    /// (scalar, or the first matching rule of an ordered list), then the
    /// record's default value, then the built-in labour-law default.
    ///
    /// # Arguments
    ///
    /// * `id` - The constraint to resolve
    /// * `employee` - The employee whose scheme, product type and rank
    ///   select the override
    ///
    /// # Returns
    ///
    /// The effective numeric limit for this employee
    pub fn resolve(&self, id: ConstraintId, employee: &Employee) -> f64 {
        if let Some(record) = self.catalog.record(id) {
            if let Some(override_spec) = record.scheme_overrides.get(&employee.scheme) {
                match override_spec {
                    SchemeOverride::Scalar(value) => return *value,
                    SchemeOverride::Rules(rules) => {
                        for rule in rules {
                            if rule.matches(&employee.product_type, &employee.rank) {
                                return rule.value;
                            }
                        }
                    }
                }
            }
            return record.default_value;
        }
        self.builtin_default(id, employee)
    }

    fn builtin_default(&self, id: ConstraintId, employee: &Employee) -> f64 {
        let apgd = employee.is_apgd_d10();
        match id {
            ConstraintId::C1 => employee.scheme.daily_gross_cap(),
            ConstraintId::C2 => 44.0,
            ConstraintId::C3 => {
                if apgd {
                    APGD_D10_CONSECUTIVE_LIMIT
                } else {
                    STANDARD_CONSECUTIVE_LIMIT
                }
            }
            ConstraintId::C4 => {
                if apgd {
                    APGD_D10_REST_HOURS
                } else {
                    STANDARD_REST_HOURS
                }
            }
            ConstraintId::C5 => 1.0,
            ConstraintId::C6 => Scheme::P.weekly_normal_cap(5),
            ConstraintId::C16 => employee.scheme.max_shifts_per_day() as f64,
            ConstraintId::C17 => STANDARD_MONTHLY_OT_CAP,
            // Eligibility rules carry no numeric limit; 1.0 reads as "on".
            _ => 1.0,
        }
    }

    /// Resolves the full per-employee limit set in one pass
    ///
    /// # Arguments
    ///
    /// * `employee` - The employee to resolve for
    /// * `work_days_per_cycle` - Work days in the employee's pattern cycle,
    ///   used for the scheme-P weekly cap variant
    ///
    /// # Returns
    ///
    /// The full resolved limit set for the employee
    pub fn limits_for(&self, employee: &Employee, work_days_per_cycle: usize) -> EmployeeLimits {
        let apgd = employee.is_apgd_d10();
        let weekly_normal_cap = if employee.scheme == Scheme::P {
            self.part_timer_weekly_cap(employee, work_days_per_cycle)
        } else {
            self.resolve(ConstraintId::C2, employee)
        };
        EmployeeLimits {
            daily_gross_cap: self.resolve(ConstraintId::C1, employee),
            weekly_normal_cap,
            consecutive_day_limit: self.resolve(ConstraintId::C3, employee).round() as usize,
            rest_hours: self.resolve(ConstraintId::C4, employee),
            min_off_days_per_week: self.resolve(ConstraintId::C5, employee).round() as usize,
            max_shifts_per_day: self.resolve(ConstraintId::C16, employee).round() as usize,
            apgd_d10: apgd,
        }
    }

    /// Scheme-P weekly normal cap, honouring a C6 catalog override
    ///
    /// # Arguments
    ///
    /// * `employee` - The part-time employee to resolve for
    /// * `work_days_per_cycle` - Work days in the employee's pattern cycle
    ///
    /// # Returns
    ///
    /// The weekly normal-hour cap in hours
    pub fn part_timer_weekly_cap(&self, employee: &Employee, work_days_per_cycle: usize) -> f64 {
        match self.catalog.record(ConstraintId::C6) {
            Some(_) => self.resolve(ConstraintId::C6, employee),
            None => Scheme::P.weekly_normal_cap(work_days_per_cycle),
        }
    }

    /// Monthly overtime cap for an employee in a month of the given length
    ///
    /// Catalog limits keyed by month length win; the fallback is 72 h
    /// standard and 124 h for APGD-D10 employees in a 31-day month.
    ///
    /// # Arguments
    ///
    /// * `employee` - The employee to resolve for
    /// * `month_len` - Days in the calendar month (28-31)
    ///
    /// # Returns
    ///
    /// The monthly overtime cap in hours
    pub fn monthly_ot_cap(&self, employee: &Employee, month_len: u32) -> f64 {
        let limits = &self.catalog.monthly_hour_limits;
        if employee.is_apgd_d10() {
            if let Some(cap) = limits.apgd_d10_ot_cap.get(&month_len) {
                return *cap;
            }
            if month_len == 31 {
                return APGD_D10_MONTHLY_OT_CAP_31;
            }
        }
        if let Some(cap) = limits.ot_cap.get(&month_len) {
            return *cap;
        }
        match self.catalog.record(ConstraintId::C17) {
            Some(_) => self.resolve(ConstraintId::C17, employee),
            None => STANDARD_MONTHLY_OT_CAP,
        }
    }

    /// Minimum contractual normal hours for a month of the given length
    ///
    /// Falls back to 44 h × weeks in the month when the catalog carries no
    /// limit for the length.
    ///
    /// # Arguments
    ///
    /// * `month_len` - Days in the calendar month (28-31)
    ///
    /// # Returns
    ///
    /// The minimum contractual normal hours for the month
    pub fn monthly_contractual(&self, month_len: u32) -> f64 {
        if let Some(hours) = self.catalog.monthly_hour_limits.contractual.get(&month_len) {
            return *hours;
        }
        44.0 * month_len as f64 / 7.0
    }

    /// Whether scheme-B SO hours follow the daily contractual split
    ///
    /// # Returns
    ///
    /// `true` when the catalog sets `calculationMethod: daily`
    pub fn uses_daily_contractual(&self) -> bool {
        self.catalog.monthly_hour_limits.calculation_method == OtCalculationMethod::Daily
    }
}
