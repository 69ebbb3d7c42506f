//! Hour-accounting post-processor service module
//!
//! Two passes over the assignment rows. Pass one computes the
//! per-assignment breakdown in chronological order, threading each
//! employee's cumulative weekly and monthly normal hours through the
//! policy formulas. Pass two enforces the monthly overtime cap per
//! (employee, calendar month) by proportionally shifting overtime back
//! into normal hours, preserving the total worked time. The whole
//! process recomputes from gross hours, so re-running it on processed
//! rows changes nothing.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::application::services::constraint_resolver::ConstraintResolver;
use crate::application::services::constraints::EmployeeRecord;
use crate::application::services::hour_calculator::{HourParams, HourPolicy, HourState};
use crate::domain::entities::horizon::days_in_month;
use crate::domain::entities::{Assignment, PlanningHorizon};
use crate::domain::value_objects::hour_breakdown::HOUR_EPSILON;

/// The hour-accounting post-processor
pub struct HourAccountant<'a> {
    resolver: &'a ConstraintResolver,
}

impl<'a> HourAccountant<'a> {
    pub fn new(resolver: &'a ConstraintResolver) -> Self {
        Self { resolver }
    }

    /// Runs both accounting passes over the assignment rows
    ///
    /// # Arguments
    ///
    /// * `assignments` - All rows of the run; only ASSIGNED rows change
    /// * `records` - The rostered employees with their resolved limits
    /// * `horizon` - The planning horizon anchoring the weekly windows
    pub fn process(
        &self,
        assignments: &mut [Assignment],
        records: &[EmployeeRecord],
        horizon: &PlanningHorizon,
    ) {
        let by_id: BTreeMap<&str, &EmployeeRecord> = records
            .iter()
            .map(|record| (record.employee.id.as_str(), record))
            .collect();
        self.compute_breakdowns(assignments, &by_id, horizon);
        self.enforce_monthly_caps(assignments, &by_id);
    }

    /// Pass one: per-assignment breakdown in chronological order
    fn compute_breakdowns(
        &self,
        assignments: &mut [Assignment],
        records: &BTreeMap<&str, &EmployeeRecord>,
        horizon: &PlanningHorizon,
    ) {
        // Chronological row indices per employee.
        let mut per_employee: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, row) in assignments.iter().enumerate() {
            if !row.is_assigned() {
                continue;
            }
            if let Some(employee_id) = &row.employee_id {
                per_employee.entry(employee_id.clone()).or_default().push(idx);
            }
        }

        for (employee_id, mut rows) in per_employee {
            let Some(record) = records.get(employee_id.as_str()) else {
                continue;
            };
            rows.sort_by_key(|idx| (assignments[*idx].date, assignments[*idx].start_date_time));
            let policy = HourPolicy::select(&record.employee, self.resolver);
            let work_days_per_cycle = record
                .pattern
                .as_ref()
                .map(|(p, _)| p.work_days_per_cycle())
                .unwrap_or(5);

            let mut state = HourState::default();
            let mut week_index = -1i64;
            let mut current_month: Option<(i32, u32)> = None;
            let mut previous_date: Option<NaiveDate> = None;

            for idx in rows {
                let date = assignments[idx].date;
                let row_week = (date - horizon.start()).num_days() / 7;
                if row_week != week_index {
                    week_index = row_week;
                    state.cumulative_weekly_normal = 0.0;
                }
                let month = (date.year(), date.month());
                if current_month != Some(month) {
                    current_month = Some(month);
                    state.cumulative_monthly_normal = 0.0;
                }
                state.consecutive_day_index = match previous_date {
                    Some(prev) if prev == date => state.consecutive_day_index,
                    Some(prev) if prev.succ_opt() == Some(date) => {
                        state.consecutive_day_index + 1
                    }
                    _ => 1,
                };
                previous_date = Some(date);

                let month_len = days_in_month(month.0, month.1);
                let params = HourParams {
                    daily_gross_cap: record.limits.daily_gross_cap,
                    weekly_normal_cap: record.limits.weekly_normal_cap,
                    work_days_per_cycle,
                    monthly_contractual: self.resolver.monthly_contractual(month_len),
                    work_days_in_month: Self::expected_work_days(month_len, work_days_per_cycle, record),
                };
                let gross = shift_gross(&assignments[idx]);
                let breakdown = policy.hours(gross, &params, &state);
                state.cumulative_weekly_normal += breakdown.normal;
                state.cumulative_monthly_normal += breakdown.normal;
                assignments[idx].hours = breakdown;
            }
        }
    }

    /// Work days the pattern gives the employee in a month of the given
    /// length, for the daily contractual per-day rate
    fn expected_work_days(month_len: u32, work_days_per_cycle: usize, record: &EmployeeRecord) -> usize {
        let cycle_len = record
            .pattern
            .as_ref()
            .map(|(p, _)| p.cycle_len())
            .unwrap_or(7);
        ((month_len as f64) * work_days_per_cycle as f64 / cycle_len as f64).round() as usize
    }

    /// Pass two: proportional monthly overtime redistribution
    ///
    /// # Arguments
    ///
    /// * `assignments` - All rows of the run; over-cap months rewritten
    /// * `records` - Rostered employees keyed by id
    pub fn enforce_monthly_caps(
        &self,
        assignments: &mut [Assignment],
        records: &BTreeMap<&str, &EmployeeRecord>,
    ) {
        // (employee, year, month) → row indices.
        let mut months: BTreeMap<(String, i32, u32), Vec<usize>> = BTreeMap::new();
        for (idx, row) in assignments.iter().enumerate() {
            if !row.is_assigned() {
                continue;
            }
            if let Some(employee_id) = &row.employee_id {
                months
                    .entry((employee_id.clone(), row.date.year(), row.date.month()))
                    .or_default()
                    .push(idx);
            }
        }

        for ((employee_id, year, month), rows) in months {
            let Some(record) = records.get(employee_id.as_str()) else {
                continue;
            };
            let month_len = days_in_month(year, month);
            let cap = record
                .monthly_ot_caps
                .get(&(year, month))
                .copied()
                .unwrap_or_else(|| self.resolver.monthly_ot_cap(&record.employee, month_len));
            let total_ot: f64 = rows.iter().map(|idx| assignments[*idx].hours.ot).sum();
            if total_ot <= cap + HOUR_EPSILON {
                continue;
            }
            let factor = cap / total_ot;
            info!(
                employee = %employee_id,
                year,
                month,
                total_ot,
                cap,
                factor,
                "redistributing monthly overtime into normal hours"
            );
            for idx in rows {
                let hours = &mut assignments[idx].hours;
                let capped_ot = hours.ot * factor;
                hours.normal += hours.ot - capped_ot;
                hours.ot = capped_ot;
                hours.recompute_paid();
                debug_assert!(hours.is_consistent());
            }
            debug!(employee = %employee_id, "monthly cap enforced");
        }
    }
}

/// Gross hours from the row's datetime span
fn shift_gross(row: &Assignment) -> f64 {
    (row.end_date_time - row.start_date_time).num_minutes() as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Employee, Slot, WorkPattern};
    use crate::domain::value_objects::Scheme;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record_for(employee: Employee, pattern: &[&str]) -> EmployeeRecord {
        let resolver = ConstraintResolver::new(Default::default());
        let pattern = WorkPattern::from_codes(pattern).unwrap();
        let limits = resolver.limits_for(&employee, pattern.work_days_per_cycle());
        EmployeeRecord {
            limits,
            pattern: Some((pattern, date(2026, 3, 1))),
            strict_adherence_ratio: 1.0,
            monthly_ot_caps: BTreeMap::new(),
            employee,
        }
    }

    fn assigned_row(employee_id: &str, day: NaiveDate, start_hour: u32, hours: i64) -> Assignment {
        let slot = Slot::new("DM1", "R1", day, "D", 0);
        let start = day.and_hms_opt(start_hour, 0, 0).unwrap();
        Assignment::assigned(&slot, employee_id, start, start + Duration::hours(hours))
    }

    #[test]
    fn test_apgd_week_matches_expected_breakdown() {
        let resolver = ConstraintResolver::new(Default::default());
        let accountant = HourAccountant::new(&resolver);
        let record = record_for(
            Employee::new("E1", Scheme::A, "APO", "SGT", "OU1"),
            &["D", "D", "D", "D", "D", "O", "O"],
        );
        let horizon = PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 31));
        let mut rows: Vec<Assignment> = (1..=5)
            .map(|d| assigned_row("E1", date(2026, 3, d), 8, 12))
            .collect();
        accountant.process(&mut rows, std::slice::from_ref(&record), &horizon);

        for row in &rows {
            assert!((row.hours.gross - 12.0).abs() < 1e-6);
            assert!((row.hours.lunch - 1.0).abs() < 1e-6);
            assert!((row.hours.normal - 8.8).abs() < 1e-6, "normal {}", row.hours.normal);
            assert!((row.hours.ot - 2.2).abs() < 1e-6);
            assert!((row.hours.rest_day_pay).abs() < 1e-6);
        }
        let weekly_normal: f64 = rows.iter().map(|r| r.hours.normal).sum();
        let weekly_ot: f64 = rows.iter().map(|r| r.hours.ot).sum();
        assert!((weekly_normal - 44.0).abs() < 1e-6);
        assert!((weekly_ot - 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_sixth_consecutive_day_accrues_rest_day_pay() {
        let resolver = ConstraintResolver::new(Default::default());
        let accountant = HourAccountant::new(&resolver);
        let record = record_for(
            Employee::new("E1", Scheme::A, "APO", "SGT", "OU1"),
            &["D", "D", "D", "D", "D", "D", "O"],
        );
        let horizon = PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 31));
        let mut rows: Vec<Assignment> = (1..=6)
            .map(|d| assigned_row("E1", date(2026, 3, d), 8, 12))
            .collect();
        accountant.process(&mut rows, std::slice::from_ref(&record), &horizon);

        let sixth = &rows[5].hours;
        assert!((sixth.rest_day_pay - 8.0).abs() < 1e-6);
        assert!((sixth.normal).abs() < 1e-6);
        assert!((sixth.ot - 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_monthly_ot_redistribution_preserves_paid() {
        let resolver = ConstraintResolver::new(Default::default());
        let accountant = HourAccountant::new(&resolver);
        let record = record_for(
            Employee::new("E1", Scheme::A, "SO", "SGT", "OU1"),
            &["D", "D", "D", "D", "D", "O", "O"],
        );
        let by_id: BTreeMap<&str, &EmployeeRecord> =
            [("E1", &record)].into_iter().collect();

        // Thirty rows with 3 h OT each: 90 h against the 72 h cap.
        let mut rows: Vec<Assignment> = (0..30)
            .map(|i| {
                let day = date(2026, 3, 1) + Duration::days(i % 28);
                let mut row = assigned_row("E1", day, 8, 12);
                row.hours = crate::domain::value_objects::HourBreakdown::new(
                    12.0, 1.0, 8.0, 3.0, 0.0,
                );
                row
            })
            .collect();
        let paid_before: f64 = rows.iter().map(|r| r.hours.paid).sum();

        accountant.enforce_monthly_caps(&mut rows, &by_id);

        for row in &rows {
            assert!((row.hours.ot - 2.4).abs() < 1e-6);
            assert!((row.hours.normal - 8.6).abs() < 1e-6);
            assert!(row.hours.is_consistent());
        }
        let total_ot: f64 = rows.iter().map(|r| r.hours.ot).sum();
        let paid_after: f64 = rows.iter().map(|r| r.hours.paid).sum();
        assert!((total_ot - 72.0).abs() < 1e-6);
        assert!((paid_before - paid_after).abs() < 1e-6);
    }

    #[test]
    fn test_processing_is_idempotent() {
        let resolver = ConstraintResolver::new(Default::default());
        let accountant = HourAccountant::new(&resolver);
        let record = record_for(
            Employee::new("E1", Scheme::A, "APO", "SGT", "OU1"),
            &["D", "D", "D", "D", "D", "O", "O"],
        );
        let horizon = PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 31));
        let mut rows: Vec<Assignment> = (1..=12)
            .map(|d| assigned_row("E1", date(2026, 3, d), 8, 12))
            .collect();

        accountant.process(&mut rows, std::slice::from_ref(&record), &horizon);
        let first = rows.clone();
        accountant.process(&mut rows, std::slice::from_ref(&record), &horizon);
        assert_eq!(first, rows);
    }

    #[test]
    fn test_months_capped_independently() {
        let resolver = ConstraintResolver::new(Default::default());
        let accountant = HourAccountant::new(&resolver);
        let record = record_for(
            Employee::new("E1", Scheme::A, "SO", "SGT", "OU1"),
            &["D", "D", "D", "D", "D", "O", "O"],
        );
        let by_id: BTreeMap<&str, &EmployeeRecord> =
            [("E1", &record)].into_iter().collect();

        // March over cap, April under it.
        let mut rows = Vec::new();
        for i in 0..25 {
            let mut row = assigned_row("E1", date(2026, 3, 1) + Duration::days(i), 8, 12);
            row.hours =
                crate::domain::value_objects::HourBreakdown::new(12.0, 1.0, 7.0, 4.0, 0.0);
            rows.push(row);
        }
        let mut april = assigned_row("E1", date(2026, 4, 2), 8, 12);
        april.hours = crate::domain::value_objects::HourBreakdown::new(12.0, 1.0, 8.0, 3.0, 0.0);
        rows.push(april);

        accountant.enforce_monthly_caps(&mut rows, &by_id);

        let march_ot: f64 = rows[..25].iter().map(|r| r.hours.ot).sum();
        assert!((march_ot - 72.0).abs() < 1e-6);
        // April untouched.
        assert!((rows[25].hours.ot - 3.0).abs() < 1e-6);
    }
}
