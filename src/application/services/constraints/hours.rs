//! Hour-cap rules: C1 daily hours, C2 weekly normal, C6 part-timer
//! weekly, C17 monthly overtime guard.
//!
//! Weekly and monthly rules work on estimated normal hours (net hours
//! clamped at the pattern-derived daily cap); exact accounting is the
//! post-processor's job, these rules keep the search inside the caps.

use chrono::{Datelike, Duration, NaiveDate};
use serde_json::json;

use super::model::{DecisionModel, RosterState};
use super::{RosterRule, RuleViolation};
use crate::domain::entities::{ConstraintId, Enforcement};
use crate::domain::value_objects::Scheme;

/// Estimated normal hours the employee accrues on one date
fn day_estimated_normal(
    model: &DecisionModel,
    state: &RosterState,
    emp_idx: usize,
    date: NaiveDate,
    extra_net: f64,
) -> f64 {
    let net = state.net_hours_on(model, emp_idx, date) + extra_net;
    if net <= 0.0 {
        return 0.0;
    }
    model.employees[emp_idx].estimated_normal(net)
}

/// Estimated normal hours over the 7-day window starting at `start`
fn window_estimated_normal(
    model: &DecisionModel,
    state: &RosterState,
    emp_idx: usize,
    start: NaiveDate,
    extra_on: Option<(NaiveDate, f64)>,
) -> f64 {
    (0..7)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let extra = match extra_on {
                Some((extra_date, net)) if extra_date == date => net,
                _ => 0.0,
            };
            day_estimated_normal(model, state, emp_idx, date, extra)
        })
        .sum()
}

/// C1: net hours per (employee, date) within the scheme daily cap
pub struct DailyHoursRule {
    enforcement: Enforcement,
}

impl DailyHoursRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }
}

impl RosterRule for DailyHoursRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C1
    }

    fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    fn permits(
        &self,
        model: &DecisionModel,
        state: &RosterState,
        slot_idx: usize,
        emp_idx: usize,
    ) -> bool {
        let slot = &model.slots[slot_idx];
        let taken = state.net_hours_on(model, emp_idx, slot.slot.date);
        taken + slot.net_hours() <= model.employees[emp_idx].limits.daily_gross_cap + 1e-9
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (emp_idx, record) in model.employees.iter().enumerate() {
            for (date, _) in state.days_of(emp_idx) {
                let net = state.net_hours_on(model, emp_idx, date);
                if net > record.limits.daily_gross_cap + 1e-9 {
                    violations.push(RuleViolation {
                        constraint: ConstraintId::C1,
                        employee_id: Some(record.employee.id.clone()),
                        date: Some(date),
                        message: format!(
                            "employee {} works {:.1} h on {} over the {:.0} h daily cap",
                            record.employee.id, net, date, record.limits.daily_gross_cap
                        ),
                        payload: Some(json!({
                            "shiftHours": net,
                            "dailyCap": record.limits.daily_gross_cap,
                        })),
                    });
                }
            }
        }
        violations
    }

    fn screening_violation(
        &self,
        model: &DecisionModel,
        slot_idx: usize,
        emp_idx: usize,
    ) -> Option<RuleViolation> {
        let slot = &model.slots[slot_idx];
        let record = &model.employees[emp_idx];
        let net = slot.net_hours();
        Some(RuleViolation {
            constraint: ConstraintId::C1,
            employee_id: Some(record.employee.id.clone()),
            date: Some(slot.slot.date),
            message: format!(
                "shift {} ({:.0} h net) exceeds the {:.0} h daily cap of scheme {}",
                slot.slot.shift_code, net, record.limits.daily_gross_cap, record.employee.scheme
            ),
            payload: Some(json!({
                "shiftHours": net,
                "dailyCap": record.limits.daily_gross_cap,
            })),
        })
    }
}

/// C2: estimated normal hours within 44 per rolling 7-day window
/// (APGD-D10 exempt, scheme P governed by C6 instead)
pub struct WeeklyNormalRule {
    enforcement: Enforcement,
}

impl WeeklyNormalRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }

    fn applies_to(&self, model: &DecisionModel, emp_idx: usize) -> bool {
        let record = &model.employees[emp_idx];
        !record.limits.apgd_d10 && record.employee.scheme != Scheme::P
    }
}

impl RosterRule for WeeklyNormalRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C2
    }

    fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    fn permits(
        &self,
        model: &DecisionModel,
        state: &RosterState,
        slot_idx: usize,
        emp_idx: usize,
    ) -> bool {
        if !self.applies_to(model, emp_idx) {
            return true;
        }
        let slot = &model.slots[slot_idx];
        let cap = model.employees[emp_idx].limits.weekly_normal_cap;
        let date = slot.slot.date;
        for offset in 0..7 {
            let start = date - Duration::days(offset);
            if start < model.horizon.start() || start > model.horizon.end() {
                continue;
            }
            let total = window_estimated_normal(
                model,
                state,
                emp_idx,
                start,
                Some((date, slot.net_hours())),
            );
            if total > cap + 1e-9 {
                return false;
            }
        }
        true
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (emp_idx, record) in model.employees.iter().enumerate() {
            if !self.applies_to(model, emp_idx) {
                continue;
            }
            let cap = record.limits.weekly_normal_cap;
            for start in model.horizon.iter_dates() {
                let total = window_estimated_normal(model, state, emp_idx, start, None);
                if total > cap + 1e-9 {
                    violations.push(RuleViolation {
                        constraint: ConstraintId::C2,
                        employee_id: Some(record.employee.id.clone()),
                        date: Some(start),
                        message: format!(
                            "employee {} accrues {:.1} normal hours in the week of {} over the {:.0} h cap",
                            record.employee.id, total, start, cap
                        ),
                        payload: None,
                    });
                }
            }
        }
        violations
    }
}

/// C6: scheme-P weekly normal cap (34.98 h or 29.98 h by cycle shape)
pub struct PartTimerWeeklyRule {
    enforcement: Enforcement,
}

impl PartTimerWeeklyRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }
}

impl RosterRule for PartTimerWeeklyRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C6
    }

    fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    fn permits(
        &self,
        model: &DecisionModel,
        state: &RosterState,
        slot_idx: usize,
        emp_idx: usize,
    ) -> bool {
        let record = &model.employees[emp_idx];
        if record.employee.scheme != Scheme::P {
            return true;
        }
        let slot = &model.slots[slot_idx];
        let date = slot.slot.date;
        for offset in 0..7 {
            let start = date - Duration::days(offset);
            if start < model.horizon.start() || start > model.horizon.end() {
                continue;
            }
            let total = window_estimated_normal(
                model,
                state,
                emp_idx,
                start,
                Some((date, slot.net_hours())),
            );
            if total > record.limits.weekly_normal_cap + 1e-9 {
                return false;
            }
        }
        true
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (emp_idx, record) in model.employees.iter().enumerate() {
            if record.employee.scheme != Scheme::P {
                continue;
            }
            for start in model.horizon.iter_dates() {
                let total = window_estimated_normal(model, state, emp_idx, start, None);
                if total > record.limits.weekly_normal_cap + 1e-9 {
                    violations.push(RuleViolation {
                        constraint: ConstraintId::C6,
                        employee_id: Some(record.employee.id.clone()),
                        date: Some(start),
                        message: format!(
                            "part-timer {} accrues {:.2} normal hours in the week of {} over the {:.2} h cap",
                            record.employee.id, total, start, record.limits.weekly_normal_cap
                        ),
                        payload: None,
                    });
                }
            }
        }
        violations
    }
}

/// C17: estimated overtime per calendar month within the monthly cap
///
/// The exact cap is enforced after accounting by the post-processor;
/// this guard keeps the search from piling obviously over-cap overtime
/// onto one employee.
pub struct MonthlyOtGuardRule {
    enforcement: Enforcement,
}

impl MonthlyOtGuardRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }

    fn month_estimated_ot(
        model: &DecisionModel,
        state: &RosterState,
        emp_idx: usize,
        year: i32,
        month: u32,
        extra_on: Option<(NaiveDate, f64)>,
    ) -> f64 {
        let mut total = 0.0;
        let mut dates: Vec<NaiveDate> = state
            .work_dates(emp_idx)
            .filter(|d| d.year() == year && d.month() == month)
            .collect();
        if let Some((extra_date, _)) = extra_on {
            if extra_date.year() == year
                && extra_date.month() == month
                && !dates.contains(&extra_date)
            {
                dates.push(extra_date);
            }
        }
        for date in dates {
            let extra = match extra_on {
                Some((extra_date, net)) if extra_date == date => net,
                _ => 0.0,
            };
            let net = state.net_hours_on(model, emp_idx, date) + extra;
            let normal = day_estimated_normal(model, state, emp_idx, date, extra);
            total += (net - normal).max(0.0);
        }
        total
    }

    fn cap_for(model: &DecisionModel, emp_idx: usize, year: i32, month: u32) -> Option<f64> {
        model.employees[emp_idx]
            .monthly_ot_caps
            .get(&(year, month))
            .copied()
    }
}

impl RosterRule for MonthlyOtGuardRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C17
    }

    fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    fn permits(
        &self,
        model: &DecisionModel,
        state: &RosterState,
        slot_idx: usize,
        emp_idx: usize,
    ) -> bool {
        let slot = &model.slots[slot_idx];
        let date = slot.slot.date;
        let Some(cap) = Self::cap_for(model, emp_idx, date.year(), date.month()) else {
            return true;
        };
        let total = Self::month_estimated_ot(
            model,
            state,
            emp_idx,
            date.year(),
            date.month(),
            Some((date, slot.net_hours())),
        );
        total <= cap + 1e-9
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (emp_idx, record) in model.employees.iter().enumerate() {
            for (&(year, month), cap) in &record.monthly_ot_caps {
                let total = Self::month_estimated_ot(model, state, emp_idx, year, month, None);
                if total > cap + 1e-9 {
                    violations.push(RuleViolation {
                        constraint: ConstraintId::C17,
                        employee_id: Some(record.employee.id.clone()),
                        date: NaiveDate::from_ymd_opt(year, month, 1),
                        message: format!(
                            "employee {} accrues an estimated {:.1} OT hours in {}-{:02} over the {:.0} h cap",
                            record.employee.id, total, year, month, cap
                        ),
                        payload: None,
                    });
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_model;
    use super::*;
    use crate::domain::entities::Employee;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_hours_blocks_second_long_shift() {
        let model = test_model(
            (8, 20),
            &[date(2026, 3, 1), date(2026, 3, 1)],
            vec![Employee::new("E1", Scheme::A, "APO", "SGT", "OU1")],
        );
        let rule = DailyHoursRule::new(Enforcement::Hard);
        let mut state = RosterState::new(&model);
        assert!(rule.permits(&model, &state, 0, 0));
        state.assign(&model, 0, 0);
        // A second 11 h net shift the same day would breach the 14 h cap.
        assert!(!rule.permits(&model, &state, 1, 0));
    }

    #[test]
    fn test_weekly_normal_caps_rolling_window() {
        let dates: Vec<NaiveDate> = (1..=7).map(|d| date(2026, 3, d)).collect();
        let model = test_model(
            (8, 20),
            &dates,
            vec![Employee::new("E1", Scheme::B, "SO", "SGT", "OU1")],
        );
        let rule = WeeklyNormalRule::new(Enforcement::Hard);
        let mut state = RosterState::new(&model);
        // Five 8.8 h estimated-normal days fill the 44 h window exactly.
        for slot_idx in 0..5 {
            assert!(rule.permits(&model, &state, slot_idx, 0));
            state.assign(&model, slot_idx, 0);
        }
        assert!(!rule.permits(&model, &state, 5, 0));
        assert!(rule.violations(&model, &state).is_empty());
    }

    #[test]
    fn test_weekly_normal_exempts_apgd() {
        let dates: Vec<NaiveDate> = (1..=7).map(|d| date(2026, 3, d)).collect();
        let model = test_model(
            (8, 20),
            &dates,
            vec![Employee::new("E1", Scheme::A, "APO", "SGT", "OU1")],
        );
        let rule = WeeklyNormalRule::new(Enforcement::Hard);
        let state = RosterState::new(&model);
        for slot_idx in 0..7 {
            assert!(rule.permits(&model, &state, slot_idx, 0));
        }
    }

    #[test]
    fn test_monthly_ot_guard_uses_month_cap() {
        let dates: Vec<NaiveDate> = (1..=28).map(|d| date(2026, 3, d)).collect();
        let mut model = test_model(
            (8, 20),
            &dates,
            vec![Employee::new("E1", Scheme::B, "SO", "SGT", "OU1")],
        );
        model.employees[0].monthly_ot_caps.insert((2026, 3), 50.0);
        let rule = MonthlyOtGuardRule::new(Enforcement::Hard);
        let mut state = RosterState::new(&model);
        // Each 12 h shift carries an estimated 2.2 h of OT; the 23rd
        // would push the month past 50 h, the guard stops the run there.
        let mut assigned = 0;
        for slot_idx in 0..dates.len() {
            if rule.permits(&model, &state, slot_idx, 0) {
                state.assign(&model, slot_idx, 0);
                assigned += 1;
            }
        }
        assert!(assigned < dates.len());
        assert!(rule.violations(&model, &state).is_empty());
    }
}
