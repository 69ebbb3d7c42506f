//! Work-day cadence rules: C3 consecutive working days and C5 off-days
//! per rolling week.

use chrono::NaiveDate;

use super::model::{DecisionModel, RosterState};
use super::{RosterRule, RuleViolation};
use crate::domain::entities::{ConstraintId, Enforcement};

/// Consecutive work-day runs of an employee, as (first date, length)
fn work_runs(state: &RosterState, emp_idx: usize) -> Vec<(NaiveDate, usize)> {
    let mut runs: Vec<(NaiveDate, usize)> = Vec::new();
    let mut previous: Option<NaiveDate> = None;
    for date in state.work_dates(emp_idx) {
        let extends = matches!(previous, Some(prev) if prev.succ_opt() == Some(date));
        if extends {
            if let Some(run) = runs.last_mut() {
                run.1 += 1;
            }
        } else {
            runs.push((date, 1));
        }
        previous = Some(date);
    }
    runs
}

/// C3: consecutive working days within the scheme limit
/// (12 standard, 8 for APGD-D10)
pub struct ConsecutiveDaysRule {
    enforcement: Enforcement,
}

impl ConsecutiveDaysRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }
}

impl RosterRule for ConsecutiveDaysRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C3
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
        let date = model.slots[slot_idx].slot.date;
        if state.is_working(emp_idx, date) {
            // A second same-day shift does not lengthen the run.
            return true;
        }
        state.run_length_through(emp_idx, date)
            <= model.employees[emp_idx].limits.consecutive_day_limit
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (emp_idx, record) in model.employees.iter().enumerate() {
            let limit = record.limits.consecutive_day_limit;
            for (start, len) in work_runs(state, emp_idx) {
                if len > limit {
                    violations.push(RuleViolation {
                        constraint: ConstraintId::C3,
                        employee_id: Some(record.employee.id.clone()),
                        date: Some(start),
                        message: format!(
                            "employee {} works {} consecutive days from {} over the limit of {}",
                            record.employee.id, len, start, limit
                        ),
                        payload: None,
                    });
                }
            }
        }
        violations
    }
}

/// C5: at least one off-day per rolling 7-day window
///
/// For a standard employee with a minimum of one off-day per week the
/// longest permissible run is six days. APGD-D10 employees are exempt
/// within an 8-day consecutive window; beyond that C3 has already
/// stopped the run.
pub struct WeeklyOffDaysRule {
    enforcement: Enforcement,
}

impl WeeklyOffDaysRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }

    fn allowed_run(model: &DecisionModel, emp_idx: usize) -> usize {
        let limits = &model.employees[emp_idx].limits;
        if limits.apgd_d10 {
            8
        } else {
            7usize.saturating_sub(limits.min_off_days_per_week)
        }
    }
}

impl RosterRule for WeeklyOffDaysRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C5
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
        let date = model.slots[slot_idx].slot.date;
        if state.is_working(emp_idx, date) {
            return true;
        }
        state.run_length_through(emp_idx, date) <= Self::allowed_run(model, emp_idx)
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (emp_idx, record) in model.employees.iter().enumerate() {
            let allowed = Self::allowed_run(model, emp_idx);
            for (start, len) in work_runs(state, emp_idx) {
                if len > allowed {
                    violations.push(RuleViolation {
                        constraint: ConstraintId::C5,
                        employee_id: Some(record.employee.id.clone()),
                        date: Some(start),
                        message: format!(
                            "employee {} has no off-day in the {} days from {}",
                            record.employee.id, len, start
                        ),
                        payload: None,
                    });
                }
            }
        }
        violations
    }
}
