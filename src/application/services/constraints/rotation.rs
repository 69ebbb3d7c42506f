//! Rotation-pattern adherence rule.
//!
//! An employee's work dates should land on the positions their pattern
//! prescribes at `(days_from_anchor + offset) mod L`. The strict
//! adherence ratio is the fraction of work dates that must match the
//! pattern exactly; at the default of 1.0 every work date must match.
//! Demand-based solves enforce this hard, outcome-based solves keep it
//! as a soft preference.

use super::model::{DecisionModel, RosterState};
use super::{RosterRule, RuleViolation};
use crate::domain::entities::{ConstraintId, Enforcement};

pub struct RotationAdherenceRule {
    enforcement: Enforcement,
}

impl RotationAdherenceRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }

    /// (matching, total) work dates of the employee, optionally counting
    /// one extra candidate date
    fn adherence(
        model: &DecisionModel,
        state: &RosterState,
        emp_idx: usize,
        extra: Option<chrono::NaiveDate>,
    ) -> (usize, usize) {
        let record = &model.employees[emp_idx];
        let Some((pattern, anchor)) = &record.pattern else {
            return (0, 0);
        };
        let offset = record.employee.rotation_offset;
        let mut matching = 0;
        let mut total = 0;
        for date in state.work_dates(emp_idx) {
            total += 1;
            if pattern.is_work_day(*anchor, date, offset) {
                matching += 1;
            }
        }
        if let Some(date) = extra {
            if !state.is_working(emp_idx, date) {
                total += 1;
                if pattern.is_work_day(*anchor, date, offset) {
                    matching += 1;
                }
            }
        }
        (matching, total)
    }
}

impl RosterRule for RotationAdherenceRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::RotationAdherence
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
        if model.employees[emp_idx].pattern.is_none() {
            return true;
        }
        let date = model.slots[slot_idx].slot.date;
        let (matching, total) = Self::adherence(model, state, emp_idx, Some(date));
        if total == 0 {
            return true;
        }
        matching as f64 / total as f64 + 1e-9 >= model.employees[emp_idx].strict_adherence_ratio
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (emp_idx, record) in model.employees.iter().enumerate() {
            let (matching, total) = Self::adherence(model, state, emp_idx, None);
            if total == 0 {
                continue;
            }
            let ratio = matching as f64 / total as f64;
            if ratio + 1e-9 < record.strict_adherence_ratio {
                violations.push(RuleViolation {
                    constraint: ConstraintId::RotationAdherence,
                    employee_id: Some(record.employee.id.clone()),
                    date: None,
                    message: format!(
                        "employee {} matches the rotation pattern on {}/{} work dates ({:.0}% required)",
                        record.employee.id,
                        matching,
                        total,
                        record.strict_adherence_ratio * 100.0
                    ),
                    payload: None,
                });
            }
        }
        violations
    }

    /// Soft penalty: one point per off-pattern work date
    fn penalty(&self, model: &DecisionModel, state: &RosterState) -> f64 {
        let mut penalty = 0.0;
        for emp_idx in 0..model.employees.len() {
            let (matching, total) = Self::adherence(model, state, emp_idx, None);
            penalty += (total - matching) as f64;
        }
        penalty
    }
}
