//! Constraint library module
//!
//! The labour-law rules C1-C17 plus rotation adherence, expressed as
//! named rules over the decision model. Every rule answers two
//! questions: `permits` guards one incremental assignment during search,
//! `violations` audits a complete roster. Hard rules gate the search;
//! soft rules contribute weighted penalties to the objective.

pub mod days;
pub mod eligibility;
pub mod hours;
pub mod model;
pub mod rest;
pub mod rotation;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::entities::{ConstraintCatalog, ConstraintId, Enforcement};

pub use model::{DecisionModel, EmployeeRecord, RosterState, SlotInfo};

/// One audited breach of a rule
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub constraint: ConstraintId,
    pub employee_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub message: String,
    /// Structured detail, e.g. `{"shiftHours": 11, "dailyCap": 9}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// A labour-law or operational rule bound to the decision model
pub trait RosterRule {
    fn id(&self) -> ConstraintId;

    fn enforcement(&self) -> Enforcement;

    /// Whether assigning `emp_idx` to `slot_idx` keeps the roster legal
    /// given the current state
    fn permits(
        &self,
        model: &DecisionModel,
        state: &RosterState,
        slot_idx: usize,
        emp_idx: usize,
    ) -> bool;

    /// Audits a complete roster for breaches of this rule
    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation>;

    /// Soft penalty of the current roster; defaults to the breach count
    fn penalty(&self, model: &DecisionModel, state: &RosterState) -> f64 {
        self.violations(model, state).len() as f64
    }

    /// Structured rejection detail for static screening, when this rule
    /// is the one excluding the pairing
    fn screening_violation(
        &self,
        _model: &DecisionModel,
        _slot_idx: usize,
        _emp_idx: usize,
    ) -> Option<RuleViolation> {
        None
    }
}

/// Builds the full rule set for one solve
///
/// Enforcement levels come from the catalog (hard when unspecified);
/// rotation adherence is forced hard in demand-based mode and soft
/// otherwise.
///
/// # Arguments
///
/// * `catalog` - The labour-law rule configuration of the run
/// * `rotation_hard` - Whether rotation adherence gates the search
///
/// # Returns
///
/// The boxed rule set in evaluation order
pub fn build_rules(catalog: &ConstraintCatalog, rotation_hard: bool) -> Vec<Box<dyn RosterRule>> {
    let e = |id| catalog.enforcement(id);
    let rotation_enforcement = if rotation_hard {
        Enforcement::Hard
    } else {
        Enforcement::Soft
    };
    vec![
        Box::new(hours::DailyHoursRule::new(e(ConstraintId::C1))),
        Box::new(hours::WeeklyNormalRule::new(e(ConstraintId::C2))),
        Box::new(days::ConsecutiveDaysRule::new(e(ConstraintId::C3))),
        Box::new(rest::RestPeriodRule::new(e(ConstraintId::C4))),
        Box::new(days::WeeklyOffDaysRule::new(e(ConstraintId::C5))),
        Box::new(hours::PartTimerWeeklyRule::new(e(ConstraintId::C6))),
        Box::new(eligibility::QualificationRule::new(e(ConstraintId::C7))),
        Box::new(eligibility::GenderRule::new(e(ConstraintId::C9))),
        Box::new(eligibility::RankProductRule::new(e(ConstraintId::C11))),
        Box::new(eligibility::WhitelistRule::new(e(ConstraintId::C12))),
        Box::new(eligibility::ShiftsPerDayRule::new(e(ConstraintId::C16))),
        Box::new(hours::MonthlyOtGuardRule::new(e(ConstraintId::C17))),
        Box::new(rotation::RotationAdherenceRule::new(rotation_enforcement)),
    ]
}

/// Computes per-slot candidate lists by screening every pairing against
/// the rule set over an empty roster
///
/// Dynamic rules pass trivially on an empty state, so the screening
/// keeps exactly the pairings static eligibility admits. Structured
/// rejections (deduplicated by message) are returned for the warning
/// stream.
///
/// # Arguments
///
/// * `model` - The decision model whose candidate lists are filled in
/// * `rules` - The rule set screening each pairing
///
/// # Returns
///
/// Structured rejections worth surfacing as warnings
pub fn compute_candidates(
    model: &mut DecisionModel,
    rules: &[Box<dyn RosterRule>],
) -> Vec<RuleViolation> {
    let empty = RosterState::new(model);
    let mut rejections: Vec<RuleViolation> = Vec::new();
    for slot_idx in 0..model.slots.len() {
        let mut candidates = Vec::new();
        'employees: for emp_idx in 0..model.employees.len() {
            for rule in rules {
                if rule.enforcement() == Enforcement::Hard
                    && !rule.permits(model, &empty, slot_idx, emp_idx)
                {
                    if let Some(violation) = rule.screening_violation(model, slot_idx, emp_idx) {
                        if !rejections.iter().any(|v| v.message == violation.message) {
                            rejections.push(violation);
                        }
                    }
                    continue 'employees;
                }
            }
            candidates.push(emp_idx);
        }
        model.slots[slot_idx].candidates = candidates;
    }
    rejections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::constraint_resolver::ConstraintResolver;
    use crate::domain::entities::{Employee, PlanningHorizon, ShiftDefinition, Slot};
    use crate::domain::value_objects::Scheme;
    use chrono::{NaiveDate, NaiveTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn test_model(
        shift_hours: (u32, u32),
        slot_dates: &[NaiveDate],
        employees: Vec<Employee>,
    ) -> DecisionModel {
        let shift = ShiftDefinition::new(
            "D",
            NaiveTime::from_hms_opt(shift_hours.0, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(shift_hours.1, 0, 0).unwrap(),
        );
        let resolver = ConstraintResolver::new(Default::default());
        let slots = slot_dates
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let (start, end) = shift.instants_on(*d);
                SlotInfo {
                    slot: Slot::new("DM1", "R1", *d, "D", i),
                    start,
                    end,
                    gross_hours: shift.duration_hours(),
                    candidates: (0..employees.len()).collect(),
                }
            })
            .collect();
        let employees = employees
            .into_iter()
            .map(|employee| {
                let limits = resolver.limits_for(&employee, 5);
                EmployeeRecord {
                    limits,
                    pattern: None,
                    strict_adherence_ratio: 1.0,
                    monthly_ot_caps: std::collections::BTreeMap::new(),
                    employee,
                }
            })
            .collect();
        DecisionModel::new(
            PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 31)),
            slots,
            employees,
        )
    }

    #[test]
    fn test_candidate_screening_excludes_overlong_shift() {
        // A 12 h shift is beyond the scheme-P net cap of 9 h.
        let mut model = test_model(
            (7, 19),
            &[date(2026, 3, 1)],
            vec![
                Employee::new("E1", Scheme::P, "SO", "SGT", "OU1"),
                Employee::new("E2", Scheme::A, "APO", "SGT", "OU1"),
            ],
        );
        let rules = build_rules(&Default::default(), true);
        let rejections = compute_candidates(&mut model, &rules);
        assert_eq!(model.slots[0].candidates, vec![1]);
        let c1 = rejections
            .iter()
            .find(|v| v.constraint == ConstraintId::C1)
            .expect("C1 rejection recorded");
        let payload = c1.payload.as_ref().unwrap();
        assert_eq!(payload["shiftHours"], 11.0);
        assert_eq!(payload["dailyCap"], 9.0);
    }

    #[test]
    fn test_rule_set_covers_catalog_ids() {
        let rules = build_rules(&Default::default(), true);
        let ids: Vec<ConstraintId> = rules.iter().map(|r| r.id()).collect();
        for id in [
            ConstraintId::C1,
            ConstraintId::C4,
            ConstraintId::C16,
            ConstraintId::C17,
            ConstraintId::RotationAdherence,
        ] {
            assert!(ids.contains(&id), "missing rule {id}");
        }
    }
}
