//! Eligibility rules: C7/C8 qualification validity, C9 gender, C11
//! rank/product/scheme match, C12 team whitelist, C16 shifts per day.
//!
//! C15 override approvals are folded into the qualification rule: an
//! explicit per-(employee, date) approval trumps the qualification and
//! availability checks for that date.

use std::collections::BTreeSet;

use super::model::{DecisionModel, RosterState};
use super::{RosterRule, RuleViolation};
use crate::domain::entities::{ConstraintId, Enforcement, GenderPolicy};
use crate::domain::value_objects::Gender;

/// C7/C8: the employee must be available and hold every required
/// qualification, valid on the assignment date, unless a C15 override
/// approval covers the date
pub struct QualificationRule {
    enforcement: Enforcement,
}

impl QualificationRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }

    fn admits(model: &DecisionModel, state_date_slot: usize, emp_idx: usize) -> bool {
        let slot = &model.slots[state_date_slot];
        let record = &model.employees[emp_idx];
        let date = slot.slot.date;
        if record.employee.has_override_approval(date) {
            return true;
        }
        if record.employee.is_on_leave(date) {
            return false;
        }
        match model.requirement_of(state_date_slot) {
            Some(requirement) => requirement
                .required_qualifications
                .iter()
                .all(|q| record.employee.holds_qualification(q, date)),
            None => true,
        }
    }
}

impl RosterRule for QualificationRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C7
    }

    fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    fn permits(
        &self,
        model: &DecisionModel,
        _state: &RosterState,
        slot_idx: usize,
        emp_idx: usize,
    ) -> bool {
        Self::admits(model, slot_idx, emp_idx)
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (slot_idx, assigned) in state.assignments().iter().enumerate() {
            let Some(emp_idx) = assigned else { continue };
            if !Self::admits(model, slot_idx, *emp_idx) {
                let slot = &model.slots[slot_idx];
                violations.push(RuleViolation {
                    constraint: ConstraintId::C7,
                    employee_id: Some(model.employees[*emp_idx].employee.id.clone()),
                    date: Some(slot.slot.date),
                    message: format!(
                        "employee {} lacks a valid qualification or is unavailable for slot {}",
                        model.employees[*emp_idx].employee.id, slot.slot.id
                    ),
                    payload: None,
                });
            }
        }
        violations
    }
}

/// C9: requirement-level gender filter
///
/// `Male`/`Female` restrict individual assignments; `Mix` is audited at
/// roster level, requiring both genders among a date's assignees.
pub struct GenderRule {
    enforcement: Enforcement,
}

impl GenderRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }
}

impl RosterRule for GenderRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C9
    }

    fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    fn permits(
        &self,
        model: &DecisionModel,
        _state: &RosterState,
        slot_idx: usize,
        emp_idx: usize,
    ) -> bool {
        match model.requirement_of(slot_idx) {
            Some(requirement) => requirement
                .gender_policy
                .admits(model.employees[emp_idx].employee.gender),
            None => true,
        }
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        // Individual filter breaches.
        for (slot_idx, assigned) in state.assignments().iter().enumerate() {
            let Some(emp_idx) = assigned else { continue };
            if !self.permits(model, state, slot_idx, *emp_idx) {
                let slot = &model.slots[slot_idx];
                violations.push(RuleViolation {
                    constraint: ConstraintId::C9,
                    employee_id: Some(model.employees[*emp_idx].employee.id.clone()),
                    date: Some(slot.slot.date),
                    message: format!(
                        "employee {} does not satisfy the gender filter of slot {}",
                        model.employees[*emp_idx].employee.id, slot.slot.id
                    ),
                    payload: None,
                });
            }
        }
        // Mix audit: a covered date staffed by a single gender.
        for (req_id, requirement) in &model.requirements {
            if requirement.gender_policy != GenderPolicy::Mix {
                continue;
            }
            let mut dates: BTreeSet<chrono::NaiveDate> = BTreeSet::new();
            for slot in &model.slots {
                if &slot.slot.requirement_id == req_id {
                    dates.insert(slot.slot.date);
                }
            }
            for date in dates {
                let mut genders = BTreeSet::new();
                let mut assignees = 0;
                for (slot_idx, assigned) in state.assignments().iter().enumerate() {
                    let Some(emp_idx) = assigned else { continue };
                    let slot = &model.slots[slot_idx];
                    if &slot.slot.requirement_id == req_id && slot.slot.date == date {
                        assignees += 1;
                        genders.insert(match model.employees[*emp_idx].employee.gender {
                            Gender::Male => 'M',
                            Gender::Female => 'F',
                            Gender::Any => '?',
                        });
                    }
                }
                if assignees >= 2 && genders.len() == 1 && !genders.contains(&'?') {
                    violations.push(RuleViolation {
                        constraint: ConstraintId::C9,
                        employee_id: None,
                        date: Some(date),
                        message: format!(
                            "requirement {} asks for a gender mix but {} is staffed by a single gender",
                            req_id, date
                        ),
                        payload: None,
                    });
                }
            }
        }
        violations
    }
}

/// C11: scheme, rank and product match between employee, requirement and
/// shift definition
pub struct RankProductRule {
    enforcement: Enforcement,
}

impl RankProductRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }

    fn admits(model: &DecisionModel, slot_idx: usize, emp_idx: usize) -> bool {
        let slot = &model.slots[slot_idx];
        let employee = &model.employees[emp_idx].employee;
        if let Some(requirement) = model.requirement_of(slot_idx) {
            if requirement.scheme != employee.scheme
                || !requirement.admits_rank(&employee.rank)
                || !requirement.admits_product(&employee.product_type)
            {
                return false;
            }
        }
        if let Some(shift_def) = model.shift_defs.get(&slot.slot.shift_code) {
            if !shift_def.allows_rank(&employee.rank)
                || !shift_def.allows_product(&employee.product_type)
            {
                return false;
            }
        }
        true
    }
}

impl RosterRule for RankProductRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C11
    }

    fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    fn permits(
        &self,
        model: &DecisionModel,
        _state: &RosterState,
        slot_idx: usize,
        emp_idx: usize,
    ) -> bool {
        Self::admits(model, slot_idx, emp_idx)
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (slot_idx, assigned) in state.assignments().iter().enumerate() {
            let Some(emp_idx) = assigned else { continue };
            if !Self::admits(model, slot_idx, *emp_idx) {
                let slot = &model.slots[slot_idx];
                violations.push(RuleViolation {
                    constraint: ConstraintId::C11,
                    employee_id: Some(model.employees[*emp_idx].employee.id.clone()),
                    date: Some(slot.slot.date),
                    message: format!(
                        "employee {} does not match the rank/product filters of slot {}",
                        model.employees[*emp_idx].employee.id, slot.slot.id
                    ),
                    payload: None,
                });
            }
        }
        violations
    }
}

/// C12: team whitelist, when the requirement carries one
pub struct WhitelistRule {
    enforcement: Enforcement,
}

impl WhitelistRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }
}

impl RosterRule for WhitelistRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C12
    }

    fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    fn permits(
        &self,
        model: &DecisionModel,
        _state: &RosterState,
        slot_idx: usize,
        emp_idx: usize,
    ) -> bool {
        match model.requirement_of(slot_idx) {
            Some(requirement) => requirement.whitelists(&model.employees[emp_idx].employee.id),
            None => true,
        }
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (slot_idx, assigned) in state.assignments().iter().enumerate() {
            let Some(emp_idx) = assigned else { continue };
            if !self.permits(model, state, slot_idx, *emp_idx) {
                let slot = &model.slots[slot_idx];
                violations.push(RuleViolation {
                    constraint: ConstraintId::C12,
                    employee_id: Some(model.employees[*emp_idx].employee.id.clone()),
                    date: Some(slot.slot.date),
                    message: format!(
                        "employee {} is not on the whitelist of slot {}",
                        model.employees[*emp_idx].employee.id, slot.slot.id
                    ),
                    payload: None,
                });
            }
        }
        violations
    }
}

/// C16: at most one shift per day, two for scheme P
pub struct ShiftsPerDayRule {
    enforcement: Enforcement,
}

impl ShiftsPerDayRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }
}

impl RosterRule for ShiftsPerDayRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C16
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
        state.slots_on(emp_idx, date).len() + 1
            <= model.employees[emp_idx].limits.max_shifts_per_day
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (emp_idx, record) in model.employees.iter().enumerate() {
            for (date, slots) in state.days_of(emp_idx) {
                if slots.len() > record.limits.max_shifts_per_day {
                    violations.push(RuleViolation {
                        constraint: ConstraintId::C16,
                        employee_id: Some(record.employee.id.clone()),
                        date: Some(date),
                        message: format!(
                            "employee {} holds {} shifts on {} over the limit of {}",
                            record.employee.id,
                            slots.len(),
                            date,
                            record.limits.max_shifts_per_day
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
    use crate::domain::entities::{DateRange, Employee, Qualification, Requirement, WorkPattern};
    use crate::domain::value_objects::Scheme;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn requirement_map(requirement: Requirement) -> BTreeMap<String, Requirement> {
        let mut map = BTreeMap::new();
        map.insert(requirement.id.clone(), requirement);
        map
    }

    fn base_requirement() -> Requirement {
        Requirement::new(
            "R1",
            vec!["D".to_string()],
            WorkPattern::from_codes(&["D", "O"]).unwrap(),
            1,
            Scheme::A,
        )
    }

    #[test]
    fn test_qualification_rule_checks_validity_window() {
        let employee = Employee::new("E1", Scheme::A, "APO", "SGT", "OU1").with_qualification(
            Qualification {
                name: "FIREARM".to_string(),
                valid_from: date(2026, 1, 1),
                valid_to: date(2026, 2, 28),
            },
        );
        let mut requirement = base_requirement();
        requirement.required_qualifications = vec!["FIREARM".to_string()];
        let model = test_model((8, 20), &[date(2026, 3, 1)], vec![employee])
            .with_requirements(requirement_map(requirement));

        let rule = QualificationRule::new(Enforcement::Hard);
        let state = RosterState::new(&model);
        // Expired on the assignment date.
        assert!(!rule.permits(&model, &state, 0, 0));
    }

    #[test]
    fn test_override_approval_trumps_qualification() {
        let mut employee = Employee::new("E1", Scheme::A, "APO", "SGT", "OU1");
        employee.override_approvals.push(date(2026, 3, 1));
        let mut requirement = base_requirement();
        requirement.required_qualifications = vec!["FIREARM".to_string()];
        let model = test_model((8, 20), &[date(2026, 3, 1)], vec![employee])
            .with_requirements(requirement_map(requirement));

        let rule = QualificationRule::new(Enforcement::Hard);
        let state = RosterState::new(&model);
        assert!(rule.permits(&model, &state, 0, 0));
    }

    #[test]
    fn test_leave_blocks_assignment() {
        let employee = Employee::new("E1", Scheme::A, "APO", "SGT", "OU1")
            .with_leave(DateRange::new(date(2026, 3, 1), date(2026, 3, 2)));
        let model = test_model((8, 20), &[date(2026, 3, 1), date(2026, 3, 3)], vec![employee])
            .with_requirements(requirement_map(base_requirement()));

        let rule = QualificationRule::new(Enforcement::Hard);
        let state = RosterState::new(&model);
        assert!(!rule.permits(&model, &state, 0, 0));
        assert!(rule.permits(&model, &state, 1, 0));
    }

    #[test]
    fn test_gender_filter_and_mix_audit() {
        let mut requirement = base_requirement();
        requirement.gender_policy = GenderPolicy::Female;
        let employees = vec![
            Employee::new("E1", Scheme::A, "APO", "SGT", "OU1").with_gender(Gender::Male),
            Employee::new("E2", Scheme::A, "APO", "SGT", "OU1").with_gender(Gender::Female),
        ];
        let model = test_model((8, 20), &[date(2026, 3, 1)], employees)
            .with_requirements(requirement_map(requirement));
        let rule = GenderRule::new(Enforcement::Hard);
        let state = RosterState::new(&model);
        assert!(!rule.permits(&model, &state, 0, 0));
        assert!(rule.permits(&model, &state, 0, 1));
    }

    #[test]
    fn test_mix_policy_flags_single_gender_date() {
        let mut requirement = base_requirement();
        requirement.gender_policy = GenderPolicy::Mix;
        let employees = vec![
            Employee::new("E1", Scheme::A, "APO", "SGT", "OU1").with_gender(Gender::Male),
            Employee::new("E2", Scheme::A, "APO", "SGT", "OU1").with_gender(Gender::Male),
        ];
        let mut model = test_model((8, 20), &[date(2026, 3, 1), date(2026, 3, 1)], employees)
            .with_requirements(requirement_map(requirement));
        model.slots[1].slot.position_index = 1;
        let rule = GenderRule::new(Enforcement::Hard);
        let mut state = RosterState::new(&model);
        state.assign(&model, 0, 0);
        state.assign(&model, 1, 1);
        let violations = rule.violations(&model, &state);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("gender mix"));
    }

    #[test]
    fn test_rank_product_and_scheme_match() {
        let mut requirement = base_requirement();
        requirement.ranks = vec!["SGT".to_string()];
        let employees = vec![
            Employee::new("E1", Scheme::A, "APO", "SGT", "OU1"),
            Employee::new("E2", Scheme::A, "APO", "CPL", "OU1"),
            Employee::new("E3", Scheme::B, "APO", "SGT", "OU1"),
        ];
        let model = test_model((8, 20), &[date(2026, 3, 1)], employees)
            .with_requirements(requirement_map(requirement));
        let rule = RankProductRule::new(Enforcement::Hard);
        let state = RosterState::new(&model);
        assert!(rule.permits(&model, &state, 0, 0));
        assert!(!rule.permits(&model, &state, 0, 1));
        // Scheme B employee on a scheme A requirement.
        assert!(!rule.permits(&model, &state, 0, 2));
    }

    #[test]
    fn test_whitelist_rule() {
        let mut requirement = base_requirement();
        requirement.team_whitelist = Some(vec!["E2".to_string()]);
        let employees = vec![
            Employee::new("E1", Scheme::A, "APO", "SGT", "OU1"),
            Employee::new("E2", Scheme::A, "APO", "SGT", "OU1"),
        ];
        let model = test_model((8, 20), &[date(2026, 3, 1)], employees)
            .with_requirements(requirement_map(requirement));
        let rule = WhitelistRule::new(Enforcement::Hard);
        let state = RosterState::new(&model);
        assert!(!rule.permits(&model, &state, 0, 0));
        assert!(rule.permits(&model, &state, 0, 1));
    }

    #[test]
    fn test_shifts_per_day_allows_two_for_part_timers() {
        let employees = vec![
            Employee::new("E1", Scheme::A, "APO", "SGT", "OU1"),
            Employee::new("E2", Scheme::P, "SO", "SGT", "OU1"),
        ];
        let model = test_model(
            (9, 13),
            &[date(2026, 3, 1), date(2026, 3, 1), date(2026, 3, 1)],
            employees,
        );
        let rule = ShiftsPerDayRule::new(Enforcement::Hard);
        let mut state = RosterState::new(&model);
        state.assign(&model, 0, 0);
        state.assign(&model, 1, 1);
        // Full-timer already holds the day; part-timer may take a second.
        assert!(!rule.permits(&model, &state, 2, 0));
        assert!(rule.permits(&model, &state, 2, 1));
    }
}
