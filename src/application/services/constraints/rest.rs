//! C4: minimum inter-shift rest.
//!
//! Pairwise enumeration over an employee's assignments, restricted to a
//! window of two days either side of the candidate date: with shifts of
//! at most 24 hours, any pair further apart has a rest gap above 24
//! hours and is trivially satisfied.

use chrono::{Duration, NaiveDate};
use serde_json::json;

use super::model::{DecisionModel, RosterState, SlotInfo};
use super::{RosterRule, RuleViolation};
use crate::domain::entities::{ConstraintId, Enforcement};
use crate::domain::value_objects::Scheme;

/// C4: minimum rest between any two shifts of one employee
/// (11 h standard, 8 h APGD-D10, 1 h between scheme-P same-day shifts)
pub struct RestPeriodRule {
    enforcement: Enforcement,
}

impl RestPeriodRule {
    pub fn new(enforcement: Enforcement) -> Self {
        Self { enforcement }
    }

    /// Required rest in hours between two shifts of this employee
    fn required_rest(model: &DecisionModel, emp_idx: usize, a: &SlotInfo, b: &SlotInfo) -> f64 {
        let record = &model.employees[emp_idx];
        if record.employee.scheme == Scheme::P && a.slot.date == b.slot.date {
            record.employee.scheme.same_day_gap_hours()
        } else {
            record.limits.rest_hours
        }
    }

    /// Whether the pair of shifts is legal for this employee
    fn pair_ok(model: &DecisionModel, emp_idx: usize, a: &SlotInfo, b: &SlotInfo) -> bool {
        // Overlap is never legal, whatever the rest rule says.
        if a.start < b.end && b.start < a.end {
            return false;
        }
        let (earlier, later) = if a.end <= b.start { (a, b) } else { (b, a) };
        let gap_hours = (later.start - earlier.end).num_minutes() as f64 / 60.0;
        gap_hours + 1e-9 >= Self::required_rest(model, emp_idx, a, b)
    }

    /// Existing slot indices of the employee near the given date
    fn nearby_slots(
        state: &RosterState,
        emp_idx: usize,
        date: NaiveDate,
    ) -> impl Iterator<Item = usize> + '_ {
        (-2..=2).flat_map(move |offset| {
            state
                .slots_on(emp_idx, date + Duration::days(offset))
                .iter()
                .copied()
        })
    }
}

impl RosterRule for RestPeriodRule {
    fn id(&self) -> ConstraintId {
        ConstraintId::C4
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
        let candidate = &model.slots[slot_idx];
        for other_idx in Self::nearby_slots(state, emp_idx, candidate.slot.date) {
            if !Self::pair_ok(model, emp_idx, candidate, &model.slots[other_idx]) {
                return false;
            }
        }
        true
    }

    fn violations(&self, model: &DecisionModel, state: &RosterState) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        for (emp_idx, record) in model.employees.iter().enumerate() {
            let slots: Vec<usize> = state.days_of(emp_idx).flat_map(|(_, s)| s.to_vec()).collect();
            for (i, a_idx) in slots.iter().enumerate() {
                let a = &model.slots[*a_idx];
                for b_idx in slots.iter().skip(i + 1) {
                    let b = &model.slots[*b_idx];
                    // Chronological slots more than two days apart rest
                    // over 24 h; stop scanning this pair chain.
                    if (b.slot.date - a.slot.date).num_days() > 2 {
                        break;
                    }
                    if !Self::pair_ok(model, emp_idx, a, b) {
                        let required = Self::required_rest(model, emp_idx, a, b);
                        violations.push(RuleViolation {
                            constraint: ConstraintId::C4,
                            employee_id: Some(record.employee.id.clone()),
                            date: Some(a.slot.date),
                            message: format!(
                                "employee {} rests under {:.0} h between {} and {}",
                                record.employee.id, required, a.slot.id, b.slot.id
                            ),
                            payload: Some(json!({ "requiredRestHours": required })),
                        });
                    }
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::super::model::{DecisionModel, EmployeeRecord, RosterState, SlotInfo};
    use super::*;
    use crate::application::services::constraint_resolver::ConstraintResolver;
    use crate::domain::entities::{Employee, PlanningHorizon, ShiftDefinition, Slot};
    use chrono::{NaiveDate, NaiveTime};
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// One slot per (code, date, start, end) tuple, single employee.
    fn model_with_shifts(
        employee: Employee,
        shifts: &[(&str, NaiveDate, (u32, u32), (u32, u32))],
    ) -> DecisionModel {
        let resolver = ConstraintResolver::new(Default::default());
        let slots = shifts
            .iter()
            .map(|(code, d, s, e)| {
                let def = ShiftDefinition::new(*code, time(s.0, s.1), time(e.0, e.1));
                let (start, end) = def.instants_on(*d);
                SlotInfo {
                    slot: Slot::new("DM1", "R1", *d, *code, 0),
                    start,
                    end,
                    gross_hours: def.duration_hours(),
                    candidates: vec![0],
                }
            })
            .collect();
        let limits = resolver.limits_for(&employee, 5);
        DecisionModel::new(
            PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 31)),
            slots,
            vec![EmployeeRecord {
                limits,
                pattern: None,
                strict_adherence_ratio: 1.0,
                monthly_ot_caps: BTreeMap::new(),
                employee,
            }],
        )
    }

    #[test]
    fn test_eleven_hour_rest_between_days() {
        let employee = Employee::new("E1", crate::domain::value_objects::Scheme::B, "SO", "SGT", "OU1");
        // Day shift ends 20:00; next day 08:00 start rests 12 h, 06:00 rests 10 h.
        let model = model_with_shifts(
            employee,
            &[
                ("D", date(2026, 3, 1), (8, 0), (20, 0)),
                ("D", date(2026, 3, 2), (8, 0), (20, 0)),
                ("E", date(2026, 3, 2), (6, 0), (18, 0)),
            ],
        );
        let rule = RestPeriodRule::new(Enforcement::Hard);
        let mut state = RosterState::new(&model);
        state.assign(&model, 0, 0);
        assert!(rule.permits(&model, &state, 1, 0));
        assert!(!rule.permits(&model, &state, 2, 0));
    }

    #[test]
    fn test_apgd_eight_hour_rest() {
        let employee = Employee::new("E1", crate::domain::value_objects::Scheme::A, "APO", "SGT", "OU1");
        let model = model_with_shifts(
            employee,
            &[
                ("D", date(2026, 3, 1), (8, 0), (20, 0)),
                ("E", date(2026, 3, 2), (6, 0), (18, 0)),
            ],
        );
        let rule = RestPeriodRule::new(Enforcement::Hard);
        let mut state = RosterState::new(&model);
        state.assign(&model, 0, 0);
        // A 10 h gap satisfies the relaxed 8 h APGD rest.
        assert!(rule.permits(&model, &state, 1, 0));
    }

    #[test]
    fn test_part_timer_same_day_gap() {
        let employee = Employee::new("E1", crate::domain::value_objects::Scheme::P, "SO", "SGT", "OU1");
        let model = model_with_shifts(
            employee,
            &[
                ("A", date(2026, 3, 1), (9, 0), (13, 0)),
                ("B", date(2026, 3, 1), (14, 0), (18, 0)),
                ("B2", date(2026, 3, 1), (13, 30), (17, 30)),
            ],
        );
        let rule = RestPeriodRule::new(Enforcement::Hard);
        let mut state = RosterState::new(&model);
        state.assign(&model, 0, 0);
        // 14:00 start leaves a full hour after the 13:00 end.
        assert!(rule.permits(&model, &state, 1, 0));
        // 13:30 start leaves only 30 minutes.
        assert!(!rule.permits(&model, &state, 2, 0));
    }

    #[test]
    fn test_overlap_always_rejected() {
        let employee = Employee::new("E1", crate::domain::value_objects::Scheme::P, "SO", "SGT", "OU1");
        let model = model_with_shifts(
            employee,
            &[
                ("A", date(2026, 3, 1), (9, 0), (13, 0)),
                ("B", date(2026, 3, 1), (12, 0), (16, 0)),
            ],
        );
        let rule = RestPeriodRule::new(Enforcement::Hard);
        let mut state = RosterState::new(&model);
        state.assign(&model, 0, 0);
        assert!(!rule.permits(&model, &state, 1, 0));
        state.assign(&model, 1, 0);
        assert_eq!(rule.violations(&model, &state).len(), 1);
    }
}
