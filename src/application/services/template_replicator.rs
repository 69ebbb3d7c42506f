//! Template generator and replicator service module (outcome-based mode)
//!
//! When one organisational unit is covered by a homogeneous cohort that
//! differs only in rotation offset, solving every employee separately is
//! wasted work: the roster of one template employee, shifted by each
//! employee's offset difference, covers the cohort. Every shifted
//! assignment is re-validated against the individual employee's own
//! calendar and limits; a failing assignment becomes UNASSIGNED for that
//! employee alone, never dropping the whole replica.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::application::services::constraints::{
    build_rules, DecisionModel, EmployeeRecord, RosterRule, RosterState, SlotInfo,
};
use crate::domain::entities::{
    Assignment, ConstraintCatalog, ConstraintId, DemandItem, Enforcement, PlanningHorizon,
    Requirement, ShiftDefinition, Slot,
};

/// Rule ids re-checked per employee after date shifting.
const REVALIDATED_RULES: [ConstraintId; 7] = [
    ConstraintId::C1,
    ConstraintId::C2,
    ConstraintId::C3,
    ConstraintId::C4,
    ConstraintId::C5,
    ConstraintId::C7,
    ConstraintId::C17,
];

/// Result of replicating one requirement across a cohort
#[derive(Debug)]
pub struct ReplicationResult {
    /// ASSIGNED and UNASSIGNED rows, hours not yet computed
    pub assignments: Vec<Assignment>,
    pub warnings: Vec<String>,
    pub unassigned_count: usize,
}

/// The outcome-based template generator and replicator
pub struct TemplateReplicator {
    rules: Vec<Box<dyn RosterRule>>,
}

impl TemplateReplicator {
    /// Creates a replicator with the re-validation rule subset
    ///
    /// # Arguments
    ///
    /// * `catalog` - The labour-law rule configuration of the run
    ///
    /// # Returns
    ///
    /// A new TemplateReplicator
    pub fn new(catalog: &ConstraintCatalog) -> Self {
        let rules = build_rules(catalog, false)
            .into_iter()
            .filter(|rule| REVALIDATED_RULES.contains(&rule.id()))
            .collect();
        Self { rules }
    }

    /// Rosters a cohort by template replication
    ///
    /// The template employee is the first of the cohort; its pattern
    /// dates are solved once, then shifted by each employee's offset
    /// difference and validated individually.
    ///
    /// # Arguments
    ///
    /// * `horizon` - The planning horizon of the run
    /// * `demand` - The demand item owning the requirement
    /// * `requirement` - The outcome-based requirement to roster
    /// * `cohort` - The selected employees, template first
    /// * `shift_defs` - Shift definitions keyed by code
    ///
    /// # Returns
    ///
    /// The cohort's ASSIGNED and UNASSIGNED rows plus warnings
    pub fn replicate(
        &self,
        horizon: &PlanningHorizon,
        demand: &DemandItem,
        requirement: &Requirement,
        cohort: Vec<EmployeeRecord>,
        shift_defs: &BTreeMap<String, ShiftDefinition>,
    ) -> ReplicationResult {
        let mut result = ReplicationResult {
            assignments: Vec::new(),
            warnings: Vec::new(),
            unassigned_count: 0,
        };
        let Some(template) = cohort.first() else {
            result.warnings.push(format!(
                "requirement {} has no eligible employee; every pattern day is uncovered",
                requirement.id
            ));
            return result;
        };
        info!(
            requirement = %requirement.id,
            template = %template.employee.id,
            cohort = cohort.len(),
            "replicating template roster"
        );

        let template_days =
            self.template_days(horizon, demand, requirement, template.employee.rotation_offset);
        debug!(
            template = %template.employee.id,
            days = template_days.len(),
            "template line solved"
        );

        for (cohort_idx, record) in cohort.iter().enumerate() {
            let delta =
                record.employee.rotation_offset as i64 - template.employee.rotation_offset as i64;
            let mut targets: Vec<(NaiveDate, String)> = template_days
                .iter()
                .map(|(date, code)| (*date + Duration::days(delta), code.clone()))
                .filter(|(date, _)| horizon.contains(*date) && demand.range.contains(*date))
                .collect();
            targets.sort();
            self.roster_employee(
                horizon,
                demand,
                requirement,
                record,
                cohort_idx,
                &targets,
                shift_defs,
                &mut result,
            );
        }
        result
    }

    /// The template's pattern days inside the demand range
    fn template_days(
        &self,
        horizon: &PlanningHorizon,
        demand: &DemandItem,
        requirement: &Requirement,
        offset: usize,
    ) -> Vec<(NaiveDate, String)> {
        let anchor = demand.range.start_date;
        demand
            .range
            .iter_dates()
            .filter(|date| horizon.contains(*date))
            .filter_map(|date| {
                requirement
                    .pattern
                    .shift_on(anchor, date, offset)
                    .map(|code| (date, code.to_string()))
            })
            .collect()
    }

    /// Validates and emits one employee's shifted assignments
    #[allow(clippy::too_many_arguments)]
    fn roster_employee(
        &self,
        horizon: &PlanningHorizon,
        demand: &DemandItem,
        requirement: &Requirement,
        record: &EmployeeRecord,
        cohort_idx: usize,
        targets: &[(NaiveDate, String)],
        shift_defs: &BTreeMap<String, ShiftDefinition>,
        result: &mut ReplicationResult,
    ) {
        let mut requirements = BTreeMap::new();
        requirements.insert(requirement.id.clone(), requirement.clone());

        let slots: Vec<SlotInfo> = targets
            .iter()
            .filter_map(|(date, code)| {
                let Some(shift_def) = shift_defs.get(code) else {
                    warn!(shift = %code, "unknown shift code in pattern, skipping");
                    return None;
                };
                let (start, end) = shift_def.instants_on(*date);
                Some(SlotInfo {
                    slot: Slot::new(&demand.id, &requirement.id, *date, code, cohort_idx),
                    start,
                    end,
                    gross_hours: shift_def.duration_hours(),
                    candidates: vec![0],
                })
            })
            .collect();

        let model = DecisionModel::new(horizon.clone(), slots, vec![record.clone()])
            .with_requirements(requirements)
            .with_shift_defs(shift_defs.clone());
        let mut state = RosterState::new(&model);

        for slot_idx in 0..model.slots.len() {
            let permitted = self
                .rules
                .iter()
                .filter(|rule| rule.enforcement() == Enforcement::Hard)
                .all(|rule| rule.permits(&model, &state, slot_idx, 0));
            let info = &model.slots[slot_idx];
            if permitted {
                state.assign(&model, slot_idx, 0);
                result.assignments.push(Assignment::assigned(
                    &info.slot,
                    &record.employee.id,
                    info.start,
                    info.end,
                ));
            } else {
                debug!(
                    employee = %record.employee.id,
                    date = %info.slot.date,
                    "shifted assignment fails individual validation"
                );
                result.unassigned_count += 1;
                result
                    .assignments
                    .push(Assignment::unassigned(&info.slot, info.start, info.end));
            }
        }
    }
}
