//! Roster generation use case
//!
//! The end-to-end pipeline: filter employees per requirement, right-size
//! the pool (ICPMP), pick the rostering mode, build and solve the
//! decision model, synthesise UNASSIGNED and OFF_DAY rows, run hour
//! accounting and hand a complete result to the output assembler.
//! Cancellation is cooperative: the pipeline checks a caller-provided
//! flag before slot building, before solving and after solving, and a
//! cancelled run yields no partial result.

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::application::services::capacity_planner::{CapacityInputs, CapacityPlanner};
use crate::application::services::constraint_resolver::ConstraintResolver;
use crate::application::services::constraints::{
    build_rules, compute_candidates, DecisionModel, EmployeeRecord, SlotInfo,
};
use crate::application::services::hour_accountant::HourAccountant;
use crate::application::services::slot_builder::SlotBuilder;
use crate::application::services::template_replicator::TemplateReplicator;
use crate::domain::entities::horizon::days_in_month;
use crate::domain::entities::{
    Assignment, DemandItem, Employee, PlanningHorizon, Requirement, RosterInput, RosteringBasis,
    ShiftDefinition, Slot,
};
use crate::domain::value_objects::{RunStatus, SolveStatus};
use crate::infrastructure::solver::CpSolver;

/// Cohort size up to which divergent individual calendars force an
/// outcome-based requirement back onto demand-based solving.
const OUTCOME_FALLBACK_COHORT_LIMIT: usize = 50;

/// Cooperative cancellation flag shared with the caller
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pure lookup for externally cached optimal strict adherence ratios
///
/// The cache itself lives outside the core; the pipeline only consults
/// this injected port.
#[cfg_attr(test, mockall::automock)]
pub trait StrictRatioProvider {
    fn optimal_ratio(&self, requirement_id: &str) -> Option<f64>;
}

/// Default provider: no cache, the configured ratio stands
pub struct NoStrictRatioCache;

impl StrictRatioProvider for NoStrictRatioCache {
    fn optimal_ratio(&self, _requirement_id: &str) -> Option<f64> {
        None
    }
}

/// Everything the output assembler needs about a finished run
#[derive(Debug)]
pub struct GenerationOutcome {
    pub status: RunStatus,
    pub solve_status: SolveStatus,
    /// All rows: ASSIGNED, UNASSIGNED and OFF_DAY, fully accounted
    pub assignments: Vec<Assignment>,
    /// The employees the roster covers, with their resolved limits
    pub roster_employees: Vec<EmployeeRecord>,
    pub warnings: Vec<String>,
    pub hard_violations: usize,
    pub soft_penalty: f64,
    pub wall_time_seconds: f64,
    pub seed: u64,
}

impl GenerationOutcome {
    fn cancelled(seed: u64, started: Instant) -> Self {
        Self {
            status: RunStatus::Cancelled,
            solve_status: SolveStatus::Unknown,
            assignments: Vec::new(),
            roster_employees: Vec::new(),
            warnings: Vec::new(),
            hard_violations: 0,
            soft_penalty: 0.0,
            wall_time_seconds: started.elapsed().as_secs_f64(),
            seed,
        }
    }
}

/// The roster generation pipeline
pub struct GenerateRoster {
    strict_ratios: Box<dyn StrictRatioProvider>,
    cancellation: CancellationFlag,
}

impl GenerateRoster {
    pub fn new() -> Self {
        Self {
            strict_ratios: Box::new(NoStrictRatioCache),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_strict_ratio_provider(mut self, provider: Box<dyn StrictRatioProvider>) -> Self {
        self.strict_ratios = provider;
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    /// Runs the pipeline over validated input
    pub fn execute(&self, input: &RosterInput) -> Result<GenerationOutcome> {
        let started = Instant::now();
        let seed = input.solver_config.seed;
        info!(
            employees = input.employees.len(),
            demands = input.demand_items.len(),
            "starting roster generation"
        );

        let resolver = ConstraintResolver::new(input.catalog.clone());
        let shift_defs: BTreeMap<String, ShiftDefinition> = input
            .shifts
            .iter()
            .map(|s| (s.code.clone(), s.clone()))
            .collect();

        let mut warnings = Vec::new();

        // Deterministic demand order.
        let mut demands: Vec<&DemandItem> = input.demand_items.iter().collect();
        demands.sort_by(|a, b| a.id.cmp(&b.id));

        // Filter and right-size the pool per requirement, then split the
        // requirements by rostering mode.
        let mut demand_based: Vec<(&DemandItem, &Requirement, Vec<Employee>)> = Vec::new();
        let mut outcome_based: Vec<(&DemandItem, &Requirement, Vec<Employee>)> = Vec::new();
        let planner = CapacityPlanner::new();
        for demand in demands.iter().copied() {
            for requirement in &demand.requirements {
                let eligible = self.filter_eligible(input, demand, requirement);
                if eligible.is_empty() {
                    warnings.push(format!(
                        "requirement {} has no eligible employee",
                        requirement.id
                    ));
                }
                let plan = planner.plan(
                    requirement,
                    &eligible,
                    self.capacity_inputs(input, requirement, &eligible, &resolver, &shift_defs),
                );
                warnings.extend(plan.warnings);

                // Mode selection inspects the pool as the input declared
                // it; ICPMP has already re-tagged the selected offsets.
                match self.select_mode(demand, requirement, &eligible, &mut warnings) {
                    RosteringBasis::DemandBased => {
                        demand_based.push((demand, requirement, plan.selected))
                    }
                    RosteringBasis::OutcomeBased => {
                        outcome_based.push((demand, requirement, plan.selected))
                    }
                }
            }
        }

        // Checkpoint: before slot building.
        if self.cancellation.is_cancelled() {
            info!("run cancelled before slot building");
            return Ok(GenerationOutcome::cancelled(seed, started));
        }

        let mut assignments: Vec<Assignment> = Vec::new();
        let mut roster_records: BTreeMap<String, EmployeeRecord> = BTreeMap::new();
        let mut solve_status = SolveStatus::Optimal;
        let mut hard_violations = 0usize;
        let mut soft_penalty = 0.0f64;
        let mut replication_unassigned = 0usize;

        // Demand-based requirements share one decision model so the
        // cross-requirement rules see every assignment.
        let mut model = self.build_demand_model(input, &resolver, &shift_defs, &demand_based);
        for record in &model.employees {
            roster_records
                .entry(record.employee.id.clone())
                .or_insert_with(|| record.clone());
        }
        if !model.slots.is_empty() {
            let rules = build_rules(&input.catalog, true);
            let rejections = compute_candidates(&mut model, &rules);
            for rejection in &rejections {
                let payload = rejection
                    .payload
                    .as_ref()
                    .map(|p| format!(" {}", p))
                    .unwrap_or_default();
                warnings.push(format!("[{}] {}{}", rejection.constraint, rejection.message, payload));
            }

            // Checkpoint: before solving.
            if self.cancellation.is_cancelled() {
                info!("run cancelled before solve");
                return Ok(GenerationOutcome::cancelled(seed, started));
            }

            let outcome = CpSolver::new(input.solver_config.clone()).solve(&model, &rules);
            solve_status = outcome.status;
            hard_violations += outcome.hard_violations;
            soft_penalty += outcome.soft_penalty;

            // Checkpoint: after solving, before post-processing.
            if self.cancellation.is_cancelled() {
                info!("run cancelled after solve");
                return Ok(GenerationOutcome::cancelled(seed, started));
            }

            for (slot_idx, assigned) in outcome.assignments.iter().enumerate() {
                let info = &model.slots[slot_idx];
                match assigned {
                    Some(emp_idx) => assignments.push(Assignment::assigned(
                        &info.slot,
                        &model.employees[*emp_idx].employee.id,
                        info.start,
                        info.end,
                    )),
                    None => {
                        assignments
                            .push(Assignment::unassigned(&info.slot, info.start, info.end));
                    }
                }
            }
        } else if self.cancellation.is_cancelled() {
            return Ok(GenerationOutcome::cancelled(seed, started));
        }

        // Outcome-based requirements replicate per cohort.
        let replicator = TemplateReplicator::new(&input.catalog);
        for (demand, requirement, cohort) in &outcome_based {
            let records: Vec<EmployeeRecord> = cohort
                .iter()
                .map(|employee| {
                    self.build_record(input, &resolver, employee, requirement, demand)
                })
                .collect();
            for record in &records {
                roster_records
                    .entry(record.employee.id.clone())
                    .or_insert_with(|| record.clone());
            }
            let result =
                replicator.replicate(&input.horizon, demand, requirement, records, &shift_defs);
            warnings.extend(result.warnings);
            replication_unassigned += result.unassigned_count;
            assignments.extend(result.assignments);
        }

        // Hour accounting, then the synthesised OFF_DAY rows.
        let records: Vec<EmployeeRecord> = roster_records.values().cloned().collect();
        let accountant = HourAccountant::new(&resolver);
        accountant.process(&mut assignments, &records, &input.horizon);
        self.fill_off_days(&mut assignments, &records, &input.horizon);

        let total_unassigned = assignments
            .iter()
            .filter(|a| a.status == crate::domain::entities::AssignmentStatus::Unassigned)
            .count();
        if total_unassigned > 0 {
            solve_status = SolveStatus::Infeasible;
        } else if replication_unassigned == 0 && solve_status == SolveStatus::Unknown {
            solve_status = SolveStatus::Feasible;
        }

        assignments.sort_by(|a, b| {
            (a.date, &a.shift_code, &a.slot_id).cmp(&(b.date, &b.shift_code, &b.slot_id))
        });

        info!(
            rows = assignments.len(),
            unassigned = total_unassigned,
            status = %solve_status,
            "roster generation finished"
        );

        Ok(GenerationOutcome {
            status: RunStatus::Completed,
            solve_status,
            assignments,
            roster_employees: records,
            warnings,
            hard_violations,
            soft_penalty,
            wall_time_seconds: started.elapsed().as_secs_f64(),
            seed,
        })
    }

    /// Requirement-level eligibility filter: scheme, rank, product,
    /// gender and whitelist, plus coarse qualification validity inside
    /// the demand range
    fn filter_eligible(
        &self,
        input: &RosterInput,
        demand: &DemandItem,
        requirement: &Requirement,
    ) -> Vec<Employee> {
        let mut eligible: Vec<Employee> = input
            .employees
            .iter()
            .filter(|e| e.scheme == requirement.scheme)
            .filter(|e| requirement.admits_rank(&e.rank))
            .filter(|e| requirement.admits_product(&e.product_type))
            .filter(|e| requirement.gender_policy.admits(e.gender))
            .filter(|e| requirement.whitelists(&e.id))
            .filter(|e| {
                requirement.required_qualifications.iter().all(|q| {
                    demand
                        .range
                        .iter_dates()
                        .any(|date| e.holds_qualification(q, date))
                })
            })
            .cloned()
            .collect();
        eligible.sort_by(|a, b| a.id.cmp(&b.id));
        eligible
    }

    fn capacity_inputs(
        &self,
        input: &RosterInput,
        requirement: &Requirement,
        eligible: &[Employee],
        resolver: &ConstraintResolver,
        shift_defs: &BTreeMap<String, ShiftDefinition>,
    ) -> CapacityInputs {
        let start = input.horizon.start();
        let month_len = days_in_month(
            chrono::Datelike::year(&start),
            chrono::Datelike::month(&start),
        );
        let durations: Vec<f64> = requirement
            .shift_codes
            .iter()
            .filter_map(|code| shift_defs.get(code).map(|s| s.duration_hours()))
            .collect();
        let avg_shift_hours = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<f64>() / durations.len() as f64
        };
        let monthly_ot_cap = eligible
            .first()
            .map(|e| resolver.monthly_ot_cap(e, month_len))
            .unwrap_or(72.0);
        CapacityInputs {
            month_len,
            weekly_normal_cap: requirement
                .scheme
                .weekly_normal_cap(requirement.pattern.work_days_per_cycle()),
            monthly_ot_cap,
            avg_shift_hours,
        }
    }

    /// Mode selection with the outcome-based correctness fallback
    fn select_mode(
        &self,
        demand: &DemandItem,
        requirement: &Requirement,
        cohort: &[Employee],
        warnings: &mut Vec<String>,
    ) -> RosteringBasis {
        let basis = requirement.rostering_basis.unwrap_or_default();
        if basis == RosteringBasis::DemandBased {
            return basis;
        }
        // Individual leave is handled by per-employee validation after
        // replication; the fallback is for cohorts replication cannot
        // represent at all.
        let multiple_org_units = cohort.iter().any(|e| e.org_unit != demand.org_unit);
        let distinct_offsets = cohort
            .iter()
            .map(|e| e.rotation_offset)
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        let offsets_beyond_cycle = cohort.len() <= OUTCOME_FALLBACK_COHORT_LIMIT
            && distinct_offsets > requirement.pattern.cycle_len();
        if multiple_org_units || offsets_beyond_cycle {
            warn!(
                requirement = %requirement.id,
                multiple_org_units,
                distinct_offsets,
                "outcome-based cohort is not homogeneous, falling back to demand-based solving"
            );
            warnings.push(format!(
                "requirement {} fell back to demand-based solving: replication is only correct for a homogeneous cohort",
                requirement.id
            ));
            return RosteringBasis::DemandBased;
        }
        RosteringBasis::OutcomeBased
    }

    fn build_record(
        &self,
        input: &RosterInput,
        resolver: &ConstraintResolver,
        employee: &Employee,
        requirement: &Requirement,
        demand: &DemandItem,
    ) -> EmployeeRecord {
        let work_days = requirement.pattern.work_days_per_cycle();
        let limits = resolver.limits_for(employee, work_days);
        let strict_adherence_ratio = requirement
            .strict_adherence_ratio
            .or_else(|| self.strict_ratios.optimal_ratio(&requirement.id))
            .unwrap_or(input.solver_config.strict_adherence_ratio);
        let mut monthly_ot_caps = BTreeMap::new();
        for (year, month) in input.horizon.months() {
            let cap = resolver.monthly_ot_cap(employee, days_in_month(year, month));
            monthly_ot_caps.insert((year, month), cap);
        }
        EmployeeRecord {
            employee: employee.clone(),
            limits,
            pattern: Some((requirement.pattern.clone(), demand.range.start_date)),
            strict_adherence_ratio,
            monthly_ot_caps,
        }
    }

    /// One decision model over every demand-based requirement
    fn build_demand_model(
        &self,
        input: &RosterInput,
        resolver: &ConstraintResolver,
        shift_defs: &BTreeMap<String, ShiftDefinition>,
        parts: &[(&DemandItem, &Requirement, Vec<Employee>)],
    ) -> DecisionModel {
        let builder = SlotBuilder::new();
        let mut slots: Vec<Slot> = Vec::new();
        let mut records: BTreeMap<String, EmployeeRecord> = BTreeMap::new();
        let mut requirements: BTreeMap<String, Requirement> = BTreeMap::new();
        for (demand, requirement, cohort) in parts {
            slots.extend(builder.build_for_requirement(&input.horizon, demand, requirement));
            requirements.insert(requirement.id.clone(), (*requirement).clone());
            for employee in cohort {
                records
                    .entry(employee.id.clone())
                    .or_insert_with(|| {
                        self.build_record(input, resolver, employee, requirement, demand)
                    });
            }
        }
        slots.sort_by(|a, b| (a.date, &a.shift_code, &a.id).cmp(&(b.date, &b.shift_code, &b.id)));
        let slot_infos: Vec<SlotInfo> = slots
            .into_iter()
            .filter_map(|slot| {
                let Some(shift_def) = shift_defs.get(&slot.shift_code) else {
                    warn!(shift = %slot.shift_code, slot = %slot.id, "unknown shift code, dropping slot");
                    return None;
                };
                let (start, end) = shift_def.instants_on(slot.date);
                Some(SlotInfo {
                    slot,
                    start,
                    end,
                    gross_hours: shift_def.duration_hours(),
                    candidates: Vec::new(),
                })
            })
            .collect();
        DecisionModel::new(
            input.horizon.clone(),
            slot_infos,
            records.into_values().collect(),
        )
        .with_requirements(requirements)
        .with_shift_defs(shift_defs.clone())
    }

    /// Synthesises one OFF_DAY row per (employee, date) without an
    /// ASSIGNED row, so each employee's timeline covers the horizon
    fn fill_off_days(
        &self,
        assignments: &mut Vec<Assignment>,
        records: &[EmployeeRecord],
        horizon: &PlanningHorizon,
    ) {
        let mut worked: BTreeMap<&str, Vec<chrono::NaiveDate>> = BTreeMap::new();
        for row in assignments.iter() {
            if row.is_assigned() {
                if let Some(id) = &row.employee_id {
                    worked.entry(id.as_str()).or_default().push(row.date);
                }
            }
        }
        let mut off_rows = Vec::new();
        for record in records {
            let days = worked
                .get(record.employee.id.as_str())
                .cloned()
                .unwrap_or_default();
            for date in horizon.iter_dates() {
                if !days.contains(&date) {
                    off_rows.push(Assignment::off_day(&record.employee.id, date));
                }
            }
        }
        assignments.extend(off_rows);
    }
}

impl Default for GenerateRoster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{
        AssignmentStatus, ConstraintCatalog, DateRange, SolverConfig, WorkPattern,
    };
    use crate::domain::value_objects::Scheme;
    use chrono::{NaiveDate, NaiveTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn shift(code: &str, start: u32, end: u32) -> ShiftDefinition {
        ShiftDefinition::new(
            code,
            NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        )
    }

    fn small_input(pool_size: usize) -> RosterInput {
        let horizon = PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 12));
        let requirement = Requirement::new(
            "R1",
            vec!["D".to_string()],
            WorkPattern::from_codes(&["D", "D", "D", "D", "O", "O"]).unwrap(),
            1,
            Scheme::A,
        );
        let demand = DemandItem::new(
            "DM1",
            "OU1",
            DateRange::new(date(2026, 3, 1), date(2026, 3, 12)),
        )
        .with_requirement(requirement);
        let employees = (0..pool_size)
            .map(|i| Employee::new(format!("E{:02}", i), Scheme::A, "APO", "SGT", "OU1"))
            .collect();
        RosterInput {
            horizon,
            shifts: vec![shift("D", 8, 16)],
            employees,
            demand_items: vec![demand],
            catalog: ConstraintCatalog::default(),
            solver_config: SolverConfig::default(),
        }
    }

    #[test]
    fn test_complete_run_covers_every_employee_day() {
        let input = small_input(4);
        let outcome = GenerateRoster::new().execute(&input).unwrap();
        assert_eq!(outcome.status, RunStatus::Completed);

        let days = input.horizon.num_days() as usize;
        for record in &outcome.roster_employees {
            let rows: Vec<_> = outcome
                .assignments
                .iter()
                .filter(|a| a.employee_id.as_deref() == Some(record.employee.id.as_str()))
                .collect();
            assert_eq!(rows.len(), days, "employee {}", record.employee.id);
        }
    }

    #[test]
    fn test_empty_pool_yields_unassigned_and_infeasible() {
        let input = small_input(0);
        let outcome = GenerateRoster::new().execute(&input).unwrap();
        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.solve_status, SolveStatus::Infeasible);
        assert!(outcome
            .assignments
            .iter()
            .all(|a| a.status == AssignmentStatus::Unassigned));
        assert!(!outcome.assignments.is_empty());
    }

    #[test]
    fn test_cancellation_yields_no_partial_output() {
        let input = small_input(4);
        let flag = CancellationFlag::new();
        flag.cancel();
        let outcome = GenerateRoster::new()
            .with_cancellation(flag)
            .execute(&input)
            .unwrap();
        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert!(outcome.assignments.is_empty());
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let input = small_input(5);
        let first = GenerateRoster::new().execute(&input).unwrap();
        let second = GenerateRoster::new().execute(&input).unwrap();
        assert_eq!(first.assignments, second.assignments);
    }

    #[test]
    fn test_outcome_basis_falls_back_for_foreign_org_unit() {
        let mut input = small_input(3);
        input.demand_items[0].requirements[0].rostering_basis = Some(RosteringBasis::OutcomeBased);
        input.employees[1] = Employee::new("E01", Scheme::A, "APO", "SGT", "OU2");
        let outcome = GenerateRoster::new().execute(&input).unwrap();
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.contains("fell back to demand-based")));
    }

    #[test]
    fn test_strict_ratio_provider_is_consulted() {
        let mut provider = MockStrictRatioProvider::new();
        provider
            .expect_optimal_ratio()
            .returning(|_| Some(0.5))
            .times(1..);
        let input = small_input(3);
        let outcome = GenerateRoster::new()
            .with_strict_ratio_provider(Box::new(provider))
            .execute(&input)
            .unwrap();
        assert!(outcome
            .roster_employees
            .iter()
            .all(|r| (r.strict_adherence_ratio - 0.5).abs() < 1e-9));
    }
}
