//! Capacity planner service module (ICPMP)
//!
//! The capacity preprocessor reduces an oversubscribed employee pool to a
//! count the downstream solve can actually assign, tagging each selected
//! employee with a rotation offset so coverage aligns with the demand
//! pattern. It never blocks the pipeline: pool exhaustion and internal
//! failures degrade to warnings.

use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::application::services::hour_calculator::lunch_for;
use crate::domain::entities::{Employee, Requirement};

/// Result of capacity planning for one requirement
#[derive(Debug, Clone)]
pub struct CapacityPlan {
    /// Selected employees, re-tagged with balanced rotation offsets
    pub selected: Vec<Employee>,
    pub warnings: Vec<String>,
}

/// Inputs the planner needs beyond the requirement itself
#[derive(Debug, Clone, Copy)]
pub struct CapacityInputs {
    /// Days in the planning month
    pub month_len: u32,
    /// Scheme weekly normal cap in hours
    pub weekly_normal_cap: f64,
    /// Scheme monthly overtime cap in hours
    pub monthly_ot_cap: f64,
    /// Average gross duration of the requirement's shifts in hours
    pub avg_shift_hours: f64,
}

/// The ICPMP capacity preprocessor
pub struct CapacityPlanner;

impl CapacityPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plans capacity for one requirement, degrading on internal failure
    ///
    /// On any internal error the original pool is passed through
    /// unchanged with a warning; feasibility is the solve engine's call.
    ///
    /// # Arguments
    ///
    /// * `requirement` - The requirement to size the pool for
    /// * `pool` - Eligible employees after requirement-level filtering
    /// * `inputs` - Month length, caps and average shift duration
    ///
    /// # Returns
    ///
    /// The selected employees with re-tagged offsets, plus any warnings
    pub fn plan(
        &self,
        requirement: &Requirement,
        pool: &[Employee],
        inputs: CapacityInputs,
    ) -> CapacityPlan {
        match self.plan_inner(requirement, pool, inputs) {
            Ok(plan) => plan,
            Err(error) => {
                warn!(
                    requirement = %requirement.id,
                    %error,
                    "capacity planning failed, passing the unfiltered pool through"
                );
                CapacityPlan {
                    selected: pool.to_vec(),
                    warnings: vec![format!(
                        "ICPMP failed for requirement {}: {}; continuing with {} unfiltered employees",
                        requirement.id,
                        error,
                        pool.len()
                    )],
                }
            }
        }
    }

    fn plan_inner(
        &self,
        requirement: &Requirement,
        pool: &[Employee],
        inputs: CapacityInputs,
    ) -> Result<CapacityPlan> {
        let mut warnings = Vec::new();
        let cycle_len = requirement.pattern.cycle_len();
        let work_days = requirement.pattern.work_days_per_cycle();
        if work_days == 0 {
            bail!("pattern {} has no work day", requirement.pattern);
        }
        if inputs.avg_shift_hours <= 0.0 {
            bail!("requirement references no positive-length shift");
        }

        let raw = if requirement.enable_ot_aware_icpmp {
            self.ot_aware_optimum(requirement, inputs, work_days, cycle_len)?
        } else {
            self.combinatorial_optimum(requirement, work_days, cycle_len)
        };

        // The OT-aware arithmetic already carries its own slack; applying
        // the percentage buffer again would double-count it.
        let buffered = if requirement.enable_ot_aware_icpmp {
            raw
        } else {
            (raw as f64 * (1.0 + requirement.icpmp_buffer_percentage / 100.0)).ceil() as usize
        };

        let count = if buffered > pool.len() {
            warnings.push(format!(
                "requirement {} needs {} employees but only {} are eligible; continuing short-handed",
                requirement.id,
                buffered,
                pool.len()
            ));
            pool.len()
        } else {
            buffered
        };

        debug!(
            requirement = %requirement.id,
            raw,
            buffered,
            count,
            pool = pool.len(),
            ot_aware = requirement.enable_ot_aware_icpmp,
            "capacity plan computed"
        );

        let mut sorted: Vec<Employee> = pool.to_vec();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        let mut selected: Vec<Employee> = sorted.into_iter().take(count).collect();

        // Cyclic distribution: each offset in {0..L-1} ends up used
        // ceil(count/L) or floor(count/L) times.
        for (index, employee) in selected.iter_mut().enumerate() {
            employee.rotation_offset = index % cycle_len;
        }

        Ok(CapacityPlan { selected, warnings })
    }

    /// Combinatorial minimum: ceil(H × L / w)
    ///
    /// # Returns
    ///
    /// The raw employee count before buffering
    fn combinatorial_optimum(
        &self,
        requirement: &Requirement,
        work_days: usize,
        cycle_len: usize,
    ) -> usize {
        let headcount = requirement.headcount;
        (headcount * cycle_len + work_days - 1) / work_days
    }

    /// Monthly-hour-aware minimum
    ///
    /// Each employee contributes up to four weeks of normal hours plus the
    /// monthly overtime cap, less the lunch deduction over the work days
    /// the pattern gives them in the month. The demand consumes
    /// headcount × month length × average shift hours.
    ///
    /// # Returns
    ///
    /// The monthly-hour-aware employee count; its slack replaces the
    /// percentage buffer
    fn ot_aware_optimum(
        &self,
        requirement: &Requirement,
        inputs: CapacityInputs,
        work_days: usize,
        cycle_len: usize,
    ) -> Result<usize> {
        let expected_work_days =
            inputs.month_len as f64 * work_days as f64 / cycle_len as f64;
        let lunch_total = expected_work_days * lunch_for(inputs.avg_shift_hours);
        let capacity_per_employee =
            inputs.weekly_normal_cap * 4.0 + inputs.monthly_ot_cap - lunch_total;
        if capacity_per_employee <= 0.0 {
            bail!(
                "per-employee monthly capacity is non-positive ({:.2} h)",
                capacity_per_employee
            );
        }
        let required_hours =
            requirement.headcount as f64 * inputs.month_len as f64 * inputs.avg_shift_hours;
        Ok((required_hours / capacity_per_employee).ceil() as usize)
    }
}

impl Default for CapacityPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::WorkPattern;
    use crate::domain::value_objects::Scheme;

    fn pool(size: usize) -> Vec<Employee> {
        (0..size)
            .map(|i| Employee::new(format!("E{:02}", i), Scheme::A, "APO", "SGT", "OU1"))
            .collect()
    }

    fn requirement(pattern: &[&str], headcount: usize) -> Requirement {
        Requirement::new(
            "R1",
            vec!["D".to_string()],
            WorkPattern::from_codes(pattern).unwrap(),
            headcount,
            Scheme::A,
        )
    }

    fn inputs() -> CapacityInputs {
        CapacityInputs {
            month_len: 31,
            weekly_normal_cap: 44.0,
            monthly_ot_cap: 72.0,
            avg_shift_hours: 8.0,
        }
    }

    #[test]
    fn test_combinatorial_optimum_with_buffer() {
        // ceil(2 × 6 / 4) = 3 raw, 20% buffer → ceil(3.6) = 4.
        let req = requirement(&["D", "D", "N", "N", "O", "O"], 2);
        let plan = CapacityPlanner::new().plan(&req, &pool(10), inputs());
        assert_eq!(plan.selected.len(), 4);
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_ot_aware_does_not_double_buffer() {
        // Per-employee capacity: 44×4 + 72 − 31×5/7×1 ≈ 225.86 h.
        // Required: 10 × 31 × 8 = 2480 h → ceil(10.98) = 11 raw.
        // With buffer at 50% the count must stay 11.
        let mut req = requirement(&["D", "D", "D", "D", "D", "O", "O"], 10);
        req.enable_ot_aware_icpmp = true;
        req.icpmp_buffer_percentage = 50.0;
        let plan = CapacityPlanner::new().plan(&req, &pool(20), inputs());
        assert_eq!(plan.selected.len(), 11);
    }

    #[test]
    fn test_pool_exhaustion_degrades_with_warning() {
        let req = requirement(&["D", "D", "N", "N", "O", "O"], 4);
        // Raw 6, buffered 8, pool only 5.
        let plan = CapacityPlanner::new().plan(&req, &pool(5), inputs());
        assert_eq!(plan.selected.len(), 5);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("short-handed"));
    }

    #[test]
    fn test_offsets_distributed_cyclically() {
        let req = requirement(&["D", "D", "O"], 2);
        let plan = CapacityPlanner::new().plan(&req, &pool(9), inputs());
        // Raw ceil(2×3/2)=3, buffered ceil(3.6)=4.
        assert_eq!(plan.selected.len(), 4);
        let offsets: Vec<usize> = plan.selected.iter().map(|e| e.rotation_offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_internal_failure_returns_unfiltered_pool() {
        let mut req = requirement(&["D", "D", "O"], 2);
        req.enable_ot_aware_icpmp = true;
        let mut bad_inputs = inputs();
        bad_inputs.avg_shift_hours = 0.0;
        let plan = CapacityPlanner::new().plan(&req, &pool(7), bad_inputs);
        assert_eq!(plan.selected.len(), 7);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("ICPMP failed"));
    }

    #[test]
    fn test_selection_is_deterministic_by_id() {
        let mut shuffled = pool(6);
        shuffled.reverse();
        let req = requirement(&["D", "D", "O"], 1);
        let plan = CapacityPlanner::new().plan(&req, &shuffled, inputs());
        let ids: Vec<&str> = plan.selected.iter().map(|e| e.id.as_str()).collect();
        // Raw ceil(3/2)=2, buffered ceil(2.4)=3; lowest ids win.
        assert_eq!(ids, vec!["E00", "E01", "E02"]);
    }
}
