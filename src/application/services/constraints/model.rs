//! Decision model for roster solving
//!
//! The decision model carries everything a solve needs: the slots to
//! cover, the employees with their resolved limits and patterns, and the
//! per-slot candidate lists produced by static eligibility screening.
//! `RosterState` is the mutable assignment matrix the search engine and
//! the constraint rules operate on.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::application::services::constraint_resolver::EmployeeLimits;
use crate::application::services::hour_calculator::{lunch_for, per_day_normal_cap};
use crate::domain::entities::{
    Employee, PlanningHorizon, Requirement, ShiftDefinition, Slot, WorkPattern,
};

/// One employee enriched with the configuration a solve needs
#[derive(Debug, Clone)]
pub struct EmployeeRecord {
    pub employee: Employee,
    pub limits: EmployeeLimits,
    /// The work pattern the employee rotates through, with its anchor
    /// date; None when no requirement claimed the employee
    pub pattern: Option<(WorkPattern, NaiveDate)>,
    /// Fraction of work dates that must match the pattern exactly
    pub strict_adherence_ratio: f64,
    /// Resolved monthly overtime cap per (year, month) the horizon spans
    pub monthly_ot_caps: BTreeMap<(i32, u32), f64>,
}

impl EmployeeRecord {
    /// Estimated normal hours of a net shift, before exact accounting
    ///
    /// # Arguments
    ///
    /// * `net_hours` - Net hours of the day after the lunch deduction
    ///
    /// # Returns
    ///
    /// The net hours clamped at the pattern-derived daily normal cap
    pub fn estimated_normal(&self, net_hours: f64) -> f64 {
        let work_days = self
            .pattern
            .as_ref()
            .map(|(p, _)| p.work_days_per_cycle())
            .unwrap_or(5);
        net_hours.min(per_day_normal_cap(self.limits.daily_gross_cap, work_days))
    }
}

/// One slot enriched with its concrete instants and candidates
#[derive(Debug, Clone)]
pub struct SlotInfo {
    pub slot: Slot,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub gross_hours: f64,
    /// Indices into the model's employee list admitted by static
    /// eligibility screening, in ascending id order
    pub candidates: Vec<usize>,
}

impl SlotInfo {
    pub fn net_hours(&self) -> f64 {
        (self.gross_hours - lunch_for(self.gross_hours)).max(0.0)
    }
}

/// The immutable problem statement of one solve
#[derive(Debug, Clone)]
pub struct DecisionModel {
    pub horizon: PlanningHorizon,
    pub slots: Vec<SlotInfo>,
    pub employees: Vec<EmployeeRecord>,
    /// Requirements keyed by id, for per-slot eligibility lookups
    pub requirements: BTreeMap<String, Requirement>,
    /// Shift definitions keyed by code
    pub shift_defs: BTreeMap<String, ShiftDefinition>,
}

impl DecisionModel {
    pub fn new(
        horizon: PlanningHorizon,
        slots: Vec<SlotInfo>,
        employees: Vec<EmployeeRecord>,
    ) -> Self {
        Self {
            horizon,
            slots,
            employees,
            requirements: BTreeMap::new(),
            shift_defs: BTreeMap::new(),
        }
    }

    pub fn with_requirements(mut self, requirements: BTreeMap<String, Requirement>) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_shift_defs(mut self, shift_defs: BTreeMap<String, ShiftDefinition>) -> Self {
        self.shift_defs = shift_defs;
        self
    }

    /// The requirement the slot belongs to, when known to the model
    pub fn requirement_of(&self, slot_idx: usize) -> Option<&Requirement> {
        self.requirements
            .get(&self.slots[slot_idx].slot.requirement_id)
    }

    /// slot-count × employee-count, the size the worker-thread default
    /// derives from
    pub fn problem_size(&self) -> usize {
        self.slots.len() * self.employees.len()
    }
}

/// The mutable assignment matrix of a solve
///
/// Tracks, per employee, the assigned slots grouped by date so the rules
/// can query a day or a window without scanning every slot.
#[derive(Debug, Clone)]
pub struct RosterState {
    assigned: Vec<Option<usize>>,
    by_employee: Vec<BTreeMap<NaiveDate, Vec<usize>>>,
}

impl RosterState {
    pub fn new(model: &DecisionModel) -> Self {
        Self {
            assigned: vec![None; model.slots.len()],
            by_employee: vec![BTreeMap::new(); model.employees.len()],
        }
    }

    pub fn employee_of(&self, slot_idx: usize) -> Option<usize> {
        self.assigned[slot_idx]
    }

    pub fn assignments(&self) -> &[Option<usize>] {
        &self.assigned
    }

    pub fn assign(&mut self, model: &DecisionModel, slot_idx: usize, emp_idx: usize) {
        debug_assert!(self.assigned[slot_idx].is_none(), "slot already filled");
        self.assigned[slot_idx] = Some(emp_idx);
        let date = model.slots[slot_idx].slot.date;
        let day = self.by_employee[emp_idx].entry(date).or_default();
        day.push(slot_idx);
        day.sort_unstable();
    }

    pub fn unassign(&mut self, model: &DecisionModel, slot_idx: usize) {
        if let Some(emp_idx) = self.assigned[slot_idx].take() {
            let date = model.slots[slot_idx].slot.date;
            if let Some(day) = self.by_employee[emp_idx].get_mut(&date) {
                day.retain(|s| *s != slot_idx);
                if day.is_empty() {
                    self.by_employee[emp_idx].remove(&date);
                }
            }
        }
    }

    /// Slot indices the employee holds on the given date
    pub fn slots_on(&self, emp_idx: usize, date: NaiveDate) -> &[usize] {
        self.by_employee[emp_idx]
            .get(&date)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Dates the employee works, in chronological order
    pub fn work_dates(&self, emp_idx: usize) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_employee[emp_idx].keys().copied()
    }

    /// (date, slot indices) pairs of the employee, chronological
    pub fn days_of(&self, emp_idx: usize) -> impl Iterator<Item = (NaiveDate, &[usize])> + '_ {
        self.by_employee[emp_idx]
            .iter()
            .map(|(date, slots)| (*date, slots.as_slice()))
    }

    pub fn is_working(&self, emp_idx: usize, date: NaiveDate) -> bool {
        self.by_employee[emp_idx].contains_key(&date)
    }

    /// Net hours (after lunch) the employee holds on the given date
    pub fn net_hours_on(&self, model: &DecisionModel, emp_idx: usize, date: NaiveDate) -> f64 {
        self.slots_on(emp_idx, date)
            .iter()
            .map(|s| model.slots[*s].net_hours())
            .sum()
    }

    /// Number of employees with at least one assignment
    pub fn employees_used(&self) -> usize {
        self.by_employee.iter().filter(|m| !m.is_empty()).count()
    }

    /// Number of unfilled slots
    pub fn unassigned_count(&self) -> usize {
        self.assigned.iter().filter(|a| a.is_none()).count()
    }

    /// Length of the consecutive work-day run that would contain `date`
    /// if the employee worked it
    ///
    /// # Arguments
    ///
    /// * `emp_idx` - Index of the employee in the model
    /// * `date` - The candidate work date
    ///
    /// # Returns
    ///
    /// The run length in days, counting `date` itself plus the worked
    /// days touching it on both sides
    pub fn run_length_through(&self, emp_idx: usize, date: NaiveDate) -> usize {
        let mut run = 1;
        let mut cursor = date.pred_opt();
        while let Some(day) = cursor {
            if self.is_working(emp_idx, day) {
                run += 1;
                cursor = day.pred_opt();
            } else {
                break;
            }
        }
        let mut cursor = date.succ_opt();
        while let Some(day) = cursor {
            if self.is_working(emp_idx, day) {
                run += 1;
                cursor = day.succ_opt();
            } else {
                break;
            }
        }
        run
    }
}
