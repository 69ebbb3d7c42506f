//! Slot and assignment entity module
//!
//! A slot is one atomic coverage need in demand-based mode: a (demand
//! item, requirement, date, shift code, position index) tuple with a
//! stable identifier. An assignment is one output row: a filled slot, an
//! unfillable slot, or a synthesised off day.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::HourBreakdown;

/// One atomic coverage need
///
/// Slot ids are stable across runs for identical input; they are derived
/// from the demand item, requirement, shift, date and position index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    pub demand_id: String,
    pub requirement_id: String,
    pub date: NaiveDate,
    pub shift_code: String,
    pub position_index: usize,
}

impl Slot {
    /// Derives the stable slot id for the given coordinates
    pub fn stable_id(
        demand_id: &str,
        requirement_id: &str,
        shift_code: &str,
        date: NaiveDate,
        position_index: usize,
    ) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            demand_id, requirement_id, shift_code, date, position_index
        )
    }

    pub fn new(
        demand_id: impl Into<String>,
        requirement_id: impl Into<String>,
        date: NaiveDate,
        shift_code: impl Into<String>,
        position_index: usize,
    ) -> Self {
        let demand_id = demand_id.into();
        let requirement_id = requirement_id.into();
        let shift_code = shift_code.into();
        let id = Self::stable_id(&demand_id, &requirement_id, &shift_code, date, position_index);
        Self {
            id,
            demand_id,
            requirement_id,
            date,
            shift_code,
            position_index,
        }
    }
}

/// Output row status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Assigned,
    Unassigned,
    OffDay,
}

/// One roster output row
///
/// Every row carries the full field set in all rostering modes. OFF_DAY
/// rows use the reserved shift code `O`, a synthetic slot id, no demand
/// or requirement reference and a zero hour breakdown; their datetime
/// range spans the civil day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub assignment_id: String,
    pub slot_id: String,
    pub employee_id: Option<String>,
    pub demand_id: Option<String>,
    pub requirement_id: Option<String>,
    pub date: NaiveDate,
    pub shift_code: String,
    pub status: AssignmentStatus,
    pub start_date_time: NaiveDateTime,
    pub end_date_time: NaiveDateTime,
    pub hours: HourBreakdown,
}

impl Assignment {
    /// Builds an ASSIGNED row for a filled slot; hours are filled in by
    /// the post-processor
    pub fn assigned(
        slot: &Slot,
        employee_id: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            assignment_id: format!("asg:{}", slot.id),
            slot_id: slot.id.clone(),
            employee_id: Some(employee_id.into()),
            demand_id: Some(slot.demand_id.clone()),
            requirement_id: Some(slot.requirement_id.clone()),
            date: slot.date,
            shift_code: slot.shift_code.clone(),
            status: AssignmentStatus::Assigned,
            start_date_time: start,
            end_date_time: end,
            hours: HourBreakdown::zero(),
        }
    }

    /// Builds an UNASSIGNED row for a slot no employee can legally fill
    pub fn unassigned(slot: &Slot, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            assignment_id: format!("asg:{}", slot.id),
            slot_id: slot.id.clone(),
            employee_id: None,
            demand_id: Some(slot.demand_id.clone()),
            requirement_id: Some(slot.requirement_id.clone()),
            date: slot.date,
            shift_code: slot.shift_code.clone(),
            status: AssignmentStatus::Unassigned,
            start_date_time: start,
            end_date_time: end,
            hours: HourBreakdown::zero(),
        }
    }

    /// Builds the synthesised OFF_DAY row for an (employee, date) pair
    pub fn off_day(employee_id: impl Into<String>, date: NaiveDate) -> Self {
        let employee_id = employee_id.into();
        let slot_id = format!("off:{}:{}", employee_id, date);
        let day_start = date.and_hms_opt(0, 0, 0).expect("midnight exists");
        let day_end = date.and_hms_opt(23, 59, 59).expect("end of day exists");
        Self {
            assignment_id: format!("asg:{}", slot_id),
            slot_id,
            employee_id: Some(employee_id),
            demand_id: None,
            requirement_id: None,
            date,
            shift_code: super::work_pattern::OFF_MARKER.to_string(),
            status: AssignmentStatus::OffDay,
            start_date_time: day_start,
            end_date_time: day_end,
            hours: HourBreakdown::zero(),
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.status == AssignmentStatus::Assigned
    }
}
