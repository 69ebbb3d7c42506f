//! Roster output document (schema 0.95)
//!
//! The output assembler: turns a finished generation into the stable
//! wire document. Ordering is deterministic, assignments by (date,
//! shift code, slot id) and employees by id, so identical runs emit
//! byte-identical documents.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::application::use_cases::GenerationOutcome;
use crate::domain::entities::{Assignment, AssignmentStatus, SCHEMA_VERSION};
use crate::domain::value_objects::{RunStatus, SolveStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterOutput {
    pub schema_version: String,
    pub solver_run: SolverRunOutput,
    pub score: ScoreOutput,
    pub assignments: Vec<Assignment>,
    pub employee_roster: Vec<EmployeeRosterOutput>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverRunOutput {
    pub status: RunStatus,
    pub solve_status: SolveStatus,
    pub wall_time_seconds: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutput {
    pub hard_violations: usize,
    pub soft_penalty: f64,
    pub unassigned_slots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRosterOutput {
    pub employee_id: String,
    pub monthly_totals: Vec<MonthlyTotalsOutput>,
    pub daily_timeline: Vec<DailyStatusOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotalsOutput {
    pub year: i32,
    pub month: u32,
    pub gross: f64,
    pub normal: f64,
    pub ot: f64,
    pub rest_day_pay: f64,
    pub paid: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatusOutput {
    pub date: NaiveDate,
    pub status: AssignmentStatus,
    pub shift_code: String,
}

impl RosterOutput {
    /// Assembles the output document from a finished generation
    pub fn from_generation(outcome: GenerationOutcome) -> Self {
        let unassigned_slots = outcome
            .assignments
            .iter()
            .filter(|a| a.status == AssignmentStatus::Unassigned)
            .count();

        let mut per_employee: BTreeMap<String, Vec<&Assignment>> = BTreeMap::new();
        for row in &outcome.assignments {
            if let Some(employee_id) = &row.employee_id {
                per_employee.entry(employee_id.clone()).or_default().push(row);
            }
        }

        let employee_roster = per_employee
            .into_iter()
            .map(|(employee_id, rows)| Self::employee_entry(employee_id, rows))
            .collect();

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            solver_run: SolverRunOutput {
                status: outcome.status,
                solve_status: outcome.solve_status,
                wall_time_seconds: outcome.wall_time_seconds,
                seed: outcome.seed,
            },
            score: ScoreOutput {
                hard_violations: outcome.hard_violations,
                soft_penalty: outcome.soft_penalty,
                unassigned_slots,
            },
            assignments: outcome.assignments,
            employee_roster,
            warnings: outcome.warnings,
        }
    }

    /// Renders the document as pretty-printed JSON
    ///
    /// The wire document is the authoritative run record, so it is
    /// always pretty-printed for auditability.
    ///
    /// # Returns
    ///
    /// The JSON text of the document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the pretty-printed JSON document to disk
    ///
    /// # Arguments
    ///
    /// * `path` - Destination file path
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails or the file cannot be
    /// written.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    fn employee_entry(employee_id: String, mut rows: Vec<&Assignment>) -> EmployeeRosterOutput {
        rows.sort_by_key(|row| (row.date, row.start_date_time));

        let mut monthly: BTreeMap<(i32, u32), MonthlyTotalsOutput> = BTreeMap::new();
        for row in rows.iter().filter(|r| r.is_assigned()) {
            let entry = monthly
                .entry((row.date.year(), row.date.month()))
                .or_insert_with(|| MonthlyTotalsOutput {
                    year: row.date.year(),
                    month: row.date.month(),
                    gross: 0.0,
                    normal: 0.0,
                    ot: 0.0,
                    rest_day_pay: 0.0,
                    paid: 0.0,
                });
            entry.gross += row.hours.gross;
            entry.normal += row.hours.normal;
            entry.ot += row.hours.ot;
            entry.rest_day_pay += row.hours.rest_day_pay;
            entry.paid += row.hours.paid;
        }

        // One timeline entry per date; a part-timer's two shifts join
        // their codes.
        let mut timeline: BTreeMap<NaiveDate, DailyStatusOutput> = BTreeMap::new();
        for row in &rows {
            timeline
                .entry(row.date)
                .and_modify(|entry| {
                    if row.is_assigned() && entry.status == AssignmentStatus::Assigned {
                        entry.shift_code = format!("{}+{}", entry.shift_code, row.shift_code);
                    } else if row.is_assigned() {
                        entry.status = AssignmentStatus::Assigned;
                        entry.shift_code = row.shift_code.clone();
                    }
                })
                .or_insert_with(|| DailyStatusOutput {
                    date: row.date,
                    status: row.status,
                    shift_code: row.shift_code.clone(),
                });
        }

        EmployeeRosterOutput {
            employee_id,
            monthly_totals: monthly.into_values().collect(),
            daily_timeline: timeline.into_values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Slot;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn outcome_with_rows(assignments: Vec<Assignment>) -> GenerationOutcome {
        GenerationOutcome {
            status: RunStatus::Completed,
            solve_status: SolveStatus::Optimal,
            assignments,
            roster_employees: Vec::new(),
            warnings: vec!["note".to_string()],
            hard_violations: 0,
            soft_penalty: 0.0,
            wall_time_seconds: 1.5,
            seed: 7,
        }
    }

    fn assigned(employee: &str, day: NaiveDate) -> Assignment {
        let slot = Slot::new("DM1", "R1", day, "D", 0);
        let start = day.and_hms_opt(8, 0, 0).unwrap();
        let mut row = Assignment::assigned(&slot, employee, start, start + Duration::hours(12));
        row.hours = crate::domain::value_objects::HourBreakdown::new(12.0, 1.0, 8.8, 2.2, 0.0);
        row
    }

    #[test]
    fn test_document_shape_and_totals() {
        let rows = vec![
            assigned("E1", date(2026, 3, 1)),
            assigned("E1", date(2026, 3, 2)),
            Assignment::off_day("E1", date(2026, 3, 3)),
        ];
        let output = RosterOutput::from_generation(outcome_with_rows(rows));

        assert_eq!(output.schema_version, "0.95");
        assert_eq!(output.solver_run.seed, 7);
        assert_eq!(output.score.unassigned_slots, 0);
        assert_eq!(output.employee_roster.len(), 1);

        let roster = &output.employee_roster[0];
        assert_eq!(roster.monthly_totals.len(), 1);
        let totals = &roster.monthly_totals[0];
        assert!((totals.normal - 17.6).abs() < 1e-9);
        assert!((totals.ot - 4.4).abs() < 1e-9);
        assert_eq!(roster.daily_timeline.len(), 3);
        assert_eq!(roster.daily_timeline[2].status, AssignmentStatus::OffDay);
        assert_eq!(roster.daily_timeline[2].shift_code, "O");
    }

    #[test]
    fn test_unassigned_rows_counted_in_score() {
        let slot = Slot::new("DM1", "R1", date(2026, 3, 1), "D", 0);
        let start = date(2026, 3, 1).and_hms_opt(8, 0, 0).unwrap();
        let rows = vec![Assignment::unassigned(&slot, start, start + Duration::hours(12))];
        let output = RosterOutput::from_generation(outcome_with_rows(rows));
        assert_eq!(output.score.unassigned_slots, 1);
        // An unassigned slot belongs to no employee roster.
        assert!(output.employee_roster.is_empty());
    }

    #[test]
    fn test_json_document_carries_full_rows() {
        let rows = vec![
            assigned("E1", date(2026, 3, 1)),
            Assignment::off_day("E1", date(2026, 3, 2)),
        ];
        let output = RosterOutput::from_generation(outcome_with_rows(rows));
        let json = output.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        // The document is pretty-printed for auditing.
        assert!(json.contains("\n  "));
        assert_eq!(parsed["schemaVersion"], "0.95");
        assert_eq!(parsed["solverRun"]["wallTimeSeconds"], 1.5);

        // Every assignment row carries the full field set, OFF_DAY rows
        // included.
        let rows = parsed["assignments"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        for row in rows {
            for field in [
                "assignmentId",
                "slotId",
                "employeeId",
                "demandId",
                "requirementId",
                "date",
                "shiftCode",
                "status",
                "startDateTime",
                "endDateTime",
                "hours",
            ] {
                assert!(row.get(field).is_some(), "field {field} absent");
            }
            assert!(row["hours"]["restDayPay"].is_number());
        }
        let off_row = &rows[1];
        assert_eq!(off_row["status"], "OFF_DAY");
        assert_eq!(off_row["shiftCode"], "O");
        assert!(off_row["demandId"].is_null());

        let roster = parsed["employeeRoster"].as_array().unwrap();
        assert_eq!(roster[0]["employeeId"], "E1");
        assert_eq!(roster[0]["dailyTimeline"].as_array().unwrap().len(), 2);
    }
}
