use anyhow::Result;
use csv::Writer;
use std::fs::File;
use std::path::Path;

use crate::presentation::dto::RosterOutput;

pub struct CsvGenerator;

impl CsvGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Writes one row per assignment (filled, unfilled and off days)
    pub fn generate<P: AsRef<Path>>(&self, output: &RosterOutput, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut wtr = Writer::from_writer(file);

        wtr.write_record([
            "Assignment Id",
            "Slot Id",
            "Employee",
            "Demand",
            "Requirement",
            "Date",
            "Shift",
            "Status",
            "Start",
            "End",
            "Gross",
            "Lunch",
            "Normal",
            "OT",
            "Rest Day Pay",
            "Paid",
        ])?;

        for row in &output.assignments {
            wtr.write_record([
                row.assignment_id.as_str(),
                row.slot_id.as_str(),
                row.employee_id.as_deref().unwrap_or(""),
                row.demand_id.as_deref().unwrap_or(""),
                row.requirement_id.as_deref().unwrap_or(""),
                &row.date.to_string(),
                row.shift_code.as_str(),
                &serde_json::to_value(row.status)?
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                &row.start_date_time.to_string(),
                &row.end_date_time.to_string(),
                &format!("{:.2}", row.hours.gross),
                &format!("{:.2}", row.hours.lunch),
                &format!("{:.2}", row.hours.normal),
                &format!("{:.2}", row.hours.ot),
                &format!("{:.2}", row.hours.rest_day_pay),
                &format!("{:.2}", row.hours.paid),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Writes one row per (employee, month) with the hour totals
    pub fn generate_employee_summary<P: AsRef<Path>>(
        &self,
        output: &RosterOutput,
        path: P,
    ) -> Result<()> {
        let file = File::create(path)?;
        let mut wtr = Writer::from_writer(file);
        wtr.write_record(["Employee", "Year", "Month", "Gross", "Normal", "OT", "Rest Day Pay", "Paid"])?;
        for roster in &output.employee_roster {
            for totals in &roster.monthly_totals {
                wtr.write_record([
                    roster.employee_id.as_str(),
                    &totals.year.to_string(),
                    &totals.month.to_string(),
                    &format!("{:.2}", totals.gross),
                    &format!("{:.2}", totals.normal),
                    &format!("{:.2}", totals.ot),
                    &format!("{:.2}", totals.rest_day_pay),
                    &format!("{:.2}", totals.paid),
                ])?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Default for CsvGenerator {
    fn default() -> Self {
        Self::new()
    }
}
