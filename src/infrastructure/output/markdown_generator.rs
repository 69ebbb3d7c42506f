use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::entities::AssignmentStatus;
use crate::presentation::dto::RosterOutput;

pub struct MarkdownGenerator;

impl MarkdownGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate<P: AsRef<Path>>(&self, output: &RosterOutput, path: P) -> Result<()> {
        let markdown = self.generate_string(output)?;
        let mut file = File::create(path)?;
        file.write_all(markdown.as_bytes())?;
        Ok(())
    }

    pub fn generate_string(&self, output: &RosterOutput) -> Result<String> {
        let mut md = String::new();

        md.push_str("# Roster Generation Report\n\n");

        md.push_str("## Run Summary\n\n");
        md.push_str(&format!("- **Run Status**: {}\n", output.solver_run.status));
        md.push_str(&format!(
            "- **Solve Status**: {}\n",
            output.solver_run.solve_status
        ));
        md.push_str(&format!(
            "- **Wall Time**: {:.2} s\n",
            output.solver_run.wall_time_seconds
        ));
        md.push_str(&format!("- **Seed**: {}\n", output.solver_run.seed));
        md.push_str(&format!(
            "- **Hard Violations**: {}\n",
            output.score.hard_violations
        ));
        md.push_str(&format!(
            "- **Soft Penalty**: {:.1}\n",
            output.score.soft_penalty
        ));
        md.push_str(&format!(
            "- **Unassigned Slots**: {}\n\n",
            output.score.unassigned_slots
        ));

        let assigned = output
            .assignments
            .iter()
            .filter(|a| a.status == AssignmentStatus::Assigned)
            .count();
        let off_days = output
            .assignments
            .iter()
            .filter(|a| a.status == AssignmentStatus::OffDay)
            .count();
        md.push_str("## Coverage\n\n");
        md.push_str(&format!("- Assigned shifts: {}\n", assigned));
        md.push_str(&format!(
            "- Unassigned slots: {}\n",
            output.score.unassigned_slots
        ));
        md.push_str(&format!("- Off-day rows: {}\n\n", off_days));

        md.push_str("## Employee Monthly Totals\n\n");
        md.push_str("| Employee | Month | Gross | Normal | OT | RDP | Paid |\n");
        md.push_str("|----------|-------|-------|--------|----|-----|------|\n");
        for roster in &output.employee_roster {
            for totals in &roster.monthly_totals {
                md.push_str(&format!(
                    "| {} | {}-{:02} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} |\n",
                    roster.employee_id,
                    totals.year,
                    totals.month,
                    totals.gross,
                    totals.normal,
                    totals.ot,
                    totals.rest_day_pay,
                    totals.paid,
                ));
            }
        }
        md.push('\n');

        if !output.warnings.is_empty() {
            md.push_str("## Warnings\n\n");
            for warning in &output.warnings {
                md.push_str(&format!("- {}\n", warning));
            }
        }

        Ok(md)
    }
}

impl Default for MarkdownGenerator {
    fn default() -> Self {
        Self::new()
    }
}
