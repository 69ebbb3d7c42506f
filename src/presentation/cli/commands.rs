//! CLI Commands module
//!
//! Command implementations for the CLI interface: roster generation with
//! report writing and a console summary, and standalone input
//! validation.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::application::use_cases::GenerateRoster;
use crate::domain::entities::AssignmentStatus;
use crate::infrastructure::output::{CsvGenerator, MarkdownGenerator};
use crate::infrastructure::parsers::RosterInputParser;
use crate::presentation::dto::RosterOutput;

/// Command for generating a roster and writing the output documents
pub struct GenerateCommand;

impl GenerateCommand {
    /// Executes the generate command
    ///
    /// Parses the input document, runs the generation pipeline, writes
    /// the requested output formats and prints a summary to the console.
    ///
    /// # Errors
    ///
    /// Returns an error if the input document is invalid, the pipeline
    /// fails structurally, or an output file cannot be written.
    pub fn execute<P: AsRef<Path>>(
        input_path: P,
        output_dir: P,
        generate_json: bool,
        generate_csv: bool,
        generate_markdown: bool,
    ) -> Result<()> {
        info!("Starting roster generation...");

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.set_message("📖 Parsing input document...");
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));

        let parser = RosterInputParser::new();
        info!("Parsing input document: {:?}", input_path.as_ref());
        let input = parser
            .parse_file(&input_path)
            .context("Failed to parse roster input document")?;
        spinner.set_message(format!(
            "🧮 Solving roster for {} employees over {} days...",
            input.employees.len(),
            input.horizon.num_days()
        ));

        let use_case = GenerateRoster::new();
        let outcome = use_case
            .execute(&input)
            .context("Failed to generate roster")?;
        spinner.finish_with_message(format!(
            "✓ Generation finished with status {}",
            outcome.solve_status
        ));

        if outcome.status == crate::domain::value_objects::RunStatus::Cancelled {
            warn!("Run was cancelled; no output emitted");
            return Ok(());
        }

        let output = RosterOutput::from_generation(outcome);

        fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

        if generate_json {
            let json_path = output_dir.as_ref().join("roster.json");
            info!("Generating JSON document: {:?}", json_path);
            output
                .write_json(&json_path)
                .context("Failed to generate JSON document")?;
        }

        if generate_csv {
            let csv_path = output_dir.as_ref().join("roster.csv");
            info!("Generating assignment CSV: {:?}", csv_path);
            let csv_gen = CsvGenerator::new();
            csv_gen
                .generate(&output, &csv_path)
                .context("Failed to generate assignment CSV")?;

            let summary_path = output_dir.as_ref().join("employee_summary.csv");
            info!("Generating employee summary CSV: {:?}", summary_path);
            csv_gen
                .generate_employee_summary(&output, &summary_path)
                .context("Failed to generate employee summary CSV")?;
        }

        if generate_markdown {
            let md_path = output_dir.as_ref().join("roster.md");
            info!("Generating Markdown report: {:?}", md_path);
            let md_gen = MarkdownGenerator::new();
            md_gen
                .generate(&output, &md_path)
                .context("Failed to generate Markdown report")?;
        }

        info!("Roster generation complete!");

        Self::print_summary(&output);

        Ok(())
    }

    /// Prints a generation summary to the console
    fn print_summary(output: &RosterOutput) {
        println!("\n{}", "=".repeat(80));
        println!("📅 ROSTER GENERATION SUMMARY");
        println!("{}", "=".repeat(80));

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

        println!("\n📈 Run:");
        println!("  • Status:                  {}", output.solver_run.status);
        println!("  • Solve status:            {}", output.solver_run.solve_status);
        println!(
            "  • Wall time:               {:.2} s",
            output.solver_run.wall_time_seconds
        );
        println!("  • Seed:                    {}", output.solver_run.seed);

        println!("\n🎯 Coverage:");
        println!("  • Assigned shifts:         {}", assigned);
        println!("  • Unassigned slots:        {}", output.score.unassigned_slots);
        println!("  • Off-day rows:            {}", off_days);
        println!("  • Employees rostered:      {}", output.employee_roster.len());

        println!("\n⚖️  Score:");
        println!("  • Hard violations:         {}", output.score.hard_violations);
        println!("  • Soft penalty:            {:.1}", output.score.soft_penalty);

        if !output.warnings.is_empty() {
            println!("\n⚠️  Warnings ({} total):", output.warnings.len());
            for warning in output.warnings.iter().take(5) {
                println!("  • {}", warning);
            }
            if output.warnings.len() > 5 {
                println!("  ... and {} more warnings", output.warnings.len() - 5);
            }
        }

        println!("\n{}", "=".repeat(80));
    }
}

/// Command for validating an input document without solving
pub struct ValidateCommand;

impl ValidateCommand {
    pub fn execute<P: AsRef<Path>>(input_path: P) -> Result<()> {
        info!("Validating input document: {:?}", input_path.as_ref());

        let parser = RosterInputParser::new();
        let input = parser
            .parse_file(&input_path)
            .context("Input document is invalid")?;

        let requirement_count: usize = input
            .demand_items
            .iter()
            .map(|d| d.requirements.len())
            .sum();

        println!("\n{}", "=".repeat(80));
        println!("✅ INPUT DOCUMENT IS VALID");
        println!("{}", "=".repeat(80));
        println!("\n📋 Contents:");
        println!(
            "  • Planning horizon:        {} → {} ({} days)",
            input.horizon.start(),
            input.horizon.end(),
            input.horizon.num_days()
        );
        println!("  • Public holidays:         {}", input.horizon.public_holidays.len());
        println!("  • Shift definitions:       {}", input.shifts.len());
        println!("  • Employees:               {}", input.employees.len());
        println!("  • Demand items:            {}", input.demand_items.len());
        println!("  • Requirements:            {}", requirement_count);
        println!("  • Constraint records:      {}", input.catalog.records.len());
        println!(
            "  • Time limit:              {} s",
            input.solver_config.time_limit_seconds
        );
        println!("{}", "=".repeat(80));

        Ok(())
    }
}
