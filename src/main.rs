use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use rosterweaver::presentation::cli::commands::{GenerateCommand, ValidateCommand};
use rosterweaver::presentation::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("rosterweaver=debug,info")
    } else {
        EnvFilter::new("rosterweaver=info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Generate {
            input,
            output,
            format,
        } => {
            GenerateCommand::execute(
                &input,
                &output,
                format.should_generate_json(),
                format.should_generate_csv(),
                format.should_generate_markdown(),
            )?;
        }
        Commands::Validate { input } => {
            ValidateCommand::execute(&input)?;
        }
    }

    Ok(())
}
