pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rosterweaver")]
#[command(author = "RosterWeaver Team")]
#[command(version = "0.1.0")]
#[command(about = "Monthly shift roster generator for regulated guarding workforces", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Generate a roster from a schema-0.95 input document")]
    Generate {
        #[arg(short, long, value_name = "FILE", help = "Input roster JSON document")]
        input: PathBuf,

        #[arg(short, long, value_name = "DIR", default_value = "output", help = "Output directory for roster documents")]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value = "all", help = "Output format")]
        format: OutputFormat,
    },

    #[command(about = "Validate an input document without solving")]
    Validate {
        #[arg(short, long, value_name = "FILE", help = "Input roster JSON document")]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    Markdown,
    All,
}

impl OutputFormat {
    pub fn should_generate_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::All)
    }

    pub fn should_generate_csv(&self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::All)
    }

    pub fn should_generate_markdown(&self) -> bool {
        matches!(self, OutputFormat::Markdown | OutputFormat::All)
    }
}
