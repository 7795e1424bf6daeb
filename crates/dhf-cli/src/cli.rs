//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dhf",
    about = "Time travel through a markdown document's edit history",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format (defaults to `DHF_FORMAT`, then text)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the document as it existed at one or more commits
    Show(ShowArgs),
    /// List the commit ledger, oldest first
    Log(FileArgs),
    /// Search every version of the document
    Search(SearchArgs),
    /// Check the document for data-quality problems
    Validate(FileArgs),
    /// Compute commit and line statistics
    Summary(FileArgs),
}

#[derive(Args)]
pub struct FileArgs {
    /// Path to a DHF JSON file
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Path to a DHF JSON file
    pub file: PathBuf,

    /// Commit to reconstruct (repeatable; defaults to the latest)
    #[arg(long = "at", value_name = "COMMIT")]
    pub at: Vec<String>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Path to a DHF JSON file
    pub file: PathBuf,

    /// Text to look for (case-insensitive)
    pub query: String,
}
