//! # DHF CLI
//!
//! Command-line time travel through DHF document histories.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;

use cli::{Cli, Command};
use config::CliConfig;

fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::from_env()?;
    let format = cli.format.unwrap_or(config.format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        ?format,
        trace = config.engine.trace,
        "Starting dhf"
    );

    let output = match cli.command {
        Command::Show(args) => {
            let document = commands::load(&args.file)?;
            commands::show(&document, &args.at, &config, format)?
        }
        Command::Log(args) => commands::log(&commands::load(&args.file)?, format)?,
        Command::Search(args) => {
            commands::search_document(&commands::load(&args.file)?, &args.query, format)?
        }
        Command::Validate(args) => {
            let document = commands::load(&args.file)?;
            let (output, valid) = commands::validate_document(&document, format)?;
            print!("{output}");
            if !valid {
                std::process::exit(1);
            }
            return Ok(());
        }
        Command::Summary(args) => commands::summary(&commands::load(&args.file)?, format)?,
    };

    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}
