pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "aislefinder",
    about = "Aislefinder operator CLI",
    long_about = "Inspect config and readiness, manage the catalog store, and exercise search, \
                  aisle lookup, scan verification, checkout, and recommendations.",
    after_help = "Examples:\n  aislefinder doctor --json\n  aislefinder seed\n  \
                  aislefinder search milk\n  aislefinder checkout P100 P200 X1:Gift:5.00"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, suggestion provider readiness, and catalog store checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo catalog, or import catalog documents from a JSON file")]
    Seed {
        #[arg(long, help = "JSON object of product documents keyed by id")]
        file: Option<PathBuf>,
    },
    #[command(about = "Case-insensitive product name search")]
    Search { query: String },
    #[command(about = "Show the aisle and shelf of a product")]
    Locate { id: String },
    #[command(about = "Check a decoded scanner payload against the expected product id")]
    Verify { id: String, payload: String },
    #[command(about = "Resolve cart items (ID, ID:NAME or ID:NAME:PRICE) and price the order")]
    Checkout {
        #[arg(required = true)]
        items: Vec<String>,
    },
    #[command(about = "Recommend products to buy with the given product")]
    Recommend { id: String },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Migrate => commands::migrate::run(),
        Command::Seed { file } => commands::seed::run(file),
        Command::Search { query } => commands::catalog::search(query),
        Command::Locate { id } => commands::catalog::locate(id),
        Command::Verify { id, payload } => commands::catalog::verify(id, payload),
        Command::Checkout { items } => commands::checkout::run(items),
        Command::Recommend { id } => commands::recommend::run(id),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
