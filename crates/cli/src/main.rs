// rentledger CLI - headless reconciliation operations
// See SPEC_FULL.md for the engine contract

mod exit_codes;
mod ingest;
mod reconcile;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;

pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Parser)]
#[command(name = "rledger")]
#[command(about = "Bank-transaction reconciliation for the rentledger platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty ledger database
    #[command(after_help = "\
Examples:
  rledger init ledger.db")]
    Init {
        /// Path of the database to create
        db: PathBuf,
    },

    /// Import platform records from CSV
    #[command(subcommand)]
    Import(ingest::ImportCommands),

    /// Run or validate bank-transaction reconciliation
    #[command(subcommand)]
    Reconcile(reconcile::ReconcileCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { db } => ingest::cmd_init(db),
        Commands::Import(cmd) => ingest::cmd_import(cmd),
        Commands::Reconcile(cmd) => reconcile::cmd_reconcile(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(err.code)
        }
    }
}
