//! `rledger init` / `rledger import` — ledger setup and CSV ingestion.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use rentledger_store::{import_obligations, import_transactions, ImportError, SqliteLedger};

use crate::exit_codes::{EXIT_IMPORT_PARSE, EXIT_RUNTIME, EXIT_USAGE};
use crate::CliError;

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Import bank transactions (columns: id,date,amount,description,counterparty)
    #[command(after_help = "\
Examples:
  rledger import transactions ledger.db feed.csv --company co_1")]
    Transactions {
        /// Path to the ledger database
        db: PathBuf,
        /// CSV file to import
        csv: PathBuf,
        /// Company the records belong to
        #[arg(long)]
        company: String,
    },

    /// Import obligations (columns: id,due_date,amount,party_name,period,reference)
    #[command(after_help = "\
Examples:
  rledger import obligations ledger.db rents.csv --company co_1")]
    Obligations {
        /// Path to the ledger database
        db: PathBuf,
        /// CSV file to import
        csv: PathBuf,
        /// Company the records belong to
        #[arg(long)]
        company: String,
    },
}

fn cli_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError {
        code,
        message: msg.into(),
        hint: None,
    }
}

pub fn cmd_init(db: PathBuf) -> Result<(), CliError> {
    SqliteLedger::open(&db)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot create {}: {e}", db.display())))?;
    eprintln!("initialized {}", db.display());
    Ok(())
}

pub fn cmd_import(cmd: ImportCommands) -> Result<(), CliError> {
    match cmd {
        ImportCommands::Transactions { db, csv, company } => {
            let (ledger, csv_data) = open_inputs(&db, &csv, &company)?;
            let summary =
                import_transactions(&ledger, &csv_data, &company).map_err(import_err)?;
            eprintln!(
                "imported {} transaction(s), skipped {} existing",
                summary.inserted, summary.skipped,
            );
        }
        ImportCommands::Obligations { db, csv, company } => {
            let (ledger, csv_data) = open_inputs(&db, &csv, &company)?;
            let summary =
                import_obligations(&ledger, &csv_data, &company).map_err(import_err)?;
            eprintln!(
                "imported {} obligation(s), skipped {} existing",
                summary.inserted, summary.skipped,
            );
        }
    }
    Ok(())
}

fn open_inputs(
    db: &Path,
    csv: &Path,
    company: &str,
) -> Result<(SqliteLedger, String), CliError> {
    if company.trim().is_empty() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "company identifier is required".into(),
            hint: Some("pass a non-empty --company".into()),
        });
    }

    let csv_data = std::fs::read_to_string(csv)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot read {}: {e}", csv.display())))?;
    let ledger = SqliteLedger::open(db)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot open {}: {e}", db.display())))?;
    Ok((ledger, csv_data))
}

fn import_err(err: ImportError) -> CliError {
    match err {
        ImportError::Store(_) => cli_err(EXIT_RUNTIME, err.to_string()),
        _ => cli_err(EXIT_IMPORT_PARSE, err.to_string()),
    }
}
