//! `rledger reconcile` — run a reconciliation batch or validate its config.

use std::path::PathBuf;

use clap::Subcommand;

use rentledger_recon::{run_batch, ReconError, ReconcileConfig, RuleScorer};
use rentledger_store::SqliteLedger;

use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_RUNTIME, EXIT_USAGE};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconcileCommands {
    /// Run a reconciliation batch against a ledger database
    #[command(after_help = "\
Examples:
  rledger reconcile run ledger.db --company co_1
  rledger reconcile run ledger.db --company co_1 --json
  rledger reconcile run ledger.db --company co_1 --config recon.toml --output report.json")]
    Run {
        /// Path to the ledger database
        db: PathBuf,

        /// Company scope for the batch
        #[arg(long)]
        company: String,

        /// Recon TOML config file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output the JSON report to stdout instead of only a human summary
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  rledger reconcile validate recon.toml")]
    Validate {
        /// Path to the recon TOML config file
        config: PathBuf,
    },
}

fn cli_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError {
        code,
        message: msg.into(),
        hint: None,
    }
}

pub fn cmd_reconcile(cmd: ReconcileCommands) -> Result<(), CliError> {
    match cmd {
        ReconcileCommands::Run {
            db,
            company,
            config,
            json,
            output,
        } => cmd_run(db, company, config, json, output),
        ReconcileCommands::Validate { config } => cmd_validate(config),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ReconcileConfig, CliError> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot read config: {e}")))?;
            ReconcileConfig::from_toml(&raw).map_err(|e| cli_err(EXIT_INVALID_CONFIG, e.to_string()))
        }
        None => Ok(ReconcileConfig::default()),
    }
}

fn cmd_run(
    db: PathBuf,
    company: String,
    config_path: Option<PathBuf>,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    if company.trim().is_empty() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "company identifier is required".into(),
            hint: Some("pass a non-empty --company".into()),
        });
    }

    let config = load_config(config_path.as_ref())?;

    let mut ledger = SqliteLedger::open(&db)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot open {}: {e}", db.display())))?;
    let scorer = RuleScorer::new(config.tolerance.clone());

    let report = run_batch(&mut ledger, &scorer, &config, &company).map_err(|e| match e {
        ReconError::MissingCompany => cli_err(EXIT_USAGE, e.to_string()),
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
            cli_err(EXIT_INVALID_CONFIG, e.to_string())
        }
        ReconError::Store(_) => cli_err(EXIT_RUNTIME, e.to_string()),
    })?;

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    eprintln!("reconcile '{}': {}", report.meta.company_id, report.summary.message);
    for detail in &report.details {
        eprintln!(
            "  {} -> {} ({}, score {}){}",
            detail.transaction_id,
            detail.obligation_id,
            detail.party_name,
            detail.score,
            if detail.was_auto_applied { "" } else { " [suggested]" },
        );
    }

    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(&config_path)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot read config: {e}")))?;

    match ReconcileConfig::from_toml(&raw) {
        Ok(config) => {
            eprintln!(
                "valid: thresholds {}/{}, batch cap {}, tolerance {}%/{}%",
                config.auto_match_threshold,
                config.suggest_threshold,
                config.batch_cap,
                config.tolerance.exact_pct,
                config.tolerance.loose_pct,
            );
            Ok(())
        }
        Err(e) => Err(cli_err(EXIT_INVALID_CONFIG, e.to_string())),
    }
}
