//! CLI exit code registry.
//!
//! Single source of truth for `rledger` exit codes. Exit codes are part of
//! the shell contract — schedulers and scripts branch on them.
//!
//! | Code | Meaning                                    |
//! |------|--------------------------------------------|
//! | 0    | Success                                    |
//! | 2    | Usage error (bad args, missing company)    |
//! | 3    | Invalid recon config                       |
//! | 4    | Runtime/storage failure                    |
//! | 5    | Import parse error (CSV, amounts, dates)   |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
/// clap's own argument failures also exit 2.
pub const EXIT_USAGE: u8 = 2;

/// Recon config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Storage or other runtime failure while executing a command.
pub const EXIT_RUNTIME: u8 = 4;

/// CSV import rejected a row or header.
pub const EXIT_IMPORT_PARSE: u8 = 5;
