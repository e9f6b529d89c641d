use std::fmt;

use chrono::NaiveDate;

use crate::model::{BankTransaction, Obligation, Suggestion};

#[derive(Debug)]
pub enum StoreError {
    /// Database-level failure.
    Sqlite(String),
    /// Compare-and-set lost: the obligation (or transaction) was no longer
    /// in its expected state at commit time.
    CommitConflict { obligation_id: String },
    /// IO error (file open, etc.).
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(msg) => write!(f, "sqlite error: {msg}"),
            Self::CommitConflict { obligation_id } => {
                write!(f, "commit conflict: obligation '{obligation_id}' is no longer pending")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// All fields of an auto-reconcile commit, applied atomically.
///
/// Both record updates succeed or neither does: the obligation flip is
/// compare-and-set on `pending`, the transaction flip on `pending_review`.
#[derive(Debug)]
pub struct MatchCommit<'a> {
    pub transaction_id: &'a str,
    pub obligation_id: &'a str,
    /// The matched transaction's date, persisted as the payment date.
    pub payment_date: NaiveDate,
    pub score: u32,
    pub matched_by: &'a str,
    pub matched_at: &'a str,
    pub note: &'a str,
}

/// Persistence seam between the engine and the platform's record stores.
pub trait ReconStore {
    /// Candidate transactions for a company: positive amount, pending
    /// review, ordered by date descending, capped.
    fn candidate_transactions(
        &self,
        company_id: &str,
        cap: usize,
    ) -> Result<Vec<BankTransaction>, StoreError>;

    /// All pending obligations for a company. Uncapped.
    fn pending_obligations(&self, company_id: &str) -> Result<Vec<Obligation>, StoreError>;

    /// Atomically pay the obligation and mark the transaction matched.
    fn commit_match(&mut self, commit: &MatchCommit<'_>) -> Result<(), StoreError>;

    /// Annotate a transaction with a suggested match. Touches no obligation
    /// state and leaves the transaction pending review.
    fn record_suggestion(
        &mut self,
        transaction_id: &str,
        suggestion: &Suggestion,
        note: &str,
    ) -> Result<(), StoreError>;
}
