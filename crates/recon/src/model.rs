use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Obligations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    Pending,
    Paid,
    Cancelled,
}

impl ObligationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An outstanding amount owed by a party by a due date (a rent installment).
///
/// Only `Pending` obligations are ever candidates for matching; the engine's
/// single write is the terminal pending → paid flip.
#[derive(Debug, Clone)]
pub struct Obligation {
    pub id: String,
    pub company_id: String,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub party_name: String,
    /// Billing period code, e.g. "2024-03".
    pub period_label: Option<String>,
    /// Unit/contract reference code.
    pub reference_label: Option<String>,
    pub status: ObligationStatus,
}

// ---------------------------------------------------------------------------
// Bank transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    PendingReview,
    Matched,
    Discarded,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Matched => "matched",
            Self::Discarded => "discarded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending_review" => Some(Self::PendingReview),
            "matched" => Some(Self::Matched),
            "discarded" => Some(Self::Discarded),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed but unapplied match, surfaced for human confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub obligation_id: String,
    pub score: u32,
    pub party_name: String,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
}

/// An incoming bank-feed record, not yet attributed to any obligation.
///
/// Only positive-amount, `PendingReview` transactions are candidates.
/// A transaction holds either a committed match (`matched_obligation_id`)
/// or a `suggestion`, never contradicting data.
#[derive(Debug, Clone)]
pub struct BankTransaction {
    pub id: String,
    pub company_id: String,
    pub amount_cents: i64,
    pub date: NaiveDate,
    /// Merchant/payer narrative as supplied by the bank feed.
    pub description: String,
    pub counterparty_name: Option<String>,
    pub review_status: ReviewStatus,
    pub match_score: Option<u32>,
    pub matched_obligation_id: Option<String>,
    pub suggestion: Option<Suggestion>,
    pub matched_by: Option<String>,
    pub matched_at: Option<String>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Run output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MatchDetail {
    pub transaction_id: String,
    pub obligation_id: String,
    pub amount_cents: i64,
    pub party_name: String,
    pub score: u32,
    pub was_auto_applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub auto_matched: usize,
    pub suggested: usize,
    pub total_processed: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub company_id: String,
    pub scorer: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub details: Vec<MatchDetail>,
}
