//! Rationale strings embedded in committed records.
//!
//! The note is data, not telemetry: a reviewer opening a matched transaction
//! must see why it was matched without re-running the scorer.

use crate::scorer::ScoreBreakdown;

/// Note persisted on an auto-reconciled transaction.
pub fn match_note(party_name: &str, score: u32, breakdown: &ScoreBreakdown) -> String {
    format!(
        "auto-matched to {party_name} (score {score}: amount {}, date {}, identity {}, reference {})",
        breakdown.amount_pts, breakdown.date_pts, breakdown.identity_pts, breakdown.reference_pts
    )
}

/// Note persisted alongside a suggestion awaiting review.
pub fn suggestion_note(party_name: &str, score: u32) -> String {
    format!("suggested match: {party_name} (score {score}), awaiting review")
}
