use crate::audit;
use crate::config::ReconcileConfig;
use crate::error::ReconError;
use crate::model::{MatchDetail, ReconcileReport, RunMeta, RunSummary, Suggestion};
use crate::scorer::{MatchScorer, ScoredMatch};
use crate::store::{MatchCommit, ReconStore, StoreError};

/// Stamped as `matched_by` on every engine commit.
pub const MATCHED_BY_AUTO: &str = "auto-reconciliation";

/// Stamped as the obligation's payment method on commit.
pub const PAYMENT_METHOD: &str = "bank-transfer";

/// Run one reconciliation batch for a company.
///
/// Single pass, greedy: each transaction (most recent first) takes its
/// best-scoring unclaimed obligation. An obligation claimed by an earlier
/// transaction in the run is unavailable to later ones even if they would
/// score higher against it. Greedy, not a global assignment optimum.
///
/// Per-pair commit failures never abort the batch; only a failure to load
/// the candidate sets does.
pub fn run_batch<S: ReconStore>(
    store: &mut S,
    scorer: &dyn MatchScorer,
    config: &ReconcileConfig,
    company_id: &str,
) -> Result<ReconcileReport, ReconError> {
    if company_id.trim().is_empty() {
        return Err(ReconError::MissingCompany);
    }

    let meta = RunMeta {
        company_id: company_id.to_string(),
        scorer: scorer.name().to_string(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        run_at: chrono::Utc::now().to_rfc3339(),
    };

    let transactions = store.candidate_transactions(company_id, config.batch_cap)?;
    if transactions.is_empty() {
        return Ok(ReconcileReport {
            meta,
            summary: RunSummary {
                auto_matched: 0,
                suggested: 0,
                total_processed: 0,
                message: "no pending transactions to reconcile".into(),
            },
            details: Vec::new(),
        });
    }

    let obligations = store.pending_obligations(company_id)?;

    // Obligations matched earlier in this run (or discovered taken at commit
    // time) are ineligible for the rest of the run.
    let mut claimed = vec![false; obligations.len()];

    let mut details: Vec<MatchDetail> = Vec::new();
    let mut auto_matched = 0usize;
    let mut suggested = 0usize;
    let mut conflicts = 0usize;

    for txn in &transactions {
        // Best unclaimed obligation; ties stay with the first one evaluated.
        let mut best: Option<(usize, ScoredMatch)> = None;
        for (oi, obligation) in obligations.iter().enumerate() {
            if claimed[oi] {
                continue;
            }
            let Some(scored) = scorer.score(txn, obligation) else {
                continue;
            };
            if best.map_or(true, |(_, b)| scored.score > b.score) {
                best = Some((oi, scored));
            }
        }

        let Some((oi, scored)) = best else {
            continue;
        };
        let obligation = &obligations[oi];

        if scored.score >= config.auto_match_threshold {
            let note = audit::match_note(&obligation.party_name, scored.score, &scored.breakdown);
            let matched_at = chrono::Utc::now().to_rfc3339();
            let commit = MatchCommit {
                transaction_id: &txn.id,
                obligation_id: &obligation.id,
                payment_date: txn.date,
                score: scored.score,
                matched_by: MATCHED_BY_AUTO,
                matched_at: &matched_at,
                note: &note,
            };

            match store.commit_match(&commit) {
                Ok(()) => {
                    claimed[oi] = true;
                    auto_matched += 1;
                    details.push(MatchDetail {
                        transaction_id: txn.id.clone(),
                        obligation_id: obligation.id.clone(),
                        amount_cents: txn.amount_cents,
                        party_name: obligation.party_name.clone(),
                        score: scored.score,
                        was_auto_applied: true,
                    });
                }
                Err(StoreError::CommitConflict { .. }) => {
                    // Lost a cross-run race: the obligation is gone. The
                    // transaction stays pending and the batch continues.
                    claimed[oi] = true;
                    conflicts += 1;
                }
                Err(_) => {
                    // Single-pair storage fault: skip this transaction,
                    // leave the obligation available.
                    conflicts += 1;
                }
            }
        } else if scored.score >= config.suggest_threshold {
            let suggestion = Suggestion {
                obligation_id: obligation.id.clone(),
                score: scored.score,
                party_name: obligation.party_name.clone(),
                amount_cents: obligation.amount_cents,
                due_date: obligation.due_date,
            };
            let note = audit::suggestion_note(&obligation.party_name, scored.score);

            if store.record_suggestion(&txn.id, &suggestion, &note).is_ok() {
                suggested += 1;
                details.push(MatchDetail {
                    transaction_id: txn.id.clone(),
                    obligation_id: obligation.id.clone(),
                    amount_cents: txn.amount_cents,
                    party_name: obligation.party_name.clone(),
                    score: scored.score,
                    was_auto_applied: false,
                });
            } else {
                conflicts += 1;
            }
            // Suggestions never claim: the obligation stays available to
            // later transactions and to manual review.
        }
        // Below the suggestion threshold both records are left untouched.
    }

    let total_processed = transactions.len();
    let mut message = format!(
        "{auto_matched} auto-matched, {suggested} suggested of {total_processed} processed"
    );
    if conflicts > 0 {
        message.push_str(&format!("; {conflicts} pair commit(s) skipped"));
    }

    Ok(ReconcileReport {
        meta,
        summary: RunSummary {
            auto_matched,
            suggested,
            total_processed,
            message,
        },
        details,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
