use serde::Serialize;

use crate::config::AmountTolerance;
use crate::model::{BankTransaction, Obligation};

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Per-factor points behind a score, persisted into the audit note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub amount_pts: u32,
    pub date_pts: u32,
    pub identity_pts: u32,
    pub reference_pts: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredMatch {
    pub score: u32,
    pub breakdown: ScoreBreakdown,
}

/// Compatibility scoring between one transaction and one obligation.
///
/// Stateless and deterministic. `None` means the pair is disqualified and
/// must never surface as a candidate. Implementations are swappable — the
/// runner is agnostic to whether scores come from rules or an assisted
/// provider.
pub trait MatchScorer {
    fn name(&self) -> &'static str;
    fn score(&self, txn: &BankTransaction, obligation: &Obligation) -> Option<ScoredMatch>;
}

// ---------------------------------------------------------------------------
// Rule-based scorer
// ---------------------------------------------------------------------------

const AMOUNT_EXACT_PTS: u32 = 50;
const AMOUNT_LOOSE_PTS: u32 = 25;
const IDENTITY_FULL_PTS: u32 = 25;
const IDENTITY_TOKEN_PTS: u32 = 10;
const PERIOD_BONUS_PTS: u32 = 10;
const REFERENCE_BONUS_PTS: u32 = 5;

/// Additive rule scoring: amount is a hard gate, date and identity are soft
/// compensating signals, structured period/reference codes are an uncapped
/// bonus on top of the nominal 100-point scale.
pub struct RuleScorer {
    tolerance: AmountTolerance,
}

impl RuleScorer {
    pub fn new(tolerance: AmountTolerance) -> Self {
        Self { tolerance }
    }
}

impl MatchScorer for RuleScorer {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn score(&self, txn: &BankTransaction, obligation: &Obligation) -> Option<ScoredMatch> {
        let amount_pts = amount_points(txn.amount_cents, obligation.amount_cents, &self.tolerance)?;

        let date_pts = date_points(txn, obligation);
        let identity_pts = identity_points(txn, obligation);
        let reference_pts = reference_points(txn, obligation);

        let breakdown = ScoreBreakdown {
            amount_pts,
            date_pts,
            identity_pts,
            reference_pts,
        };

        Some(ScoredMatch {
            score: amount_pts + date_pts + identity_pts + reference_pts,
            breakdown,
        })
    }
}

/// Amount gate. `diff * 100 <= amount * pct` keeps the percentage check in
/// exact integer arithmetic on minor units.
fn amount_points(txn_cents: i64, obligation_cents: i64, tol: &AmountTolerance) -> Option<u32> {
    let diff = (txn_cents - obligation_cents).abs();
    if diff * 100 <= obligation_cents * i64::from(tol.exact_pct) {
        Some(AMOUNT_EXACT_PTS)
    } else if diff * 100 <= obligation_cents * i64::from(tol.loose_pct) {
        Some(AMOUNT_LOOSE_PTS)
    } else {
        None
    }
}

fn date_points(txn: &BankTransaction, obligation: &Obligation) -> u32 {
    let days = (txn.date - obligation.due_date).num_days().abs();
    match days {
        0..=3 => 25,
        4..=7 => 15,
        8..=15 => 5,
        _ => 0,
    }
}

fn identity_points(txn: &BankTransaction, obligation: &Obligation) -> u32 {
    let name = fold(&obligation.party_name);
    if name.is_empty() {
        return 0;
    }

    let mut haystack = fold(&txn.description);
    if let Some(ref counterparty) = txn.counterparty_name {
        haystack.push(' ');
        haystack.push_str(&fold(counterparty));
    }

    if haystack.contains(&name) {
        return IDENTITY_FULL_PTS;
    }

    let token_hit = name
        .split_whitespace()
        .any(|token| token.chars().count() > 2 && haystack.contains(token));
    if token_hit {
        IDENTITY_TOKEN_PTS
    } else {
        0
    }
}

/// Structured codes in the narrative: period is case-insensitive, the
/// unit/contract reference must appear literally.
fn reference_points(txn: &BankTransaction, obligation: &Obligation) -> u32 {
    let mut pts = 0;

    if let Some(ref period) = obligation.period_label {
        if !period.is_empty()
            && txn.description.to_lowercase().contains(&period.to_lowercase())
        {
            pts += PERIOD_BONUS_PTS;
        }
    }

    if let Some(ref reference) = obligation.reference_label {
        if !reference.is_empty() && txn.description.contains(reference.as_str()) {
            pts += REFERENCE_BONUS_PTS;
        }
    }

    pts
}

/// Lower-case and strip Latin diacritics so "Pérez" matches a bank
/// narrative spelled "PEREZ". Bank feeds routinely drop accents.
fn fold(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
