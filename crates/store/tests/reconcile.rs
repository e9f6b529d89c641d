//! End-to-end reconciliation runs against the SQLite adapter.

use chrono::NaiveDate;

use rentledger_recon::config::{AmountTolerance, ReconcileConfig};
use rentledger_recon::engine::run_batch;
use rentledger_recon::model::{BankTransaction, Obligation, ObligationStatus, ReviewStatus};
use rentledger_recon::scorer::RuleScorer;
use rentledger_store::{import_obligations, import_transactions, SqliteLedger};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn obligation(id: &str, amount_cents: i64, due: &str, party: &str) -> Obligation {
    Obligation {
        id: id.into(),
        company_id: "co_1".into(),
        amount_cents,
        due_date: date(due),
        party_name: party.into(),
        period_label: None,
        reference_label: None,
        status: ObligationStatus::Pending,
    }
}

fn txn(id: &str, amount_cents: i64, on: &str, description: &str) -> BankTransaction {
    BankTransaction {
        id: id.into(),
        company_id: "co_1".into(),
        amount_cents,
        date: date(on),
        description: description.into(),
        counterparty_name: None,
        review_status: ReviewStatus::PendingReview,
        match_score: None,
        matched_obligation_id: None,
        suggestion: None,
        matched_by: None,
        matched_at: None,
        notes: None,
    }
}

fn run(ledger: &mut SqliteLedger) -> rentledger_recon::ReconcileReport {
    run_batch(
        ledger,
        &RuleScorer::new(AmountTolerance::default()),
        &ReconcileConfig::default(),
        "co_1",
    )
    .unwrap()
}

#[test]
fn strong_match_is_auto_reconciled() {
    // Exact amount (+50), 4 days late (+15), surname token (+10) = 75
    let mut ledger = SqliteLedger::open_in_memory().unwrap();
    let mut o = obligation("o1", 85000, "2024-03-01", "Juan Pérez García");
    o.period_label = Some("2024-03".into());
    ledger.insert_obligation(&o).unwrap();
    ledger
        .insert_transaction(&txn("t1", 85000, "2024-03-05", "TRANSFERENCIA JUAN PEREZ ALQUILER MARZO"))
        .unwrap();

    let report = run(&mut ledger);
    assert_eq!(report.summary.auto_matched, 1);
    assert_eq!(report.summary.suggested, 0);
    assert_eq!(report.summary.total_processed, 1);
    assert_eq!(report.details[0].score, 75);
    assert!(report.details[0].was_auto_applied);

    // Obligation paid with the transaction's date as payment date.
    let o = ledger.obligation("o1").unwrap().unwrap();
    assert_eq!(o.status, ObligationStatus::Paid);
    let (payment_date, payment_method) = ledger.obligation_payment("o1").unwrap().unwrap();
    assert_eq!(payment_date, "2024-03-05");
    assert_eq!(payment_method, "bank-transfer");

    // Transaction carries the full audit trail.
    let t = ledger.transaction("t1").unwrap().unwrap();
    assert_eq!(t.review_status, ReviewStatus::Matched);
    assert_eq!(t.matched_obligation_id.as_deref(), Some("o1"));
    assert_eq!(t.match_score, Some(75));
    assert_eq!(t.matched_by.as_deref(), Some("auto-reconciliation"));
    assert!(t.matched_at.is_some());
    let notes = t.notes.unwrap();
    assert!(notes.contains("Juan Pérez García"));
    assert!(notes.contains("75"));
}

#[test]
fn weak_signals_produce_suggestion_only() {
    // Exact amount, no name overlap, 20 days off = 50
    let mut ledger = SqliteLedger::open_in_memory().unwrap();
    ledger
        .insert_obligation(&obligation("o1", 85000, "2024-03-01", "María López"))
        .unwrap();
    ledger
        .insert_transaction(&txn("t1", 85000, "2024-03-21", "TRANSFERENCIA SIN NOMBRE"))
        .unwrap();

    let report = run(&mut ledger);
    assert_eq!(report.summary.auto_matched, 0);
    assert_eq!(report.summary.suggested, 1);
    assert!(!report.details[0].was_auto_applied);

    // Obligation untouched; transaction annotated but still pending review.
    let o = ledger.obligation("o1").unwrap().unwrap();
    assert_eq!(o.status, ObligationStatus::Pending);
    let t = ledger.transaction("t1").unwrap().unwrap();
    assert_eq!(t.review_status, ReviewStatus::PendingReview);
    assert_eq!(t.match_score, Some(50));

    let s = t.suggestion.unwrap();
    assert_eq!(s.obligation_id, "o1");
    assert_eq!(s.score, 50);
    assert_eq!(s.party_name, "María López");
    assert_eq!(s.amount_cents, 85000);
    assert_eq!(s.due_date, date("2024-03-01"));
}

#[test]
fn amount_outside_tolerance_leaves_no_trace() {
    // 935.00 against 850.00 is a 10% difference: disqualified outright.
    let mut ledger = SqliteLedger::open_in_memory().unwrap();
    ledger
        .insert_obligation(&obligation("o1", 85000, "2024-03-01", "Juan Pérez García"))
        .unwrap();
    ledger
        .insert_transaction(&txn("t1", 93500, "2024-03-01", "TRANSFERENCIA JUAN PEREZ"))
        .unwrap();

    let report = run(&mut ledger);
    assert_eq!(report.summary.auto_matched, 0);
    assert_eq!(report.summary.suggested, 0);
    assert_eq!(report.summary.total_processed, 1);

    let t = ledger.transaction("t1").unwrap().unwrap();
    assert_eq!(t.review_status, ReviewStatus::PendingReview);
    assert!(t.match_score.is_none());
    assert!(t.suggestion.is_none());
    assert!(t.notes.is_none());
}

#[test]
fn one_obligation_cannot_satisfy_two_transactions() {
    let mut ledger = SqliteLedger::open_in_memory().unwrap();
    ledger
        .insert_obligation(&obligation("o1", 85000, "2024-03-01", "Juan Pérez García"))
        .unwrap();
    ledger
        .insert_transaction(&txn("t_first", 85000, "2024-03-04", "JUAN PEREZ GARCIA RENT"))
        .unwrap();
    ledger
        .insert_transaction(&txn("t_second", 85000, "2024-03-02", "JUAN PEREZ GARCIA RENT"))
        .unwrap();

    let report = run(&mut ledger);
    assert_eq!(report.summary.auto_matched, 1);

    // Most recent transaction wins; the other is left pending with nothing.
    assert_eq!(ledger.transaction("t_first").unwrap().unwrap().review_status, ReviewStatus::Matched);
    let loser = ledger.transaction("t_second").unwrap().unwrap();
    assert_eq!(loser.review_status, ReviewStatus::PendingReview);
    assert!(loser.suggestion.is_none());

    // No obligation id appears twice among applied details.
    let mut applied: Vec<&str> = report
        .details
        .iter()
        .filter(|d| d.was_auto_applied)
        .map(|d| d.obligation_id.as_str())
        .collect();
    applied.sort_unstable();
    applied.dedup();
    assert_eq!(applied.len(), report.summary.auto_matched);
}

#[test]
fn empty_transaction_set_is_success() {
    let mut ledger = SqliteLedger::open_in_memory().unwrap();
    ledger
        .insert_obligation(&obligation("o1", 85000, "2024-03-01", "Juan Pérez García"))
        .unwrap();

    let report = run(&mut ledger);
    assert_eq!(report.summary.auto_matched, 0);
    assert_eq!(report.summary.suggested, 0);
    assert_eq!(report.summary.total_processed, 0);
    assert!(report.summary.message.contains("no pending transactions"));
}

#[test]
fn second_run_processes_nothing_new() {
    let mut ledger = SqliteLedger::open_in_memory().unwrap();
    ledger
        .insert_obligation(&obligation("o1", 85000, "2024-03-01", "Juan Pérez García"))
        .unwrap();
    ledger
        .insert_transaction(&txn("t1", 85000, "2024-03-02", "JUAN PEREZ GARCIA RENT"))
        .unwrap();

    let first = run(&mut ledger);
    assert_eq!(first.summary.auto_matched, 1);

    let second = run(&mut ledger);
    assert_eq!(second.summary.auto_matched, 0);
    assert_eq!(second.summary.suggested, 0);
    assert_eq!(second.summary.total_processed, 0);
}

#[test]
fn displaced_transaction_falls_back_to_next_obligation() {
    // Both transactions prefer o_named (full-name hit); the displaced one
    // is re-scored against what remains and still clears the auto bar
    // against o_other via the shared "garcia" token.
    let mut ledger = SqliteLedger::open_in_memory().unwrap();
    ledger
        .insert_obligation(&obligation("o_named", 85000, "2024-03-01", "Juan Pérez García"))
        .unwrap();
    ledger
        .insert_obligation(&obligation("o_other", 85000, "2024-03-01", "García Hermanos SL"))
        .unwrap();
    ledger
        .insert_transaction(&txn("t_new", 85000, "2024-03-02", "RENT JUAN PEREZ GARCIA"))
        .unwrap();
    ledger
        .insert_transaction(&txn("t_old", 85000, "2024-03-01", "RENT JUAN PEREZ GARCIA"))
        .unwrap();

    let report = run(&mut ledger);
    assert_eq!(report.summary.auto_matched, 2);

    let newer = ledger.transaction("t_new").unwrap().unwrap();
    assert_eq!(newer.matched_obligation_id.as_deref(), Some("o_named"));
    let older = ledger.transaction("t_old").unwrap().unwrap();
    assert_eq!(older.matched_obligation_id.as_deref(), Some("o_other"));
}

#[test]
fn csv_import_feeds_a_full_run() {
    let mut ledger = SqliteLedger::open_in_memory().unwrap();

    let obligations_csv = "\
id,due_date,amount,party_name,period,reference
o1,2024-03-01,850.00,Juan Pérez García,2024-03,
o2,2024-03-01,600.00,María López,2024-03,
";
    let transactions_csv = "\
id,date,amount,description,counterparty
t1,2024-03-05,850.00,TRANSFERENCIA JUAN PEREZ ALQUILER MARZO,
t2,2024-03-06,-30.00,MAINTENANCE FEE,
";
    let obligations = import_obligations(&ledger, obligations_csv, "co_1").unwrap();
    assert_eq!(obligations.inserted, 2);
    let transactions = import_transactions(&ledger, transactions_csv, "co_1").unwrap();
    assert_eq!(transactions.inserted, 2);

    let report = run(&mut ledger);
    // The negative fee row is never a candidate.
    assert_eq!(report.summary.total_processed, 1);
    assert_eq!(report.summary.auto_matched, 1);
    assert_eq!(ledger.obligation("o1").unwrap().unwrap().status, ObligationStatus::Paid);
    assert_eq!(ledger.obligation("o2").unwrap().unwrap().status, ObligationStatus::Pending);
}

#[test]
fn ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    {
        let mut ledger = SqliteLedger::open(&path).unwrap();
        ledger
            .insert_obligation(&obligation("o1", 85000, "2024-03-01", "Juan Pérez García"))
            .unwrap();
        ledger
            .insert_transaction(&txn("t1", 85000, "2024-03-02", "JUAN PEREZ GARCIA RENT"))
            .unwrap();
        let report = run(&mut ledger);
        assert_eq!(report.summary.auto_matched, 1);
    }

    let ledger = SqliteLedger::open(&path).unwrap();
    assert_eq!(ledger.obligation("o1").unwrap().unwrap().status, ObligationStatus::Paid);
    assert_eq!(
        ledger.transaction("t1").unwrap().unwrap().review_status,
        ReviewStatus::Matched
    );
}
