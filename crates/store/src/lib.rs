//! `rentledger-store` — SQLite persistence for the reconciliation engine.
//!
//! Implements the engine's `ReconStore` trait: candidate queries, the
//! atomic compare-and-set match commit, and suggestion annotation.

pub mod import;

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use rentledger_recon::engine::PAYMENT_METHOD;
use rentledger_recon::model::{
    BankTransaction, Obligation, ObligationStatus, ReviewStatus, Suggestion,
};
use rentledger_recon::store::{MatchCommit, ReconStore, StoreError};

pub use import::{import_obligations, import_transactions, ImportError, ImportSummary};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS obligations (
    id              TEXT PRIMARY KEY,
    company_id      TEXT NOT NULL,
    amount_cents    INTEGER NOT NULL,
    due_date        TEXT NOT NULL,
    party_name      TEXT NOT NULL,
    period_label    TEXT,
    reference_label TEXT,
    status          TEXT NOT NULL DEFAULT 'pending',
    payment_date    TEXT,
    payment_method  TEXT
);

CREATE TABLE IF NOT EXISTS bank_transactions (
    id                     TEXT PRIMARY KEY,
    company_id             TEXT NOT NULL,
    amount_cents           INTEGER NOT NULL,
    date                   TEXT NOT NULL,
    description            TEXT NOT NULL,
    counterparty_name      TEXT,
    review_status          TEXT NOT NULL DEFAULT 'pending_review',
    match_score            INTEGER,
    matched_obligation_id  TEXT,
    suggestion             TEXT,  -- JSON payload
    matched_by             TEXT,
    matched_at             TEXT,
    notes                  TEXT
);

CREATE INDEX IF NOT EXISTS idx_obligations_candidates
    ON obligations (company_id, status);
CREATE INDEX IF NOT EXISTS idx_transactions_candidates
    ON bank_transactions (company_id, review_status);
"#;

fn sql_err(e: rusqlite::Error) -> StoreError {
    StoreError::Sqlite(e.to_string())
}

pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(sql_err)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(sql_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(sql_err)?;
        Ok(Self { conn })
    }

    /// Insert, ignoring rows whose id already exists. Returns whether the
    /// row was new.
    pub fn insert_obligation(&self, obligation: &Obligation) -> Result<bool, StoreError> {
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO obligations
                 (id, company_id, amount_cents, due_date, party_name, period_label, reference_label, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    obligation.id,
                    obligation.company_id,
                    obligation.amount_cents,
                    obligation.due_date,
                    obligation.party_name,
                    obligation.period_label,
                    obligation.reference_label,
                    obligation.status.as_str(),
                ],
            )
            .map_err(sql_err)?;
        Ok(inserted == 1)
    }

    /// Insert, ignoring rows whose id already exists. Returns whether the
    /// row was new.
    pub fn insert_transaction(&self, txn: &BankTransaction) -> Result<bool, StoreError> {
        let suggestion_json = match &txn.suggestion {
            Some(s) => Some(
                serde_json::to_string(s)
                    .map_err(|e| StoreError::Sqlite(format!("suggestion encode: {e}")))?,
            ),
            None => None,
        };
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO bank_transactions
                 (id, company_id, amount_cents, date, description, counterparty_name,
                  review_status, match_score, matched_obligation_id, suggestion,
                  matched_by, matched_at, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    txn.id,
                    txn.company_id,
                    txn.amount_cents,
                    txn.date,
                    txn.description,
                    txn.counterparty_name,
                    txn.review_status.as_str(),
                    txn.match_score.map(i64::from),
                    txn.matched_obligation_id,
                    suggestion_json,
                    txn.matched_by,
                    txn.matched_at,
                    txn.notes,
                ],
            )
            .map_err(sql_err)?;
        Ok(inserted == 1)
    }

    pub fn obligation(&self, id: &str) -> Result<Option<Obligation>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, company_id, amount_cents, due_date, party_name,
                        period_label, reference_label, status
                 FROM obligations WHERE id = ?1",
                params![id],
                obligation_from_row,
            )
            .optional()
            .map_err(sql_err)
    }

    pub fn transaction(&self, id: &str) -> Result<Option<BankTransaction>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, company_id, amount_cents, date, description, counterparty_name,
                        review_status, match_score, matched_obligation_id, suggestion,
                        matched_by, matched_at, notes
                 FROM bank_transactions WHERE id = ?1",
                params![id],
                transaction_from_row,
            )
            .optional()
            .map_err(sql_err)
    }

    /// Payment audit fields, for inspection after a commit.
    pub fn obligation_payment(&self, id: &str) -> Result<Option<(String, String)>, StoreError> {
        self.conn
            .query_row(
                "SELECT payment_date, payment_method FROM obligations
                 WHERE id = ?1 AND status = 'paid'",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(sql_err)
    }
}

fn obligation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Obligation> {
    let status_raw: String = row.get(7)?;
    Ok(Obligation {
        id: row.get(0)?,
        company_id: row.get(1)?,
        amount_cents: row.get(2)?,
        due_date: row.get(3)?,
        party_name: row.get(4)?,
        period_label: row.get(5)?,
        reference_label: row.get(6)?,
        status: ObligationStatus::parse(&status_raw).unwrap_or(ObligationStatus::Cancelled),
    })
}

fn transaction_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BankTransaction> {
    let status_raw: String = row.get(6)?;
    let suggestion_json: Option<String> = row.get(9)?;
    let suggestion: Option<Suggestion> = match suggestion_json {
        Some(ref json) => serde_json::from_str(json).ok(),
        None => None,
    };
    Ok(BankTransaction {
        id: row.get(0)?,
        company_id: row.get(1)?,
        amount_cents: row.get(2)?,
        date: row.get(3)?,
        description: row.get(4)?,
        counterparty_name: row.get(5)?,
        review_status: ReviewStatus::parse(&status_raw).unwrap_or(ReviewStatus::Discarded),
        match_score: row.get::<_, Option<i64>>(7)?.map(|v| v as u32),
        matched_obligation_id: row.get(8)?,
        suggestion,
        matched_by: row.get(10)?,
        matched_at: row.get(11)?,
        notes: row.get(12)?,
    })
}

impl ReconStore for SqliteLedger {
    fn candidate_transactions(
        &self,
        company_id: &str,
        cap: usize,
    ) -> Result<Vec<BankTransaction>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, company_id, amount_cents, date, description, counterparty_name,
                        review_status, match_score, matched_obligation_id, suggestion,
                        matched_by, matched_at, notes
                 FROM bank_transactions
                 WHERE company_id = ?1 AND review_status = 'pending_review' AND amount_cents > 0
                 ORDER BY date DESC, id ASC
                 LIMIT ?2",
            )
            .map_err(sql_err)?;

        let rows = stmt
            .query_map(params![company_id, cap as i64], transaction_from_row)
            .map_err(sql_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sql_err)
    }

    fn pending_obligations(&self, company_id: &str) -> Result<Vec<Obligation>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, company_id, amount_cents, due_date, party_name,
                        period_label, reference_label, status
                 FROM obligations
                 WHERE company_id = ?1 AND status = 'pending'
                 ORDER BY due_date ASC, id ASC",
            )
            .map_err(sql_err)?;

        let rows = stmt
            .query_map(params![company_id], obligation_from_row)
            .map_err(sql_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sql_err)
    }

    /// Both updates are compare-and-set inside one SQLite transaction: the
    /// obligation must still be pending and the bank transaction still
    /// pending review, or the whole commit rolls back.
    fn commit_match(&mut self, commit: &MatchCommit<'_>) -> Result<(), StoreError> {
        let tx = self.conn.transaction().map_err(sql_err)?;

        let obligation_rows = tx
            .execute(
                "UPDATE obligations
                 SET status = 'paid', payment_date = ?1, payment_method = ?2
                 WHERE id = ?3 AND status = 'pending'",
                params![commit.payment_date, PAYMENT_METHOD, commit.obligation_id],
            )
            .map_err(sql_err)?;
        if obligation_rows != 1 {
            return Err(StoreError::CommitConflict {
                obligation_id: commit.obligation_id.to_string(),
            });
        }

        let txn_rows = tx
            .execute(
                "UPDATE bank_transactions
                 SET review_status = 'matched', matched_obligation_id = ?1,
                     match_score = ?2, matched_by = ?3, matched_at = ?4,
                     notes = ?5, suggestion = NULL
                 WHERE id = ?6 AND review_status = 'pending_review'",
                params![
                    commit.obligation_id,
                    i64::from(commit.score),
                    commit.matched_by,
                    commit.matched_at,
                    commit.note,
                    commit.transaction_id,
                ],
            )
            .map_err(sql_err)?;
        if txn_rows != 1 {
            // Dropping the open transaction rolls the obligation flip back.
            return Err(StoreError::CommitConflict {
                obligation_id: commit.obligation_id.to_string(),
            });
        }

        tx.commit().map_err(sql_err)
    }

    fn record_suggestion(
        &mut self,
        transaction_id: &str,
        suggestion: &Suggestion,
        note: &str,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(suggestion)
            .map_err(|e| StoreError::Sqlite(format!("suggestion encode: {e}")))?;

        let rows = self
            .conn
            .execute(
                "UPDATE bank_transactions
                 SET match_score = ?1, suggestion = ?2, notes = ?3
                 WHERE id = ?4 AND review_status = 'pending_review'",
                params![i64::from(suggestion.score), json, note, transaction_id],
            )
            .map_err(sql_err)?;
        if rows != 1 {
            return Err(StoreError::CommitConflict {
                obligation_id: suggestion.obligation_id.clone(),
            });
        }
        Ok(())
    }
}
