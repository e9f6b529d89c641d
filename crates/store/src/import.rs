//! CSV ingestion for bank transactions and billing obligations.
//!
//! Operator tooling around the engine: rows land in their initial states
//! (`pending_review` / `pending`) and re-imports of the same ids are
//! ignored rather than duplicated.

use std::fmt;

use chrono::NaiveDate;

use rentledger_recon::model::{BankTransaction, Obligation, ObligationStatus, ReviewStatus};
use rentledger_recon::store::StoreError;

use crate::SqliteLedger;

#[derive(Debug)]
pub enum ImportError {
    /// CSV reader failure (malformed quoting, uneven rows).
    Csv(String),
    /// Required header missing from the input.
    MissingColumn { column: String },
    /// A row field that must be non-empty was empty.
    EmptyField { record_id: String, column: String },
    /// Decimal amount that does not parse to minor units.
    AmountParse { record_id: String, value: String },
    /// Date outside `YYYY-MM-DD`.
    DateParse { record_id: String, value: String },
    /// Underlying storage failure.
    Store(StoreError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::MissingColumn { column } => write!(f, "missing column '{column}'"),
            Self::EmptyField { record_id, column } => {
                write!(f, "record '{record_id}': column '{column}' is empty")
            }
            Self::AmountParse { record_id, value } => {
                write!(f, "record '{record_id}': cannot parse amount '{value}'")
            }
            Self::DateParse { record_id, value } => {
                write!(f, "record '{record_id}': cannot parse date '{value}'")
            }
            Self::Store(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    /// Rows whose id already existed.
    pub skipped: usize,
}

/// Parse a decimal amount string ("850", "850.5", "-12.50") to minor units.
/// At most two fraction digits; fewer are right-padded.
pub fn parse_amount_minor(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if digits.is_empty() {
        return None;
    }

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() || whole.chars().any(|c| !c.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 || frac.chars().any(|c| !c.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = whole.parse().ok()?;
    let frac_cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };

    let cents = whole.checked_mul(100)?.checked_add(frac_cents)?;
    Some(if negative { -cents } else { cents })
}

struct HeaderIndex {
    headers: Vec<String>,
}

impl HeaderIndex {
    fn required(&self, name: &str) -> Result<usize, ImportError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ImportError::MissingColumn { column: name.into() })
    }
}

fn read_headers(reader: &mut csv::Reader<&[u8]>) -> Result<HeaderIndex, ImportError> {
    let headers = reader
        .headers()
        .map_err(|e| ImportError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    Ok(HeaderIndex { headers })
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("").trim()
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Import bank transactions. Columns: `id,date,amount,description,counterparty`.
pub fn import_transactions(
    ledger: &SqliteLedger,
    csv_data: &str,
    company_id: &str,
) -> Result<ImportSummary, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());
    let index = read_headers(&mut reader)?;

    let id_idx = index.required("id")?;
    let date_idx = index.required("date")?;
    let amount_idx = index.required("amount")?;
    let description_idx = index.required("description")?;
    let counterparty_idx = index.required("counterparty")?;

    let mut summary = ImportSummary::default();

    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Csv(e.to_string()))?;

        let id = field(&record, id_idx).to_string();
        if id.is_empty() {
            return Err(ImportError::EmptyField {
                record_id: "?".into(),
                column: "id".into(),
            });
        }

        let date_str = field(&record, date_idx);
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
            ImportError::DateParse {
                record_id: id.clone(),
                value: date_str.into(),
            }
        })?;

        let amount_str = field(&record, amount_idx);
        let amount_cents =
            parse_amount_minor(amount_str).ok_or_else(|| ImportError::AmountParse {
                record_id: id.clone(),
                value: amount_str.into(),
            })?;

        let txn = BankTransaction {
            id,
            company_id: company_id.to_string(),
            amount_cents,
            date,
            description: field(&record, description_idx).to_string(),
            counterparty_name: optional(field(&record, counterparty_idx)),
            review_status: ReviewStatus::PendingReview,
            match_score: None,
            matched_obligation_id: None,
            suggestion: None,
            matched_by: None,
            matched_at: None,
            notes: None,
        };

        if ledger.insert_transaction(&txn)? {
            summary.inserted += 1;
        } else {
            summary.skipped += 1;
        }
    }

    Ok(summary)
}

/// Import obligations. Columns: `id,due_date,amount,party_name,period,reference`.
pub fn import_obligations(
    ledger: &SqliteLedger,
    csv_data: &str,
    company_id: &str,
) -> Result<ImportSummary, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());
    let index = read_headers(&mut reader)?;

    let id_idx = index.required("id")?;
    let due_date_idx = index.required("due_date")?;
    let amount_idx = index.required("amount")?;
    let party_idx = index.required("party_name")?;
    let period_idx = index.required("period")?;
    let reference_idx = index.required("reference")?;

    let mut summary = ImportSummary::default();

    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Csv(e.to_string()))?;

        let id = field(&record, id_idx).to_string();
        if id.is_empty() {
            return Err(ImportError::EmptyField {
                record_id: "?".into(),
                column: "id".into(),
            });
        }

        let party_name = field(&record, party_idx).to_string();
        if party_name.is_empty() {
            return Err(ImportError::EmptyField {
                record_id: id,
                column: "party_name".into(),
            });
        }

        let date_str = field(&record, due_date_idx);
        let due_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
            ImportError::DateParse {
                record_id: id.clone(),
                value: date_str.into(),
            }
        })?;

        let amount_str = field(&record, amount_idx);
        let amount_cents =
            parse_amount_minor(amount_str).ok_or_else(|| ImportError::AmountParse {
                record_id: id.clone(),
                value: amount_str.into(),
            })?;

        let obligation = Obligation {
            id,
            company_id: company_id.to_string(),
            amount_cents,
            due_date,
            party_name,
            period_label: optional(field(&record, period_idx)),
            reference_label: optional(field(&record, reference_idx)),
            status: ObligationStatus::Pending,
        };

        if ledger.insert_obligation(&obligation)? {
            summary.inserted += 1;
        } else {
            summary.skipped += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount_minor("850"), Some(85000));
        assert_eq!(parse_amount_minor("850.00"), Some(85000));
        assert_eq!(parse_amount_minor("850.5"), Some(85050));
        assert_eq!(parse_amount_minor("-12.50"), Some(-1250));
        assert_eq!(parse_amount_minor(" 0.99 "), Some(99));
        assert_eq!(parse_amount_minor("12.345"), None);
        assert_eq!(parse_amount_minor("12,50"), None);
        assert_eq!(parse_amount_minor(""), None);
        assert_eq!(parse_amount_minor("."), None);
        assert_eq!(parse_amount_minor("abc"), None);
    }

    #[test]
    fn import_transactions_basic() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        let csv_data = "\
id,date,amount,description,counterparty
t1,2024-03-05,850.00,TRANSFERENCIA JUAN PEREZ,
t2,2024-03-06,-12.00,BANK FEE,ACME BANK
";
        let summary = import_transactions(&ledger, csv_data, "co_1").unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.skipped, 0);

        let t1 = ledger.transaction("t1").unwrap().unwrap();
        assert_eq!(t1.amount_cents, 85000);
        assert_eq!(t1.company_id, "co_1");
        assert!(t1.counterparty_name.is_none());

        let t2 = ledger.transaction("t2").unwrap().unwrap();
        assert_eq!(t2.amount_cents, -1200);
        assert_eq!(t2.counterparty_name.as_deref(), Some("ACME BANK"));
    }

    #[test]
    fn import_obligations_basic() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        let csv_data = "\
id,due_date,amount,party_name,period,reference
o1,2024-03-01,850.00,Juan Pérez García,2024-03,APT-4B
o2,2024-03-01,600.00,María López,,
";
        let summary = import_obligations(&ledger, csv_data, "co_1").unwrap();
        assert_eq!(summary.inserted, 2);

        let o1 = ledger.obligation("o1").unwrap().unwrap();
        assert_eq!(o1.amount_cents, 85000);
        assert_eq!(o1.period_label.as_deref(), Some("2024-03"));
        assert_eq!(o1.reference_label.as_deref(), Some("APT-4B"));

        let o2 = ledger.obligation("o2").unwrap().unwrap();
        assert!(o2.period_label.is_none());
        assert!(o2.reference_label.is_none());
    }

    #[test]
    fn reimport_skips_existing_ids() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        let csv_data = "\
id,date,amount,description,counterparty
t1,2024-03-05,850.00,TRANSFER,
";
        let first = import_transactions(&ledger, csv_data, "co_1").unwrap();
        assert_eq!(first.inserted, 1);
        let second = import_transactions(&ledger, csv_data, "co_1").unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 1);
    }

    #[test]
    fn missing_header_is_rejected() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        let err = import_transactions(&ledger, "id,date,amount\n", "co_1").unwrap_err();
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn bad_amount_names_the_record() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        let csv_data = "\
id,date,amount,description,counterparty
t1,2024-03-05,850€,TRANSFER,
";
        let err = import_transactions(&ledger, csv_data, "co_1").unwrap_err();
        assert!(err.to_string().contains("t1"));
        assert!(err.to_string().contains("850€"));
    }
}
