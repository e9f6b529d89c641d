use std::fmt;

use crate::store::StoreError;

#[derive(Debug)]
pub enum ReconError {
    /// Company scope missing or empty — rejected before any loading occurs.
    MissingCompany,
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold ordering, zero cap, etc.).
    ConfigValidation(String),
    /// Candidate loading or other whole-batch storage failure.
    Store(StoreError),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCompany => write!(f, "company identifier is required"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Store(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<StoreError> for ReconError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
