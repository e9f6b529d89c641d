//! `rentledger-recon` — bank-transaction reconciliation engine.
//!
//! Pure engine crate: scoring, decision thresholds, and the greedy batch
//! runner. Persistence lives behind the `ReconStore` trait; no IO here.

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod scorer;
pub mod store;

pub use config::ReconcileConfig;
pub use engine::run_batch;
pub use error::ReconError;
pub use model::{BankTransaction, Obligation, ReconcileReport};
pub use scorer::{MatchScorer, RuleScorer};
pub use store::{ReconStore, StoreError};
