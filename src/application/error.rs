use std::path::PathBuf;

use thiserror::Error;

use crate::domain::LedgerError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("No trip found at {0} (run `tripsplit init` first)")]
    TripNotFound(PathBuf),

    #[error("A trip already exists at {0}")]
    TripAlreadyExists(PathBuf),

    #[error("Stored summary in {0} does not match its event log")]
    SummaryMismatch(PathBuf),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Nothing to settle: {from} owes {to} nothing")]
    NothingToSettle { from: String, to: String },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
