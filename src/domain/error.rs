use thiserror::Error;

use super::Cents;

/// Rejections raised by the ledger and the balance calculator. A failed call
/// never mutates the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Member already exists: {0}")]
    DuplicateMember(String),

    #[error(
        "Invalid member name '{0}': names must not be blank, start or end with spaces, or contain ';'"
    )]
    InvalidMemberName(String),

    #[error("Unknown member: {0}")]
    UnknownMember(String),

    #[error("Invalid amount {0}: amounts must be positive")]
    InvalidAmount(Cents),

    #[error("Expense must have at least one participant")]
    EmptyParticipants,

    #[error("Participant listed more than once: {0}")]
    DuplicateParticipant(String),

    #[error("Cannot pay advance to self: {0}")]
    SelfAdvance(String),

    #[error("Cannot settle with self: {0}")]
    SelfSettlement(String),

    #[error("Settlement of {requested} cents from {from} to {to} exceeds outstanding {outstanding} cents")]
    Overpayment {
        from: String,
        to: String,
        outstanding: Cents,
        requested: Cents,
    },

    #[error("Amounts too large: trip totals overflow")]
    AmountOverflow,

    #[error("Ledger is inconsistent: event #{sequence} references unknown member {member}")]
    InconsistentLedger { sequence: u64, member: String },
}
