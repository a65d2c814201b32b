use thiserror::Error;

use mintsale_core::{AccountId, DomainError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account {account} holds {available}, needs {required}")]
    InsufficientBalance {
        account: AccountId,
        required: u128,
        available: u128,
    },

    #[error("{spender} may move {approved} from {owner}, needs {required}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        required: u128,
        approved: u128,
    },

    #[error("balance of {account} would overflow")]
    Overflow { account: AccountId },

    /// The ledger refused the transfer for its own reasons (paused, blocked).
    #[error("transfer rejected: {reason}")]
    Rejected { reason: String },
}

impl From<LedgerError> for DomainError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::InsufficientBalance {
                required, available, ..
            } => DomainError::InsufficientBalance { required, available },
            LedgerError::InsufficientAllowance {
                required, approved, ..
            } => DomainError::InsufficientAllowance { required, approved },
            LedgerError::Overflow { .. } => DomainError::invariant(value.to_string()),
            LedgerError::Rejected { .. } => DomainError::validation(value.to_string()),
        }
    }
}
