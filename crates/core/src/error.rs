//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is terminal for the operation that produced it: the caller
/// sees the `Display` text as the reason and no state has changed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An item id outside the collection range.
    #[error("token id {id} out of range (valid ids are {min}..={max})")]
    OutOfRange { id: u32, min: u32, max: u32 },

    /// The inventory guard was asked to issue an item twice.
    #[error("id {id} was minted before")]
    AlreadyIssued { id: u32 },

    /// A targeted purchase named an item that is no longer for sale.
    #[error("id {id} not available")]
    IdUnavailable { id: u32 },

    /// The buyer did not authorize the engine to move enough payment tokens.
    #[error("not enough allowance (required: {required}, approved: {approved})")]
    InsufficientAllowance { required: u128, approved: u128 },

    /// The payer does not hold enough of the currency being spent.
    #[error("not enough balance (required: {required}, available: {available})")]
    InsufficientBalance { required: u128, available: u128 },

    /// A native-currency payment below the fixed deposit price.
    #[error("not enough native currency sent (required: {required}, sent: {sent})")]
    InsufficientDeposit { required: u128, sent: u128 },

    /// Every item has been issued.
    #[error("No NFTs available")]
    Exhausted,

    /// The caller lacks a required capability.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A value failed validation (e.g. malformed configuration).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A one-shot setting was written twice.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
