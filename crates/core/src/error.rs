//! Failures raised by sale, return and collaborator operations.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Why an operation was refused.
///
/// Raised straight to the caller and never retried here. A collaborator that
/// fails (a ledger refusing a decrement, a missing record) reports through
/// the same kinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The requested transition is not allowed from the current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A stock decrement exceeds the ledger balance.
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    /// A value failed validation (missing items, bad quantities, prices...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The client is not in good standing for the requested operation.
    #[error("client ineligible: {0}")]
    ClientIneligible(String),

    /// Data was found in a combination that should be impossible.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// Text that does not parse as an id.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn insufficient_stock(msg: impl Into<String>) -> Self {
        Self::InsufficientStock(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn client_ineligible(msg: impl Into<String>) -> Self {
        Self::ClientIneligible(msg.into())
    }

    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
