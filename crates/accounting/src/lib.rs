//! Accounting collaborators of the sale engine: the fiscal (tax) book and
//! salesperson commissions.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! in-memory books are reference implementations of the traits.

pub mod commission;
pub mod fiscal;

pub use commission::{Commission, CommissionBook, CommissionId, CommissionKind, InMemoryCommissionBook};
pub use fiscal::{FiscalBook, FiscalBookEntry, FiscalEntryId, FiscalEntryKind, InMemoryFiscalBook};
