//! Payments and payment groups.
//!
//! Settlement itself (cash drawers, card acquirers, bank files) is out of this
//! crate's hands; a payment here only moves between pending, paid and
//! cancelled.

pub mod group;
pub mod payment;

pub use group::{PaymentGroup, PaymentGroupId};
pub use payment::{Payment, PaymentId, PaymentKind, PaymentMethod, PaymentStatus};
