//! Building blocks shared by the saleflow crates: identifiers, the domain
//! error type, money rounding and the aggregate/entity traits.
//!
//! Nothing here performs IO.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;

pub use aggregate::AggregateRoot;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, BranchId, StationId, UserId};
pub use money::{MIN_UNIT, percent_of, quantize};
