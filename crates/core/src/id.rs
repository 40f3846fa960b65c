//! Identifiers shared by every saleflow crate.
//!
//! All of them wrap a UUIDv7, so ids minted in sequence also sort in
//! creation order.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh time-ordered id.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(raw).map(Self).map_err(|err| {
                    DomainError::invalid_id(format!("{}: {err}", stringify!($name)))
                })
            }
        }
    };
}

uuid_id!(
    /// The clerk or manager acting on a sale.
    UserId
);

uuid_id!(
    /// Store location; stock balances are kept per branch.
    BranchId
);

uuid_id!(
    /// Till or terminal a sale was rung up on.
    StationId
);

uuid_id!(
    /// Identity of a sale, a returned sale, a payment group or any of their
    /// child records.
    AggregateId
);

/// Declare a domain identifier wrapping an [`AggregateId`].
///
/// ```ignore
/// typed_id!(
///     /// Sale identifier.
///     SaleId
/// );
/// let id = SaleId::new(AggregateId::new());
/// ```
#[macro_export]
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $crate::AggregateId);

        impl $name {
            pub fn new(id: $crate::AggregateId) -> Self {
                Self(id)
            }

            /// Shorthand for `Self::new(AggregateId::new())`.
            pub fn generate() -> Self {
                Self($crate::AggregateId::new())
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    typed_id!(
        /// Identifier used only by these tests.
        WidgetId
    );

    #[test]
    fn parse_round_trips_display() {
        let id = BranchId::new();
        let parsed: BranchId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_garbage_with_type_name() {
        let err = "not-a-uuid".parse::<StationId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) if msg.starts_with("StationId") => {}
            other => panic!("Expected InvalidId naming StationId, got {other:?}"),
        }
    }

    #[test]
    fn typed_ids_are_distinct_and_display_inner_uuid() {
        let inner = AggregateId::new();
        let a = WidgetId::new(inner);
        assert_eq!(a.to_string(), inner.to_string());
        assert_ne!(WidgetId::generate(), WidgetId::generate());
    }
}
