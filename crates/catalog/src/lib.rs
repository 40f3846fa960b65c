//! Sellable catalog entries (products and services).
//!
//! The engine only reads the catalog: availability, price, tax rates and
//! commission percentages all arrive as plain values on the [`Sellable`].

pub mod sellable;

pub use sellable::{
    CommissionSource, ProductFacet, Sellable, SellableFacet, SellableId, SellableStatus,
    ServiceFacet,
};
