//! Inventory ledger boundary.
//!
//! The sale engine never owns stock balances; it describes each change as a
//! [`StockMovement`] and hands it to a [`StockLedger`]. [`InMemoryStockLedger`]
//! is the reference implementation used by tests and embedders without a
//! persistent store.

pub mod in_memory;
pub mod ledger;

pub use in_memory::{InMemoryStockLedger, StockDirection, StockTransaction};
pub use ledger::{BatchId, StockLedger, StockMovement, StockReason};
