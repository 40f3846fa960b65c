//! Parties a sale is made to.

pub mod client;

pub use client::{Client, ClientId, ClientStatus};
