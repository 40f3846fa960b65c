//! Sale lifecycle and returns engine.
//!
//! Pure domain logic (no IO, no HTTP, no storage): a [`Sale`] moves from quote
//! to confirmed and then to returned, renegotiated or cancelled, keeping the
//! stock ledger, payment group, fiscal book and commissions consistent through
//! the collaborators borrowed in a [`SaleContext`].

pub mod batches;
pub mod commission;
pub mod context;
pub mod discount;
pub mod events;
pub mod fiscal;
pub mod fulfillment;
pub mod hooks;
pub mod item;
pub mod lifecycle;
pub mod returned;
pub mod sale;
pub mod settings;
pub mod status;
pub mod stock;

#[cfg(test)]
mod test_support;

pub use commission::commission_value;
pub use context::SaleContext;
pub use discount::{AdjustmentKind, DiscountAllocation, PricedLine, allocate};
pub use events::{
    SaleCancelled, SaleConfirmed, SaleEvent, SaleNotPaid, SaleOrdered, SalePaid, SaleRenegotiated,
    SaleReturnUndone, SaleReturned,
};
pub use fulfillment::{InMemoryWorkOrders, WorkOrderId, WorkOrderItem, WorkOrderItemId, WorkOrders};
pub use hooks::{DefaultSaleHooks, SaleHooks};
pub use item::{SaleItem, SaleItemId};
pub use lifecycle::WORK_ORDER_CANCEL_REASON;
pub use returned::{ReturnedSale, ReturnedSaleId, ReturnedSaleItem, ReturnedSaleItemId, ReturnedSaleStatus};
pub use sale::{Sale, SaleId};
pub use settings::{CommissionPolicy, SalesSettings, SettingsError};
pub use status::SaleStatus;
