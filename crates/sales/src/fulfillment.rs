//! Work-order (fulfillment) boundary.
//!
//! A work order tracks the physical completion of sale lines. The engine only
//! keeps the linked item counters in lockstep and tells the work-order
//! subsystem when the sale is cancelled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflow_core::{DomainResult, typed_id};
use saleflow_inventory::BatchId;

typed_id!(
    /// Work order identifier.
    WorkOrderId
);

typed_id!(
    /// Work order item identifier.
    WorkOrderItemId
);

/// Work order line linked 1:1 to a sale item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderItem {
    pub id: WorkOrderItemId,
    pub order: WorkOrderId,
    pub quantity: Decimal,
    pub quantity_decreased: Decimal,
    pub batch: Option<BatchId>,
}

impl WorkOrderItem {
    pub fn new(order: WorkOrderId, quantity: Decimal, batch: Option<BatchId>) -> Self {
        Self {
            id: WorkOrderItemId::generate(),
            order,
            quantity,
            quantity_decreased: Decimal::ZERO,
            batch,
        }
    }
}

/// Work-order collaborator.
pub trait WorkOrders {
    fn cancel_order(&mut self, order: WorkOrderId, reason: &str) -> DomainResult<()>;
}

/// Records cancellations; used by tests and embedders without work orders.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkOrders {
    cancelled: Vec<(WorkOrderId, String)>,
}

impl InMemoryWorkOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelled(&self) -> &[(WorkOrderId, String)] {
        &self.cancelled
    }

    pub fn is_cancelled(&self, order: WorkOrderId) -> bool {
        self.cancelled.iter().any(|(id, _)| *id == order)
    }
}

impl WorkOrders for InMemoryWorkOrders {
    fn cancel_order(&mut self, order: WorkOrderId, reason: &str) -> DomainResult<()> {
        if !self.is_cancelled(order) {
            self.cancelled.push((order, reason.to_string()));
        }
        Ok(())
    }
}
