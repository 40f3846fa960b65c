use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflow_catalog::SellableId;
use saleflow_core::{BranchId, DomainResult, UserId, typed_id};

typed_id!(
    /// Storable batch (lot) identifier.
    BatchId
);

/// Why a stock balance changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockReason {
    Initial,
    Sale,
    SaleCancel,
    SaleReturn,
    ReturnUndo,
    Reserve,
    ReturnToStock,
}

/// A single stock change requested by the engine.
///
/// `quantity` is always positive; direction is given by the ledger call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub sellable: SellableId,
    pub branch: BranchId,
    pub quantity: Decimal,
    pub reason: StockReason,
    pub batch: Option<BatchId>,
    pub user: UserId,
}

impl StockMovement {
    pub fn new(
        sellable: SellableId,
        branch: BranchId,
        quantity: Decimal,
        reason: StockReason,
        user: UserId,
    ) -> Self {
        Self {
            sellable,
            branch,
            quantity,
            reason,
            batch: None,
            user,
        }
    }

    pub fn with_batch(mut self, batch: Option<BatchId>) -> Self {
        self.batch = batch;
        self
    }
}

/// Inventory collaborator.
///
/// Calls are synchronous. A failed `decrease_stock` must leave balances
/// untouched so the caller can abort the whole transition.
pub trait StockLedger {
    fn increase_stock(&mut self, movement: &StockMovement) -> DomainResult<()>;

    /// Fails with `InsufficientStock` when the balance cannot cover the movement.
    fn decrease_stock(&mut self, movement: &StockMovement) -> DomainResult<()>;

    /// Quantity on hand for the sellable in the branch, all batches included.
    fn balance_for_branch(&self, sellable: SellableId, branch: BranchId) -> Decimal;

    /// Batches with stock on hand, in registration order.
    fn batches_for(&self, sellable: SellableId, branch: BranchId) -> Vec<BatchId>;
}
