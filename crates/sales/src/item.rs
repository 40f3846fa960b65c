use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use saleflow_catalog::Sellable;
use saleflow_core::{BranchId, DomainError, DomainResult, Entity, UserId, quantize, typed_id};
use saleflow_inventory::{BatchId, StockLedger, StockMovement, StockReason};

use crate::discount::PricedLine;
use crate::fulfillment::WorkOrderItem;
use crate::stock;

typed_id!(
    /// Sale item identifier.
    SaleItemId
);

/// A line of a sale.
///
/// `quantity_decreased` is how much of `quantity` the stock ledger has already
/// given up for this line. It is kept equal to the linked work-order item's
/// counter after every stock operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    id: SaleItemId,
    sellable: Sellable,
    quantity: Decimal,
    price: Decimal,
    base_price: Decimal,
    quantity_decreased: Decimal,
    returned_quantity: Decimal,
    parent: Option<SaleItemId>,
    batch: Option<BatchId>,
    work_order_item: Option<WorkOrderItem>,
}

impl SaleItem {
    pub(crate) fn new(
        sellable: Sellable,
        quantity: Decimal,
        price: Decimal,
        base_price: Decimal,
        parent: Option<SaleItemId>,
    ) -> Self {
        Self {
            id: SaleItemId::generate(),
            sellable,
            quantity,
            price,
            base_price,
            quantity_decreased: Decimal::ZERO,
            returned_quantity: Decimal::ZERO,
            parent,
            batch: None,
            work_order_item: None,
        }
    }

    /// Copy of this line for `quantity` units of `batch`, with fresh counters.
    pub(crate) fn split_off(&self, quantity: Decimal, batch: BatchId) -> Self {
        Self {
            id: SaleItemId::generate(),
            quantity,
            quantity_decreased: Decimal::ZERO,
            returned_quantity: Decimal::ZERO,
            batch: Some(batch),
            work_order_item: self
                .work_order_item
                .as_ref()
                .map(|w| WorkOrderItem::new(w.order, quantity, Some(batch))),
            ..self.clone()
        }
    }

    pub fn id_typed(&self) -> SaleItemId {
        self.id
    }

    pub fn sellable(&self) -> &Sellable {
        &self.sellable
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    pub fn quantity_decreased(&self) -> Decimal {
        self.quantity_decreased
    }

    pub fn returned_quantity(&self) -> Decimal {
        self.returned_quantity
    }

    pub fn parent(&self) -> Option<SaleItemId> {
        self.parent
    }

    pub fn batch(&self) -> Option<BatchId> {
        self.batch
    }

    pub fn work_order_item(&self) -> Option<&WorkOrderItem> {
        self.work_order_item.as_ref()
    }

    pub fn is_service(&self) -> bool {
        self.sellable.is_service()
    }

    pub fn is_package(&self) -> bool {
        self.sellable.is_package()
    }

    /// Batch-tracked and no batch chosen yet.
    pub fn is_missing_batch(&self) -> bool {
        self.sellable.is_batch_tracked() && self.batch.is_none()
    }

    pub fn total(&self) -> Decimal {
        quantize(self.price * self.quantity)
    }

    pub fn base_total(&self) -> Decimal {
        quantize(self.base_price * self.quantity)
    }

    /// Stock currently held by this line (the larger tracker).
    pub fn reserved_quantity(&self) -> Decimal {
        stock::already_decreased(
            self.quantity_decreased,
            self.work_order_item.as_ref().map(|w| w.quantity_decreased),
        )
    }

    pub fn returnable_quantity(&self) -> Decimal {
        self.quantity - self.returned_quantity
    }

    pub fn is_fully_returned(&self) -> bool {
        self.returned_quantity >= self.quantity
    }

    /// Discount given on this line relative to its base price.
    pub fn sale_discount(&self) -> Decimal {
        if self.price < self.base_price {
            quantize((self.base_price - self.price) * self.quantity)
        } else {
            Decimal::ZERO
        }
    }

    /// Surcharge applied on this line relative to its base price.
    pub fn sale_surcharge(&self) -> Decimal {
        if self.price > self.base_price {
            quantize((self.price - self.base_price) * self.quantity)
        } else {
            Decimal::ZERO
        }
    }

    /// `(base_price - price) * quantity`; packages are handled by the sale.
    pub fn item_discount(&self) -> Decimal {
        quantize((self.base_price - self.price) * self.quantity)
    }

    pub(crate) fn set_price(&mut self, price: Decimal) {
        self.price = price;
    }

    pub(crate) fn set_quantity(&mut self, quantity: Decimal) {
        self.quantity = quantity;
        if let Some(w) = self.work_order_item.as_mut() {
            w.quantity = quantity;
        }
    }

    pub(crate) fn set_batch(&mut self, batch: Option<BatchId>) {
        self.batch = batch;
        if let Some(w) = self.work_order_item.as_mut() {
            w.batch = batch;
        }
    }

    pub(crate) fn link_work_order_item(&mut self, item: WorkOrderItem) {
        self.work_order_item = Some(item);
    }

    pub(crate) fn refresh_sellable(&mut self, sellable: &Sellable) {
        if sellable.id_typed() == self.sellable.id_typed() {
            self.sellable = sellable.clone();
        }
    }

    pub(crate) fn ensure_available(&self) -> DomainResult<()> {
        if !self.sellable.is_available() {
            return Err(DomainError::validation(format!(
                "{} is not available for sale. Try making it available first and then try again.",
                self.sellable.description()
            )));
        }
        Ok(())
    }

    /// Both trackers move together.
    fn set_decreased(&mut self, value: Decimal) {
        self.quantity_decreased = value;
        if let Some(w) = self.work_order_item.as_mut() {
            w.quantity_decreased = value;
        }
    }

    fn movement(&self, quantity: Decimal, reason: StockReason, branch: BranchId, user: UserId) -> StockMovement {
        StockMovement::new(self.sellable.id_typed(), branch, quantity, reason, user)
            .with_batch(self.batch)
    }

    fn decrease(
        &self,
        ledger: &mut dyn StockLedger,
        quantity: Decimal,
        reason: StockReason,
        branch: BranchId,
        user: UserId,
    ) -> DomainResult<()> {
        if !self.sellable.is_storable() || quantity <= Decimal::ZERO {
            return Ok(());
        }
        ledger.decrease_stock(&self.movement(quantity, reason, branch, user))?;
        debug!(item = %self.id, sellable = self.sellable.code(), %quantity, ?reason, "stock decreased");
        Ok(())
    }

    fn increase(
        &self,
        ledger: &mut dyn StockLedger,
        quantity: Decimal,
        reason: StockReason,
        branch: BranchId,
        user: UserId,
    ) -> DomainResult<()> {
        if !self.sellable.is_storable() || quantity <= Decimal::ZERO {
            return Ok(());
        }
        ledger.increase_stock(&self.movement(quantity, reason, branch, user))?;
        debug!(item = %self.id, sellable = self.sellable.code(), %quantity, ?reason, "stock increased");
        Ok(())
    }

    /// Take whatever the ledger has not given up yet for this line.
    pub(crate) fn sell(
        &mut self,
        ledger: &mut dyn StockLedger,
        branch: BranchId,
        user: UserId,
    ) -> DomainResult<()> {
        self.ensure_available()?;

        let to_decrease = stock::quantity_to_decrease(
            self.quantity,
            self.quantity_decreased,
            self.work_order_item.as_ref().map(|w| w.quantity_decreased),
        );
        self.decrease(ledger, to_decrease, StockReason::Sale, branch, user)?;
        self.set_decreased(self.quantity);
        Ok(())
    }

    /// Give back everything this line holds.
    pub(crate) fn cancel(
        &mut self,
        ledger: &mut dyn StockLedger,
        branch: BranchId,
        user: UserId,
    ) -> DomainResult<()> {
        let to_restore = stock::quantity_to_restore(
            self.quantity_decreased,
            self.work_order_item.as_ref().map(|w| w.quantity_decreased),
        );
        self.increase(ledger, to_restore, StockReason::SaleCancel, branch, user)?;
        self.set_decreased(Decimal::ZERO);
        Ok(())
    }

    pub(crate) fn reserve(
        &mut self,
        quantity: Decimal,
        ledger: &mut dyn StockLedger,
        branch: BranchId,
        user: UserId,
    ) -> DomainResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation("The quantity to reserve must be positive"));
        }
        let reserved = self.reserved_quantity();
        if reserved + quantity > self.quantity {
            return Err(DomainError::validation(format!(
                "Cannot reserve {quantity} of {}: only {} left to reserve",
                self.sellable.description(),
                self.quantity - reserved
            )));
        }
        self.decrease(ledger, quantity, StockReason::Reserve, branch, user)?;
        self.set_decreased(reserved + quantity);
        Ok(())
    }

    pub(crate) fn return_to_stock(
        &mut self,
        quantity: Decimal,
        ledger: &mut dyn StockLedger,
        branch: BranchId,
        user: UserId,
    ) -> DomainResult<()> {
        let reserved = self.reserved_quantity();
        if quantity <= Decimal::ZERO || quantity > reserved {
            return Err(DomainError::validation(format!(
                "Cannot return {quantity} of {} to stock: {reserved} reserved",
                self.sellable.description()
            )));
        }
        self.increase(ledger, quantity, StockReason::ReturnToStock, branch, user)?;
        self.set_decreased(reserved - quantity);
        Ok(())
    }

    /// Register `quantity` returned units; returns how many went back to stock.
    pub(crate) fn apply_return(
        &mut self,
        quantity: Decimal,
        ledger: &mut dyn StockLedger,
        branch: BranchId,
        user: UserId,
    ) -> DomainResult<Decimal> {
        if quantity > self.returnable_quantity() {
            return Err(DomainError::validation(format!(
                "Cannot return {quantity} of {}: only {} can be returned",
                self.sellable.description(),
                self.returnable_quantity()
            )));
        }
        let reserved = self.reserved_quantity();
        let restocked = quantity.min(reserved);
        self.increase(ledger, restocked, StockReason::SaleReturn, branch, user)?;
        self.set_decreased(reserved - restocked);
        self.returned_quantity += quantity;
        Ok(restocked)
    }

    /// Reverse [`apply_return`](Self::apply_return).
    pub(crate) fn undo_return(
        &mut self,
        quantity: Decimal,
        restocked: Decimal,
        ledger: &mut dyn StockLedger,
        branch: BranchId,
        user: UserId,
    ) -> DomainResult<()> {
        if quantity > self.returned_quantity {
            return Err(DomainError::consistency(format!(
                "{} has only {} returned units",
                self.sellable.description(),
                self.returned_quantity
            )));
        }
        let reserved = self.reserved_quantity();
        self.decrease(ledger, restocked, StockReason::ReturnUndo, branch, user)?;
        self.set_decreased(reserved + restocked);
        self.returned_quantity -= quantity;
        Ok(())
    }
}

impl PricedLine for SaleItem {
    fn base_price(&self) -> Decimal {
        self.base_price
    }

    fn quantity(&self) -> Decimal {
        self.quantity
    }

    fn price(&self) -> Decimal {
        self.price
    }

    fn set_price(&mut self, price: Decimal) {
        self.price = price;
    }
}

impl Entity for SaleItem {
    type Id = SaleItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
