//! Batch assignment for batch-tracked items.

use rust_decimal::Decimal;
use tracing::debug;

use saleflow_core::{BranchId, DomainError, DomainResult};
use saleflow_inventory::{BatchId, StockLedger};

use crate::item::{SaleItem, SaleItemId};
use crate::sale::Sale;

impl Sale {
    /// Batch-tracked items without a batch.
    pub fn items_missing_batch(&self) -> Vec<&SaleItem> {
        self.items.iter().filter(|i| i.is_missing_batch()).collect()
    }

    pub fn need_adjust_batches(&self) -> bool {
        self.items.iter().any(SaleItem::is_missing_batch)
    }

    /// Split an item across batches.
    ///
    /// When the allocations cover the whole quantity the item itself takes
    /// the first batch; otherwise it keeps the unallocated remainder. Every
    /// other allocation becomes a new item. Returns the ids of the items
    /// now carrying the batches, in allocation order.
    pub fn set_batches(
        &mut self,
        id: SaleItemId,
        allocations: &[(BatchId, Decimal)],
    ) -> DomainResult<Vec<SaleItemId>> {
        self.ensure_items_editable("set batches")?;
        let index = self
            .items
            .iter()
            .position(|i| i.id_typed() == id)
            .ok_or_else(|| DomainError::not_found(format!("sale item {id}")))?;
        let item = &self.items[index];

        if item.batch().is_some() {
            return Err(DomainError::validation("This item already has a batch"));
        }
        if item.reserved_quantity() > Decimal::ZERO {
            return Err(DomainError::validation(
                "Cannot split an item that already has reserved stock",
            ));
        }
        if allocations.iter().any(|(_, q)| *q <= Decimal::ZERO) {
            return Err(DomainError::validation("Batch quantities must be positive"));
        }
        let allocated: Decimal = allocations.iter().map(|(_, q)| *q).sum();
        if allocated > item.quantity() {
            return Err(DomainError::validation(
                "The sum of batch quantities needs to be equal or less than the item's original quantity",
            ));
        }
        let Some(((first_batch, first_quantity), rest)) = allocations.split_first() else {
            return Ok(Vec::new());
        };

        let mut carrying = Vec::with_capacity(allocations.len());
        let mut new_items = Vec::with_capacity(allocations.len());
        let remainder = item.quantity() - allocated;

        if remainder.is_zero() {
            for (batch, quantity) in rest {
                new_items.push(item.split_off(*quantity, *batch));
            }
            let item = &mut self.items[index];
            item.set_quantity(*first_quantity);
            item.set_batch(Some(*first_batch));
            carrying.push(item.id_typed());
        } else {
            for (batch, quantity) in allocations {
                new_items.push(item.split_off(*quantity, *batch));
            }
            self.items[index].set_quantity(remainder);
        }

        carrying.extend(new_items.iter().map(SaleItem::id_typed));
        debug!(sale = %self.id, item = %id, batches = allocations.len(), "item split into batches");
        for (offset, new_item) in new_items.into_iter().enumerate() {
            self.items.insert(index + 1 + offset, new_item);
        }
        Ok(carrying)
    }

    /// Assign the batch to every missing item that has exactly one batch in
    /// stock. Returns whether no item is left without a batch.
    pub fn check_and_adjust_batches(&mut self, ledger: &dyn StockLedger, branch: BranchId) -> bool {
        for item in self.items.iter_mut().filter(|i| i.is_missing_batch()) {
            let batches = ledger.batches_for(item.sellable().id_typed(), branch);
            if let [batch] = batches.as_slice() {
                item.set_batch(Some(*batch));
            }
        }
        !self.need_adjust_batches()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::{WorkOrderId, WorkOrderItem};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use saleflow_catalog::{ProductFacet, Sellable, SellableId};
    use saleflow_core::{AggregateId, StationId, UserId};
    use saleflow_inventory::{InMemoryStockLedger, StockMovement, StockReason};

    fn batch_tracked() -> Sellable {
        Sellable::product(
            SellableId::new(AggregateId::new()),
            "LOT",
            "Vaccine",
            dec!(30),
            ProductFacet {
                batch_tracked: true,
                ..ProductFacet::storable()
            },
        )
    }

    fn test_sale() -> Sale {
        Sale::new_quote(1, BranchId::new(), StationId::new(), UserId::new(), Utc::now())
    }

    #[test]
    fn full_allocation_reuses_the_item_for_the_first_batch() {
        let mut sale = test_sale();
        let item = sale.add_sellable(&batch_tracked(), dec!(10), None, None).unwrap();
        assert!(sale.need_adjust_batches());

        let (b1, b2) = (BatchId::generate(), BatchId::generate());
        let carrying = sale.set_batches(item, &[(b1, dec!(6)), (b2, dec!(4))]).unwrap();

        assert_eq!(carrying.len(), 2);
        assert_eq!(carrying[0], item);
        assert_eq!(sale.item(item).unwrap().quantity(), dec!(6));
        assert_eq!(sale.item(item).unwrap().batch(), Some(b1));
        assert_eq!(sale.item(carrying[1]).unwrap().batch(), Some(b2));
        assert_eq!(sale.item(carrying[1]).unwrap().price(), dec!(30));
        assert!(!sale.need_adjust_batches());
    }

    #[test]
    fn partial_allocation_keeps_the_remainder() {
        let mut sale = test_sale();
        let item = sale.add_sellable(&batch_tracked(), dec!(10), None, None).unwrap();

        let carrying = sale
            .set_batches(item, &[(BatchId::generate(), dec!(3))])
            .unwrap();

        assert_eq!(carrying.len(), 1);
        assert_ne!(carrying[0], item);
        assert_eq!(sale.item(item).unwrap().quantity(), dec!(7));
        assert_eq!(sale.item(item).unwrap().batch(), None);
        assert_eq!(sale.items_missing_batch().len(), 1);
    }

    #[test]
    fn split_rules() {
        let mut sale = test_sale();
        let item = sale.add_sellable(&batch_tracked(), dec!(2), None, None).unwrap();

        let err = sale
            .set_batches(item, &[(BatchId::generate(), dec!(3))])
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation(
                "The sum of batch quantities needs to be equal or less than the item's original quantity"
                    .to_string()
            )
        );

        sale.set_batches(item, &[(BatchId::generate(), dec!(2))])
            .unwrap();
        let err = sale
            .set_batches(item, &[(BatchId::generate(), dec!(1))])
            .unwrap_err();
        assert_eq!(err, DomainError::Validation("This item already has a batch".to_string()));
    }

    #[test]
    fn work_order_items_are_split_too() {
        let mut sale = test_sale();
        let item = sale.add_sellable(&batch_tracked(), dec!(5), None, None).unwrap();
        let order = WorkOrderId::generate();
        sale.link_work_order_item(item, WorkOrderItem::new(order, dec!(5), None))
            .unwrap();

        let (b1, b2) = (BatchId::generate(), BatchId::generate());
        let carrying = sale.set_batches(item, &[(b1, dec!(2)), (b2, dec!(3))]).unwrap();

        let original = sale.item(item).unwrap().work_order_item().unwrap();
        assert_eq!((original.quantity, original.batch), (dec!(2), Some(b1)));
        let split = sale.item(carrying[1]).unwrap().work_order_item().unwrap();
        assert_eq!((split.order, split.quantity, split.batch), (order, dec!(3), Some(b2)));
        assert_eq!(sale.work_order(), Some(order));
    }

    #[test]
    fn check_and_adjust_picks_the_only_batch() {
        let mut sale = test_sale();
        let sellable = batch_tracked();
        sale.add_sellable(&sellable, dec!(1), None, None).unwrap();

        let mut ledger = InMemoryStockLedger::new();
        let branch = sale.branch();
        assert!(!sale.check_and_adjust_batches(&ledger, branch));

        let batch = BatchId::generate();
        ledger
            .increase_stock(
                &StockMovement::new(sellable.id_typed(), branch, dec!(5), StockReason::Initial, UserId::new())
                    .with_batch(Some(batch)),
            )
            .unwrap();
        assert!(sale.check_and_adjust_batches(&ledger, branch));
        assert_eq!(sale.items()[0].batch(), Some(batch));
    }

    #[test]
    fn check_and_adjust_leaves_ambiguous_items() {
        let mut sale = test_sale();
        let sellable = batch_tracked();
        sale.add_sellable(&sellable, dec!(1), None, None).unwrap();

        let mut ledger = InMemoryStockLedger::new();
        let branch = sale.branch();
        for _ in 0..2 {
            ledger
                .increase_stock(
                    &StockMovement::new(sellable.id_typed(), branch, dec!(1), StockReason::Initial, UserId::new())
                        .with_batch(Some(BatchId::generate())),
                )
                .unwrap();
        }
        assert!(!sale.check_and_adjust_batches(&ledger, branch));
    }
}
