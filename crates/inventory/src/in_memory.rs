use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflow_catalog::SellableId;
use saleflow_core::{BranchId, DomainError, DomainResult};

use crate::ledger::{BatchId, StockLedger, StockMovement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    Increase,
    Decrease,
}

/// Applied movement, kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransaction {
    pub direction: StockDirection,
    pub movement: StockMovement,
}

impl StockTransaction {
    /// Signed quantity (negative for decreases).
    pub fn delta(&self) -> Decimal {
        match self.direction {
            StockDirection::Increase => self.movement.quantity,
            StockDirection::Decrease => -self.movement.quantity,
        }
    }
}

type BranchKey = (SellableId, BranchId);

/// Stock ledger held in memory.
///
/// Balances never go negative, per branch and per batch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockLedger {
    branch_balances: HashMap<BranchKey, Decimal>,
    batch_balances: HashMap<(SellableId, BranchId, BatchId), Decimal>,
    batches: HashMap<BranchKey, Vec<BatchId>>,
    history: Vec<StockTransaction>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a batch known for the sellable in the branch.
    pub fn register_batch(&mut self, sellable: SellableId, branch: BranchId, batch: BatchId) {
        let known = self.batches.entry((sellable, branch)).or_default();
        if !known.contains(&batch) {
            known.push(batch);
        }
    }

    pub fn batch_balance(&self, sellable: SellableId, branch: BranchId, batch: BatchId) -> Decimal {
        self.batch_balances
            .get(&(sellable, branch, batch))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn history(&self) -> &[StockTransaction] {
        &self.history
    }

    /// Net quantity moved for the sellable in the branch since creation.
    pub fn net_movement(&self, sellable: SellableId, branch: BranchId) -> Decimal {
        self.history
            .iter()
            .filter(|t| t.movement.sellable == sellable && t.movement.branch == branch)
            .map(StockTransaction::delta)
            .sum()
    }

    fn ensure_positive(movement: &StockMovement) -> DomainResult<()> {
        if movement.quantity <= Decimal::ZERO {
            return Err(DomainError::validation(
                "stock movement quantity must be positive",
            ));
        }
        Ok(())
    }
}

impl StockLedger for InMemoryStockLedger {
    fn increase_stock(&mut self, movement: &StockMovement) -> DomainResult<()> {
        Self::ensure_positive(movement)?;

        *self
            .branch_balances
            .entry((movement.sellable, movement.branch))
            .or_insert(Decimal::ZERO) += movement.quantity;

        if let Some(batch) = movement.batch {
            self.register_batch(movement.sellable, movement.branch, batch);
            *self
                .batch_balances
                .entry((movement.sellable, movement.branch, batch))
                .or_insert(Decimal::ZERO) += movement.quantity;
        }

        self.history.push(StockTransaction {
            direction: StockDirection::Increase,
            movement: movement.clone(),
        });
        Ok(())
    }

    fn decrease_stock(&mut self, movement: &StockMovement) -> DomainResult<()> {
        Self::ensure_positive(movement)?;

        let available = self.balance_for_branch(movement.sellable, movement.branch);
        let batch_available = movement
            .batch
            .map(|batch| self.batch_balance(movement.sellable, movement.branch, batch));

        if movement.quantity > available || batch_available.is_some_and(|b| movement.quantity > b)
        {
            return Err(DomainError::insufficient_stock(
                "Quantity to decrease is greater than the available stock.",
            ));
        }

        *self
            .branch_balances
            .entry((movement.sellable, movement.branch))
            .or_insert(Decimal::ZERO) -= movement.quantity;

        if let Some(batch) = movement.batch {
            *self
                .batch_balances
                .entry((movement.sellable, movement.branch, batch))
                .or_insert(Decimal::ZERO) -= movement.quantity;
        }

        self.history.push(StockTransaction {
            direction: StockDirection::Decrease,
            movement: movement.clone(),
        });
        Ok(())
    }

    fn balance_for_branch(&self, sellable: SellableId, branch: BranchId) -> Decimal {
        self.branch_balances
            .get(&(sellable, branch))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn batches_for(&self, sellable: SellableId, branch: BranchId) -> Vec<BatchId> {
        self.batches
            .get(&(sellable, branch))
            .map(|known| {
                known
                    .iter()
                    .copied()
                    .filter(|b| self.batch_balance(sellable, branch, *b) > Decimal::ZERO)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StockReason;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use saleflow_core::{AggregateId, UserId};

    fn test_sellable_id() -> SellableId {
        SellableId::new(AggregateId::new())
    }

    fn movement(sellable: SellableId, branch: BranchId, quantity: Decimal) -> StockMovement {
        StockMovement::new(sellable, branch, quantity, StockReason::Initial, UserId::new())
    }

    #[test]
    fn increase_then_decrease_tracks_balance_and_history() {
        let mut ledger = InMemoryStockLedger::new();
        let sellable = test_sellable_id();
        let branch = BranchId::new();

        ledger.increase_stock(&movement(sellable, branch, dec!(10))).unwrap();
        ledger.decrease_stock(&movement(sellable, branch, dec!(4))).unwrap();

        assert_eq!(ledger.balance_for_branch(sellable, branch), dec!(6));
        assert_eq!(ledger.history().len(), 2);
        assert_eq!(ledger.net_movement(sellable, branch), dec!(6));
    }

    #[test]
    fn decrease_beyond_balance_fails_without_side_effects() {
        let mut ledger = InMemoryStockLedger::new();
        let sellable = test_sellable_id();
        let branch = BranchId::new();
        ledger.increase_stock(&movement(sellable, branch, dec!(2))).unwrap();

        let err = ledger
            .decrease_stock(&movement(sellable, branch, dec!(3)))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock(
                "Quantity to decrease is greater than the available stock.".to_string()
            )
        );
        assert_eq!(ledger.balance_for_branch(sellable, branch), dec!(2));
        assert_eq!(ledger.history().len(), 1);
    }

    #[test]
    fn balances_are_per_branch() {
        let mut ledger = InMemoryStockLedger::new();
        let sellable = test_sellable_id();
        let (a, b) = (BranchId::new(), BranchId::new());
        ledger.increase_stock(&movement(sellable, a, dec!(5))).unwrap();

        assert_eq!(ledger.balance_for_branch(sellable, b), Decimal::ZERO);
        assert!(ledger.decrease_stock(&movement(sellable, b, dec!(1))).is_err());
    }

    #[test]
    fn batch_balance_is_checked_on_decrease() {
        let mut ledger = InMemoryStockLedger::new();
        let sellable = test_sellable_id();
        let branch = BranchId::new();
        let (lot1, lot2) = (BatchId::generate(), BatchId::generate());

        ledger
            .increase_stock(&movement(sellable, branch, dec!(3)).with_batch(Some(lot1)))
            .unwrap();
        ledger
            .increase_stock(&movement(sellable, branch, dec!(1)).with_batch(Some(lot2)))
            .unwrap();

        assert_eq!(ledger.balance_for_branch(sellable, branch), dec!(4));
        assert!(
            ledger
                .decrease_stock(&movement(sellable, branch, dec!(2)).with_batch(Some(lot2)))
                .is_err()
        );

        ledger
            .decrease_stock(&movement(sellable, branch, dec!(1)).with_batch(Some(lot2)))
            .unwrap();
        assert_eq!(ledger.batches_for(sellable, branch), vec![lot1]);
    }

    #[test]
    fn zero_quantity_movement_is_rejected() {
        let mut ledger = InMemoryStockLedger::new();
        let err = ledger
            .increase_stock(&movement(test_sellable_id(), BranchId::new(), Decimal::ZERO))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        #[test]
        fn balance_never_goes_negative(ops in proptest::collection::vec((any::<bool>(), 1u32..20), 0..40)) {
            let mut ledger = InMemoryStockLedger::new();
            let sellable = test_sellable_id();
            let branch = BranchId::new();

            for (increase, qty) in ops {
                let m = movement(sellable, branch, Decimal::from(qty));
                let _ = if increase { ledger.increase_stock(&m) } else { ledger.decrease_stock(&m) };
                prop_assert!(ledger.balance_for_branch(sellable, branch) >= Decimal::ZERO);
            }
            prop_assert_eq!(ledger.balance_for_branch(sellable, branch), ledger.net_movement(sellable, branch));
        }
    }
}
