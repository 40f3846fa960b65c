//! Returns and trades of confirmed sales.
//!
//! A [`ReturnedSale`] is created pending from [`Sale::create_return`], its
//! quantities can be lowered, and it is then finalized either as a plain
//! return (the client is reimbursed) or as a trade (the value pays part of a
//! new sale). A confirmed return can be undone while its reimbursement is
//! still pending.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use saleflow_catalog::{SellableFacet, SellableId};
use saleflow_core::{
    AggregateRoot, BranchId, DomainError, DomainResult, Entity, StationId, UserId, quantize,
    typed_id,
};
use saleflow_inventory::BatchId;
use saleflow_payments::{PaymentGroupId, PaymentId, PaymentMethod};

use crate::commission;
use crate::context::SaleContext;
use crate::events::{SaleEvent, SaleReturnUndone, SaleReturned};
use crate::fiscal;
use crate::item::SaleItemId;
use crate::sale::{Sale, SaleId};
use crate::status::SaleStatus;

typed_id!(
    /// Returned sale identifier.
    ReturnedSaleId
);

typed_id!(
    /// Returned sale item identifier.
    ReturnedSaleItemId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnedSaleStatus {
    Pending,
    Confirmed,
    /// The return was undone.
    Cancelled,
}

/// Line of a return, pointing back to the sale item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedSaleItem {
    id: ReturnedSaleItemId,
    sale_item: SaleItemId,
    sellable: SellableId,
    facet: SellableFacet,
    batch: Option<BatchId>,
    price: Decimal,
    quantity: Decimal,
    max_quantity: Decimal,
    restocked: Decimal,
}

impl ReturnedSaleItem {
    pub fn id_typed(&self) -> ReturnedSaleItemId {
        self.id
    }

    pub fn sale_item(&self) -> SaleItemId {
        self.sale_item
    }

    pub fn sellable(&self) -> SellableId {
        self.sellable
    }

    pub fn batch(&self) -> Option<BatchId> {
        self.batch
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Quantity still returnable when the return was created.
    pub fn max_quantity(&self) -> Decimal {
        self.max_quantity
    }

    /// Units that went back to stock when the return was confirmed.
    pub fn restocked(&self) -> Decimal {
        self.restocked
    }

    pub fn total(&self) -> Decimal {
        quantize(self.price * self.quantity)
    }
}

impl Entity for ReturnedSaleItem {
    type Id = ReturnedSaleItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Aggregate root: ReturnedSale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedSale {
    id: ReturnedSaleId,
    sale: SaleId,
    new_sale: Option<SaleId>,
    reason: String,
    status: ReturnedSaleStatus,
    branch: BranchId,
    station: StationId,
    responsible: UserId,
    return_date: DateTime<Utc>,
    undo_date: Option<DateTime<Utc>>,
    undo_reason: Option<String>,
    reimbursement: Option<PaymentId>,
    group: Option<PaymentGroupId>,
    value: Decimal,
    items: Vec<ReturnedSaleItem>,
}

impl Sale {
    /// Start a return of everything not returned yet.
    pub fn create_return(&self, ctx: &SaleContext<'_>, reason: impl Into<String>) -> DomainResult<ReturnedSale> {
        if !self.can_return() {
            return Err(DomainError::invalid_transition(format!(
                "Sale {} cannot be returned while {}",
                self.identifier, self.status
            )));
        }
        let items = self
            .items
            .iter()
            .map(|item| ReturnedSaleItem {
                id: ReturnedSaleItemId::generate(),
                sale_item: item.id_typed(),
                sellable: item.sellable().id_typed(),
                facet: item.sellable().facet().clone(),
                batch: item.batch(),
                price: item.price(),
                quantity: item.returnable_quantity(),
                max_quantity: item.returnable_quantity(),
                restocked: Decimal::ZERO,
            })
            .collect();

        Ok(ReturnedSale {
            id: ReturnedSaleId::generate(),
            sale: self.id,
            new_sale: None,
            reason: reason.into(),
            status: ReturnedSaleStatus::Pending,
            branch: ctx.branch,
            station: ctx.station,
            responsible: ctx.user.id(),
            return_date: ctx.now,
            undo_date: None,
            undo_reason: None,
            reimbursement: None,
            group: None,
            value: Decimal::ZERO,
            items,
        })
    }
}

impl ReturnedSale {
    pub fn id_typed(&self) -> ReturnedSaleId {
        self.id
    }

    pub fn sale(&self) -> SaleId {
        self.sale
    }

    /// Sale that received the value of a trade.
    pub fn new_sale(&self) -> Option<SaleId> {
        self.new_sale
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn status(&self) -> ReturnedSaleStatus {
        self.status
    }

    pub fn branch(&self) -> BranchId {
        self.branch
    }

    pub fn station(&self) -> StationId {
        self.station
    }

    pub fn responsible(&self) -> UserId {
        self.responsible
    }

    pub fn return_date(&self) -> DateTime<Utc> {
        self.return_date
    }

    pub fn undo_date(&self) -> Option<DateTime<Utc>> {
        self.undo_date
    }

    pub fn undo_reason(&self) -> Option<&str> {
        self.undo_reason.as_deref()
    }

    pub fn reimbursement(&self) -> Option<PaymentId> {
        self.reimbursement
    }

    /// Group holding the reimbursement or the trade payment.
    pub fn group(&self) -> Option<PaymentGroupId> {
        self.group
    }

    pub fn items(&self) -> &[ReturnedSaleItem] {
        &self.items
    }

    pub fn is_trade(&self) -> bool {
        self.new_sale.is_some()
    }

    /// Value of the returned items at the prices they were sold for.
    pub fn returned_total(&self) -> Decimal {
        self.items.iter().map(ReturnedSaleItem::total).sum()
    }

    /// Amount given back once confirmed, after the sale's own discount and
    /// surcharge.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn total_quantity(&self) -> Decimal {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Lower (or restore) the quantity returned for a sale item.
    pub fn set_item_quantity(&mut self, sale_item: SaleItemId, quantity: Decimal) -> DomainResult<()> {
        if self.status != ReturnedSaleStatus::Pending {
            return Err(DomainError::invalid_transition(
                "Only pending returns can be changed",
            ));
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.sale_item == sale_item)
            .ok_or_else(|| DomainError::not_found(format!("sale item {sale_item}")))?;
        if quantity < Decimal::ZERO || quantity > item.max_quantity {
            return Err(DomainError::validation(format!(
                "The quantity to return must be between 0 and {}",
                item.max_quantity
            )));
        }
        item.quantity = quantity;
        Ok(())
    }

    /// Confirm the return and reimburse the client with a pending money
    /// out-payment on the sale's group.
    pub fn return_(&mut self, sale: &mut Sale, ctx: &mut SaleContext<'_>) -> DomainResult<()> {
        self.ensure_can_finalize(sale)?;
        let value = self.finalize(sale, ctx)?;

        if value > Decimal::ZERO {
            let payment = sale.group.add_outpayment(
                PaymentMethod::Money,
                value,
                format!("Reimbursement for sale {}", sale.identifier),
                ctx.now,
            );
            self.reimbursement = Some(payment);
        }
        self.group = Some(sale.group.id_typed());
        self.announce(sale, ctx, value);
        Ok(())
    }

    /// Confirm the return and credit its value as a paid trade in-payment
    /// on `new_sale`, which must not be confirmed yet.
    pub fn trade(
        &mut self,
        sale: &mut Sale,
        new_sale: &mut Sale,
        ctx: &mut SaleContext<'_>,
    ) -> DomainResult<()> {
        if !new_sale.status.allows_item_edits() {
            return Err(DomainError::validation(format!(
                "Sale {} is already {} and cannot receive a trade",
                new_sale.identifier, new_sale.status
            )));
        }
        self.ensure_can_finalize(sale)?;
        let value = self.finalize(sale, ctx)?;

        if value > Decimal::ZERO {
            let payment = new_sale.group.add_inpayment(
                PaymentMethod::Trade,
                value,
                format!("Traded items of sale {}", sale.identifier),
                ctx.now,
            );
            new_sale.group.pay(payment, ctx.now)?;
        }
        self.new_sale = Some(new_sale.id);
        self.group = Some(new_sale.group.id_typed());
        self.announce(sale, ctx, value);
        Ok(())
    }

    fn ensure_can_finalize(&self, sale: &Sale) -> DomainResult<()> {
        if self.status != ReturnedSaleStatus::Pending {
            return Err(DomainError::invalid_transition(format!(
                "Return {} is already {:?}",
                self.id, self.status
            )));
        }
        if self.sale != sale.id {
            return Err(DomainError::consistency(format!(
                "Return {} does not belong to sale {}",
                self.id, sale.identifier
            )));
        }
        if !sale.can_return() {
            return Err(DomainError::invalid_transition(format!(
                "Sale {} cannot be returned while {}",
                sale.identifier, sale.status
            )));
        }
        if self.total_quantity().is_zero() {
            return Err(DomainError::validation("There are no items to return"));
        }
        for returned in self.items.iter().filter(|i| i.quantity > Decimal::ZERO) {
            let item = sale
                .item(returned.sale_item)
                .ok_or_else(|| DomainError::not_found(format!("sale item {}", returned.sale_item)))?;
            if returned.quantity > item.returnable_quantity() {
                return Err(DomainError::validation(format!(
                    "Cannot return {} of {}: only {} can be returned",
                    returned.quantity,
                    item.sellable().description(),
                    item.returnable_quantity()
                )));
            }
        }
        Ok(())
    }

    /// Stock, fiscal and commission effects shared by return and trade.
    /// Returns the value to give back.
    fn finalize(&mut self, sale: &mut Sale, ctx: &mut SaleContext<'_>) -> DomainResult<Decimal> {
        let branch = sale.branch;
        let user = ctx.user.id();
        for returned in self.items.iter_mut().filter(|i| i.quantity > Decimal::ZERO) {
            returned.restocked = sale.item_mut(returned.sale_item)?.apply_return(
                returned.quantity,
                ctx.stock,
                branch,
                user,
            )?;
        }

        let completing = sale.items.iter().all(|i| i.is_fully_returned());
        let by_kind = fiscal::value_by_kind(
            self.items
                .iter()
                .filter(|i| i.quantity > Decimal::ZERO)
                .map(|i| (&i.facet, i.total())),
        );
        fiscal::record_reversals(sale, ctx.fiscal, self.id.0, by_kind, completing, ctx.now)?;
        commission::record_reversals(
            sale,
            ctx.commissions,
            self.id.0,
            self.returned_total(),
            completing,
        )?;

        let value = sale.refund_for(self.returned_total(), completing);
        sale.refunded_value += value;
        if completing {
            sale.status = SaleStatus::Returned;
            sale.return_date = Some(ctx.now);
        }
        self.value = value;
        self.status = ReturnedSaleStatus::Confirmed;
        self.return_date = ctx.now;
        self.responsible = user;
        Ok(value)
    }

    fn announce(&self, sale: &mut Sale, ctx: &SaleContext<'_>, value: Decimal) {
        let total = sale.status == SaleStatus::Returned;
        sale.record(
            ctx.branch,
            ctx.user.id(),
            SaleEvent::SaleReturned(SaleReturned {
                sale: sale.id,
                returned_sale: self.id,
                total,
                trade: self.is_trade(),
                value,
                reason: self.reason.clone(),
                occurred_at: ctx.now,
            }),
        );
        info!(
            sale = %sale.id,
            status = %sale.status,
            value = %value,
            "Sale {} to client {} was {} with value {:.2}. Reason: {}",
            sale.identifier,
            sale.client_name(),
            if total { "returned" } else { "partially returned" },
            value,
            self.reason
        );
    }

    pub fn can_undo(&self, sale: &Sale) -> bool {
        self.status == ReturnedSaleStatus::Confirmed
            && !self.is_trade()
            && matches!(sale.status, SaleStatus::Confirmed | SaleStatus::Returned)
            && self
                .reimbursement
                .and_then(|p| sale.group.get(p))
                .is_none_or(|p| !p.is_paid())
    }

    /// Undo a confirmed return whose reimbursement was not paid yet.
    pub fn undo(&mut self, sale: &mut Sale, ctx: &mut SaleContext<'_>, reason: impl Into<String>) -> DomainResult<()> {
        if self.status != ReturnedSaleStatus::Confirmed {
            return Err(DomainError::invalid_transition("Only confirmed returns can be undone"));
        }
        if self.sale != sale.id {
            return Err(DomainError::consistency(format!(
                "Return {} does not belong to sale {}",
                self.id, sale.identifier
            )));
        }
        if self.is_trade() {
            return Err(DomainError::invalid_transition(
                "A return traded for another sale cannot be undone",
            ));
        }
        if !matches!(sale.status, SaleStatus::Confirmed | SaleStatus::Returned) {
            return Err(DomainError::invalid_transition(format!(
                "Sale {} is {} and its returns cannot be undone",
                sale.identifier, sale.status
            )));
        }
        if let Some(payment) = self.reimbursement.and_then(|p| sale.group.get(p)) {
            if payment.is_paid() {
                return Err(DomainError::invalid_transition(
                    "The reimbursement was already paid",
                ));
            }
        }

        let branch = sale.branch;
        let user = ctx.user.id();
        for returned in self.items.iter().filter(|i| i.quantity > Decimal::ZERO) {
            sale.item_mut(returned.sale_item)?.undo_return(
                returned.quantity,
                returned.restocked,
                ctx.stock,
                branch,
                user,
            )?;
        }
        if let Some(payment) = self.reimbursement {
            if sale.group.get(payment).is_some_and(|p| p.is_pending()) {
                sale.group.cancel_payment(payment, ctx.now)?;
            }
        }
        sale.refunded_value -= self.value;
        let fiscal_removed = ctx.fiscal.remove_by_source(self.id.0);
        let commissions_removed = ctx.commissions.remove_by_source(self.id.0);
        sale.revert_return();

        let reason = reason.into();
        self.status = ReturnedSaleStatus::Cancelled;
        self.undo_date = Some(ctx.now);
        self.undo_reason = Some(reason.clone());
        sale.record(
            ctx.branch,
            user,
            SaleEvent::SaleReturnUndone(SaleReturnUndone {
                sale: sale.id,
                returned_sale: Some(self.id),
                reason: Some(reason),
                occurred_at: ctx.now,
            }),
        );
        info!(
            sale = %sale.id,
            status = %sale.status,
            returned_sale = %self.id,
            fiscal_removed,
            commissions_removed,
            "sale return undone"
        );
        Ok(())
    }
}

impl AggregateRoot for ReturnedSale {
    type Id = ReturnedSaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        0
    }
}
