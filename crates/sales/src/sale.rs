use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use saleflow_catalog::Sellable;
use saleflow_core::{
    AggregateRoot, BranchId, DomainError, DomainResult, MIN_UNIT, StationId, UserId, entity,
    percent_of, quantize, typed_id,
};
use saleflow_events::EventEnvelope;
use saleflow_parties::Client;
use saleflow_payments::{PaymentGroup, PaymentGroupId};

use crate::context::SaleContext;
use crate::discount::{self, AdjustmentKind, DiscountAllocation};
use crate::events::SaleEvent;
use crate::fulfillment::{WorkOrderId, WorkOrderItem};
use crate::item::{SaleItem, SaleItemId};
use crate::status::SaleStatus;

typed_id!(
    /// Sale identifier.
    SaleId
);

/// Sale aggregate root.
///
/// Operations that touch stock, payments or the books take a
/// [`SaleContext`]; every transition appends an event that
/// [`take_events`](Sale::take_events) hands over to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub(crate) id: SaleId,
    pub(crate) identifier: u64,
    pub(crate) status: SaleStatus,
    pub(crate) open_date: DateTime<Utc>,
    pub(crate) confirm_date: Option<DateTime<Utc>>,
    pub(crate) close_date: Option<DateTime<Utc>>,
    pub(crate) cancel_date: Option<DateTime<Utc>>,
    pub(crate) return_date: Option<DateTime<Utc>>,
    pub(crate) cancel_reason: Option<String>,
    pub(crate) discount_value: Decimal,
    pub(crate) surcharge_value: Decimal,
    pub(crate) client: Option<Client>,
    pub(crate) branch: BranchId,
    pub(crate) station: StationId,
    pub(crate) salesperson: UserId,
    pub(crate) group: PaymentGroup,
    pub(crate) work_order: Option<WorkOrderId>,
    pub(crate) paid: bool,
    /// Value handed back through confirmed returns and trades.
    #[serde(default)]
    pub(crate) refunded_value: Decimal,
    pub(crate) items: Vec<SaleItem>,
    pub(crate) version: u64,
    #[serde(skip)]
    pub(crate) pending_events: Vec<EventEnvelope<SaleEvent>>,
}

impl Sale {
    /// New sale in the initial (non-quoted) state.
    pub fn new(
        identifier: u64,
        branch: BranchId,
        station: StationId,
        salesperson: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SaleId::generate(),
            identifier,
            status: SaleStatus::Initial,
            open_date: now,
            confirm_date: None,
            close_date: None,
            cancel_date: None,
            return_date: None,
            cancel_reason: None,
            discount_value: Decimal::ZERO,
            surcharge_value: Decimal::ZERO,
            client: None,
            branch,
            station,
            salesperson,
            group: PaymentGroup::new(PaymentGroupId::generate()),
            work_order: None,
            paid: false,
            refunded_value: Decimal::ZERO,
            items: Vec::new(),
            version: 0,
            pending_events: Vec::new(),
        }
    }

    /// New sale in the quoting state.
    pub fn new_quote(
        identifier: u64,
        branch: BranchId,
        station: StationId,
        salesperson: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            status: SaleStatus::Quote,
            ..Self::new(identifier, branch, station, salesperson, now)
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    /// Human sale number.
    pub fn identifier(&self) -> u64 {
        self.identifier
    }

    pub fn status(&self) -> SaleStatus {
        self.status
    }

    pub fn open_date(&self) -> DateTime<Utc> {
        self.open_date
    }

    pub fn confirm_date(&self) -> Option<DateTime<Utc>> {
        self.confirm_date
    }

    pub fn close_date(&self) -> Option<DateTime<Utc>> {
        self.close_date
    }

    pub fn cancel_date(&self) -> Option<DateTime<Utc>> {
        self.cancel_date
    }

    pub fn return_date(&self) -> Option<DateTime<Utc>> {
        self.return_date
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    pub fn discount_value(&self) -> Decimal {
        self.discount_value
    }

    pub fn surcharge_value(&self) -> Decimal {
        self.surcharge_value
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn branch(&self) -> BranchId {
        self.branch
    }

    pub fn station(&self) -> StationId {
        self.station
    }

    pub fn salesperson(&self) -> UserId {
        self.salesperson
    }

    pub fn group(&self) -> &PaymentGroup {
        &self.group
    }

    /// Payments can be added while the sale is open; settlement goes through
    /// [`pay_payment`](Sale::pay_payment).
    pub fn group_mut(&mut self) -> &mut PaymentGroup {
        &mut self.group
    }

    pub fn work_order(&self) -> Option<WorkOrderId> {
        self.work_order
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn item(&self, id: SaleItemId) -> Option<&SaleItem> {
        entity::find_by_id(&self.items, &id)
    }

    pub(crate) fn item_mut(&mut self, id: SaleItemId) -> DomainResult<&mut SaleItem> {
        entity::find_by_id_mut(&mut self.items, &id)
            .ok_or_else(|| DomainError::not_found(format!("sale item {id}")))
    }

    pub(crate) fn client_name(&self) -> &str {
        self.client.as_ref().map_or("Not Specified", Client::name)
    }

    // ─── Events ─────────────────────────────────────────────────────────

    pub(crate) fn record(&mut self, branch: BranchId, user: UserId, event: SaleEvent) {
        self.version += 1;
        self.pending_events.push(EventEnvelope::new(
            Uuid::now_v7(),
            branch,
            user,
            self.id.0,
            "sale",
            self.version,
            event,
        ));
    }

    /// Drain the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<EventEnvelope<SaleEvent>> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn pending_events(&self) -> &[EventEnvelope<SaleEvent>] {
        &self.pending_events
    }

    // ─── Editing ────────────────────────────────────────────────────────

    pub(crate) fn ensure_items_editable(&self, action: &str) -> DomainResult<()> {
        if !self.status.allows_item_edits() {
            warn!(sale = %self.id, status = %self.status, action, "item edit rejected");
            return Err(DomainError::invalid_transition(format!(
                "Cannot {action} on sale {} with status {}",
                self.identifier, self.status
            )));
        }
        Ok(())
    }

    pub fn set_client(&mut self, client: Option<Client>) -> DomainResult<()> {
        self.ensure_items_editable("change the client")?;
        self.client = client;
        Ok(())
    }

    pub fn set_work_order(&mut self, order: Option<WorkOrderId>) {
        self.work_order = order;
    }

    /// Link a work-order line to an item; the sale's work order is set if
    /// it has none yet.
    pub fn link_work_order_item(&mut self, item: SaleItemId, order_item: WorkOrderItem) -> DomainResult<()> {
        if self.work_order.is_none() {
            self.work_order = Some(order_item.order);
        }
        self.item_mut(item)?.link_work_order_item(order_item);
        Ok(())
    }

    /// Replace the catalog snapshot held by items selling `sellable`.
    pub fn refresh_sellable(&mut self, sellable: &Sellable) {
        for item in &mut self.items {
            item.refresh_sellable(sellable);
        }
    }

    /// Add a line. `price` defaults to the sellable's base price; a package
    /// component (`parent` set) uses the given price as its base price.
    pub fn add_sellable(
        &mut self,
        sellable: &Sellable,
        quantity: Decimal,
        price: Option<Decimal>,
        parent: Option<SaleItemId>,
    ) -> DomainResult<SaleItemId> {
        self.ensure_items_editable("add items")?;

        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation("The quantity must be positive"));
        }
        let price = price.unwrap_or_else(|| sellable.base_price());
        if price < MIN_UNIT && !sellable.is_package() {
            return Err(DomainError::validation(format!(
                "The price of {} must be at least {MIN_UNIT}",
                sellable.description()
            )));
        }
        if let Some(parent_id) = parent {
            let parent_item = self
                .item(parent_id)
                .ok_or_else(|| DomainError::not_found(format!("sale item {parent_id}")))?;
            if parent_item.parent().is_some() {
                return Err(DomainError::validation(
                    "A package component cannot have components of its own",
                ));
            }
        }

        let base_price = if parent.is_some() {
            price
        } else {
            sellable.base_price()
        };
        let item = SaleItem::new(sellable.clone(), quantity, price, base_price, parent);
        let id = item.id_typed();
        self.items.push(item);
        Ok(id)
    }

    /// Remove a line and its components. Reserved stock goes back first.
    pub fn remove_item(&mut self, id: SaleItemId, ctx: &mut SaleContext<'_>) -> DomainResult<()> {
        self.ensure_items_editable("remove items")?;
        if self.item(id).is_none() {
            return Err(DomainError::not_found(format!("sale item {id}")));
        }

        let mut doomed: Vec<SaleItemId> = self
            .items
            .iter()
            .filter(|i| i.parent() == Some(id))
            .map(SaleItem::id_typed)
            .collect();
        doomed.push(id);

        let branch = self.branch;
        let user = ctx.user.id();
        for item in self.items.iter_mut().filter(|i| doomed.contains(&i.id_typed())) {
            let reserved = item.reserved_quantity();
            if reserved > Decimal::ZERO {
                item.return_to_stock(reserved, ctx.stock, branch, user)?;
            }
        }
        self.items.retain(|i| !doomed.contains(&i.id_typed()));
        Ok(())
    }

    /// Decrease stock ahead of confirmation.
    pub fn reserve(&mut self, id: SaleItemId, quantity: Decimal, ctx: &mut SaleContext<'_>) -> DomainResult<()> {
        self.ensure_items_editable("reserve stock")?;
        let branch = self.branch;
        self.item_mut(id)?
            .reserve(quantity, ctx.stock, branch, ctx.user.id())
    }

    /// Give back stock reserved with [`reserve`](Sale::reserve).
    pub fn return_to_stock(
        &mut self,
        id: SaleItemId,
        quantity: Decimal,
        ctx: &mut SaleContext<'_>,
    ) -> DomainResult<()> {
        self.ensure_items_editable("return reserved stock")?;
        let branch = self.branch;
        self.item_mut(id)?
            .return_to_stock(quantity, ctx.stock, branch, ctx.user.id())
    }

    // ─── Totals ─────────────────────────────────────────────────────────

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(SaleItem::total).sum()
    }

    /// Subtotal at base prices.
    pub fn base_subtotal(&self) -> Decimal {
        self.items.iter().map(SaleItem::base_total).sum()
    }

    pub fn total_amount(&self) -> Decimal {
        quantize(self.subtotal() - self.discount_value + self.surcharge_value)
    }

    pub fn refunded_value(&self) -> Decimal {
        self.refunded_value
    }

    /// What returning items worth `gross` at item prices gives back, with the
    /// sale-level discount and surcharge applied. The return that completes
    /// the sale gets whatever is left of the total.
    pub(crate) fn refund_for(&self, gross: Decimal, completing: bool) -> Decimal {
        if completing {
            return self.total_amount() - self.refunded_value;
        }
        let subtotal = self.subtotal();
        if subtotal.is_zero() {
            return Decimal::ZERO;
        }
        quantize(gross * self.total_amount() / subtotal)
    }

    /// Paid in minus paid out.
    pub fn total_paid(&self) -> Decimal {
        self.group.total_paid()
    }

    pub fn total_to_pay(&self) -> Decimal {
        self.total_amount() - self.total_paid()
    }

    /// Largest sale-level discount that still leaves one cent per priced unit.
    pub fn available_discount(&self) -> Decimal {
        let floor: Decimal = self
            .items
            .iter()
            .filter(|i| i.price() > Decimal::ZERO)
            .map(|i| i.quantity() * MIN_UNIT)
            .sum();
        (self.subtotal() - floor).max(Decimal::ZERO)
    }

    fn ensure_percentage(percentage: Decimal) -> DomainResult<()> {
        if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(DomainError::validation(format!(
                "Percentage must be between 0 and 100, got {percentage}"
            )));
        }
        Ok(())
    }

    fn percentage_of_subtotal(&self, value: Decimal) -> Decimal {
        let subtotal = self.subtotal();
        if subtotal.is_zero() {
            Decimal::ZERO
        } else {
            value / subtotal * Decimal::ONE_HUNDRED
        }
    }

    pub fn discount_percentage(&self) -> Decimal {
        self.percentage_of_subtotal(self.discount_value)
    }

    pub fn surcharge_percentage(&self) -> Decimal {
        self.percentage_of_subtotal(self.surcharge_value)
    }

    /// Store `percentage` of the subtotal as the sale-level discount.
    pub fn set_discount_percentage(&mut self, percentage: Decimal) -> DomainResult<()> {
        self.ensure_items_editable("change the discount")?;
        Self::ensure_percentage(percentage)?;
        let value = percent_of(self.subtotal(), percentage);
        if value > self.available_discount() {
            return Err(DomainError::validation(format!(
                "The discount of {value} exceeds the available discount of {}",
                self.available_discount()
            )));
        }
        self.discount_value = value;
        Ok(())
    }

    pub fn set_surcharge_percentage(&mut self, percentage: Decimal) -> DomainResult<()> {
        self.ensure_items_editable("change the surcharge")?;
        if percentage < Decimal::ZERO {
            return Err(DomainError::validation("The surcharge cannot be negative"));
        }
        self.surcharge_value = percent_of(self.subtotal(), percentage);
        Ok(())
    }

    /// How far item prices are below their base prices, in percent.
    pub fn items_discount_percentage(&self) -> Decimal {
        let base = self.base_subtotal();
        if base.is_zero() {
            Decimal::ZERO
        } else {
            (base - self.subtotal()) / base * Decimal::ONE_HUNDRED
        }
    }

    /// Spread a discount over the item prices.
    pub fn set_items_discount(&mut self, percentage: Decimal) -> DomainResult<DiscountAllocation> {
        self.adjust_items(percentage, AdjustmentKind::Discount)
    }

    /// Spread a surcharge over the item prices.
    pub fn set_items_surcharge(&mut self, percentage: Decimal) -> DomainResult<DiscountAllocation> {
        self.adjust_items(percentage, AdjustmentKind::Surcharge)
    }

    fn adjust_items(&mut self, percentage: Decimal, kind: AdjustmentKind) -> DomainResult<DiscountAllocation> {
        self.ensure_items_editable("reprice items")?;
        match kind {
            AdjustmentKind::Discount => Self::ensure_percentage(percentage)?,
            AdjustmentKind::Surcharge if percentage < Decimal::ZERO => {
                return Err(DomainError::validation("The surcharge cannot be negative"));
            }
            AdjustmentKind::Surcharge => {}
        }
        let allocation = discount::allocate(&mut self.items, percentage, kind);
        if !allocation.shortfall.is_zero() {
            warn!(
                sale = %self.id,
                requested = %allocation.requested,
                applied = %allocation.applied,
                "item prices hit the minimum price"
            );
        }
        Ok(allocation)
    }

    /// Discount of a line; packages report the sum of their components.
    pub fn item_discount(&self, id: SaleItemId) -> DomainResult<Decimal> {
        let item = self
            .item(id)
            .ok_or_else(|| DomainError::not_found(format!("sale item {id}")))?;
        if !item.is_package() {
            return Ok(item.item_discount());
        }
        Ok(self
            .items
            .iter()
            .filter(|i| i.parent() == Some(id))
            .map(SaleItem::item_discount)
            .sum())
    }

    fn sorted_by_code<'a>(items: impl Iterator<Item = &'a SaleItem>) -> Vec<&'a SaleItem> {
        let mut items: Vec<_> = items.collect();
        items.sort_by(|a, b| a.sellable().code().cmp(b.sellable().code()));
        items
    }

    /// Product lines, ordered by sellable code.
    pub fn products(&self) -> Vec<&SaleItem> {
        Self::sorted_by_code(self.items.iter().filter(|i| !i.is_service()))
    }

    /// Service lines, ordered by sellable code.
    pub fn services(&self) -> Vec<&SaleItem> {
        Self::sorted_by_code(self.items.iter().filter(|i| i.is_service()))
    }
}

impl AggregateRoot for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
