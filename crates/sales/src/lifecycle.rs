//! Sale status transitions and their guards.
//!
//! Every `can_*` predicate mirrors its action; the action re-validates on its
//! own and fails with [`DomainError::InvalidTransition`] when the sale is in
//! the wrong state.

use rust_decimal::Decimal;
use tracing::{info, warn};

use saleflow_core::{DomainError, DomainResult};
use saleflow_payments::{PaymentId, PaymentMethod};

use crate::commission;
use crate::context::SaleContext;
use crate::events::{
    SaleCancelled, SaleConfirmed, SaleEvent, SaleNotPaid, SaleOrdered, SalePaid, SaleRenegotiated,
    SaleReturnUndone,
};
use crate::fiscal;
use crate::hooks::SaleHooks;
use crate::item::SaleItem;
use crate::sale::Sale;
use crate::settings::CommissionPolicy;
use crate::status::SaleStatus;

/// Reason handed to the work-order subsystem when a sale is cancelled.
pub const WORK_ORDER_CANCEL_REASON: &str = "The sale was cancelled";

impl Sale {
    fn invalid_transition(&self, action: &str) -> DomainError {
        warn!(sale = %self.id, status = %self.status, action, "transition rejected");
        DomainError::invalid_transition(format!(
            "Sale {} cannot be {action} while {}",
            self.identifier, self.status
        ))
    }

    fn check_client(&self) -> DomainResult<()> {
        let Some(client) = self.client.as_ref() else {
            return Ok(());
        };
        client.ensure_can_purchase()?;

        let credit = self.group.pending_value(PaymentMethod::Credit);
        if credit > Decimal::ZERO {
            client.ensure_credit_available(credit)?;
        }
        let store_credit = self.group.pending_value(PaymentMethod::StoreCredit);
        if store_credit > Decimal::ZERO {
            client.ensure_store_credit_available(store_credit)?;
        }
        Ok(())
    }

    // ─── Order ──────────────────────────────────────────────────────────

    pub fn can_order(&self) -> bool {
        matches!(self.status, SaleStatus::Initial | SaleStatus::Quote)
            && !self.items.is_empty()
            && self.client.as_ref().is_none_or(|c| c.is_solvent())
    }

    pub fn order(&mut self, ctx: &SaleContext<'_>) -> DomainResult<()> {
        if !matches!(self.status, SaleStatus::Initial | SaleStatus::Quote) {
            return Err(self.invalid_transition("ordered"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("The sale must have sellable items"));
        }
        if let Some(client) = self.client.as_ref() {
            client.ensure_can_purchase()?;
        }

        self.status = SaleStatus::Ordered;
        self.record(
            ctx.branch,
            ctx.user.id(),
            SaleEvent::SaleOrdered(SaleOrdered {
                sale: self.id,
                occurred_at: ctx.now,
            }),
        );
        info!(sale = %self.id, status = %self.status, "sale ordered");
        Ok(())
    }

    // ─── Confirm ────────────────────────────────────────────────────────

    /// Stock is only checked by the ledger while confirming.
    pub fn can_confirm(&self) -> bool {
        self.check_confirmable().is_ok()
    }

    fn check_confirmable(&self) -> DomainResult<()> {
        if !matches!(self.status, SaleStatus::Ordered | SaleStatus::Quote) {
            return Err(self.invalid_transition("confirmed"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("The sale must have sellable items"));
        }
        if self.need_adjust_batches() {
            return Err(DomainError::validation(
                "Some items need a batch before the sale can be confirmed",
            ));
        }
        self.check_client()?;
        self.items.iter().try_for_each(SaleItem::ensure_available)
    }

    /// Sell every item, book the taxes and move to confirmed.
    pub fn confirm(&mut self, ctx: &mut SaleContext<'_>) -> DomainResult<()> {
        self.check_confirmable()?;

        let branch = self.branch;
        let user = ctx.user.id();
        for item in &mut self.items {
            item.sell(ctx.stock, branch, user)?;
        }

        let payer = self.client.as_ref().map(|c| c.id_typed());
        self.group.set_payer(payer);
        self.status = SaleStatus::Confirmed;
        self.confirm_date = Some(ctx.now);
        fiscal::record_sale_entries(self, ctx.fiscal)?;

        let total = self.total_amount();
        self.record(
            ctx.branch,
            user,
            SaleEvent::SaleConfirmed(SaleConfirmed {
                sale: self.id,
                total,
                occurred_at: ctx.now,
            }),
        );
        info!(sale = %self.id, status = %self.status, value = %total, "sale confirmed");

        if ctx.settings.commission_policy == CommissionPolicy::OnConfirm {
            commission::create_missing(self, ctx.commissions, |_| true)?;
        }
        if self.can_set_paid() {
            self.set_paid(ctx)?;
        }
        Ok(())
    }

    // ─── Payments ───────────────────────────────────────────────────────

    /// Settle one payment of the group.
    ///
    /// On a confirmed sale this creates the payment's commission under the
    /// per-payment policy and marks the sale paid once nothing is pending.
    pub fn pay_payment(&mut self, payment: PaymentId, ctx: &mut SaleContext<'_>) -> DomainResult<()> {
        self.group.pay(payment, ctx.now)?;

        if self.status != SaleStatus::Confirmed {
            return Ok(());
        }
        if ctx.settings.commission_policy == CommissionPolicy::OnEachPayment {
            commission::create_for_payment(self, payment, ctx.commissions)?;
        }
        if self.can_set_paid() {
            self.set_paid(ctx)?;
        }
        Ok(())
    }

    /// Settle every pending in-payment; returns how many were paid.
    pub fn pay_all(&mut self, ctx: &mut SaleContext<'_>) -> DomainResult<usize> {
        let pending = self.group.pending_inpayments();
        for payment in &pending {
            self.pay_payment(*payment, ctx)?;
        }
        Ok(pending.len())
    }

    pub fn can_set_paid(&self) -> bool {
        self.status == SaleStatus::Confirmed && !self.paid && self.group.is_fully_paid()
    }

    /// Mark a confirmed sale whose in-payments are all paid.
    ///
    /// Commissions still missing for paid in-payments are created here,
    /// whatever the policy.
    pub fn set_paid(&mut self, ctx: &mut SaleContext<'_>) -> DomainResult<()> {
        if self.status != SaleStatus::Confirmed || self.paid {
            return Err(self.invalid_transition("paid"));
        }
        if !self.group.is_fully_paid() {
            return Err(DomainError::validation(format!(
                "Sale {} still has pending payments",
                self.identifier
            )));
        }

        commission::create_missing(self, ctx.commissions, |p| p.is_paid())?;
        self.paid = true;
        self.close_date = Some(ctx.now);

        let value = self.total_paid();
        self.record(
            ctx.branch,
            ctx.user.id(),
            SaleEvent::SalePaid(SalePaid {
                sale: self.id,
                value,
                occurred_at: ctx.now,
            }),
        );
        info!(
            sale = %self.id,
            status = %self.status,
            value = %value,
            "Sale {} to client {} was paid with value {:.2}",
            self.identifier,
            self.client_name(),
            value
        );
        Ok(())
    }

    /// Clear the paid flag; the status is left alone.
    pub fn set_not_paid(&mut self, ctx: &SaleContext<'_>) -> DomainResult<()> {
        if !self.paid {
            return Err(self.invalid_transition("set as not paid"));
        }
        self.paid = false;
        self.close_date = None;
        self.record(
            ctx.branch,
            ctx.user.id(),
            SaleEvent::SaleNotPaid(SaleNotPaid {
                sale: self.id,
                occurred_at: ctx.now,
            }),
        );
        info!(sale = %self.id, status = %self.status, "sale set as not paid");
        Ok(())
    }

    // ─── Cancel ─────────────────────────────────────────────────────────

    pub fn can_cancel(&self, ctx: &SaleContext<'_>) -> bool {
        if !matches!(
            self.status,
            SaleStatus::Quote | SaleStatus::Ordered | SaleStatus::Confirmed
        ) {
            return false;
        }
        if ctx.hooks.can_cancel(self) == Some(false) {
            return false;
        }
        if ctx.hooks.is_external(self) {
            return true;
        }
        match self.status {
            SaleStatus::Ordered | SaleStatus::Confirmed => {
                ctx.settings.allow_cancel_confirmed_sales || ctx.user.is_admin()
            }
            _ => true,
        }
    }

    /// Cancel the sale, giving back stock and cancelling its payments.
    ///
    /// `force` skips the permission guard; returned, cancelled and
    /// renegotiated sales can never be cancelled.
    pub fn cancel(
        &mut self,
        ctx: &mut SaleContext<'_>,
        reason: Option<String>,
        force: bool,
    ) -> DomainResult<()> {
        if self.status.is_final() {
            return Err(self.invalid_transition("cancelled"));
        }
        if !force && !self.can_cancel(ctx) {
            return Err(self.invalid_transition("cancelled"));
        }

        let branch = self.branch;
        let user = ctx.user.id();
        for item in &mut self.items {
            item.cancel(ctx.stock, branch, user)?;
        }
        self.group.cancel_all(ctx.now)?;
        if let Some(order) = self.work_order {
            ctx.work_orders.cancel_order(order, WORK_ORDER_CANCEL_REASON)?;
        }

        self.status = SaleStatus::Cancelled;
        self.cancel_date = Some(ctx.now);
        self.cancel_reason = reason.clone();
        self.paid = false;
        self.record(
            ctx.branch,
            user,
            SaleEvent::SaleCancelled(SaleCancelled {
                sale: self.id,
                reason,
                occurred_at: ctx.now,
            }),
        );
        info!(sale = %self.id, status = %self.status, force, "sale cancelled");
        Ok(())
    }

    // ─── Renegotiate / return ───────────────────────────────────────────

    pub fn can_set_renegotiated(&self) -> bool {
        self.status == SaleStatus::Confirmed && self.group.has_pending_inpayments()
    }

    /// Drop the pending payments of a confirmed sale so it can be settled
    /// some other way.
    pub fn set_renegotiated(&mut self, ctx: &SaleContext<'_>) -> DomainResult<()> {
        if !self.can_set_renegotiated() {
            return Err(self.invalid_transition("renegotiated"));
        }
        let cancelled = self.group.cancel_pending(ctx.now)?;
        self.status = SaleStatus::Renegotiated;
        self.close_date = Some(ctx.now);
        self.record(
            ctx.branch,
            ctx.user.id(),
            SaleEvent::SaleRenegotiated(SaleRenegotiated {
                sale: self.id,
                occurred_at: ctx.now,
            }),
        );
        info!(sale = %self.id, status = %self.status, cancelled, "sale renegotiated");
        Ok(())
    }

    pub fn can_return(&self) -> bool {
        self.status == SaleStatus::Confirmed
            && self.items.iter().any(|i| i.returnable_quantity() > Decimal::ZERO)
    }

    /// Bring a returned sale back to confirmed.
    pub fn set_not_returned(&mut self, ctx: &SaleContext<'_>) -> DomainResult<()> {
        if self.status != SaleStatus::Returned {
            return Err(self.invalid_transition("set as not returned"));
        }
        self.revert_return();
        self.record(
            ctx.branch,
            ctx.user.id(),
            SaleEvent::SaleReturnUndone(SaleReturnUndone {
                sale: self.id,
                returned_sale: None,
                reason: None,
                occurred_at: ctx.now,
            }),
        );
        info!(sale = %self.id, status = %self.status, "sale set as not returned");
        Ok(())
    }

    pub(crate) fn revert_return(&mut self) {
        if self.status == SaleStatus::Returned {
            self.status = SaleStatus::Confirmed;
        }
        self.return_date = None;
    }

    /// Quotes and orders not managed by an external system.
    pub fn can_edit(&self, hooks: &dyn SaleHooks) -> bool {
        matches!(self.status, SaleStatus::Quote | SaleStatus::Ordered) && !hooks.is_external(self)
    }
}
