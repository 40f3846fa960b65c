use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflow_core::{AggregateRoot, DomainError, DomainResult, entity, typed_id};
use saleflow_parties::ClientId;

use crate::payment::{Payment, PaymentId, PaymentKind, PaymentMethod};

typed_id!(
    /// Payment group identifier.
    PaymentGroupId
);

/// The set of payments that together settle one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentGroup {
    id: PaymentGroupId,
    payer: Option<ClientId>,
    payments: Vec<Payment>,
}

impl PaymentGroup {
    pub fn new(id: PaymentGroupId) -> Self {
        Self {
            id,
            payer: None,
            payments: Vec::new(),
        }
    }

    pub fn id_typed(&self) -> PaymentGroupId {
        self.id
    }

    pub fn payer(&self) -> Option<ClientId> {
        self.payer
    }

    pub fn set_payer(&mut self, payer: Option<ClientId>) {
        self.payer = payer;
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn get(&self, id: PaymentId) -> Option<&Payment> {
        entity::find_by_id(&self.payments, &id)
    }

    pub fn add_inpayment(
        &mut self,
        method: PaymentMethod,
        value: Decimal,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> PaymentId {
        self.add(PaymentKind::In, method, value, description, now)
    }

    pub fn add_outpayment(
        &mut self,
        method: PaymentMethod,
        value: Decimal,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> PaymentId {
        self.add(PaymentKind::Out, method, value, description, now)
    }

    fn add(
        &mut self,
        kind: PaymentKind,
        method: PaymentMethod,
        value: Decimal,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> PaymentId {
        let id = PaymentId::generate();
        self.payments
            .push(Payment::new(id, kind, method, value, description, now));
        id
    }

    fn payment_mut(&mut self, id: PaymentId) -> DomainResult<&mut Payment> {
        entity::find_by_id_mut(&mut self.payments, &id)
            .ok_or_else(|| DomainError::not_found(format!("payment {id}")))
    }

    pub fn pay(&mut self, id: PaymentId, now: DateTime<Utc>) -> DomainResult<()> {
        self.payment_mut(id)?.pay(now)
    }

    pub fn cancel_payment(&mut self, id: PaymentId, now: DateTime<Utc>) -> DomainResult<()> {
        self.payment_mut(id)?.cancel(now)
    }

    pub fn set_payment_not_paid(&mut self, id: PaymentId) -> DomainResult<()> {
        self.payment_mut(id)?.set_not_paid()
    }

    /// Pending in-payment ids, in creation order.
    pub fn pending_inpayments(&self) -> Vec<PaymentId> {
        self.payments
            .iter()
            .filter(|p| p.is_inpayment() && p.is_pending())
            .map(Payment::id_typed)
            .collect()
    }

    pub fn has_pending_inpayments(&self) -> bool {
        self.payments
            .iter()
            .any(|p| p.is_inpayment() && p.is_pending())
    }

    /// Non-cancelled in-payments.
    pub fn inpayments(&self) -> impl Iterator<Item = &Payment> {
        self.payments
            .iter()
            .filter(|p| p.is_inpayment() && !p.is_cancelled())
    }

    pub fn inpayments_count(&self) -> usize {
        self.inpayments().count()
    }

    /// At least one in-payment, and every non-cancelled one is paid.
    pub fn is_fully_paid(&self) -> bool {
        let mut any = false;
        for p in self.inpayments() {
            if !p.is_paid() {
                return false;
            }
            any = true;
        }
        any
    }

    /// Paid in minus paid out.
    pub fn total_paid(&self) -> Decimal {
        self.payments
            .iter()
            .filter(|p| p.is_paid())
            .map(|p| match p.kind() {
                PaymentKind::In => p.value(),
                PaymentKind::Out => -p.value(),
            })
            .sum()
    }

    /// Value of pending in-payments made with `method`.
    pub fn pending_value(&self, method: PaymentMethod) -> Decimal {
        self.payments
            .iter()
            .filter(|p| p.is_inpayment() && p.is_pending() && p.method() == method)
            .map(Payment::value)
            .sum()
    }

    /// Cancel every pending payment; returns how many were cancelled.
    pub fn cancel_pending(&mut self, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut count = 0;
        for p in self.payments.iter_mut().filter(|p| p.is_pending()) {
            p.cancel(now)?;
            count += 1;
        }
        Ok(count)
    }

    /// Cancel every payment that is not cancelled yet, paid ones included.
    pub fn cancel_all(&mut self, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut count = 0;
        for p in self.payments.iter_mut().filter(|p| !p.is_cancelled()) {
            p.cancel(now)?;
            count += 1;
        }
        Ok(count)
    }
}

impl AggregateRoot for PaymentGroup {
    type Id = PaymentGroupId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        0
    }
}
