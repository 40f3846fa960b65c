use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflow_core::{AggregateId, DomainError, DomainResult, typed_id};
use saleflow_payments::PaymentId;

typed_id!(
    /// Commission identifier.
    CommissionId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionKind {
    /// Paid in a single in-payment.
    Direct,
    /// Paid in installments.
    Installments,
}

/// Salesperson commission for one payment of a sale.
///
/// Reversals (from returns) carry a negative `value` and the returned sale in
/// `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub id: CommissionId,
    pub sale: AggregateId,
    pub payment: PaymentId,
    pub value: Decimal,
    pub kind: CommissionKind,
    pub is_reversal: bool,
    pub source: Option<AggregateId>,
}

impl Commission {
    pub fn new(sale: AggregateId, payment: PaymentId, value: Decimal, kind: CommissionKind) -> Self {
        Self {
            id: CommissionId::generate(),
            sale,
            payment,
            value,
            kind,
            is_reversal: false,
            source: None,
        }
    }

    pub fn reversal(
        sale: AggregateId,
        payment: PaymentId,
        value: Decimal,
        kind: CommissionKind,
        source: AggregateId,
    ) -> Self {
        Self {
            is_reversal: true,
            source: Some(source),
            ..Self::new(sale, payment, -value.abs(), kind)
        }
    }
}

/// Commission collaborator.
pub trait CommissionBook {
    fn record(&mut self, commission: Commission) -> DomainResult<()>;

    /// Every commission of the sale, reversals included.
    fn for_sale(&self, sale: AggregateId) -> Vec<Commission>;

    /// The original (non-reversal) commission of a payment, if any.
    fn for_payment(&self, sale: AggregateId, payment: PaymentId) -> Option<Commission>;

    /// Drop commissions produced by `source`; returns how many were removed.
    fn remove_by_source(&mut self, source: AggregateId) -> usize;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCommissionBook {
    commissions: Vec<Commission>,
}

impl InMemoryCommissionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Commission] {
        &self.commissions
    }

    /// Originals plus (negative) reversals.
    pub fn net_for_sale(&self, sale: AggregateId) -> Decimal {
        self.commissions
            .iter()
            .filter(|c| c.sale == sale)
            .map(|c| c.value)
            .sum()
    }
}

impl CommissionBook for InMemoryCommissionBook {
    fn record(&mut self, commission: Commission) -> DomainResult<()> {
        if !commission.is_reversal && self.for_payment(commission.sale, commission.payment).is_some() {
            return Err(DomainError::consistency(format!(
                "payment {} already has a commission",
                commission.payment
            )));
        }
        self.commissions.push(commission);
        Ok(())
    }

    fn for_sale(&self, sale: AggregateId) -> Vec<Commission> {
        self.commissions
            .iter()
            .filter(|c| c.sale == sale)
            .cloned()
            .collect()
    }

    fn for_payment(&self, sale: AggregateId, payment: PaymentId) -> Option<Commission> {
        self.commissions
            .iter()
            .find(|c| c.sale == sale && c.payment == payment && !c.is_reversal)
            .cloned()
    }

    fn remove_by_source(&mut self, source: AggregateId) -> usize {
        let before = self.commissions.len();
        self.commissions.retain(|c| c.source != Some(source));
        before - self.commissions.len()
    }
}
