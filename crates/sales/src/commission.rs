//! Salesperson commissions derived from a sale.
//!
//! A commission is created per in-payment: the commission percentage of each
//! item, weighted by the payment's share of the sale total. When the group has
//! more than one in-payment the sellable's installments percentage applies.

use rust_decimal::Decimal;
use tracing::debug;

use saleflow_accounting::{Commission, CommissionBook, CommissionKind};
use saleflow_core::{AggregateId, DomainResult, quantize};
use saleflow_payments::{Payment, PaymentId};

use crate::sale::Sale;

pub(crate) fn kind_for(sale: &Sale) -> CommissionKind {
    if sale.group().inpayments_count() > 1 {
        CommissionKind::Installments
    } else {
        CommissionKind::Direct
    }
}

/// Commission owed for `payment`; zero when no item carries a commission.
pub fn commission_value(sale: &Sale, payment: &Payment) -> Decimal {
    let total = sale.total_amount();
    if total.is_zero() {
        return Decimal::ZERO;
    }
    let kind = kind_for(sale);
    let weighted: Decimal = sale
        .items()
        .iter()
        .filter_map(|item| {
            let source = item.sellable().commission()?;
            let pct = match kind {
                CommissionKind::Direct => source.direct_pct,
                CommissionKind::Installments => source.installments_pct,
            };
            Some(item.total() * pct / Decimal::ONE_HUNDRED)
        })
        .sum();
    quantize(weighted * payment.value() / total)
}

/// Create the commission for a paid in-payment unless it already exists.
pub(crate) fn create_for_payment(
    sale: &Sale,
    payment: PaymentId,
    book: &mut dyn CommissionBook,
) -> DomainResult<bool> {
    let sale_id = sale.id_typed().0;
    if book.for_payment(sale_id, payment).is_some() {
        return Ok(false);
    }
    let Some(payment) = sale.group().get(payment) else {
        return Ok(false);
    };
    if !payment.is_inpayment() || payment.is_cancelled() {
        return Ok(false);
    }
    let value = commission_value(sale, payment);
    if value.is_zero() {
        return Ok(false);
    }
    book.record(Commission::new(sale_id, payment.id_typed(), value, kind_for(sale)))?;
    debug!(sale = %sale.id_typed(), payment = %payment.id_typed(), %value, "commission created");
    Ok(true)
}

/// Create commissions for every in-payment matching `filter`.
pub(crate) fn create_missing(
    sale: &Sale,
    book: &mut dyn CommissionBook,
    filter: impl Fn(&Payment) -> bool,
) -> DomainResult<usize> {
    let payments: Vec<PaymentId> = sale
        .group()
        .inpayments()
        .filter(|p| filter(p))
        .map(Payment::id_typed)
        .collect();
    let mut created = 0;
    for payment in payments {
        if create_for_payment(sale, payment, book)? {
            created += 1;
        }
    }
    Ok(created)
}

/// Reverse `returned_value / subtotal` of every original commission of the
/// sale. When `completing` whatever is left of each commission is reversed.
pub(crate) fn record_reversals(
    sale: &Sale,
    book: &mut dyn CommissionBook,
    source: AggregateId,
    returned_value: Decimal,
    completing: bool,
) -> DomainResult<()> {
    let sale_id = sale.id_typed().0;
    let subtotal = sale.subtotal();
    let commissions = book.for_sale(sale_id);

    for original in commissions.iter().filter(|c| !c.is_reversal) {
        let already: Decimal = commissions
            .iter()
            .filter(|c| c.is_reversal && c.payment == original.payment)
            .map(|c| -c.value)
            .sum();
        let value = if completing {
            original.value - already
        } else if subtotal.is_zero() {
            Decimal::ZERO
        } else {
            quantize(original.value * returned_value / subtotal)
        };
        if value.is_zero() {
            continue;
        }
        book.record(Commission::reversal(
            sale_id,
            original.payment,
            value,
            original.kind,
            source,
        ))?;
    }
    Ok(())
}
