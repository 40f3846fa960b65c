//! Fiscal book entries produced by a sale and their reversals on return.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use saleflow_accounting::{FiscalBook, FiscalBookEntry, FiscalEntryKind};
use saleflow_catalog::SellableFacet;
use saleflow_core::{AggregateId, DomainResult, quantize};

use crate::sale::Sale;

/// Item value per fiscal kind, as (products, services).
pub(crate) fn value_by_kind<'a>(
    lines: impl Iterator<Item = (&'a SellableFacet, Decimal)>,
) -> (Decimal, Decimal) {
    lines.fold((Decimal::ZERO, Decimal::ZERO), |(p, s), (facet, value)| match facet {
        SellableFacet::Product(_) => (p + value, s),
        SellableFacet::Service(_) => (p, s + value),
    })
}

/// Book the taxes of a confirmed sale: one product entry and one service
/// entry, each only when the sale has such items.
pub(crate) fn record_sale_entries(sale: &Sale, book: &mut dyn FiscalBook) -> DomainResult<()> {
    let date = sale.confirm_date().unwrap_or_else(|| sale.open_date());
    let group = sale.group().id_typed();

    let mut has_products = false;
    let mut has_services = false;
    let (mut icms, mut ipi, mut iss) = (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
    for item in sale.items() {
        match item.sellable().facet() {
            SellableFacet::Product(p) => {
                has_products = true;
                icms += item.total() * p.icms_rate / Decimal::ONE_HUNDRED;
                ipi += item.total() * p.ipi_rate / Decimal::ONE_HUNDRED;
            }
            SellableFacet::Service(s) => {
                has_services = true;
                iss += item.total() * s.iss_rate / Decimal::ONE_HUNDRED;
            }
        }
    }

    if has_products {
        book.record(FiscalBookEntry::product(group, quantize(icms), quantize(ipi), date))?;
    }
    if has_services {
        book.record(FiscalBookEntry::service(group, quantize(iss), date))?;
    }
    Ok(())
}

/// Reverse `returned / original` of every original entry of the sale's
/// group, per kind. When `completing` the remainder is reversed exactly.
pub(crate) fn record_reversals(
    sale: &Sale,
    book: &mut dyn FiscalBook,
    source: AggregateId,
    returned: (Decimal, Decimal),
    completing: bool,
    date: DateTime<Utc>,
) -> DomainResult<()> {
    let group = sale.group().id_typed();
    let original = value_by_kind(sale.items().iter().map(|i| (i.sellable().facet(), i.total())));
    let reversals = book.entries(group, true);

    for entry in book.entries(group, false) {
        let (returned_value, original_value) = match entry.kind {
            FiscalEntryKind::Product => (returned.0, original.0),
            FiscalEntryKind::Service => (returned.1, original.1),
        };
        if returned_value.is_zero() && !completing {
            continue;
        }

        let reversed = |f: fn(&FiscalBookEntry) -> Decimal| -> Decimal {
            reversals
                .iter()
                .filter(|r| r.kind == entry.kind)
                .map(f)
                .sum()
        };
        let scale = |value: Decimal, already: Decimal| -> Decimal {
            if completing {
                value - already
            } else if original_value.is_zero() {
                Decimal::ZERO
            } else {
                quantize(value * returned_value / original_value)
            }
        };

        let icms = scale(entry.icms, reversed(|r| r.icms));
        let iss = scale(entry.iss, reversed(|r| r.iss));
        let ipi = scale(entry.ipi, reversed(|r| r.ipi));
        if icms.is_zero() && iss.is_zero() && ipi.is_zero() {
            continue;
        }

        let reversal = match entry.kind {
            FiscalEntryKind::Product => FiscalBookEntry::product(group, icms, ipi, date),
            FiscalEntryKind::Service => FiscalBookEntry::service(group, iss, date),
        };
        book.record(reversal.reversing(source))?;
    }
    Ok(())
}
