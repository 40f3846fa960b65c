use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflow_core::{AggregateId, DomainError, DomainResult, typed_id};
use saleflow_payments::PaymentGroupId;

typed_id!(
    /// Fiscal book entry identifier.
    FiscalEntryId
);

/// Which tax book an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalEntryKind {
    /// ICMS/IPI book.
    Product,
    /// ISS book.
    Service,
}

/// Tax-ledger record tied to a payment group.
///
/// Reversal entries carry the returned sale that produced them in `source`
/// and hold positive values; they are subtracted when netting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalBookEntry {
    pub id: FiscalEntryId,
    pub group: PaymentGroupId,
    pub kind: FiscalEntryKind,
    pub icms: Decimal,
    pub iss: Decimal,
    pub ipi: Decimal,
    pub is_reversal: bool,
    pub source: Option<AggregateId>,
    pub date: DateTime<Utc>,
}

impl FiscalBookEntry {
    pub fn product(
        group: PaymentGroupId,
        icms: Decimal,
        ipi: Decimal,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: FiscalEntryId::generate(),
            group,
            kind: FiscalEntryKind::Product,
            icms,
            iss: Decimal::ZERO,
            ipi,
            is_reversal: false,
            source: None,
            date,
        }
    }

    pub fn service(group: PaymentGroupId, iss: Decimal, date: DateTime<Utc>) -> Self {
        Self {
            id: FiscalEntryId::generate(),
            group,
            kind: FiscalEntryKind::Service,
            icms: Decimal::ZERO,
            iss,
            ipi: Decimal::ZERO,
            is_reversal: false,
            source: None,
            date,
        }
    }

    /// Mark as a reversal produced by `source`.
    pub fn reversing(mut self, source: AggregateId) -> Self {
        self.is_reversal = true;
        self.source = Some(source);
        self
    }

    /// Sum of all tax values of the entry.
    pub fn total(&self) -> Decimal {
        self.icms + self.iss + self.ipi
    }
}

/// Fiscal book collaborator.
pub trait FiscalBook {
    fn record(&mut self, entry: FiscalBookEntry) -> DomainResult<()>;

    /// Entries of the group with the given reversal flag, in recording order.
    fn entries(&self, group: PaymentGroupId, is_reversal: bool) -> Vec<FiscalBookEntry>;

    /// Drop entries produced by `source`; returns how many were removed.
    fn remove_by_source(&mut self, source: AggregateId) -> usize;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryFiscalBook {
    entries: Vec<FiscalBookEntry>,
}

impl InMemoryFiscalBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[FiscalBookEntry] {
        &self.entries
    }

    /// Originals minus reversals for the group and kind, as (icms, iss, ipi).
    pub fn net(&self, group: PaymentGroupId, kind: FiscalEntryKind) -> (Decimal, Decimal, Decimal) {
        self.entries
            .iter()
            .filter(|e| e.group == group && e.kind == kind)
            .fold((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO), |acc, e| {
                let sign = if e.is_reversal { -Decimal::ONE } else { Decimal::ONE };
                (
                    acc.0 + sign * e.icms,
                    acc.1 + sign * e.iss,
                    acc.2 + sign * e.ipi,
                )
            })
    }
}

impl FiscalBook for InMemoryFiscalBook {
    fn record(&mut self, entry: FiscalBookEntry) -> DomainResult<()> {
        if entry.is_reversal && entry.source.is_none() {
            return Err(DomainError::consistency(
                "a fiscal reversal must reference the return that produced it",
            ));
        }
        self.entries.push(entry);
        Ok(())
    }

    fn entries(&self, group: PaymentGroupId, is_reversal: bool) -> Vec<FiscalBookEntry> {
        self.entries
            .iter()
            .filter(|e| e.group == group && e.is_reversal == is_reversal)
            .cloned()
            .collect()
    }

    fn remove_by_source(&mut self, source: AggregateId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.source != Some(source));
        before - self.entries.len()
    }
}
