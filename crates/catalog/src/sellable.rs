use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflow_core::{AggregateId, AggregateRoot, DomainError, DomainResult};

/// Sellable identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SellableId(pub AggregateId);

impl SellableId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SellableId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Whether the sellable can currently appear on a confirmed sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellableStatus {
    Available,
    Closed,
}

/// Product facet. Tax rates are percentages (18 means 18%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFacet {
    /// Stock is tracked per branch for this product.
    pub storable: bool,
    /// Stock is additionally tracked per batch; sale items need a batch to confirm.
    pub batch_tracked: bool,
    /// Bundle whose components are sold as child items.
    pub is_package: bool,
    pub icms_rate: Decimal,
    pub ipi_rate: Decimal,
}

impl ProductFacet {
    /// A storable product without batches, package or taxes.
    pub fn storable() -> Self {
        Self {
            storable: true,
            batch_tracked: false,
            is_package: false,
            icms_rate: Decimal::ZERO,
            ipi_rate: Decimal::ZERO,
        }
    }
}

/// Service facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFacet {
    pub iss_rate: Decimal,
}

/// What kind of thing is being sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SellableFacet {
    Product(ProductFacet),
    Service(ServiceFacet),
}

/// Commission percentages paid to the salesperson.
///
/// `installments_pct` applies when the sale is paid in more than one
/// in-payment, `direct_pct` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSource {
    pub direct_pct: Decimal,
    pub installments_pct: Decimal,
}

/// Catalog entry that can appear on a sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sellable {
    id: SellableId,
    code: String,
    description: String,
    base_price: Decimal,
    status: SellableStatus,
    facet: SellableFacet,
    commission: Option<CommissionSource>,
}

impl Sellable {
    pub fn new(
        id: SellableId,
        code: impl Into<String>,
        description: impl Into<String>,
        base_price: Decimal,
        facet: SellableFacet,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            description: description.into(),
            base_price,
            status: SellableStatus::Available,
            facet,
            commission: None,
        }
    }

    pub fn product(
        id: SellableId,
        code: impl Into<String>,
        description: impl Into<String>,
        base_price: Decimal,
        product: ProductFacet,
    ) -> Self {
        Self::new(id, code, description, base_price, SellableFacet::Product(product))
    }

    pub fn service(
        id: SellableId,
        code: impl Into<String>,
        description: impl Into<String>,
        base_price: Decimal,
        iss_rate: Decimal,
    ) -> Self {
        Self::new(
            id,
            code,
            description,
            base_price,
            SellableFacet::Service(ServiceFacet { iss_rate }),
        )
    }

    pub fn with_commission(mut self, direct_pct: Decimal, installments_pct: Decimal) -> Self {
        self.commission = Some(CommissionSource {
            direct_pct,
            installments_pct,
        });
        self
    }

    pub fn id_typed(&self) -> SellableId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    pub fn set_base_price(&mut self, price: Decimal) {
        self.base_price = price;
    }

    pub fn status(&self) -> SellableStatus {
        self.status
    }

    pub fn facet(&self) -> &SellableFacet {
        &self.facet
    }

    pub fn commission(&self) -> Option<&CommissionSource> {
        self.commission.as_ref()
    }

    pub fn is_available(&self) -> bool {
        self.status == SellableStatus::Available
    }

    pub fn close(&mut self) -> DomainResult<()> {
        if self.status == SellableStatus::Closed {
            return Err(DomainError::invalid_transition(format!(
                "{} is already closed",
                self.description
            )));
        }
        self.status = SellableStatus::Closed;
        Ok(())
    }

    pub fn set_available(&mut self) {
        self.status = SellableStatus::Available;
    }

    pub fn product_facet(&self) -> Option<&ProductFacet> {
        match &self.facet {
            SellableFacet::Product(p) => Some(p),
            SellableFacet::Service(_) => None,
        }
    }

    pub fn service_facet(&self) -> Option<&ServiceFacet> {
        match &self.facet {
            SellableFacet::Service(s) => Some(s),
            SellableFacet::Product(_) => None,
        }
    }

    pub fn is_service(&self) -> bool {
        matches!(self.facet, SellableFacet::Service(_))
    }

    pub fn is_storable(&self) -> bool {
        self.product_facet().is_some_and(|p| p.storable)
    }

    pub fn is_batch_tracked(&self) -> bool {
        self.product_facet().is_some_and(|p| p.storable && p.batch_tracked)
    }

    pub fn is_package(&self) -> bool {
        self.product_facet().is_some_and(|p| p.is_package)
    }
}

impl AggregateRoot for Sellable {
    type Id = SellableId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_sellable_id() -> SellableId {
        SellableId::new(AggregateId::new())
    }

    #[test]
    fn product_facets_drive_predicates() {
        let batch = Sellable::product(
            test_sellable_id(),
            "0001",
            "Rice",
            dec!(10),
            ProductFacet {
                batch_tracked: true,
                ..ProductFacet::storable()
            },
        );
        assert!(batch.is_storable());
        assert!(batch.is_batch_tracked());
        assert!(!batch.is_service());
        assert!(!batch.is_package());

        let non_storable = Sellable::product(
            test_sellable_id(),
            "0002",
            "Gift wrap",
            dec!(1),
            ProductFacet {
                storable: false,
                batch_tracked: true,
                ..ProductFacet::storable()
            },
        );
        assert!(!non_storable.is_storable());
        assert!(!non_storable.is_batch_tracked());
    }

    #[test]
    fn services_are_never_storable() {
        let service = Sellable::service(test_sellable_id(), "S01", "Repair", dec!(50), dec!(5));
        assert!(service.is_service());
        assert!(!service.is_storable());
        assert_eq!(service.service_facet().map(|s| s.iss_rate), Some(dec!(5)));
        assert!(service.product_facet().is_none());
    }

    #[test]
    fn close_then_make_available_again() {
        let mut sellable =
            Sellable::product(test_sellable_id(), "0003", "Beans", dec!(7), ProductFacet::storable());
        assert!(sellable.is_available());

        sellable.close().unwrap();
        assert!(!sellable.is_available());
        match sellable.close() {
            Err(DomainError::InvalidTransition(_)) => {}
            other => panic!("Expected InvalidTransition, got {other:?}"),
        }

        sellable.set_available();
        assert!(sellable.is_available());
    }

    #[test]
    fn facet_is_tagged_in_json() {
        let service = Sellable::service(test_sellable_id(), "S01", "Repair", dec!(50), dec!(5));
        let json = serde_json::to_value(service.facet()).unwrap();
        assert_eq!(json["kind"], "service");
    }
}
