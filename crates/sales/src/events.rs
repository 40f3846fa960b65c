use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflow_events::Event;

use crate::returned::ReturnedSaleId;
use crate::sale::SaleId;

/// Event: SaleOrdered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOrdered {
    pub sale: SaleId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfirmed {
    pub sale: SaleId,
    pub total: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SalePaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePaid {
    pub sale: SaleId,
    pub value: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleNotPaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleNotPaid {
    pub sale: SaleId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCancelled {
    pub sale: SaleId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleReturned.
///
/// `total` is set once every item has been fully returned; `trade` when the
/// returned value went to another sale instead of a reimbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReturned {
    pub sale: SaleId,
    pub returned_sale: ReturnedSaleId,
    pub total: bool,
    pub trade: bool,
    pub value: Decimal,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleReturnUndone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReturnUndone {
    pub sale: SaleId,
    pub returned_sale: Option<ReturnedSaleId>,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleRenegotiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRenegotiated {
    pub sale: SaleId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleEvent {
    SaleOrdered(SaleOrdered),
    SaleConfirmed(SaleConfirmed),
    SalePaid(SalePaid),
    SaleNotPaid(SaleNotPaid),
    SaleCancelled(SaleCancelled),
    SaleReturned(SaleReturned),
    SaleReturnUndone(SaleReturnUndone),
    SaleRenegotiated(SaleRenegotiated),
}

impl Event for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::SaleOrdered(_) => "sales.sale.ordered",
            SaleEvent::SaleConfirmed(_) => "sales.sale.confirmed",
            SaleEvent::SalePaid(_) => "sales.sale.paid",
            SaleEvent::SaleNotPaid(_) => "sales.sale.not_paid",
            SaleEvent::SaleCancelled(_) => "sales.sale.cancelled",
            SaleEvent::SaleReturned(_) => "sales.sale.returned",
            SaleEvent::SaleReturnUndone(_) => "sales.sale.return_undone",
            SaleEvent::SaleRenegotiated(_) => "sales.sale.renegotiated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::SaleOrdered(e) => e.occurred_at,
            SaleEvent::SaleConfirmed(e) => e.occurred_at,
            SaleEvent::SalePaid(e) => e.occurred_at,
            SaleEvent::SaleNotPaid(e) => e.occurred_at,
            SaleEvent::SaleCancelled(e) => e.occurred_at,
            SaleEvent::SaleReturned(e) => e.occurred_at,
            SaleEvent::SaleReturnUndone(e) => e.occurred_at,
            SaleEvent::SaleRenegotiated(e) => e.occurred_at,
        }
    }
}
