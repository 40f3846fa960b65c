use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflow_core::{DomainError, DomainResult, Entity, typed_id};

typed_id!(
    /// Payment identifier.
    PaymentId
);

/// How the money moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Money,
    Check,
    Card,
    Bill,
    /// Consumes the client's credit balance.
    Credit,
    /// Consumes the client's store credit line.
    StoreCredit,
    /// Value carried over from a returned sale.
    Trade,
}

/// Direction: `In` is received from the payer, `Out` is paid back to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A single installment or reimbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    method: PaymentMethod,
    kind: PaymentKind,
    status: PaymentStatus,
    value: Decimal,
    description: String,
    open_date: DateTime<Utc>,
    paid_date: Option<DateTime<Utc>>,
    cancel_date: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(
        id: PaymentId,
        kind: PaymentKind,
        method: PaymentMethod,
        value: Decimal,
        description: impl Into<String>,
        open_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            method,
            kind,
            status: PaymentStatus::Pending,
            value,
            description: description.into(),
            open_date,
            paid_date: None,
            cancel_date: None,
        }
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn kind(&self) -> PaymentKind {
        self.kind
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn open_date(&self) -> DateTime<Utc> {
        self.open_date
    }

    pub fn paid_date(&self) -> Option<DateTime<Utc>> {
        self.paid_date
    }

    pub fn cancel_date(&self) -> Option<DateTime<Utc>> {
        self.cancel_date
    }

    pub fn is_inpayment(&self) -> bool {
        self.kind == PaymentKind::In
    }

    pub fn is_outpayment(&self) -> bool {
        self.kind == PaymentKind::Out
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == PaymentStatus::Cancelled
    }

    pub fn pay(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_pending() {
            return Err(DomainError::invalid_transition(format!(
                "Payment {} cannot be paid while {}",
                self.description, self.status
            )));
        }
        self.status = PaymentStatus::Paid;
        self.paid_date = Some(now);
        Ok(())
    }

    /// Paid payments can be cancelled too (e.g. when the sale is cancelled).
    pub fn cancel(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.is_cancelled() {
            return Err(DomainError::invalid_transition(format!(
                "Payment {} is already cancelled",
                self.description
            )));
        }
        self.status = PaymentStatus::Cancelled;
        self.cancel_date = Some(now);
        Ok(())
    }

    pub fn set_not_paid(&mut self) -> DomainResult<()> {
        if !self.is_paid() {
            return Err(DomainError::invalid_transition(format!(
                "Payment {} is not paid",
                self.description
            )));
        }
        self.status = PaymentStatus::Pending;
        self.paid_date = None;
        Ok(())
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
