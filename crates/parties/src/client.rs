use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflow_core::{AggregateId, AggregateRoot, DomainError, DomainResult};

/// Client identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub AggregateId);

impl ClientId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ClientId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Client financial standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Solvent,
    Indebted,
    Insolvent,
    Inactive,
}

impl core::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ClientStatus::Solvent => write!(f, "Solvent"),
            ClientStatus::Indebted => write!(f, "Indebted"),
            ClientStatus::Insolvent => write!(f, "Insolvent"),
            ClientStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

/// Aggregate root: Client.
///
/// Two independent credit lines exist:
/// - `credit_balance`: money the client has on account (e.g. from returns),
///   consumed by `Credit` payments;
/// - `credit_limit` minus `store_credit_used`: the store credit line,
///   consumed by `StoreCredit` payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    id: ClientId,
    name: String,
    status: ClientStatus,
    credit_balance: Decimal,
    credit_limit: Decimal,
    store_credit_used: Decimal,
}

impl Client {
    pub fn new(id: ClientId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: ClientStatus::Solvent,
            credit_balance: Decimal::ZERO,
            credit_limit: Decimal::ZERO,
            store_credit_used: Decimal::ZERO,
        }
    }

    pub fn with_status(mut self, status: ClientStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_credit_balance(mut self, balance: Decimal) -> Self {
        self.credit_balance = balance;
        self
    }

    pub fn with_credit_limit(mut self, limit: Decimal) -> Self {
        self.credit_limit = limit;
        self
    }

    pub fn id_typed(&self) -> ClientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ClientStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ClientStatus) {
        self.status = status;
    }

    pub fn credit_balance(&self) -> Decimal {
        self.credit_balance
    }

    pub fn credit_limit(&self) -> Decimal {
        self.credit_limit
    }

    pub fn store_credit_used(&self) -> Decimal {
        self.store_credit_used
    }

    /// Store credit still available (never negative).
    pub fn remaining_store_credit(&self) -> Decimal {
        (self.credit_limit - self.store_credit_used).max(Decimal::ZERO)
    }

    pub fn use_store_credit(&mut self, amount: Decimal) -> DomainResult<()> {
        self.ensure_store_credit_available(amount)?;
        self.store_credit_used += amount;
        Ok(())
    }

    pub fn is_solvent(&self) -> bool {
        self.status == ClientStatus::Solvent
    }

    /// Only solvent clients can buy.
    pub fn ensure_can_purchase(&self) -> DomainResult<()> {
        if !self.is_solvent() {
            return Err(DomainError::client_ineligible(format!(
                "Unable to make sales for clients with status {}",
                self.status
            )));
        }
        Ok(())
    }

    pub fn ensure_credit_available(&self, amount: Decimal) -> DomainResult<()> {
        if amount > self.credit_balance {
            return Err(self.not_enough_credit());
        }
        Ok(())
    }

    pub fn ensure_store_credit_available(&self, amount: Decimal) -> DomainResult<()> {
        if amount > self.remaining_store_credit() {
            return Err(self.not_enough_credit());
        }
        Ok(())
    }

    fn not_enough_credit(&self) -> DomainError {
        DomainError::client_ineligible(format!(
            "Client {} does not have enough credit left to purchase.",
            self.name
        ))
    }
}

impl AggregateRoot for Client {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        0
    }
}
