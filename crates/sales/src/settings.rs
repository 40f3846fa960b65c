//! Engine settings.
//!
//! Read once by the embedding application (usually via [`SalesSettings::from_env`])
//! and passed to every operation through the sale context.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// When salesperson commissions are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommissionPolicy {
    /// One commission per in-payment as soon as the sale is confirmed.
    OnConfirm,
    /// A commission each time an in-payment of a confirmed sale is paid.
    #[default]
    #[serde(rename = "on_payment")]
    OnEachPayment,
    /// All commissions at once, when the last in-payment is paid.
    WhenFullyPaid,
}

impl core::str::FromStr for CommissionPolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_confirm" => Ok(CommissionPolicy::OnConfirm),
            "on_payment" => Ok(CommissionPolicy::OnEachPayment),
            "when_fully_paid" => Ok(CommissionPolicy::WhenFullyPaid),
            other => Err(SettingsError::UnknownCommissionPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unknown commission policy: {0} (expected on_confirm, on_payment or when_fully_paid)")]
    UnknownCommissionPolicy(String),

    #[error("{var} must be a boolean, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SalesSettings {
    pub commission_policy: CommissionPolicy,
    /// Lets non-administrators cancel ordered and confirmed sales.
    pub allow_cancel_confirmed_sales: bool,
}

impl SalesSettings {
    pub const COMMISSION_POLICY_VAR: &'static str = "SALE_COMMISSION_POLICY";
    pub const PAY_COMMISSION_WHEN_CONFIRMED_VAR: &'static str = "SALE_PAY_COMMISSION_WHEN_CONFIRMED";
    pub const ALLOW_CANCEL_CONFIRMED_VAR: &'static str = "ALLOW_CANCEL_CONFIRMED_SALES";

    /// Read settings from the process environment.
    ///
    /// `SALE_COMMISSION_POLICY` wins over the legacy boolean
    /// `SALE_PAY_COMMISSION_WHEN_CONFIRMED` when both are set.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(value) = lookup(Self::PAY_COMMISSION_WHEN_CONFIRMED_VAR) {
            if parse_bool(Self::PAY_COMMISSION_WHEN_CONFIRMED_VAR, &value)? {
                settings.commission_policy = CommissionPolicy::OnConfirm;
            }
        }

        if let Some(value) = lookup(Self::COMMISSION_POLICY_VAR) {
            settings.commission_policy = value.parse()?;
        }

        if let Some(value) = lookup(Self::ALLOW_CANCEL_CONFIRMED_VAR) {
            settings.allow_cancel_confirmed_sales =
                parse_bool(Self::ALLOW_CANCEL_CONFIRMED_VAR, &value)?;
        }

        Ok(settings)
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SettingsError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}
