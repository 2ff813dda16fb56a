//! Configuration types for a marketplace instance.

use serde::{Deserialize, Serialize};

use crate::{constants, Address, MarketError, Result};

/// What happens to payment above the listed price in a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverpaymentPolicy {
    /// Credit the seller exactly the price; the excess becomes the buyer's
    /// withdrawable balance.
    #[default]
    Refund,
    /// Credit the seller the full payment.
    CreditSeller,
}

impl std::fmt::Display for OverpaymentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Refund => write!(f, "REFUND"),
            Self::CreditSeller => write!(f, "CREDIT_SELLER"),
        }
    }
}

/// Configuration for a single marketplace instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// The marketplace's own address: the operator that sellers approve.
    pub marketplace: Address,
    /// Handling of payment above the listed price.
    #[serde(default)]
    pub overpayment: OverpaymentPolicy,
    /// Verify custody accounting before committing each purchase and withdrawal.
    #[serde(default = "default_enforce_custody")]
    pub enforce_custody: bool,
}

fn default_enforce_custody() -> bool {
    constants::DEFAULT_ENFORCE_CUSTODY
}

impl MarketConfig {
    /// Config with default policies for the given marketplace address.
    #[must_use]
    pub fn new(marketplace: Address) -> Self {
        Self {
            marketplace,
            overpayment: OverpaymentPolicy::default(),
            enforce_custody: constants::DEFAULT_ENFORCE_CUSTODY,
        }
    }

    #[must_use]
    pub fn with_overpayment(mut self, policy: OverpaymentPolicy) -> Self {
        self.overpayment = policy;
        self
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the marketplace cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.marketplace.is_zero() {
            return Err(MarketError::Configuration(
                "marketplace address must not be zero".to_string(),
            ));
        }
        Ok(())
    }
}
