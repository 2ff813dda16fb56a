//! Error types for the NftMarket ledger.
//!
//! All errors use the `NM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Listing errors
//! - 2xx: Purchase errors
//! - 3xx: Proceeds errors
//! - 6xx: External collaborator errors
//! - 8xx: Invariant errors
//! - 9xx: General / input errors

use thiserror::Error;

use crate::{Address, Amount, AssetId};

/// Central error enum for all marketplace operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    // =================================================================
    // Listing Errors (1xx)
    // =================================================================
    /// Caller does not own the asset, or is not the listing's seller.
    #[error("NM_ERR_100: Caller is not the owner")]
    NotOwner,

    /// A listing price of zero was supplied.
    #[error("NM_ERR_101: Price must be above zero")]
    PriceMustBeAboveZero,

    /// The marketplace is not an approved operator for the asset.
    #[error("NM_ERR_102: Marketplace is not approved to transfer the asset")]
    NotApprovedForMarketplace,

    /// The asset already has an active listing.
    #[error("NM_ERR_103: Already listed: {collection} #{asset_id}")]
    AlreadyListed {
        collection: Address,
        asset_id: AssetId,
    },

    /// The asset has no active listing.
    #[error("NM_ERR_104: Not listed: {collection} #{asset_id}")]
    NotListed {
        collection: Address,
        asset_id: AssetId,
    },

    // =================================================================
    // Purchase Errors (2xx)
    // =================================================================
    /// The seller tried to buy their own listing.
    #[error("NM_ERR_200: Owner cannot buy own item")]
    OwnerCannotBuyOwnItem,

    /// Payment is below the listed price.
    #[error("NM_ERR_201: Insufficient purchase amount: price {price}, paid {paid}")]
    InsufficientPurchaseAmt { price: Amount, paid: Amount },

    // =================================================================
    // Proceeds Errors (3xx)
    // =================================================================
    /// Withdrawal attempted with a zero balance.
    #[error("NM_ERR_300: No proceeds to withdraw")]
    ZeroProceeds,

    /// A proceeds credit would overflow 256 bits.
    #[error("NM_ERR_301: Proceeds balance overflow")]
    ProceedsOverflow,

    /// Withdrawal attempted from inside another marketplace operation.
    /// A payout cannot be undone, so it may only run at the outermost level.
    #[error("NM_ERR_302: Withdrawal not allowed during another operation")]
    ReentrantWithdrawal,

    // =================================================================
    // External Collaborator Errors (6xx)
    // =================================================================
    /// The asset-ownership provider failed to answer an owner/approval query.
    #[error("NM_ERR_600: Ownership query failed: {reason}")]
    OwnershipQueryFailed { reason: String },

    /// The asset-ownership provider rejected the transfer.
    #[error("NM_ERR_601: Asset transfer failed: {reason}")]
    AssetTransferFailed { reason: String },

    /// The value-transfer primitive rejected the payment.
    #[error("NM_ERR_602: Fund transfer failed: {reason}")]
    FundTransferFailed { reason: String },

    // =================================================================
    // Invariant Errors (8xx)
    // =================================================================
    /// Custody accounting no longer matches outstanding proceeds.
    #[error("NM_ERR_800: Custody invariant violation: {reason}")]
    CustodyInvariantViolation { reason: String },

    // =================================================================
    // General (9xx)
    // =================================================================
    /// A string could not be parsed as an address.
    #[error("NM_ERR_900: Invalid address: {0}")]
    InvalidAddress(String),

    /// Serialization / deserialization error.
    #[error("NM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("NM_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl MarketError {
    /// Numeric code of this error (the digits after `NM_ERR_`).
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::NotOwner => 100,
            Self::PriceMustBeAboveZero => 101,
            Self::NotApprovedForMarketplace => 102,
            Self::AlreadyListed { .. } => 103,
            Self::NotListed { .. } => 104,
            Self::OwnerCannotBuyOwnItem => 200,
            Self::InsufficientPurchaseAmt { .. } => 201,
            Self::ZeroProceeds => 300,
            Self::ProceedsOverflow => 301,
            Self::ReentrantWithdrawal => 302,
            Self::OwnershipQueryFailed { .. } => 600,
            Self::AssetTransferFailed { .. } => 601,
            Self::FundTransferFailed { .. } => 602,
            Self::CustodyInvariantViolation { .. } => 800,
            Self::InvalidAddress(_) => 900,
            Self::Serialization(_) => 901,
            Self::Configuration(_) => 902,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
