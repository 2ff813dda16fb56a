//! Access guard: hard gate for listing authorization.
//!
//! The AccessGuard answers two questions against the external asset
//! ownership provider before a listing is created:
//!
//! - does the caller currently own the asset?
//! - may the marketplace move the asset on the owner's behalf?
//!
//! ## Design Principles
//!
//! - **Fail-closed**: a failing query rejects the listing
//! - **Read-only**: the guard never mutates marketplace or collaborator state

use nftmarket_types::{Address, AssetId, AssetOwnership, MarketError, Result};

/// Ownership and approval gate for listing operations.
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard {
    /// The operator address the marketplace acts as.
    marketplace: Address,
}

impl AccessGuard {
    /// Create a guard for the marketplace at `marketplace`.
    #[must_use]
    pub fn new(marketplace: Address) -> Self {
        Self { marketplace }
    }

    /// The operator address checked by [`require_approved`](Self::require_approved).
    #[must_use]
    pub fn marketplace(&self) -> Address {
        self.marketplace
    }

    /// Fail unless `caller` is the current owner of the asset.
    ///
    /// # Errors
    /// - `NotOwner` if the provider reports a different owner, or `caller` is zero
    /// - `OwnershipQueryFailed` if the provider cannot answer
    pub fn require_owner<A: AssetOwnership + ?Sized>(
        &self,
        assets: &A,
        collection: Address,
        asset_id: AssetId,
        caller: Address,
    ) -> Result<()> {
        if caller.is_zero() {
            return Err(MarketError::NotOwner);
        }

        let owner = assets
            .owner_of(collection, asset_id)
            .map_err(|e| MarketError::OwnershipQueryFailed { reason: e.reason })?;

        if owner != caller {
            tracing::debug!(
                collection = %collection,
                asset_id = %asset_id,
                caller = %caller,
                owner = %owner,
                "Owner check rejected"
            );
            return Err(MarketError::NotOwner);
        }
        Ok(())
    }

    /// Fail unless the marketplace is an approved operator for the asset.
    ///
    /// # Errors
    /// - `NotApprovedForMarketplace` if no approval covers the marketplace
    /// - `OwnershipQueryFailed` if the provider cannot answer
    pub fn require_approved<A: AssetOwnership + ?Sized>(
        &self,
        assets: &A,
        collection: Address,
        asset_id: AssetId,
    ) -> Result<()> {
        let approved = assets
            .is_approved_for(collection, asset_id, self.marketplace)
            .map_err(|e| MarketError::OwnershipQueryFailed { reason: e.reason })?;

        if !approved {
            tracing::debug!(
                collection = %collection,
                asset_id = %asset_id,
                marketplace = %self.marketplace,
                "Approval check rejected"
            );
            return Err(MarketError::NotApprovedForMarketplace);
        }
        Ok(())
    }
}
