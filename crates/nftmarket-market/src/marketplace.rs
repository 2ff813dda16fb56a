//! Marketplace orchestrator.
//!
//! [`Marketplace`] composes the access guard, listing registry, proceeds
//! ledger, custody ledger and event log into the public operations. Every
//! operation runs inside a journal checkpoint:
//!
//! ```text
//! checkpoint → checks → effects (state + events) → interactions (collaborators)
//!            └─ any error: revert_to(checkpoint)     └─ ok: commit
//! ```
//!
//! Collaborators may call back into the same marketplace while a transfer
//! is in flight. The state lives in a `RefCell` and no borrow is held across
//! a collaborator call, so a reentrant call always sees the effects already
//! applied by its caller.

use std::cell::RefCell;

use nftmarket_registry::AccessGuard;
use nftmarket_settlement::CustodyTotals;
use nftmarket_types::{
    constants, Address, Amount, AssetId, AssetOwnership, EventRecord, Listing, ListingKey,
    MarketConfig, MarketError, MarketEvent, OverpaymentPolicy, Result, ValueTransfer,
};

use crate::event_log::{compute_event_root, root_hex};
use crate::state::MarketState;

/// A single marketplace instance and the collaborators it drives.
pub struct Marketplace<A: AssetOwnership, V: ValueTransfer> {
    config: MarketConfig,
    guard: AccessGuard,
    state: RefCell<MarketState>,
    assets: A,
    funds: V,
}

impl<A: AssetOwnership, V: ValueTransfer> Marketplace<A, V> {
    /// Create a marketplace with empty state.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` fails validation.
    pub fn new(config: MarketConfig, assets: A, funds: V) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            marketplace = %config.marketplace,
            overpayment = %config.overpayment,
            enforce_custody = config.enforce_custody,
            "Marketplace created"
        );
        Ok(Self {
            guard: AccessGuard::new(config.marketplace),
            config,
            state: RefCell::new(MarketState::new()),
            assets,
            funds,
        })
    }

    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    #[must_use]
    pub fn assets(&self) -> &A {
        &self.assets
    }

    #[must_use]
    pub fn funds(&self) -> &V {
        &self.funds
    }

    // ── Operations ──────────────────────────────────────────────────

    /// List `asset_id` of `collection` for sale at `price`.
    ///
    /// # Errors
    /// In order of precedence: `AlreadyListed`, `PriceMustBeAboveZero`,
    /// `NotOwner`, `NotApprovedForMarketplace`, `OwnershipQueryFailed`.
    pub fn list_item(
        &self,
        collection: Address,
        asset_id: AssetId,
        price: Amount,
        caller: Address,
    ) -> Result<()> {
        self.atomic("list_item", || {
            let key = ListingKey::new(collection, asset_id);
            self.state.borrow().registry().ensure_not_listed(&key)?;
            if price.is_zero() {
                return Err(MarketError::PriceMustBeAboveZero);
            }
            self.guard
                .require_owner(&self.assets, collection, asset_id, caller)?;
            self.guard
                .require_approved(&self.assets, collection, asset_id)?;

            let mut state = self.state.borrow_mut();
            state.list(key, Listing::new(caller, price))?;
            state.emit(MarketEvent::ItemListed {
                seller: caller,
                collection,
                asset_id,
                price,
            });
            drop(state);

            tracing::info!(
                seller = %caller,
                listing = %key,
                price = %price,
                "Item listed"
            );
            Ok(())
        })
    }

    /// Change the price of the caller's listing. Emits `ItemListed` again.
    ///
    /// # Errors
    /// `NotListed`, `NotOwner` (caller is not the seller), `PriceMustBeAboveZero`.
    pub fn update_listing(
        &self,
        collection: Address,
        asset_id: AssetId,
        new_price: Amount,
        caller: Address,
    ) -> Result<()> {
        self.atomic("update_listing", || {
            let key = ListingKey::new(collection, asset_id);
            let mut state = self.state.borrow_mut();
            let old = state.update_price(key, caller, new_price)?;
            state.emit(MarketEvent::ItemListed {
                seller: caller,
                collection,
                asset_id,
                price: new_price,
            });
            drop(state);

            tracing::info!(
                seller = %caller,
                listing = %key,
                old_price = %old,
                new_price = %new_price,
                "Listing updated"
            );
            Ok(())
        })
    }

    /// Withdraw the caller's listing.
    ///
    /// # Errors
    /// `NotListed`, `NotOwner` (caller is not the seller).
    pub fn remove_listing(
        &self,
        collection: Address,
        asset_id: AssetId,
        caller: Address,
    ) -> Result<()> {
        self.atomic("remove_listing", || {
            let key = ListingKey::new(collection, asset_id);
            let mut state = self.state.borrow_mut();
            state.remove_listing(key, caller)?;
            state.emit(MarketEvent::ItemUnlisted {
                seller: caller,
                collection,
                asset_id,
            });
            drop(state);

            tracing::info!(seller = %caller, listing = %key, "Listing removed");
            Ok(())
        })
    }

    /// Buy a listed asset with `payment`.
    ///
    /// The listing is removed, the seller credited and `ItemBought` emitted
    /// before the asset moves. Under [`OverpaymentPolicy::Refund`] the excess
    /// is credited to the buyer's withdrawable balance; under
    /// [`OverpaymentPolicy::CreditSeller`] the seller is credited the whole
    /// payment. The asset transfer is the only external call.
    ///
    /// # Errors
    /// - `NotListed`, `OwnerCannotBuyOwnItem`, `InsufficientPurchaseAmt`
    /// - `AssetTransferFailed` if the collaborator refuses the transfer
    /// - `CustodyInvariantViolation` if custody accounting is inconsistent
    ///
    /// On any error the marketplace state is exactly as before the call.
    pub fn buy_item(
        &self,
        collection: Address,
        asset_id: AssetId,
        payment: Amount,
        buyer: Address,
    ) -> Result<()> {
        self.atomic("buy_item", || {
            let key = ListingKey::new(collection, asset_id);

            // Checks
            let listing = self
                .state
                .borrow()
                .registry()
                .get(&key)
                .ok_or(MarketError::NotListed {
                    collection,
                    asset_id,
                })?;
            if buyer == listing.seller {
                return Err(MarketError::OwnerCannotBuyOwnItem);
            }
            if payment < listing.price {
                return Err(MarketError::InsufficientPurchaseAmt {
                    price: listing.price,
                    paid: payment,
                });
            }
            let excess = payment - listing.price;
            let (credited, refund) = match self.config.overpayment {
                OverpaymentPolicy::Refund => (listing.price, excess),
                OverpaymentPolicy::CreditSeller => (payment, Amount::zero()),
            };

            // Effects
            {
                let mut state = self.state.borrow_mut();
                state.take_listing(key)?;
                state.credit(listing.seller, credited)?;
                if !refund.is_zero() {
                    state.credit(buyer, refund)?;
                }
                state.record_received(payment)?;
                state.emit(MarketEvent::ItemBought {
                    buyer,
                    collection,
                    asset_id,
                    price: listing.price,
                });
            }

            self.check_custody()?;

            // Interaction
            self.assets
                .transfer_from(collection, listing.seller, buyer, asset_id)
                .map_err(|e| {
                    tracing::warn!(listing = %key, reason = %e, "Asset transfer failed");
                    MarketError::AssetTransferFailed { reason: e.reason }
                })?;

            tracing::info!(
                buyer = %buyer,
                seller = %listing.seller,
                listing = %key,
                price = %listing.price,
                credited = %credited,
                refund = %refund,
                "Item bought"
            );
            Ok(())
        })
    }

    /// Pay out the caller's accumulated proceeds. Returns the amount paid.
    ///
    /// A payout cannot be taken back once sent, so withdrawal is not
    /// reentrant: called from inside another operation with a non-zero
    /// balance it fails before anything is paid.
    ///
    /// # Errors
    /// - `ZeroProceeds` if the caller has nothing to withdraw
    /// - `ReentrantWithdrawal` if another operation is in progress
    /// - `FundTransferFailed` if the payout fails (balance unchanged)
    pub fn withdraw_proceeds(&self, caller: Address) -> Result<Amount> {
        self.atomic("withdraw_proceeds", || {
            let amount = {
                let mut state = self.state.borrow_mut();
                let amount = state.take_proceeds(caller)?;
                if state.depth() > 1 {
                    return Err(MarketError::ReentrantWithdrawal);
                }
                state.record_paid_out(amount)?;
                amount
            };
            self.check_custody()?;

            self.funds.send(caller, amount).map_err(|e| {
                tracing::warn!(seller = %caller, amount = %amount, reason = %e, "Proceeds payout failed");
                MarketError::FundTransferFailed { reason: e.reason }
            })?;

            tracing::info!(seller = %caller, amount = %amount, "Proceeds withdrawn");
            Ok(amount)
        })
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Current listing for the asset, if any.
    #[must_use]
    pub fn get_listing(&self, collection: Address, asset_id: AssetId) -> Option<Listing> {
        self.state
            .borrow()
            .registry()
            .get(&ListingKey::new(collection, asset_id))
    }

    /// Proceeds owed to `seller`; zero if never credited.
    #[must_use]
    pub fn get_proceeds(&self, seller: Address) -> Amount {
        self.state.borrow().proceeds().balance(&seller)
    }

    #[must_use]
    pub fn listings_by_seller(&self, seller: Address) -> Vec<(ListingKey, Listing)> {
        self.state.borrow().registry().listings_by_seller(&seller)
    }

    #[must_use]
    pub fn listings_in_collection(&self, collection: Address) -> Vec<(ListingKey, Listing)> {
        self.state
            .borrow()
            .registry()
            .listings_in_collection(&collection)
    }

    /// Accounts with a non-zero withdrawable balance, ordered by address.
    #[must_use]
    pub fn sellers_with_balance(&self) -> Vec<(Address, Amount)> {
        self.state.borrow().proceeds().sellers_with_balance()
    }

    /// Every event in the log.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.borrow().events().records().to_vec()
    }

    /// Events with sequence number `>= from`.
    #[must_use]
    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.state.borrow().events().since(from).to_vec()
    }

    /// Root hash over the event log.
    #[must_use]
    pub fn event_root(&self) -> [u8; 32] {
        let state = self.state.borrow();
        compute_event_root(state.events().records())
    }

    #[must_use]
    pub fn custody_totals(&self) -> CustodyTotals {
        self.state.borrow().custody().totals()
    }

    /// Sum of all sellers' proceeds.
    pub fn total_outstanding(&self) -> Result<Amount> {
        self.state.borrow().proceeds().total_outstanding()
    }

    /// Check that outstanding proceeds equal the value held in custody.
    pub fn verify_custody(&self) -> Result<()> {
        self.state.borrow().verify_custody()
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Run `op` inside a checkpoint: commit on success, revert on error.
    fn atomic<T>(&self, name: &'static str, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let checkpoint = self.state.borrow_mut().checkpoint();
        let result = op();
        let mut state = self.state.borrow_mut();
        match &result {
            Ok(_) => state.commit(checkpoint),
            Err(e) => {
                state.revert_to(checkpoint);
                tracing::warn!(
                    operation = name,
                    code = e.code(),
                    error = %e,
                    depth = state.depth(),
                    "Operation reverted"
                );
            }
        }
        if result.is_ok() && state.depth() == 0 {
            tracing::debug!(
                operation = name,
                events = state.events().len(),
                root = %root_hex(&state.events().root()),
                "Committed"
            );
        }
        result
    }

    fn check_custody(&self) -> Result<()> {
        if self.config.enforce_custody {
            self.state.borrow().verify_custody()?;
        }
        Ok(())
    }
}

impl<A: AssetOwnership, V: ValueTransfer> std::fmt::Debug for Marketplace<A, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
