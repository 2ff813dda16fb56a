//! Listing registry: the one-listing-per-asset map.
//!
//! Holds every active [`Listing`] keyed by [`ListingKey`], plus a
//! per-seller index for views. Every check happens before any mutation, so
//! a failed call leaves the registry unchanged.
//!
//! The registry does not consult the asset-ownership provider; callers run
//! the [`AccessGuard`](crate::AccessGuard) first.

use std::collections::{BTreeSet, HashMap};

use nftmarket_types::{Address, Amount, Listing, ListingKey, MarketError, Result};

/// Active listings keyed by (collection, asset).
#[derive(Debug, Default, Clone)]
pub struct ListingRegistry {
    /// The canonical map. A missing key means "not listed".
    listings: HashMap<ListingKey, Listing>,
    /// Seller → keys they currently have listed.
    by_seller: HashMap<Address, BTreeSet<ListingKey>>,
}

impl ListingRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the listing for `key`. `None` means not listed.
    #[must_use]
    pub fn get(&self, key: &ListingKey) -> Option<Listing> {
        self.listings.get(key).copied()
    }

    #[must_use]
    pub fn contains(&self, key: &ListingKey) -> bool {
        self.listings.contains_key(key)
    }

    /// Fail with `AlreadyListed` if `key` has an active listing.
    pub fn ensure_not_listed(&self, key: &ListingKey) -> Result<()> {
        if self.contains(key) {
            return Err(already_listed(key));
        }
        Ok(())
    }

    /// Insert a new listing.
    ///
    /// # Errors
    /// - `AlreadyListed` if `key` is already present
    /// - `PriceMustBeAboveZero` if the price is zero
    /// - `NotOwner` if the seller is the zero address
    pub fn list(&mut self, key: ListingKey, listing: Listing) -> Result<()> {
        self.ensure_not_listed(&key)?;
        if listing.price.is_zero() {
            return Err(MarketError::PriceMustBeAboveZero);
        }
        if listing.seller.is_zero() {
            return Err(MarketError::NotOwner);
        }
        self.insert_unchecked(key, listing);
        Ok(())
    }

    /// Change the price of an existing listing. Returns the previous price.
    ///
    /// # Errors
    /// - `NotListed` if `key` is absent
    /// - `NotOwner` if `caller` is not the listing's seller
    /// - `PriceMustBeAboveZero` if `new_price` is zero
    pub fn update_price(
        &mut self,
        key: &ListingKey,
        caller: Address,
        new_price: Amount,
    ) -> Result<Amount> {
        let listing = self
            .listings
            .get_mut(key)
            .ok_or_else(|| not_listed(key))?;
        if listing.seller != caller {
            return Err(MarketError::NotOwner);
        }
        if new_price.is_zero() {
            return Err(MarketError::PriceMustBeAboveZero);
        }
        let old = listing.price;
        listing.price = new_price;
        Ok(old)
    }

    /// Remove a listing on behalf of its seller. Returns the removed listing.
    ///
    /// # Errors
    /// - `NotListed` if `key` is absent
    /// - `NotOwner` if `caller` is not the listing's seller
    pub fn remove(&mut self, key: &ListingKey, caller: Address) -> Result<Listing> {
        let listing = self.get(key).ok_or_else(|| not_listed(key))?;
        if listing.seller != caller {
            return Err(MarketError::NotOwner);
        }
        self.remove_unchecked(key);
        Ok(listing)
    }

    /// Remove a listing regardless of caller (purchase path).
    ///
    /// # Errors
    /// Returns `NotListed` if `key` is absent.
    pub fn take(&mut self, key: &ListingKey) -> Result<Listing> {
        self.remove_unchecked(key).ok_or_else(|| not_listed(key))
    }

    /// Put a listing back exactly as it was. Used to undo a removal.
    pub fn restore(&mut self, key: ListingKey, listing: Listing) {
        self.insert_unchecked(key, listing);
    }

    /// Overwrite the price of a present listing. Used to undo a repricing.
    pub fn restore_price(&mut self, key: &ListingKey, price: Amount) {
        if let Some(listing) = self.listings.get_mut(key) {
            listing.price = price;
        }
    }

    /// Drop a listing without checks. Used to undo an insertion.
    pub fn discard(&mut self, key: &ListingKey) {
        self.remove_unchecked(key);
    }

    /// All listings of `seller`, ordered by key.
    #[must_use]
    pub fn listings_by_seller(&self, seller: &Address) -> Vec<(ListingKey, Listing)> {
        self.by_seller
            .get(seller)
            .into_iter()
            .flatten()
            .filter_map(|key| self.listings.get(key).map(|l| (*key, *l)))
            .collect()
    }

    /// All listings in `collection`, ordered by asset ID.
    #[must_use]
    pub fn listings_in_collection(&self, collection: &Address) -> Vec<(ListingKey, Listing)> {
        let mut out: Vec<(ListingKey, Listing)> = self
            .listings
            .iter()
            .filter(|(key, _)| key.collection == *collection)
            .map(|(key, listing)| (*key, *listing))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Number of active listings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    fn insert_unchecked(&mut self, key: ListingKey, listing: Listing) {
        if let Some(previous) = self.listings.insert(key, listing) {
            self.unindex(&key, previous.seller);
        }
        self.by_seller.entry(listing.seller).or_default().insert(key);
    }

    fn remove_unchecked(&mut self, key: &ListingKey) -> Option<Listing> {
        let listing = self.listings.remove(key)?;
        self.unindex(key, listing.seller);
        Some(listing)
    }

    fn unindex(&mut self, key: &ListingKey, seller: Address) {
        if let Some(keys) = self.by_seller.get_mut(&seller) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_seller.remove(&seller);
            }
        }
    }
}

fn not_listed(key: &ListingKey) -> MarketError {
    MarketError::NotListed {
        collection: key.collection,
        asset_id: key.asset_id,
    }
}

fn already_listed(key: &ListingKey) -> MarketError {
    MarketError::AlreadyListed {
        collection: key.collection,
        asset_id: key.asset_id,
    }
}
