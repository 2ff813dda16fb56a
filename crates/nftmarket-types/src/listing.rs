//! Listing model.
//!
//! A [`Listing`] is an active offer to sell one asset at a fixed price. It is
//! stored under its [`ListingKey`](crate::ListingKey); a key with no entry is
//! the only representation of "not listed".
//!
//! ## State Machine
//!
//! ```text
//!            list                buy / remove
//!   ┌────────┐ ───────▶ ┌────────┐ ───────▶ ┌────────┐
//!   │ ABSENT │          │ LISTED │          │ ABSENT │
//!   └────────┘          └───┬────┘          └────────┘
//!                           │ update (price only)
//!                           └──────▶ LISTED
//! ```

use serde::{Deserialize, Serialize};

use crate::{Address, Amount};

/// An active listing: who sells and at what price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// The account that listed the asset and receives the proceeds.
    pub seller: Address,
    /// Asking price. Always non-zero for a stored listing.
    pub price: Amount,
}

impl Listing {
    #[must_use]
    pub fn new(seller: Address, price: Amount) -> Self {
        Self { seller, price }
    }

    /// Whether this listing satisfies the stored-listing invariant.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.price.is_zero() && !self.seller.is_zero()
    }
}
