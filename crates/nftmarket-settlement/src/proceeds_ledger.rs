//! Proceeds ledger: per-seller accumulated sale revenue.
//!
//! Balances only move in two ways: a sale credits the seller (and, when the
//! buyer overpaid, the buyer's excess), a withdrawal zeroes the balance and
//! pays it out. Entries are never deleted; an account that has withdrawn
//! everything is held at zero.

use std::collections::HashMap;

use nftmarket_types::{Address, Amount, MarketError, Result, U256};

/// Per-seller proceeds balances.
#[derive(Debug, Default, Clone)]
pub struct ProceedsLedger {
    balances: HashMap<Address, Amount>,
}

impl ProceedsLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the seller's balance. Returns the new balance.
    ///
    /// # Errors
    /// Returns `ProceedsOverflow` if the balance would exceed 256 bits.
    pub fn credit(&mut self, seller: Address, amount: Amount) -> Result<Amount> {
        let entry = self.balances.entry(seller).or_default();
        let updated = entry
            .checked_add(amount)
            .ok_or(MarketError::ProceedsOverflow)?;
        *entry = updated;
        Ok(updated)
    }

    /// Current balance of `seller`; zero if never credited.
    #[must_use]
    pub fn balance(&self, seller: &Address) -> Amount {
        self.balances.get(seller).copied().unwrap_or_default()
    }

    /// Zero the caller's balance and return what it held.
    ///
    /// This is the commit-intent half of a withdrawal. The payout itself
    /// belongs to the caller, which undoes the take with
    /// [`restore`](Self::restore) if the payout fails.
    ///
    /// # Errors
    /// Returns `ZeroProceeds` if the balance is zero.
    pub fn take(&mut self, caller: &Address) -> Result<Amount> {
        let entry = self
            .balances
            .get_mut(caller)
            .filter(|b| !b.is_zero())
            .ok_or(MarketError::ZeroProceeds)?;
        Ok(std::mem::take(entry))
    }

    /// Set the seller's balance back to `amount`. Used to undo a credit or take.
    pub fn restore(&mut self, seller: Address, amount: Amount) {
        self.balances.insert(seller, amount);
    }

    /// Sum of all balances.
    ///
    /// # Errors
    /// Returns `ProceedsOverflow` if the sum exceeds 256 bits.
    pub fn total_outstanding(&self) -> Result<Amount> {
        self.balances
            .values()
            .try_fold(U256::zero(), |acc, b| acc.checked_add(*b))
            .ok_or(MarketError::ProceedsOverflow)
    }

    /// Sellers with a non-zero balance, ordered by address.
    #[must_use]
    pub fn sellers_with_balance(&self) -> Vec<(Address, Amount)> {
        let mut out: Vec<(Address, Amount)> = self
            .balances
            .iter()
            .filter(|(_, b)| !b.is_zero())
            .map(|(a, b)| (*a, *b))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}
