//! Custody conservation invariant checker.
//!
//! Invariant enforced after every purchase and withdrawal:
//! ```text
//! Σ(proceeds) == Σ(received) - Σ(paid_out)
//! ```
//!
//! `received` counts every payment accepted by a purchase; `paid_out`
//! counts every withdrawal. If the two sides disagree,
//! value has been created or lost inside the marketplace.

use nftmarket_types::{Amount, MarketError, Result, U256};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the custody totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustodyTotals {
    pub received: Amount,
    pub paid_out: Amount,
}

/// Running totals of value the marketplace has taken in and sent out.
#[derive(Debug, Default, Clone)]
pub struct CustodyLedger {
    totals: CustodyTotals,
}

impl CustodyLedger {
    /// Create a new custody tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a payment received from a buyer.
    ///
    /// # Errors
    /// Returns `CustodyInvariantViolation` on 256-bit overflow.
    pub fn record_received(&mut self, amount: Amount) -> Result<()> {
        self.totals.received = self
            .totals
            .received
            .checked_add(amount)
            .ok_or_else(|| overflow("received"))?;
        Ok(())
    }

    /// Record value sent out by a withdrawal.
    ///
    /// # Errors
    /// Returns `CustodyInvariantViolation` on 256-bit overflow.
    pub fn record_paid_out(&mut self, amount: Amount) -> Result<()> {
        self.totals.paid_out = self
            .totals
            .paid_out
            .checked_add(amount)
            .ok_or_else(|| overflow("paid_out"))?;
        Ok(())
    }

    /// Value currently held: received - paid_out. `None` if more was paid
    /// out than received.
    #[must_use]
    pub fn held(&self) -> Option<Amount> {
        self.totals.received.checked_sub(self.totals.paid_out)
    }

    #[must_use]
    pub fn totals(&self) -> CustodyTotals {
        self.totals
    }

    /// Reset the totals to an earlier snapshot. Used by rollback.
    pub fn restore(&mut self, totals: CustodyTotals) {
        self.totals = totals;
    }

    /// Verify that outstanding proceeds equal the value held.
    ///
    /// # Errors
    /// Returns [`MarketError::CustodyInvariantViolation`] if they differ.
    pub fn verify(&self, outstanding: Amount) -> Result<()> {
        let held = self.held().ok_or_else(|| MarketError::CustodyInvariantViolation {
            reason: format!(
                "paid out {} exceeds received {}",
                self.totals.paid_out, self.totals.received
            ),
        })?;
        if held != outstanding {
            return Err(MarketError::CustodyInvariantViolation {
                reason: format!(
                    "outstanding proceeds {outstanding} != held {held} \
                     (received={}, paid_out={})",
                    self.totals.received, self.totals.paid_out,
                ),
            });
        }
        Ok(())
    }
}

fn overflow(which: &str) -> MarketError {
    MarketError::CustodyInvariantViolation {
        reason: format!("{which} total overflow"),
    }
}
