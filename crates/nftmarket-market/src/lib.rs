//! # nftmarket-market
//!
//! The marketplace orchestrator for the **NftMarket** ledger.
//!
//! - [`Marketplace`]: public operations (list, update, remove, buy, withdraw)
//!   and queries over one marketplace instance
//! - [`MarketState`]: registry, proceeds, custody and event log behind a
//!   nested undo journal
//! - [`EventLog`]: sequenced event feed with a deterministic root hash
//!
//! ## Purchase Lifecycle
//!
//! ```text
//! buy_item
//!   checks:        listed? ─ buyer ≠ seller? ─ payment ≥ price?
//!   effects:       take listing → credit seller (and buyer's excess)
//!                  → custody → ItemBought → custody check
//!   interaction:   AssetOwnership.transfer_from(seller → buyer)
//!   commit; any error reverts everything above
//! ```
//!
//! Collaborators may re-enter the marketplace during the interaction phase.
//! Nested operations open nested checkpoints, so a failed outer purchase
//! also undoes whatever its reentrant callers committed. Withdrawal is the
//! exception: a payout cannot be undone, so `withdraw_proceeds` refuses to
//! run inside another operation.

pub mod event_log;
pub mod marketplace;
pub mod state;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use event_log::{compute_event_root, verify_event_root, EventLog};
pub use marketplace::Marketplace;
pub use state::{Checkpoint, MarketState};
