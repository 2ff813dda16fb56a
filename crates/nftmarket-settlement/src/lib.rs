//! # nftmarket-settlement
//!
//! **Value side** of the marketplace: what sellers are owed and what the
//! marketplace holds on their behalf.
//!
//! ## Architecture
//!
//! 1. **ProceedsLedger**: per-seller balance, credited on sale and zeroed
//!    on withdrawal
//! 2. **CustodyLedger**: running totals of value received and paid out,
//!    checked against the sum of outstanding proceeds
//!
//! ## Withdrawal
//!
//! ```text
//! balance > 0 → ProceedsLedger.take() → record paid out → payout
//!                                                           └─ on failure: restore
//! ```

pub mod custody;
pub mod proceeds_ledger;

pub use custody::{CustodyLedger, CustodyTotals};
pub use proceeds_ledger::ProceedsLedger;
