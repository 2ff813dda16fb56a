//! Journaled marketplace state.
//!
//! Every mutation of the registry, the proceeds ledger, the custody totals
//! or the event log goes through [`MarketState`] and records an undo entry.
//! Operations bracket their work with [`checkpoint`](MarketState::checkpoint)
//! and either [`commit`](MarketState::commit) or
//! [`revert_to`](MarketState::revert_to).
//!
//! Checkpoints nest. A reentrant operation that commits still leaves its
//! undo entries in the journal; if the enclosing operation later reverts,
//! the inner effects are undone with it. The journal is dropped only when
//! the outermost checkpoint commits.

use nftmarket_registry::ListingRegistry;
use nftmarket_settlement::{CustodyLedger, CustodyTotals, ProceedsLedger};
use nftmarket_types::{Address, Amount, Listing, ListingKey, MarketEvent, Result};

use crate::event_log::EventLog;

/// Undo information for a single mutation.
#[derive(Debug, Clone)]
enum JournalEntry {
    ListingInserted(ListingKey),
    ListingRemoved(ListingKey, Listing),
    ListingRepriced(ListingKey, Amount),
    ProceedsChanged(Address, Amount),
    CustodyChanged(CustodyTotals),
    EventEmitted,
}

/// Position in the journal returned by [`MarketState::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Checkpoint {
    journal_len: usize,
}

/// Registry, ledgers and event log of one marketplace instance.
#[derive(Debug, Default)]
pub struct MarketState {
    registry: ListingRegistry,
    proceeds: ProceedsLedger,
    custody: CustodyLedger,
    events: EventLog,
    journal: Vec<JournalEntry>,
    depth: usize,
}

impl MarketState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Read access ─────────────────────────────────────────────────

    #[must_use]
    pub fn registry(&self) -> &ListingRegistry {
        &self.registry
    }

    #[must_use]
    pub fn proceeds(&self) -> &ProceedsLedger {
        &self.proceeds
    }

    #[must_use]
    pub fn custody(&self) -> &CustodyLedger {
        &self.custody
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Number of operations currently open on the call stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of undo entries not yet discarded.
    #[must_use]
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    // ── Checkpoints ─────────────────────────────────────────────────

    /// Open a (possibly nested) checkpoint.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.depth += 1;
        tracing::debug!(depth = self.depth, journal = self.journal.len(), "Checkpoint opened");
        Checkpoint {
            journal_len: self.journal.len(),
        }
    }

    /// Close a checkpoint, keeping its effects.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        debug_assert!(self.journal.len() >= checkpoint.journal_len);
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.journal.clear();
        }
        tracing::debug!(depth = self.depth, "Checkpoint committed");
    }

    /// Undo every mutation recorded since `checkpoint` and close it.
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        let undone = self.journal.len().saturating_sub(checkpoint.journal_len);
        while self.journal.len() > checkpoint.journal_len {
            if let Some(entry) = self.journal.pop() {
                self.undo(entry);
            }
        }
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.journal.clear();
        }
        tracing::debug!(depth = self.depth, undone, "Checkpoint reverted");
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::ListingInserted(key) => self.registry.discard(&key),
            JournalEntry::ListingRemoved(key, listing) => self.registry.restore(key, listing),
            JournalEntry::ListingRepriced(key, price) => self.registry.restore_price(&key, price),
            JournalEntry::ProceedsChanged(seller, previous) => {
                self.proceeds.restore(seller, previous);
            }
            JournalEntry::CustodyChanged(totals) => self.custody.restore(totals),
            JournalEntry::EventEmitted => {
                self.events.pop();
            }
        }
    }

    // ── Journaled mutations ─────────────────────────────────────────

    pub fn list(&mut self, key: ListingKey, listing: Listing) -> Result<()> {
        self.registry.list(key, listing)?;
        self.journal.push(JournalEntry::ListingInserted(key));
        Ok(())
    }

    /// Returns the previous price.
    pub fn update_price(&mut self, key: ListingKey, caller: Address, price: Amount) -> Result<Amount> {
        let old = self.registry.update_price(&key, caller, price)?;
        self.journal.push(JournalEntry::ListingRepriced(key, old));
        Ok(old)
    }

    pub fn remove_listing(&mut self, key: ListingKey, caller: Address) -> Result<Listing> {
        let listing = self.registry.remove(&key, caller)?;
        self.journal.push(JournalEntry::ListingRemoved(key, listing));
        Ok(listing)
    }

    pub fn take_listing(&mut self, key: ListingKey) -> Result<Listing> {
        let listing = self.registry.take(&key)?;
        self.journal.push(JournalEntry::ListingRemoved(key, listing));
        Ok(listing)
    }

    /// Returns the seller's new balance.
    pub fn credit(&mut self, seller: Address, amount: Amount) -> Result<Amount> {
        let previous = self.proceeds.balance(&seller);
        let balance = self.proceeds.credit(seller, amount)?;
        self.journal.push(JournalEntry::ProceedsChanged(seller, previous));
        Ok(balance)
    }

    /// Zero the caller's proceeds and return what they held.
    pub fn take_proceeds(&mut self, caller: Address) -> Result<Amount> {
        let amount = self.proceeds.take(&caller)?;
        self.journal.push(JournalEntry::ProceedsChanged(caller, amount));
        Ok(amount)
    }

    pub fn record_received(&mut self, amount: Amount) -> Result<()> {
        let before = self.custody.totals();
        self.custody.record_received(amount)?;
        self.journal.push(JournalEntry::CustodyChanged(before));
        Ok(())
    }

    pub fn record_paid_out(&mut self, amount: Amount) -> Result<()> {
        let before = self.custody.totals();
        self.custody.record_paid_out(amount)?;
        self.journal.push(JournalEntry::CustodyChanged(before));
        Ok(())
    }

    /// Append an event; returns its sequence number.
    pub fn emit(&mut self, event: MarketEvent) -> u64 {
        let sequence = self.events.append(event);
        self.journal.push(JournalEntry::EventEmitted);
        sequence
    }

    /// Check outstanding proceeds against custody totals.
    pub fn verify_custody(&self) -> Result<()> {
        let outstanding = self.proceeds.total_outstanding()?;
        self.custody.verify(outstanding)
    }
}
