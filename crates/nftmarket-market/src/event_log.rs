//! Append-only event log and its deterministic root hash.
//!
//! Indexers replaying the same committed events must arrive at the same
//! `event_root`. The root covers sequence numbers, event kinds and every
//! event field; timestamps are excluded.

use chrono::Utc;
use nftmarket_types::{constants, Address, EventRecord, MarketEvent, U256};
use sha2::{Digest, Sha256};

/// Sequenced, append-only record of marketplace events.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    pub fn append(&mut self, event: MarketEvent) -> u64 {
        let sequence = self.records.len() as u64;
        self.records.push(EventRecord {
            sequence,
            event,
            emitted_at: Utc::now(),
        });
        sequence
    }

    /// Drop the most recent event. Used only to undo an emission that
    /// belongs to a reverted operation.
    pub(crate) fn pop(&mut self) -> Option<EventRecord> {
        self.records.pop()
    }

    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence >= from`.
    #[must_use]
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from).map_or(self.records.len(), |s| s.min(self.records.len()));
        &self.records[start..]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Root hash over the whole log.
    #[must_use]
    pub fn root(&self) -> [u8; 32] {
        compute_event_root(&self.records)
    }
}

/// Compute the root hash over a slice of event records.
///
/// The same events in the same order always produce the same root.
#[must_use]
pub fn compute_event_root(records: &[EventRecord]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::EVENT_ROOT_DOMAIN);
    hasher.update((records.len() as u64).to_le_bytes());

    for record in records {
        hasher.update(record.sequence.to_le_bytes());
        hasher.update([record.event.kind().tag()]);
        match &record.event {
            MarketEvent::ItemListed {
                seller,
                collection,
                asset_id,
                price,
            } => {
                hash_address(&mut hasher, seller);
                hash_address(&mut hasher, collection);
                hash_u256(&mut hasher, asset_id);
                hash_u256(&mut hasher, price);
            }
            MarketEvent::ItemBought {
                buyer,
                collection,
                asset_id,
                price,
            } => {
                hash_address(&mut hasher, buyer);
                hash_address(&mut hasher, collection);
                hash_u256(&mut hasher, asset_id);
                hash_u256(&mut hasher, price);
            }
            MarketEvent::ItemUnlisted {
                seller,
                collection,
                asset_id,
            } => {
                hash_address(&mut hasher, seller);
                hash_address(&mut hasher, collection);
                hash_u256(&mut hasher, asset_id);
            }
        }
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Verify that `expected_root` matches the root of `records`.
#[must_use]
pub fn verify_event_root(records: &[EventRecord], expected_root: &[u8; 32]) -> bool {
    compute_event_root(records) == *expected_root
}

/// Hex form of a root, for logs and APIs.
#[must_use]
pub fn root_hex(root: &[u8; 32]) -> String {
    hex::encode(root)
}

fn hash_address(hasher: &mut Sha256, address: &Address) {
    hasher.update(address.as_bytes());
}

// Fixed-width big-endian encoding; limbs are stored least significant first.
fn hash_u256(hasher: &mut Sha256, value: &U256) {
    for limb in value.0.iter().rev() {
        hasher.update(limb.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(id: u64, price: u64) -> MarketEvent {
        MarketEvent::ItemListed {
            seller: Address([1; 20]),
            collection: Address([2; 20]),
            asset_id: U256::from(id),
            price: U256::from(price),
        }
    }

    fn unlisted(id: u64) -> MarketEvent {
        MarketEvent::ItemUnlisted {
            seller: Address([1; 20]),
            collection: Address([2; 20]),
            asset_id: U256::from(id),
        }
    }

    #[test]
    fn append_assigns_gap_free_sequence() {
        let mut log = EventLog::new();
        assert_eq!(log.append(listed(0, 1)), 0);
        assert_eq!(log.append(unlisted(0)), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[1].sequence, 1);
    }

    #[test]
    fn since_slices_from_sequence() {
        let mut log = EventLog::new();
        log.append(listed(0, 1));
        log.append(listed(1, 1));
        log.append(listed(2, 1));
        assert_eq!(log.since(1).len(), 2);
        assert_eq!(log.since(1)[0].sequence, 1);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn pop_removes_latest() {
        let mut log = EventLog::new();
        log.append(listed(0, 1));
        log.append(unlisted(0));
        let popped = log.pop().unwrap();
        assert_eq!(popped.event, unlisted(0));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn empty_root_deterministic() {
        assert_eq!(compute_event_root(&[]), compute_event_root(&[]));
    }

    #[test]
    fn root_ignores_timestamps() {
        let mut a = EventLog::new();
        a.append(listed(0, 1));
        let mut b = EventLog::new();
        b.append(listed(0, 1));
        b.records[0].emitted_at = b.records[0].emitted_at + chrono::Duration::hours(1);
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn different_price_different_root() {
        let mut a = EventLog::new();
        a.append(listed(0, 1));
        let mut b = EventLog::new();
        b.append(listed(0, 2));
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn order_matters() {
        let mut a = EventLog::new();
        a.append(listed(0, 1));
        a.append(listed(1, 1));
        let mut b = EventLog::new();
        b.append(listed(1, 1));
        b.append(listed(0, 1));
        assert_ne!(a.root(), b.root(), "Order of events must affect root hash");
    }

    #[test]
    fn kind_affects_root() {
        // Same key fields, different event kind.
        let mut a = EventLog::new();
        a.append(unlisted(0));
        let mut b = EventLog::new();
        b.append(MarketEvent::ItemBought {
            buyer: Address([1; 20]),
            collection: Address([2; 20]),
            asset_id: U256::zero(),
            price: U256::zero(),
        });
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn verify_roots() {
        let mut log = EventLog::new();
        log.append(listed(0, 1));
        let root = log.root();
        assert!(verify_event_root(log.records(), &root));
        assert!(!verify_event_root(log.records(), &[0xAB; 32]));
        assert_eq!(root_hex(&root).len(), 64);
    }
}
