//! Marketplace events for the append-only indexer feed.
//!
//! Every committed listing, purchase, or unlisting produces a
//! [`MarketEvent`]. The event log wraps each one in an [`EventRecord`]
//! with a sequence number and timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, AssetId};

/// Discriminant of a [`MarketEvent`], used for filtering and hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ItemListed,
    ItemBought,
    ItemUnlisted,
}

impl EventKind {
    /// Stable one-byte tag for the event root hash.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            Self::ItemListed => 1,
            Self::ItemBought => 2,
            Self::ItemUnlisted => 3,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemListed => write!(f, "ITEM_LISTED"),
            Self::ItemBought => write!(f, "ITEM_BOUGHT"),
            Self::ItemUnlisted => write!(f, "ITEM_UNLISTED"),
        }
    }
}

/// An event emitted by a marketplace operation.
///
/// `ItemListed` is emitted both on creation and on price update; there is no
/// separate update event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MarketEvent {
    ItemListed {
        seller: Address,
        collection: Address,
        asset_id: AssetId,
        price: Amount,
    },
    ItemBought {
        buyer: Address,
        collection: Address,
        asset_id: AssetId,
        price: Amount,
    },
    ItemUnlisted {
        seller: Address,
        collection: Address,
        asset_id: AssetId,
    },
}

impl MarketEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ItemListed { .. } => EventKind::ItemListed,
            Self::ItemBought { .. } => EventKind::ItemBought,
            Self::ItemUnlisted { .. } => EventKind::ItemUnlisted,
        }
    }

    /// The collection the event refers to.
    #[must_use]
    pub fn collection(&self) -> Address {
        match self {
            Self::ItemListed { collection, .. }
            | Self::ItemBought { collection, .. }
            | Self::ItemUnlisted { collection, .. } => *collection,
        }
    }

    /// The asset the event refers to.
    #[must_use]
    pub fn asset_id(&self) -> AssetId {
        match self {
            Self::ItemListed { asset_id, .. }
            | Self::ItemBought { asset_id, .. }
            | Self::ItemUnlisted { asset_id, .. } => *asset_id,
        }
    }
}

/// A committed event together with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Zero-based, gap-free position in the log.
    pub sequence: u64,
    pub event: MarketEvent,
    pub emitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    fn listed() -> MarketEvent {
        MarketEvent::ItemListed {
            seller: Address([1; 20]),
            collection: Address([2; 20]),
            asset_id: U256::zero(),
            price: U256::one(),
        }
    }

    #[test]
    fn event_kind_display() {
        assert_eq!(format!("{}", EventKind::ItemListed), "ITEM_LISTED");
        assert_eq!(format!("{}", EventKind::ItemBought), "ITEM_BOUGHT");
        assert_eq!(format!("{}", EventKind::ItemUnlisted), "ITEM_UNLISTED");
    }

    #[test]
    fn event_kind_tags_distinct() {
        let tags = [
            EventKind::ItemListed.tag(),
            EventKind::ItemBought.tag(),
            EventKind::ItemUnlisted.tag(),
        ];
        assert_ne!(tags[0], tags[1]);
        assert_ne!(tags[1], tags[2]);
        assert_ne!(tags[0], tags[2]);
    }

    #[test]
    fn accessors() {
        let e = listed();
        assert_eq!(e.kind(), EventKind::ItemListed);
        assert_eq!(e.collection(), Address([2; 20]));
        assert_eq!(e.asset_id(), U256::zero());
    }

    #[test]
    fn event_json_is_tagged() {
        let json = serde_json::to_string(&listed()).unwrap();
        assert!(json.contains("\"type\":\"ItemListed\""), "Got: {json}");
        let back: MarketEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, listed());
    }
}
