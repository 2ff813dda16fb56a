//! Identifiers used throughout NftMarket.
//!
//! Accounts and asset collections share the 20-byte [`Address`] space.
//! Assets inside a collection are numbered by a 256-bit [`AssetId`].

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::MarketError;

/// Identifier of a single asset within a collection.
pub type AssetId = U256;

/// Fungible value amount (prices, payments, proceeds).
pub type Amount = U256;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account or contract address.
///
/// Displays and serializes as `0x`-prefixed lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address. Never a valid seller, buyer or owner.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| MarketError::InvalidAddress(format!("{s}: {e}")))?;
        let arr: [u8; 20] = bytes.try_into().map_err(|b: Vec<u8>| {
            MarketError::InvalidAddress(format!("{s}: expected 20 bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Random addresses for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    pub fn random() -> Self {
        let mut bytes: [u8; 20] = rand::random();
        // A random draw of all zeros would alias `Address::ZERO`.
        bytes[0] |= 0x01;
        Self(bytes)
    }

    /// Deterministic address with every byte set to `byte`.
    pub fn repeat(byte: u8) -> Self {
        Self([byte; 20])
    }
}

// ---------------------------------------------------------------------------
// ListingKey
// ---------------------------------------------------------------------------

/// Composite key of a listing: the collection contract and the asset in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ListingKey {
    pub collection: Address,
    pub asset_id: AssetId,
}

impl ListingKey {
    #[must_use]
    pub fn new(collection: Address, asset_id: AssetId) -> Self {
        Self {
            collection,
            asset_id,
        }
    }
}

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.collection, self.asset_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
