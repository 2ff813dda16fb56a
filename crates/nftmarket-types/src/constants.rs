//! System-wide constants for the NftMarket ledger.

/// Domain tag prefixed to the event-log root hash.
pub const EVENT_ROOT_DOMAIN: &[u8] = b"nftmarket:event_root:v1:";

/// Default for [`MarketConfig::enforce_custody`](crate::MarketConfig).
pub const DEFAULT_ENFORCE_CUSTODY: bool = true;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "NftMarket";
