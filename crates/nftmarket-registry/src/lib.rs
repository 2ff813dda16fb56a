//! # nftmarket-registry
//!
//! **Listing side** of the marketplace: who may list, and what is listed.
//!
//! ## Architecture
//!
//! 1. **AccessGuard**: hard gate; the caller owns the asset and the
//!    marketplace is an approved operator for it
//! 2. **ListingRegistry**: at most one [`Listing`](nftmarket_types::Listing)
//!    per (collection, asset) key, with a per-seller index
//!
//! ## Listing Flow
//!
//! ```text
//! list_item → ListingRegistry (not yet listed) → price > 0
//!           → AccessGuard.require_owner() → AccessGuard.require_approved()
//!           → ListingRegistry.list()
//! ```
//!
//! Neither component talks to the outside world except through the
//! read-only [`AssetOwnership`](nftmarket_types::AssetOwnership) queries
//! made by the guard.

pub mod access_guard;
pub mod listing_registry;

pub use access_guard::AccessGuard;
pub use listing_registry::ListingRegistry;
