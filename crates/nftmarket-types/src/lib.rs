//! # nftmarket-types
//!
//! Shared types, errors, and configuration for the **NftMarket** ledger.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`AssetId`], [`Amount`], [`ListingKey`]
//! - **Listing model**: [`Listing`]
//! - **Event model**: [`MarketEvent`], [`EventRecord`], [`EventKind`]
//! - **Collaborators**: [`AssetOwnership`], [`ValueTransfer`], [`CollaboratorError`]
//! - **Configuration**: [`MarketConfig`], [`OverpaymentPolicy`]
//! - **Errors**: [`MarketError`] with `NM_ERR_` prefix codes
//! - **Constants**: system-wide names and hash domain tags

pub mod collaborator;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod listing;

// Re-export all primary types at crate root for ergonomic imports:
//   use nftmarket_types::{Address, Listing, MarketEvent, ...};

pub use collaborator::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use listing::*;

/// Unsigned 256-bit integer used for asset IDs and amounts.
pub use primitive_types::U256;

// Constants are accessed via `nftmarket_types::constants::FOO`
// (not re-exported to avoid name collisions).
