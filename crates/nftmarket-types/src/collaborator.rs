//! External collaborators consumed by the marketplace.
//!
//! The marketplace never owns assets or funds itself; it drives two
//! collaborators:
//!
//! - [`AssetOwnership`]: the NFT collection contract (owner lookup,
//!   approval lookup, transfer).
//! - [`ValueTransfer`]: the primitive that pays fungible value out.
//!
//! Methods take `&self`: implementations use interior mutability and may
//! call back into the marketplace (reentrancy) while a transfer is in flight.

use std::rc::Rc;

use thiserror::Error;

use crate::{Address, Amount, AssetId};

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct CollaboratorError {
    pub reason: String,
}

impl CollaboratorError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Asset ownership provider (an ERC-721-style collection registry).
pub trait AssetOwnership {
    /// Current owner of `asset_id` in `collection`.
    ///
    /// Fails if the asset does not exist.
    fn owner_of(&self, collection: Address, asset_id: AssetId) -> Result<Address, CollaboratorError>;

    /// Whether `operator` may transfer the asset, either through a
    /// single-token approval or a collection-wide operator approval.
    fn is_approved_for(
        &self,
        collection: Address,
        asset_id: AssetId,
        operator: Address,
    ) -> Result<bool, CollaboratorError>;

    /// Move the asset from `from` to `to`. Must fail atomically: either the
    /// asset moves or nothing changes.
    fn transfer_from(
        &self,
        collection: Address,
        from: Address,
        to: Address,
        asset_id: AssetId,
    ) -> Result<(), CollaboratorError>;
}

/// Atomic send-or-fail of a fungible amount.
pub trait ValueTransfer {
    fn send(&self, to: Address, amount: Amount) -> Result<(), CollaboratorError>;
}

impl<T: AssetOwnership + ?Sized> AssetOwnership for Rc<T> {
    fn owner_of(&self, collection: Address, asset_id: AssetId) -> Result<Address, CollaboratorError> {
        (**self).owner_of(collection, asset_id)
    }

    fn is_approved_for(
        &self,
        collection: Address,
        asset_id: AssetId,
        operator: Address,
    ) -> Result<bool, CollaboratorError> {
        (**self).is_approved_for(collection, asset_id, operator)
    }

    fn transfer_from(
        &self,
        collection: Address,
        from: Address,
        to: Address,
        asset_id: AssetId,
    ) -> Result<(), CollaboratorError> {
        (**self).transfer_from(collection, from, to, asset_id)
    }
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for Rc<T> {
    fn send(&self, to: Address, amount: Amount) -> Result<(), CollaboratorError> {
        (**self).send(to, amount)
    }
}
