//! In-memory collaborators for tests.
//!
//! - [`InMemoryAssets`]: an ERC-721-like asset book with single-token and
//!   operator approvals, a transfer kill switch, and a hook that runs after
//!   each successful transfer (the receiver callback).
//! - [`InMemoryFunds`]: a value sink that records what each address received,
//!   with per-recipient rejection and a hook that runs after each send.
//!
//! Hooks may re-enter the marketplace. A hook is taken out of its slot while
//! it runs, so a reentrant transfer does not trigger it again. A hook that
//! returns an error makes the transfer fail and undoes it.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use nftmarket_types::{Address, Amount, AssetId, AssetOwnership, CollaboratorError, ValueTransfer};

/// Arguments of a completed asset transfer, passed to the transfer hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetTransfer {
    pub collection: Address,
    pub from: Address,
    pub to: Address,
    pub asset_id: AssetId,
}

type TransferHook = Box<dyn FnMut(&AssetTransfer) -> Result<(), CollaboratorError>>;
type SendHook = Box<dyn FnMut(Address, Amount) -> Result<(), CollaboratorError>>;

/// ERC-721-like ownership book.
///
/// `transfer_from` is performed on behalf of the `operator` given at
/// construction, which must be the owner, the token's approved address, or
/// an approved operator of the owner.
pub struct InMemoryAssets {
    operator: Address,
    owners: RefCell<HashMap<(Address, AssetId), Address>>,
    token_approvals: RefCell<HashMap<(Address, AssetId), Address>>,
    /// (collection, owner, operator)
    operator_approvals: RefCell<HashSet<(Address, Address, Address)>>,
    fail_transfers: Cell<bool>,
    transfer_count: Cell<usize>,
    on_transfer: RefCell<Option<TransferHook>>,
}

impl InMemoryAssets {
    #[must_use]
    pub fn new(operator: Address) -> Self {
        Self {
            operator,
            owners: RefCell::new(HashMap::new()),
            token_approvals: RefCell::new(HashMap::new()),
            operator_approvals: RefCell::new(HashSet::new()),
            fail_transfers: Cell::new(false),
            transfer_count: Cell::new(0),
            on_transfer: RefCell::new(None),
        }
    }

    pub fn mint(&self, collection: Address, asset_id: AssetId, owner: Address) {
        self.owners.borrow_mut().insert((collection, asset_id), owner);
    }

    /// Single-token approval; cleared when the token moves.
    pub fn approve(&self, collection: Address, asset_id: AssetId, approved: Address) {
        self.token_approvals
            .borrow_mut()
            .insert((collection, asset_id), approved);
    }

    pub fn revoke(&self, collection: Address, asset_id: AssetId) {
        self.token_approvals.borrow_mut().remove(&(collection, asset_id));
    }

    pub fn set_approval_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
        approved: bool,
    ) {
        let mut approvals = self.operator_approvals.borrow_mut();
        if approved {
            approvals.insert((collection, owner, operator));
        } else {
            approvals.remove(&(collection, owner, operator));
        }
    }

    /// Make every subsequent `transfer_from` fail while set.
    pub fn set_fail_transfers(&self, fail: bool) {
        self.fail_transfers.set(fail);
    }

    pub fn set_transfer_hook(
        &self,
        hook: impl FnMut(&AssetTransfer) -> Result<(), CollaboratorError> + 'static,
    ) {
        *self.on_transfer.borrow_mut() = Some(Box::new(hook));
    }

    pub fn clear_transfer_hook(&self) {
        self.on_transfer.borrow_mut().take();
    }

    #[must_use]
    pub fn owner(&self, collection: Address, asset_id: AssetId) -> Option<Address> {
        self.owners.borrow().get(&(collection, asset_id)).copied()
    }

    /// Completed transfers, not counting undone ones.
    #[must_use]
    pub fn transfer_count(&self) -> usize {
        self.transfer_count.get()
    }

    fn approved(&self, collection: Address, asset_id: AssetId, owner: Address, operator: Address) -> bool {
        owner == operator
            || self.token_approvals.borrow().get(&(collection, asset_id)) == Some(&operator)
            || self
                .operator_approvals
                .borrow()
                .contains(&(collection, owner, operator))
    }

    fn run_hook(&self, transfer: &AssetTransfer) -> Result<(), CollaboratorError> {
        let hook = self.on_transfer.borrow_mut().take();
        let Some(mut hook) = hook else {
            return Ok(());
        };
        let result = hook(transfer);
        let mut slot = self.on_transfer.borrow_mut();
        if slot.is_none() {
            *slot = Some(hook);
        }
        result
    }
}

impl AssetOwnership for InMemoryAssets {
    fn owner_of(&self, collection: Address, asset_id: AssetId) -> Result<Address, CollaboratorError> {
        self.owner(collection, asset_id)
            .ok_or_else(|| CollaboratorError::new(format!("nonexistent token {collection}#{asset_id}")))
    }

    fn is_approved_for(
        &self,
        collection: Address,
        asset_id: AssetId,
        operator: Address,
    ) -> Result<bool, CollaboratorError> {
        let owner = self.owner_of(collection, asset_id)?;
        Ok(self.approved(collection, asset_id, owner, operator))
    }

    fn transfer_from(
        &self,
        collection: Address,
        from: Address,
        to: Address,
        asset_id: AssetId,
    ) -> Result<(), CollaboratorError> {
        if self.fail_transfers.get() {
            return Err(CollaboratorError::new("transfers disabled"));
        }
        if to.is_zero() {
            return Err(CollaboratorError::new("transfer to the zero address"));
        }
        let owner = self.owner_of(collection, asset_id)?;
        if owner != from {
            return Err(CollaboratorError::new("transfer from incorrect owner"));
        }
        if !self.approved(collection, asset_id, owner, self.operator) {
            return Err(CollaboratorError::new("caller is not token owner or approved"));
        }

        let key = (collection, asset_id);
        let prior_approval = self.token_approvals.borrow_mut().remove(&key);
        self.owners.borrow_mut().insert(key, to);

        let transfer = AssetTransfer {
            collection,
            from,
            to,
            asset_id,
        };
        if let Err(e) = self.run_hook(&transfer) {
            self.owners.borrow_mut().insert(key, from);
            if let Some(approved) = prior_approval {
                self.token_approvals.borrow_mut().insert(key, approved);
            }
            return Err(e);
        }
        self.transfer_count.set(self.transfer_count.get() + 1);
        Ok(())
    }
}

/// Value sink recording the total received per address.
#[derive(Default)]
pub struct InMemoryFunds {
    received: RefCell<HashMap<Address, Amount>>,
    rejecting: RefCell<HashSet<Address>>,
    sends: Cell<usize>,
    on_send: RefCell<Option<SendHook>>,
}

impl InMemoryFunds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total value `to` has received.
    #[must_use]
    pub fn received(&self, to: Address) -> Amount {
        self.received.borrow().get(&to).copied().unwrap_or_default()
    }

    /// Make every send to `to` fail.
    pub fn reject(&self, to: Address) {
        self.rejecting.borrow_mut().insert(to);
    }

    pub fn accept(&self, to: Address) {
        self.rejecting.borrow_mut().remove(&to);
    }

    /// Completed sends, not counting undone ones.
    #[must_use]
    pub fn send_count(&self) -> usize {
        self.sends.get()
    }

    pub fn set_send_hook(
        &self,
        hook: impl FnMut(Address, Amount) -> Result<(), CollaboratorError> + 'static,
    ) {
        *self.on_send.borrow_mut() = Some(Box::new(hook));
    }

    pub fn clear_send_hook(&self) {
        self.on_send.borrow_mut().take();
    }

    fn run_hook(&self, to: Address, amount: Amount) -> Result<(), CollaboratorError> {
        let hook = self.on_send.borrow_mut().take();
        let Some(mut hook) = hook else {
            return Ok(());
        };
        let result = hook(to, amount);
        let mut slot = self.on_send.borrow_mut();
        if slot.is_none() {
            *slot = Some(hook);
        }
        result
    }
}

impl ValueTransfer for InMemoryFunds {
    fn send(&self, to: Address, amount: Amount) -> Result<(), CollaboratorError> {
        if self.rejecting.borrow().contains(&to) {
            return Err(CollaboratorError::new(format!("recipient {to} rejected payment")));
        }
        let previous = self.received(to);
        let updated = previous
            .checked_add(amount)
            .ok_or_else(|| CollaboratorError::new("recipient balance overflow"))?;
        self.received.borrow_mut().insert(to, updated);

        if let Err(e) = self.run_hook(to, amount) {
            self.received.borrow_mut().insert(to, previous);
            return Err(e);
        }
        self.sends.set(self.sends.get() + 1);
        Ok(())
    }
}
