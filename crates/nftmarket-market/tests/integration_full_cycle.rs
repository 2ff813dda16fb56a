//! Integration test: full listing lifecycle
//!
//! LIST → UPDATE → BUY → WITHDRAW
//!
//! Drives a marketplace through every public operation and checks
//! listings, proceeds, asset ownership, events and custody along the way.

use std::rc::Rc;

use nftmarket_market::testing::{InMemoryAssets, InMemoryFunds};
use nftmarket_market::{verify_event_root, Marketplace};
use nftmarket_types::*;

type TestMarket = Marketplace<Rc<InMemoryAssets>, Rc<InMemoryFunds>>;

struct World {
    market: TestMarket,
    assets: Rc<InMemoryAssets>,
    funds: Rc<InMemoryFunds>,
    operator: Address,
    collection: Address,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn world(config: impl FnOnce(MarketConfig) -> MarketConfig) -> World {
    init_tracing();
    let operator = Address::random();
    let assets = Rc::new(InMemoryAssets::new(operator));
    let funds = Rc::new(InMemoryFunds::new());
    let market = Marketplace::new(
        config(MarketConfig::new(operator)),
        Rc::clone(&assets),
        Rc::clone(&funds),
    )
    .unwrap();
    World {
        market,
        assets,
        funds,
        operator,
        collection: Address::random(),
    }
}

fn id(n: u64) -> AssetId {
    U256::from(n)
}

fn amt(n: u64) -> Amount {
    U256::from(n)
}

impl World {
    fn mint_approved(&self, asset: u64, owner: Address) {
        self.assets.mint(self.collection, id(asset), owner);
        self.assets.approve(self.collection, id(asset), self.operator);
    }
}

#[test]
fn list_buy_withdraw_scenario() {
    let w = world(|c| c);
    let seller = Address::random();
    let buyer = Address::random();
    w.mint_approved(0, seller);

    // Seller lists (A, 0) at 1
    w.market.list_item(w.collection, id(0), amt(1), seller).unwrap();
    assert_eq!(
        w.market.get_listing(w.collection, id(0)),
        Some(Listing::new(seller, amt(1)))
    );

    // Buyer buys with exactly 1
    w.market.buy_item(w.collection, id(0), amt(1), buyer).unwrap();
    assert!(w.market.get_listing(w.collection, id(0)).is_none());
    assert_eq!(w.market.get_proceeds(seller), amt(1));
    assert_eq!(w.assets.owner(w.collection, id(0)), Some(buyer));

    // Buying again fails: nothing is listed
    let err = w.market.buy_item(w.collection, id(0), amt(1), buyer).unwrap_err();
    assert_eq!(
        err,
        MarketError::NotListed {
            collection: w.collection,
            asset_id: id(0)
        }
    );

    // Seller withdraws exactly once
    assert_eq!(w.market.withdraw_proceeds(seller).unwrap(), amt(1));
    assert_eq!(w.funds.received(seller), amt(1));
    assert!(w.market.get_proceeds(seller).is_zero());
    assert_eq!(
        w.market.withdraw_proceeds(seller).unwrap_err(),
        MarketError::ZeroProceeds
    );
    assert_eq!(w.funds.received(seller), amt(1));

    let kinds: Vec<EventKind> = w.market.events().iter().map(|r| r.event.kind()).collect();
    assert_eq!(kinds, vec![EventKind::ItemListed, EventKind::ItemBought]);
    assert!(w.market.verify_custody().is_ok());
}

#[test]
fn buy_unlisted_key_fails() {
    let w = world(|c| c);
    let err = w
        .market
        .buy_item(w.collection, id(42), amt(100), Address::random())
        .unwrap_err();
    assert!(matches!(err, MarketError::NotListed { .. }));
}

#[test]
fn list_requires_ownership_and_approval() {
    let w = world(|c| c);
    let seller = Address::random();
    w.assets.mint(w.collection, id(1), seller);

    // Not approved yet
    let err = w
        .market
        .list_item(w.collection, id(1), amt(5), seller)
        .unwrap_err();
    assert_eq!(err, MarketError::NotApprovedForMarketplace);

    // Someone else tries to list it
    w.assets.approve(w.collection, id(1), w.operator);
    let err = w
        .market
        .list_item(w.collection, id(1), amt(5), Address::random())
        .unwrap_err();
    assert_eq!(err, MarketError::NotOwner);

    // Operator-wide approval also works
    w.assets.revoke(w.collection, id(1));
    w.assets
        .set_approval_for_all(w.collection, seller, w.operator, true);
    w.market.list_item(w.collection, id(1), amt(5), seller).unwrap();
}

#[test]
fn list_nonexistent_asset_is_query_failure() {
    let w = world(|c| c);
    let err = w
        .market
        .list_item(w.collection, id(9), amt(5), Address::random())
        .unwrap_err();
    assert!(matches!(err, MarketError::OwnershipQueryFailed { .. }));
}

#[test]
fn zero_price_rejected_regardless_of_caller() {
    let w = world(|c| c);
    w.mint_approved(1, Address::random());
    for caller in [Address::ZERO, Address::random()] {
        let err = w
            .market
            .list_item(w.collection, id(1), U256::zero(), caller)
            .unwrap_err();
        assert_eq!(err, MarketError::PriceMustBeAboveZero);
    }
}

#[test]
fn relist_fails_regardless_of_price() {
    let w = world(|c| c);
    let seller = Address::random();
    w.mint_approved(1, seller);
    w.market.list_item(w.collection, id(1), amt(5), seller).unwrap();

    for price in [U256::zero(), amt(5), amt(6)] {
        let err = w
            .market
            .list_item(w.collection, id(1), price, seller)
            .unwrap_err();
        assert_eq!(
            err,
            MarketError::AlreadyListed {
                collection: w.collection,
                asset_id: id(1)
            }
        );
    }
}

#[test]
fn update_changes_only_price_and_reemits_listed() {
    let w = world(|c| c);
    let seller = Address::random();
    w.mint_approved(1, seller);
    w.market.list_item(w.collection, id(1), amt(5), seller).unwrap();
    w.market.update_listing(w.collection, id(1), amt(8), seller).unwrap();

    assert_eq!(
        w.market.get_listing(w.collection, id(1)),
        Some(Listing::new(seller, amt(8)))
    );
    let events = w.market.events();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1].event,
        MarketEvent::ItemListed {
            seller,
            collection: w.collection,
            asset_id: id(1),
            price: amt(8),
        }
    );
}

#[test]
fn update_and_remove_guarded_by_seller() {
    let w = world(|c| c);
    let seller = Address::random();
    let other = Address::random();
    w.mint_approved(1, seller);

    assert!(matches!(
        w.market.update_listing(w.collection, id(1), amt(2), seller),
        Err(MarketError::NotListed { .. })
    ));
    assert!(matches!(
        w.market.remove_listing(w.collection, id(1), seller),
        Err(MarketError::NotListed { .. })
    ));

    w.market.list_item(w.collection, id(1), amt(5), seller).unwrap();
    assert_eq!(
        w.market.update_listing(w.collection, id(1), amt(2), other),
        Err(MarketError::NotOwner)
    );
    assert_eq!(
        w.market.update_listing(w.collection, id(1), U256::zero(), seller),
        Err(MarketError::PriceMustBeAboveZero)
    );
    assert_eq!(
        w.market.remove_listing(w.collection, id(1), other),
        Err(MarketError::NotOwner)
    );
    assert_eq!(w.market.events().len(), 1);

    w.market.remove_listing(w.collection, id(1), seller).unwrap();
    assert!(w.market.get_listing(w.collection, id(1)).is_none());
    assert_eq!(
        w.market.events().last().map(|r| r.event.kind()),
        Some(EventKind::ItemUnlisted)
    );

    // Removed listings can be listed again
    w.market.list_item(w.collection, id(1), amt(7), seller).unwrap();
}

#[test]
fn seller_cannot_buy_own_item() {
    let w = world(|c| c);
    let seller = Address::random();
    w.mint_approved(1, seller);
    w.market.list_item(w.collection, id(1), amt(5), seller).unwrap();
    assert_eq!(
        w.market.buy_item(w.collection, id(1), amt(5), seller),
        Err(MarketError::OwnerCannotBuyOwnItem)
    );
}

#[test]
fn underpayment_reports_price_and_paid() {
    let w = world(|c| c);
    let seller = Address::random();
    w.mint_approved(1, seller);
    w.market.list_item(w.collection, id(1), amt(5), seller).unwrap();
    assert_eq!(
        w.market.buy_item(w.collection, id(1), amt(4), Address::random()),
        Err(MarketError::InsufficientPurchaseAmt {
            price: amt(5),
            paid: amt(4)
        })
    );
    assert!(w.market.get_listing(w.collection, id(1)).is_some());
}

#[test]
fn overpayment_returned_to_buyer_by_default() {
    let w = world(|c| c);
    let seller = Address::random();
    let buyer = Address::random();
    w.mint_approved(1, seller);
    w.market.list_item(w.collection, id(1), amt(5), seller).unwrap();
    w.market.buy_item(w.collection, id(1), amt(12), buyer).unwrap();

    assert_eq!(w.market.get_proceeds(seller), amt(5));
    assert_eq!(w.market.get_proceeds(buyer), amt(7));
    assert_eq!(w.funds.send_count(), 0, "purchase makes no value transfer");

    assert_eq!(w.market.withdraw_proceeds(buyer).unwrap(), amt(7));
    assert_eq!(w.funds.received(buyer), amt(7));
    let totals = w.market.custody_totals();
    assert_eq!(totals.received, amt(12));
    assert_eq!(totals.paid_out, amt(7));
    assert!(w.market.verify_custody().is_ok());
}

#[test]
fn overpayment_credited_to_seller_when_configured() {
    let w = world(|c| c.with_overpayment(OverpaymentPolicy::CreditSeller));
    let seller = Address::random();
    let buyer = Address::random();
    w.mint_approved(1, seller);
    w.market.list_item(w.collection, id(1), amt(5), seller).unwrap();
    w.market.buy_item(w.collection, id(1), amt(12), buyer).unwrap();

    assert_eq!(w.market.get_proceeds(seller), amt(12));
    assert!(w.market.get_proceeds(buyer).is_zero());

    // ItemBought still carries the listed price
    let bought = w.market.events().pop().unwrap();
    assert_eq!(
        bought.event,
        MarketEvent::ItemBought {
            buyer,
            collection: w.collection,
            asset_id: id(1),
            price: amt(5),
        }
    );
}

#[test]
fn proceeds_accumulate_across_sales() {
    let w = world(|c| c);
    let seller = Address::random();
    for n in 0..3 {
        w.mint_approved(n, seller);
        w.market
            .list_item(w.collection, id(n), amt(10 + n), seller)
            .unwrap();
    }
    assert_eq!(w.market.listings_by_seller(seller).len(), 3);
    assert_eq!(w.market.listings_in_collection(w.collection).len(), 3);

    for n in 0..3 {
        w.market
            .buy_item(w.collection, id(n), amt(10 + n), Address::random())
            .unwrap();
    }
    assert_eq!(w.market.get_proceeds(seller), amt(33));
    assert_eq!(w.market.total_outstanding().unwrap(), amt(33));
    assert_eq!(w.market.sellers_with_balance(), vec![(seller, amt(33))]);
    assert!(w.market.listings_by_seller(seller).is_empty());
    assert_eq!(w.market.withdraw_proceeds(seller).unwrap(), amt(33));
    assert!(w.market.sellers_with_balance().is_empty());
    assert!(w.market.verify_custody().is_ok());
}

#[test]
fn buyer_can_relist_purchased_asset() {
    let w = world(|c| c);
    let seller = Address::random();
    let buyer = Address::random();
    w.mint_approved(1, seller);
    w.market.list_item(w.collection, id(1), amt(5), seller).unwrap();
    w.market.buy_item(w.collection, id(1), amt(5), buyer).unwrap();

    // Single-token approval was cleared by the transfer
    assert_eq!(
        w.market.list_item(w.collection, id(1), amt(9), buyer),
        Err(MarketError::NotApprovedForMarketplace)
    );
    w.assets.approve(w.collection, id(1), w.operator);
    w.market.list_item(w.collection, id(1), amt(9), buyer).unwrap();

    // The previous seller no longer owns it
    assert_eq!(
        w.market.update_listing(w.collection, id(1), amt(1), seller),
        Err(MarketError::NotOwner)
    );
}

#[test]
fn independent_marketplaces_do_not_share_state() {
    let a = world(|c| c);
    let b = world(|c| c);
    let seller = Address::random();
    a.mint_approved(1, seller);
    a.market.list_item(a.collection, id(1), amt(5), seller).unwrap();

    assert!(b.market.get_listing(a.collection, id(1)).is_none());
    assert!(b.market.events().is_empty());
}

#[test]
fn event_feed_is_sequenced_and_rooted() {
    let w = world(|c| c);
    let seller = Address::random();
    w.mint_approved(1, seller);
    w.mint_approved(2, seller);
    w.market.list_item(w.collection, id(1), amt(5), seller).unwrap();
    w.market.list_item(w.collection, id(2), amt(6), seller).unwrap();
    w.market.remove_listing(w.collection, id(2), seller).unwrap();

    let events = w.market.events();
    let sequences: Vec<u64> = events.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
    assert_eq!(w.market.events_since(1).len(), 2);
    assert!(w.market.events_since(3).is_empty());

    let root = w.market.event_root();
    assert!(verify_event_root(&events, &root));

    // Events serialize for the indexer feed
    let json = serde_json::to_string(&events[0]).unwrap();
    let back: EventRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, events[0]);
}
