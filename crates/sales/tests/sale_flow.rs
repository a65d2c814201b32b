use std::collections::HashSet;

use chrono::Utc;
use proptest::prelude::*;

use mintsale_auth::Role;
use mintsale_core::{AccountId, CollectionId, DomainError, ItemId};
use mintsale_events::{EventBus, EventEnvelope, InMemoryEventBus, Projection, Subscription};
use mintsale_inventory::{Collection, CollectionMetadata};
use mintsale_ledger::{InMemoryNative, InMemoryToken, NativeCurrency, PaymentToken};
use mintsale_sales::{
    Collaborators, ContextSeededPicker, Currency, IdPicker, OwnershipProjection, PurchasePath,
    SaleConfig, SaleEngine, SaleEvent, SequencePicker,
};

type Bus = InMemoryEventBus<EventEnvelope<SaleEvent>>;
type Engine<P> = SaleEngine<InMemoryToken, InMemoryNative, P, Bus>;

const FUNDS: u128 = 10_000_000;
const DEPOSIT: u128 = 10_000_000_000_000_000;

struct Deployment<P> {
    engine: Engine<P>,
    owner: AccountId,
    treasury: AccountId,
    buyer: AccountId,
    events: Subscription<EventEnvelope<SaleEvent>>,
}

impl<P: IdPicker> Deployment<P> {
    fn sale(&self) -> AccountId {
        self.engine.account()
    }

    fn approve(&mut self, amount: u128) {
        let (buyer, sale) = (self.buyer, self.sale());
        self.engine.token_mut().approve(buyer, sale, amount);
    }

    fn token_balance(&self, account: AccountId) -> u128 {
        self.engine.token().balance_of(account)
    }

    fn native_balance(&self, account: AccountId) -> u128 {
        self.engine.native().balance_of(account)
    }

    fn deliveries(&self) -> Vec<(AccountId, u32)> {
        self.events
            .drain()
            .into_iter()
            .filter_map(|env| env.payload().as_delivery().map(|d| (d.recipient, d.id.get())))
            .collect()
    }
}

/// Deployment wired the way the deploy flow does it: the sale account holds
/// the minter role and the treasury is set.
fn deploy<P: IdPicker>(config: SaleConfig, picker: P) -> Deployment<P> {
    let owner = AccountId::new();
    let sale = AccountId::new();
    let treasury = AccountId::new();
    let buyer = AccountId::new();

    let mut collection = Collection::new(CollectionId::new(), CollectionMetadata::default(), owner);
    collection
        .grant_role(owner, Role::MINTER, sale, Utc::now())
        .unwrap();

    let mut token = InMemoryToken::new("MiPrimerToken", "MPRTKN", config.token_decimals);
    token.mint(buyer, FUNDS).unwrap();
    let mut native = InMemoryNative::new();
    native.fund(buyer, 40 * config.deposit_price).unwrap();

    let bus = Bus::new();
    let events = bus.subscribe();

    let mut engine = SaleEngine::new(
        owner,
        sale,
        collection,
        &config,
        Collaborators {
            token,
            native,
            picker,
            bus,
        },
    )
    .unwrap();
    engine.set_treasury(owner, treasury).unwrap();

    Deployment {
        engine,
        owner,
        treasury,
        buyer,
        events,
    }
}

fn unit_config() -> SaleConfig {
    SaleConfig {
        token_decimals: 0,
        ..SaleConfig::default()
    }
}

fn unit_deployment() -> Deployment<SequencePicker> {
    deploy(unit_config(), SequencePicker::lowest())
}

#[test]
fn tier_prices_match_the_schedule() {
    let d = unit_deployment();
    assert_eq!(d.engine.price_of(5).unwrap(), 500);
    assert_eq!(d.engine.price_of(11).unwrap(), 11_000);
    assert_eq!(d.engine.price_of(20).unwrap(), 20_000);
    assert_eq!(d.engine.price_of(25).unwrap(), 50_000);
}

#[test]
fn prices_scale_with_token_decimals() {
    let d = deploy(SaleConfig::default(), SequencePicker::lowest());
    assert_eq!(d.engine.price_of(5).unwrap(), 500 * 10u128.pow(18));
    assert_eq!(d.engine.price_of(25).unwrap(), 50_000 * 10u128.pow(18));
}

#[test]
fn purchase_of_item_one_routes_ten_percent_to_treasury() {
    let mut d = unit_deployment();
    d.approve(500);

    let receipt = d.engine.purchase_by_id(d.buyer, 1).unwrap();

    assert_eq!(d.token_balance(d.treasury), 50);
    assert_eq!(d.token_balance(d.sale()), 450);
    assert_eq!(d.token_balance(d.buyer), FUNDS - 500);
    assert_eq!(d.engine.owner_of(1).unwrap(), Some(d.buyer));
    assert_eq!(d.deliveries(), vec![(d.buyer, 1)]);
    assert_eq!(receipt.path, PurchasePath::ById);
    assert_eq!(receipt.currency, Currency::Token);
}

#[test]
fn purchase_of_item_eleven_routes_ten_percent_to_treasury() {
    let mut d = unit_deployment();
    d.approve(11_000);

    d.engine.purchase_by_id(d.buyer, 11).unwrap();

    assert_eq!(d.token_balance(d.treasury), 1_100);
    assert_eq!(d.token_balance(d.sale()), 9_900);
    assert_eq!(d.token_balance(d.buyer), FUNDS - 11_000);
}

#[test]
fn buying_a_sold_id_fails_without_moving_funds() {
    let mut d = unit_deployment();
    d.approve(1_000);
    d.engine.purchase_by_id(d.buyer, 2).unwrap();
    let before = d.token_balance(d.buyer);

    let err = d.engine.purchase_by_id(d.buyer, 2).unwrap_err();

    assert_eq!(err, DomainError::IdUnavailable { id: 2 });
    assert_eq!(err.to_string(), "id 2 not available");
    assert_eq!(d.token_balance(d.buyer), before);
}

#[test]
fn allowance_below_price_keeps_the_item_available() {
    let mut d = unit_deployment();
    d.approve(19_999);

    let err = d.engine.purchase_by_id(d.buyer, 20).unwrap_err();

    assert_eq!(
        err,
        DomainError::InsufficientAllowance {
            required: 20_000,
            approved: 19_999
        }
    );
    assert!(d.engine.is_available(20).unwrap());
    assert_eq!(d.token_balance(d.buyer), FUNDS);
    assert!(d.deliveries().is_empty());
}

#[test]
fn balance_below_price_is_rejected() {
    let mut d = unit_deployment();
    let poor = AccountId::new();
    let sale = d.sale();
    d.engine.token_mut().mint(poor, 400).unwrap();
    d.engine.token_mut().approve(poor, sale, 500);

    let err = d.engine.purchase_by_id(poor, 3).unwrap_err();

    assert_eq!(
        err,
        DomainError::InsufficientBalance {
            required: 500,
            available: 400
        }
    );
    assert_eq!(d.token_balance(poor), 400);
    assert_eq!(d.engine.remaining_count(), 30);
}

#[test]
fn native_balance_below_deposit_is_rejected() {
    let mut d = unit_deployment();
    let price = d.engine.deposit_price();
    let poor = AccountId::new();
    d.engine.native_mut().fund(poor, price - 1).unwrap();

    let err = d.engine.purchase_random_by_deposit(poor, price).unwrap_err();

    assert_eq!(
        err,
        DomainError::InsufficientBalance {
            required: price,
            available: price - 1
        }
    );
    assert!(!err.to_string().contains("token"));
    assert_eq!(d.engine.remaining_count(), 30);
    assert_eq!(d.native_balance(poor), price - 1);
    assert_eq!(d.native_balance(d.sale()), 0);
    assert!(d.deliveries().is_empty());
}

#[test]
fn thirty_random_purchases_drain_the_pool_then_fail() {
    let config = SaleConfig {
        deposit_price: DEPOSIT,
        ..unit_config()
    };
    let mut d = deploy(config, ContextSeededPicker::new());

    let mut seen = HashSet::new();
    for _ in 0..30 {
        let receipt = d.engine.purchase_random_by_deposit(d.buyer, DEPOSIT).unwrap();
        assert!((1..=30).contains(&receipt.id.get()));
        assert!(seen.insert(receipt.id));
    }

    let err = d.engine.purchase_random_by_deposit(d.buyer, DEPOSIT).unwrap_err();
    assert_eq!(err, DomainError::Exhausted);
    assert_eq!(err.to_string(), "No NFTs available");
    assert_eq!(d.engine.remaining_count(), 0);
    assert_eq!(d.deliveries().len(), 30);
    assert_eq!(d.native_balance(d.sale()), 30 * DEPOSIT);
}

#[test]
fn deposit_overpayment_is_refunded() {
    let mut d = unit_deployment();
    let price = d.engine.deposit_price();

    let receipt = d.engine.purchase_random_by_deposit(d.buyer, price + 7).unwrap();

    assert_eq!(receipt.refund, 7);
    assert_eq!(receipt.price, price);
    assert_eq!(d.native_balance(d.buyer), 39 * price);
    assert_eq!(d.native_balance(d.sale()), price);
    assert_eq!(d.native_balance(d.treasury), 0);
}

#[test]
fn bare_payment_follows_the_deposit_contract() {
    let mut d = unit_deployment();
    let price = d.engine.deposit_price();

    let receipt = d.engine.receive_native(d.buyer, price).unwrap();

    assert_eq!(receipt.path, PurchasePath::BarePayment);
    assert_eq!(receipt.currency, Currency::Native);
    assert_eq!(receipt.id.get(), 1);
    assert_eq!(d.deliveries(), vec![(d.buyer, 1)]);

    let err = d.engine.receive_native(d.buyer, price - 1).unwrap_err();
    assert!(matches!(err, DomainError::InsufficientDeposit { .. }));
}

#[test]
fn native_commission_is_a_deployment_choice() {
    let config = SaleConfig {
        native_commission_bps: Some(1_000),
        ..unit_config()
    };
    let mut d = deploy(config, SequencePicker::lowest());
    let price = d.engine.deposit_price();

    let receipt = d.engine.purchase_random_by_deposit(d.buyer, price).unwrap();

    assert_eq!(receipt.commission, price / 10);
    assert_eq!(d.native_balance(d.treasury), price / 10);
    assert_eq!(d.native_balance(d.sale()), price - price / 10);
}

#[test]
fn purchases_before_treasury_is_set_are_rejected() {
    let owner = AccountId::new();
    let sale = AccountId::new();
    let buyer = AccountId::new();
    let mut collection = Collection::new(CollectionId::new(), CollectionMetadata::default(), owner);
    collection.grant_role(owner, Role::MINTER, sale, Utc::now()).unwrap();
    let mut token = InMemoryToken::new("MiPrimerToken", "MPRTKN", 0);
    token.mint(buyer, 1_000).unwrap();
    token.approve(buyer, sale, 1_000);

    let mut engine: Engine<SequencePicker> = SaleEngine::new(
        owner,
        sale,
        collection,
        &unit_config(),
        Collaborators {
            token,
            native: InMemoryNative::new(),
            picker: SequencePicker::lowest(),
            bus: Bus::new(),
        },
    )
    .unwrap();

    let err = engine.purchase_by_id(buyer, 1).unwrap_err();
    assert_eq!(err, DomainError::validation("treasury address not set"));
    assert_eq!(engine.token().balance_of(buyer), 1_000);
}

#[test]
fn only_the_owner_may_set_the_treasury() {
    let mut d = unit_deployment();
    let err = d.engine.set_treasury(d.buyer, d.buyer).unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized(_)));
    assert_eq!(d.engine.treasury(), Some(d.treasury));
    assert!(d.engine.is_admin(d.owner));
}

#[test]
fn ownership_projection_follows_the_stream() {
    let mut d = unit_deployment();
    d.approve(FUNDS);
    let mut projection = OwnershipProjection::new();

    d.engine.purchase_by_id(d.buyer, 12).unwrap();
    d.engine
        .purchase_random_by_deposit(d.buyer, d.engine.deposit_price())
        .unwrap();
    let envelopes = d.events.drain();
    for env in envelopes.iter().chain(envelopes.iter()) {
        projection.apply(env);
    }

    assert_eq!(projection.position(), 4);
    assert_eq!(projection.owned_by(d.buyer).len(), 2);
    assert_eq!(projection.remaining().len(), d.engine.remaining_count());
    assert_eq!(projection.owner_of(ItemId::new(12).unwrap()), Some(d.buyer));
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn out_of_range_ids_are_rejected_everywhere(id in prop_oneof![Just(0u32), 31u32..]) {
        let mut d = unit_deployment();
        d.approve(FUNDS);

        let expected = DomainError::OutOfRange { id, min: 1, max: 30 };
        prop_assert_eq!(d.engine.price_of(id).unwrap_err(), expected.clone());
        prop_assert_eq!(d.engine.is_available(id).unwrap_err(), expected.clone());
        prop_assert_eq!(d.engine.purchase_by_id(d.buyer, id).unwrap_err(), expected);
        prop_assert_eq!(d.token_balance(d.buyer), FUNDS);
    }

    #[test]
    fn commission_and_net_always_sum_to_price(id in 1u32..=30) {
        let mut d = unit_deployment();
        d.approve(FUNDS);
        let price = d.engine.price_of(id).unwrap();

        let receipt = d.engine.purchase_by_id(d.buyer, id).unwrap();

        prop_assert_eq!(receipt.commission + receipt.net, price);
        prop_assert_eq!(receipt.commission, price / 10);
        prop_assert_eq!(d.token_balance(d.buyer), FUNDS - price);
        prop_assert_eq!(d.deliveries(), vec![(d.buyer, id)]);
    }
}
