use anyhow::Context;
use chrono::Utc;

use mintsale_auth::Role;
use mintsale_core::{AccountId, CollectionId};
use mintsale_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use mintsale_inventory::{Collection, CollectionMetadata};
use mintsale_ledger::{InMemoryNative, InMemoryToken};
use mintsale_sales::{Collaborators, ContextSeededPicker, SaleConfig, SaleEngine, SaleEvent};

pub type DemoSale = SaleEngine<
    InMemoryToken,
    InMemoryNative,
    ContextSeededPicker,
    InMemoryEventBus<EventEnvelope<SaleEvent>>,
>;

/// Whole payment tokens minted to the demo buyer; enough to buy every item.
const BUYER_TOKENS: u128 = 1_000_000;
/// Deposits the demo buyer can afford.
const BUYER_DEPOSITS: u128 = 100;

/// An in-memory deployment with one funded buyer.
pub struct Demo {
    pub sale: DemoSale,
    pub owner: AccountId,
    pub treasury: AccountId,
    pub buyer: AccountId,
    pub events: Subscription<EventEnvelope<SaleEvent>>,
}

/// Deploy token, collection and sale, then wire them together: the sale
/// account becomes a minter, the treasury is set, and the buyer is funded
/// and has approved the sale.
pub fn deploy(config: &SaleConfig) -> anyhow::Result<Demo> {
    let owner = AccountId::new();
    let sale_account = AccountId::new();
    let treasury = AccountId::new();
    let buyer = AccountId::new();

    let scale = 10u128
        .checked_pow(config.token_decimals)
        .context("token decimals too large")?;
    let tokens = BUYER_TOKENS
        .checked_mul(scale)
        .context("token decimals too large")?;
    let mut token = InMemoryToken::new("MiPrimerToken", "MPRTKN", config.token_decimals);
    token.mint(buyer, tokens)?;
    token.approve(buyer, sale_account, tokens);

    let mut native = InMemoryNative::new();
    let deposits = BUYER_DEPOSITS
        .checked_mul(config.deposit_price)
        .context("deposit price too large")?;
    native.fund(buyer, deposits)?;

    let mut collection = Collection::new(CollectionId::new(), CollectionMetadata::default(), owner);
    collection.grant_role(owner, Role::MINTER, sale_account, Utc::now())?;

    let bus = InMemoryEventBus::new();
    let events = bus.subscribe();

    let mut sale = SaleEngine::new(
        owner,
        sale_account,
        collection,
        config,
        Collaborators {
            token,
            native,
            picker: ContextSeededPicker::new(),
            bus,
        },
    )?;
    sale.set_treasury(owner, treasury)?;

    tracing::info!(
        "deployed sale {} (collection {}, treasury {}, buyer {})",
        sale.sale_id(),
        sale.collection().name(),
        treasury,
        buyer
    );

    Ok(Demo {
        sale,
        owner,
        treasury,
        buyer,
        events,
    })
}
