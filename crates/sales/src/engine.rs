//! Sale engine: the two purchase paths over the inventory guard.
//!
//! Every purchase runs in three phases:
//!
//! 1. **Decide**: all preconditions are checked and the guard's `handle`
//!    produces the issuance event. Nothing has been written yet.
//! 2. **Settle**: the payment is pulled from the buyer in a single transfer,
//!    then the engine forwards the commission (and any refund) out of its
//!    own balance. If a forward is refused, the pulled payment is sent back
//!    before the error is returned.
//! 3. **Commit**: the issuance event is applied to the guard, then the
//!    resulting envelopes are published.
//!
//! A failure in phase 1 leaves every balance, allowance and item untouched.
//! A failure in phase 2 leaves every balance and item as it was; the token
//! allowance spent by the returned pull stays spent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mintsale_auth::{AccessControl, Role, authorize};
use mintsale_core::{AccountId, Aggregate, DomainError, DomainResult, ItemId, SaleId};
use mintsale_events::{EventBus, EventEnvelope};
use mintsale_inventory::{Collection, CollectionCommand, CollectionEvent, IssueItem};
use mintsale_ledger::{LedgerError, NativeCurrency, PaymentToken};
use mintsale_pricing::{CommissionRate, PricingPolicy, Split};

use crate::allocator::{DrawContext, IdPicker};
use crate::config::SaleConfig;
use crate::events::{Currency, ItemDelivered, PaymentSettled, PurchasePath, SaleEvent};

/// The sale's external collaborators, injected at construction.
#[derive(Debug)]
pub struct Collaborators<T, N, P, B> {
    pub token: T,
    pub native: N,
    pub picker: P,
    pub bus: B,
}

/// Outcome of a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub id: ItemId,
    pub buyer: AccountId,
    pub path: PurchasePath,
    pub currency: Currency,
    pub price: u128,
    pub commission: u128,
    pub net: u128,
    pub refund: u128,
    /// Envelopes published for this purchase, in stream order.
    pub events: Vec<EventEnvelope<SaleEvent>>,
}

/// Fixed-inventory sale over a [`Collection`].
///
/// `account` is the engine's own address: it is the spender of buyer
/// allowances, the holder of net proceeds, and must hold the minter role on
/// the collection.
#[derive(Debug)]
pub struct SaleEngine<T, N, P, B> {
    sale_id: SaleId,
    account: AccountId,
    acl: AccessControl,
    collection: Collection,
    pricing: PricingPolicy,
    commission: CommissionRate,
    native_commission: Option<CommissionRate>,
    deposit_price: u128,
    treasury: Option<AccountId>,
    token: T,
    native: N,
    picker: P,
    bus: B,
    sequence: u64,
    draws: u64,
}

impl<T, N, P, B> SaleEngine<T, N, P, B>
where
    T: PaymentToken,
    N: NativeCurrency,
    P: IdPicker,
    B: EventBus<EventEnvelope<SaleEvent>>,
{
    /// Create a sale owned by `owner`, trading from `account`.
    pub fn new(
        owner: AccountId,
        account: AccountId,
        collection: Collection,
        config: &SaleConfig,
        collaborators: Collaborators<T, N, P, B>,
    ) -> DomainResult<Self> {
        let Collaborators {
            token,
            native,
            picker,
            bus,
        } = collaborators;

        if token.decimals() != config.token_decimals {
            return Err(DomainError::validation(format!(
                "payment token has {} decimals, sale is configured for {}",
                token.decimals(),
                config.token_decimals
            )));
        }
        if config.deposit_price == 0 {
            return Err(DomainError::validation("deposit price must be positive"));
        }

        Ok(Self {
            sale_id: SaleId::new(),
            account,
            acl: AccessControl::with_admin(owner, std::iter::empty()),
            collection,
            pricing: PricingPolicy::standard(config.token_decimals)?,
            commission: config.commission()?,
            native_commission: config.native_commission()?,
            deposit_price: config.deposit_price,
            treasury: None,
            token,
            native,
            picker,
            bus,
            sequence: 0,
            draws: 0,
        })
    }

    /// Set the treasury address. Admin only, once per sale.
    pub fn set_treasury(&mut self, caller: AccountId, treasury: AccountId) -> DomainResult<()> {
        authorize(&self.acl, caller, &Role::ADMIN)?;
        if let Some(existing) = self.treasury {
            return Err(DomainError::conflict(format!(
                "treasury address already set to {existing}"
            )));
        }
        self.treasury = Some(treasury);
        tracing::info!(sale_id = %self.sale_id, %treasury, "treasury address set");
        Ok(())
    }

    /// Buy item `id` with payment tokens the buyer approved to the engine.
    pub fn purchase_by_id(&mut self, buyer: AccountId, id: u32) -> DomainResult<PurchaseReceipt> {
        let item = ItemId::new(id)?;
        if !self.collection.is_available(id)? {
            return Err(DomainError::IdUnavailable { id });
        }

        let price = self.pricing.price_of_item(item);
        let treasury = self.require_treasury()?;

        let approved = self.token.allowance(buyer, self.account);
        if approved < price {
            return Err(DomainError::InsufficientAllowance {
                required: price,
                approved,
            });
        }
        let available = self.token.balance_of(buyer);
        if available < price {
            return Err(DomainError::InsufficientBalance {
                required: price,
                available,
            });
        }

        let split = self.commission.split(price);
        let at = Utc::now();
        let issued = self.decide_issue(item, buyer, at)?;

        // One pull from the buyer; the commission leaves from the sale's own balance.
        self.token.transfer_from(self.account, buyer, self.account, price)?;
        if split.commission > 0 {
            if let Err(err) = self.token.transfer(self.account, treasury, split.commission) {
                return Err(self.return_token_payment(buyer, price, err));
            }
        }

        self.commit_issue(&issued);
        let settlement = Settlement {
            item,
            buyer,
            path: PurchasePath::ById,
            currency: Currency::Token,
            price,
            split,
            refund: 0,
            treasury: Some(treasury),
            at,
        };
        Ok(self.finish(settlement))
    }

    /// Buy a random available item with a native-currency deposit.
    ///
    /// `amount` above the deposit price is refunded to the buyer.
    pub fn purchase_random_by_deposit(
        &mut self,
        buyer: AccountId,
        amount: u128,
    ) -> DomainResult<PurchaseReceipt> {
        self.settle_deposit(buyer, amount, PurchasePath::Deposit)
    }

    /// A bare native-currency payment to the sale: same contract as
    /// [`Self::purchase_random_by_deposit`].
    pub fn receive_native(&mut self, payer: AccountId, amount: u128) -> DomainResult<PurchaseReceipt> {
        self.settle_deposit(payer, amount, PurchasePath::BarePayment)
    }

    fn settle_deposit(
        &mut self,
        buyer: AccountId,
        amount: u128,
        path: PurchasePath,
    ) -> DomainResult<PurchaseReceipt> {
        if self.collection.is_exhausted() {
            return Err(DomainError::Exhausted);
        }

        let price = self.deposit_price;
        if amount < price {
            return Err(DomainError::InsufficientDeposit {
                required: price,
                sent: amount,
            });
        }
        let available = self.native.balance_of(buyer);
        if available < amount {
            return Err(DomainError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        let refund = amount - price;
        let split = self
            .native_commission
            .unwrap_or(CommissionRate::ZERO)
            .split(price);
        let treasury = if split.commission > 0 {
            Some(self.require_treasury()?)
        } else {
            None
        };

        let at = Utc::now();
        let pool = self.collection.available_ids();
        let ctx = DrawContext {
            sale_id: self.sale_id,
            buyer,
            nonce: self.draws,
            at,
        };
        let item = self
            .picker
            .pick(&ctx, &pool)
            .filter(|picked| pool.contains(picked))
            .ok_or_else(|| DomainError::invariant("allocator picked an id outside the remaining pool"))?;
        let issued = self.decide_issue(item, buyer, at)?;

        self.native.transfer(buyer, self.account, amount)?;
        if refund > 0 {
            if let Err(err) = self.native.transfer(self.account, buyer, refund) {
                return Err(self.return_native_payment(buyer, amount, err));
            }
        }
        if let Some(treasury) = treasury {
            if let Err(err) = self.native.transfer(self.account, treasury, split.commission) {
                return Err(self.return_native_payment(buyer, price, err));
            }
        }

        self.draws += 1;
        self.commit_issue(&issued);
        let settlement = Settlement {
            item,
            buyer,
            path,
            currency: Currency::Native,
            price,
            split,
            refund,
            treasury,
            at,
        };
        Ok(self.finish(settlement))
    }

    /// Send a payment already pulled from `buyer` back, after a later leg of
    /// the settlement failed. Returns the error to surface.
    fn return_token_payment(&mut self, buyer: AccountId, amount: u128, cause: LedgerError) -> DomainError {
        let undo = self.token.transfer(self.account, buyer, amount);
        self.settlement_failed(buyer, amount, cause, undo)
    }

    fn return_native_payment(&mut self, buyer: AccountId, amount: u128, cause: LedgerError) -> DomainError {
        let undo = self.native.transfer(self.account, buyer, amount);
        self.settlement_failed(buyer, amount, cause, undo)
    }

    fn settlement_failed(
        &self,
        buyer: AccountId,
        amount: u128,
        cause: LedgerError,
        undo: Result<(), LedgerError>,
    ) -> DomainError {
        match undo {
            Ok(()) => {
                tracing::warn!(
                    "settlement for {} on sale {} failed, {} returned: {}",
                    buyer,
                    self.sale_id,
                    amount,
                    cause
                );
                cause.into()
            }
            Err(undo_err) => {
                tracing::error!(
                    "settlement for {} on sale {} failed ({}) and {} could not be returned: {}",
                    buyer,
                    self.sale_id,
                    cause,
                    amount,
                    undo_err
                );
                DomainError::invariant(format!(
                    "payment of {amount} held for {buyer} after failed settlement: {undo_err}"
                ))
            }
        }
    }

    fn require_treasury(&self) -> DomainResult<AccountId> {
        self.treasury
            .ok_or_else(|| DomainError::validation("treasury address not set"))
    }

    /// Ask the guard to issue `item` without applying anything.
    fn decide_issue(
        &self,
        item: ItemId,
        buyer: AccountId,
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<CollectionEvent>> {
        self.collection
            .handle(&CollectionCommand::IssueItem(IssueItem {
                caller: self.account,
                id: item.get(),
                recipient: buyer,
                occurred_at: at,
            }))
    }

    fn commit_issue(&mut self, events: &[CollectionEvent]) {
        for event in events {
            self.collection.apply(event);
        }
    }

    fn finish(&mut self, s: Settlement) -> PurchaseReceipt {
        let delivered = SaleEvent::ItemDelivered(ItemDelivered {
            sale_id: self.sale_id,
            id: s.item,
            recipient: s.buyer,
            path: s.path,
            occurred_at: s.at,
        });
        let settled = SaleEvent::PaymentSettled(PaymentSettled {
            sale_id: self.sale_id,
            id: s.item,
            payer: s.buyer,
            currency: s.currency,
            price: s.price,
            commission: s.split.commission,
            net: s.split.net,
            refund: s.refund,
            treasury: s.treasury,
            occurred_at: s.at,
        });
        let events = self.publish([delivered, settled]);

        tracing::info!(
            sale_id = %self.sale_id,
            buyer = %s.buyer,
            id = s.item.get(),
            path = ?s.path,
            price = %s.price,
            commission = %s.split.commission,
            refund = %s.refund,
            remaining = self.collection.remaining_count(),
            "item sold"
        );

        PurchaseReceipt {
            id: s.item,
            buyer: s.buyer,
            path: s.path,
            currency: s.currency,
            price: s.price,
            commission: s.split.commission,
            net: s.split.net,
            refund: s.refund,
            events,
        }
    }

    fn publish(&mut self, payloads: impl IntoIterator<Item = SaleEvent>) -> Vec<EventEnvelope<SaleEvent>> {
        let mut envelopes = Vec::new();
        for payload in payloads {
            self.sequence += 1;
            let envelope = EventEnvelope::new(Uuid::now_v7(), self.sale_id, self.sequence, payload);
            if let Err(err) = self.bus.publish(envelope.clone()) {
                // The sale is already committed; subscribers can rebuild from receipts.
                tracing::warn!(
                    "failed to publish event {} of sale {}: {:?}",
                    self.sequence,
                    self.sale_id,
                    err
                );
            }
            envelopes.push(envelope);
        }
        envelopes
    }
}

/// Everything known about a purchase once it has settled.
struct Settlement {
    item: ItemId,
    buyer: AccountId,
    path: PurchasePath,
    currency: Currency,
    price: u128,
    split: Split,
    refund: u128,
    treasury: Option<AccountId>,
    at: DateTime<Utc>,
}

// Views and collaborator access.
impl<T, N, P, B> SaleEngine<T, N, P, B>
where
    T: PaymentToken,
{
    pub fn sale_id(&self) -> SaleId {
        self.sale_id
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn treasury(&self) -> Option<AccountId> {
        self.treasury
    }

    pub fn deposit_price(&self) -> u128 {
        self.deposit_price
    }

    pub fn commission_rate(&self) -> CommissionRate {
        self.commission
    }

    pub fn remaining_count(&self) -> usize {
        self.collection.remaining_count()
    }

    pub fn is_available(&self, id: u32) -> DomainResult<bool> {
        self.collection.is_available(id)
    }

    pub fn price_of(&self, id: u32) -> DomainResult<u128> {
        self.pricing.price_of(id)
    }

    pub fn owner_of(&self, id: u32) -> DomainResult<Option<AccountId>> {
        self.collection.owner_of(id)
    }

    /// Payment tokens held by the engine (net proceeds).
    pub fn proceeds(&self) -> u128 {
        self.token.balance_of(self.account)
    }

    pub fn is_admin(&self, account: AccountId) -> bool {
        self.acl.has_role(account, &Role::ADMIN)
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Mutable guard access, for role administration.
    pub fn collection_mut(&mut self) -> &mut Collection {
        &mut self.collection
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    pub fn native_mut(&mut self) -> &mut N {
        &mut self.native
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintsale_events::InMemoryEventBus;
    use mintsale_inventory::CollectionMetadata;
    use mintsale_ledger::{InMemoryNative, InMemoryToken};

    use crate::allocator::SequencePicker;

    type Engine = SaleEngine<InMemoryToken, InMemoryNative, SequencePicker, InMemoryEventBus<EventEnvelope<SaleEvent>>>;

    const UNIT: u128 = 1;

    struct Fixture {
        engine: Engine,
        owner: AccountId,
        treasury: AccountId,
        buyer: AccountId,
    }

    fn setup() -> Fixture {
        let owner = AccountId::new();
        let account = AccountId::new();
        let treasury = AccountId::new();
        let buyer = AccountId::new();

        let mut collection = Collection::new(Default::default(), CollectionMetadata::default(), owner);
        collection
            .grant_role(owner, Role::MINTER, account, Utc::now())
            .unwrap();

        let config = SaleConfig {
            token_decimals: 0,
            deposit_price: 100,
            ..SaleConfig::default()
        };
        let mut token = InMemoryToken::new("MiPrimerToken", "MPRTKN", 0);
        token.mint(buyer, 1_000_000 * UNIT).unwrap();
        let mut native = InMemoryNative::new();
        native.fund(buyer, 10_000).unwrap();

        let mut engine = SaleEngine::new(
            owner,
            account,
            collection,
            &config,
            Collaborators {
                token,
                native,
                picker: SequencePicker::lowest(),
                bus: InMemoryEventBus::new(),
            },
        )
        .unwrap();
        engine.set_treasury(owner, treasury).unwrap();

        Fixture {
            engine,
            owner,
            treasury,
            buyer,
        }
    }

    fn approve(f: &mut Fixture, amount: u128) {
        let spender = f.engine.account();
        f.engine.token_mut().approve(f.buyer, spender, amount);
    }

    #[test]
    fn purchase_by_id_splits_payment_and_issues() {
        let mut f = setup();
        approve(&mut f, 500);

        let receipt = f.engine.purchase_by_id(f.buyer, 1).unwrap();

        assert_eq!((receipt.price, receipt.commission, receipt.net), (500, 50, 450));
        assert_eq!(f.engine.token().balance_of(f.treasury), 50);
        assert_eq!(f.engine.proceeds(), 450);
        assert_eq!(f.engine.owner_of(1).unwrap(), Some(f.buyer));
        assert_eq!(receipt.events.len(), 2);
        assert_eq!(receipt.events[0].sequence_number(), 1);
    }

    #[test]
    fn rejected_purchase_leaves_no_trace() {
        let mut f = setup();
        approve(&mut f, 499);
        let token_before = f.engine.token().clone();

        let err = f.engine.purchase_by_id(f.buyer, 1).unwrap_err();

        assert_eq!(err, DomainError::InsufficientAllowance { required: 500, approved: 499 });
        assert_eq!(f.engine.token(), &token_before);
        assert!(f.engine.is_available(1).unwrap());
    }

    #[test]
    fn engine_without_minter_role_cannot_sell() {
        let mut f = setup();
        let account = f.engine.account();
        let owner = f.owner;
        f.engine
            .collection_mut()
            .revoke_role(owner, Role::MINTER, account, Utc::now())
            .unwrap();
        approve(&mut f, 500);

        let err = f.engine.purchase_by_id(f.buyer, 1).unwrap_err();

        assert!(matches!(err, DomainError::Unauthorized(_)));
        assert_eq!(f.engine.token().balance_of(f.buyer), 1_000_000);
    }

    #[test]
    fn deposit_refunds_overpayment() {
        let mut f = setup();

        let receipt = f.engine.purchase_random_by_deposit(f.buyer, 250).unwrap();

        assert_eq!(receipt.id.get(), 1);
        assert_eq!(receipt.refund, 150);
        assert_eq!(receipt.commission, 0);
        assert_eq!(f.engine.native().balance_of(f.buyer), 10_000 - 100);
        assert_eq!(f.engine.native().balance_of(f.engine.account()), 100);
    }

    #[test]
    fn deposit_below_price_is_rejected() {
        let mut f = setup();
        let err = f.engine.purchase_random_by_deposit(f.buyer, 99).unwrap_err();
        assert_eq!(err, DomainError::InsufficientDeposit { required: 100, sent: 99 });
        assert_eq!(f.engine.remaining_count(), 30);
    }

    #[test]
    fn treasury_is_set_once() {
        let mut f = setup();
        let err = f.engine.set_treasury(f.owner, AccountId::new()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(f.engine.treasury(), Some(f.treasury));
    }

    #[test]
    fn mismatched_token_decimals_are_rejected() {
        let owner = AccountId::new();
        let collection = Collection::new(Default::default(), CollectionMetadata::default(), owner);
        let result = Engine::new(
            owner,
            AccountId::new(),
            collection,
            &SaleConfig::default(),
            Collaborators {
                token: InMemoryToken::new("MiPrimerToken", "MPRTKN", 6),
                native: InMemoryNative::new(),
                picker: SequencePicker::lowest(),
                bus: InMemoryEventBus::new(),
            },
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
