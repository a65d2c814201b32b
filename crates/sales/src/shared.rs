//! Thread-safe handle around one [`SaleEngine`].
//!
//! Every operation runs under a single lock, so the availability check, the
//! price, the transfers and the issuance of one purchase are never
//! interleaved with another purchase. The random path holds the same lock
//! over the whole pool.

use std::sync::{Mutex, MutexGuard};

use mintsale_core::{AccountId, DomainError, DomainResult};
use mintsale_events::{EventBus, EventEnvelope};
use mintsale_ledger::{NativeCurrency, PaymentToken};

use crate::allocator::IdPicker;
use crate::engine::{PurchaseReceipt, SaleEngine};
use crate::events::SaleEvent;

#[derive(Debug)]
pub struct SharedSale<T, N, P, B> {
    inner: Mutex<SaleEngine<T, N, P, B>>,
}

impl<T, N, P, B> SharedSale<T, N, P, B>
where
    T: PaymentToken,
    N: NativeCurrency,
    P: IdPicker,
    B: EventBus<EventEnvelope<SaleEvent>>,
{
    pub fn new(engine: SaleEngine<T, N, P, B>) -> Self {
        Self {
            inner: Mutex::new(engine),
        }
    }

    fn lock(&self) -> DomainResult<MutexGuard<'_, SaleEngine<T, N, P, B>>> {
        self.inner.lock().map_err(|_| {
            tracing::error!("sale engine lock poisoned");
            DomainError::invariant("sale engine lock poisoned")
        })
    }

    pub fn purchase_by_id(&self, buyer: AccountId, id: u32) -> DomainResult<PurchaseReceipt> {
        self.lock()?.purchase_by_id(buyer, id)
    }

    pub fn purchase_random_by_deposit(&self, buyer: AccountId, amount: u128) -> DomainResult<PurchaseReceipt> {
        self.lock()?.purchase_random_by_deposit(buyer, amount)
    }

    pub fn receive_native(&self, payer: AccountId, amount: u128) -> DomainResult<PurchaseReceipt> {
        self.lock()?.receive_native(payer, amount)
    }

    pub fn remaining_count(&self) -> DomainResult<usize> {
        Ok(self.lock()?.remaining_count())
    }

    /// Run a read-only closure against the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&SaleEngine<T, N, P, B>) -> R) -> DomainResult<R> {
        Ok(f(&*self.lock()?))
    }

    /// Run a closure with exclusive engine access (administration, funding).
    pub fn with_engine_mut<R>(&self, f: impl FnOnce(&mut SaleEngine<T, N, P, B>) -> R) -> DomainResult<R> {
        Ok(f(&mut *self.lock()?))
    }

    pub fn into_inner(self) -> DomainResult<SaleEngine<T, N, P, B>> {
        self.inner
            .into_inner()
            .map_err(|_| DomainError::invariant("sale engine lock poisoned"))
    }
}
