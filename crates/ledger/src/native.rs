use mintsale_core::AccountId;

use crate::{Balances, LedgerError};

/// Native-currency accounts as seen by the sale engine.
pub trait NativeCurrency {
    fn balance_of(&self, account: AccountId) -> u128;

    /// Move `amount` between accounts. Fails without side effects.
    fn transfer(&mut self, from: AccountId, to: AccountId, amount: u128) -> Result<(), LedgerError>;
}

/// In-memory native-currency accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryNative {
    balances: Balances,
}

impl InMemoryNative {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fund an account out of thin air (test faucet).
    pub fn fund(&mut self, account: AccountId, amount: u128) -> Result<(), LedgerError> {
        self.balances.credit(account, amount)
    }
}

impl NativeCurrency for InMemoryNative {
    fn balance_of(&self, account: AccountId) -> u128 {
        self.balances.get(account)
    }

    fn transfer(&mut self, from: AccountId, to: AccountId, amount: u128) -> Result<(), LedgerError> {
        self.balances.transfer(from, to, amount)
    }
}
