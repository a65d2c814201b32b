use std::collections::HashMap;

use mintsale_core::AccountId;

use crate::{Balances, LedgerError};

/// The slice of a fungible payment token the sale engine needs.
pub trait PaymentToken {
    fn decimals(&self) -> u32;

    fn balance_of(&self, owner: AccountId) -> u128;

    /// Amount `spender` may still move out of `owner`'s balance.
    fn allowance(&self, owner: AccountId, spender: AccountId) -> u128;

    /// Move `amount` out of the caller's own balance (`from` is the caller).
    /// Fails without side effects.
    fn transfer(&mut self, from: AccountId, to: AccountId, amount: u128) -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance. Fails without side effects when allowance or balance is
    /// short.
    fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), LedgerError>;
}

/// In-memory fungible token with balances and allowances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryToken {
    name: String,
    symbol: String,
    decimals: u32,
    balances: Balances,
    allowances: HashMap<(AccountId, AccountId), u128>,
}

impl InMemoryToken {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            balances: Balances::new(),
            allowances: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn total_supply(&self) -> u128 {
        self.balances.total()
    }

    pub fn mint(&mut self, to: AccountId, amount: u128) -> Result<(), LedgerError> {
        self.balances.credit(to, amount)
    }

    /// Set (not add to) the amount `spender` may move from `owner`.
    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: u128) {
        self.allowances.insert((owner, spender), amount);
    }
}

impl PaymentToken for InMemoryToken {
    fn decimals(&self) -> u32 {
        self.decimals
    }

    fn balance_of(&self, owner: AccountId) -> u128 {
        self.balances.get(owner)
    }

    fn allowance(&self, owner: AccountId, spender: AccountId) -> u128 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: AccountId, to: AccountId, amount: u128) -> Result<(), LedgerError> {
        self.balances.transfer(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: from,
                spender,
                required: amount,
                approved,
            });
        }
        self.balances.transfer(from, to, amount)?;
        self.allowances.insert((from, spender), approved - amount);
        Ok(())
    }
}
