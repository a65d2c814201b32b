use std::collections::HashMap;

use mintsale_core::AccountId;

use crate::LedgerError;

/// Per-account balances in the smallest unit.
///
/// Transfers are checked before anything is written, so a failed transfer
/// leaves both sides untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balances {
    accounts: HashMap<AccountId, u128>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, account: AccountId) -> u128 {
        self.accounts.get(&account).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, account: AccountId, amount: u128) -> Result<(), LedgerError> {
        let next = self
            .get(account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account })?;
        self.accounts.insert(account, next);
        Ok(())
    }

    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: u128) -> Result<(), LedgerError> {
        let available = self.get(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from,
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .get(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: to })?;

        self.accounts.insert(from, available - amount);
        self.accounts.insert(to, credited);
        Ok(())
    }

    pub fn total(&self) -> u128 {
        self.accounts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn failed_transfer_changes_nothing() {
        let (alice, bob) = (AccountId::new(), AccountId::new());
        let mut balances = Balances::new();
        balances.credit(alice, 10).unwrap();

        let err = balances.transfer(alice, bob, 11).unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientBalance { required: 11, available: 10, .. }));
        assert_eq!(balances.get(alice), 10);
        assert_eq!(balances.get(bob), 0);
    }

    #[test]
    fn overflowing_credit_is_rejected() {
        let alice = AccountId::new();
        let mut balances = Balances::new();
        balances.credit(alice, u128::MAX).unwrap();
        assert_eq!(balances.credit(alice, 1), Err(LedgerError::Overflow { account: alice }));
    }

    #[test]
    fn self_transfer_is_a_no_op() {
        let alice = AccountId::new();
        let mut balances = Balances::new();
        balances.credit(alice, 5).unwrap();
        balances.transfer(alice, alice, 5).unwrap();
        assert_eq!(balances.get(alice), 5);
    }

    proptest! {
        /// Property: transfers conserve the total supply whether they
        /// succeed or fail.
        #[test]
        fn transfers_conserve_total(
            seed in 0u128..1_000_000,
            moves in prop::collection::vec((0usize..3, 0usize..3, 0u128..500_000), 0..20)
        ) {
            let accounts = [AccountId::new(), AccountId::new(), AccountId::new()];
            let mut balances = Balances::new();
            balances.credit(accounts[0], seed).unwrap();

            for (from, to, amount) in moves {
                let _ = balances.transfer(accounts[from], accounts[to], amount);
                prop_assert_eq!(balances.total(), seed);
            }
        }
    }
}
