use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use mintsale_core::{AccountId, DomainError};

use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("account {account} is missing role '{role}'")]
    MissingRole { account: AccountId, role: Role },
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::unauthorized(value.to_string())
    }
}

/// Role grants per account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessControl {
    grants: HashMap<AccountId, BTreeSet<Role>>,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table where `admin` holds every role in `roles` plus [`Role::ADMIN`].
    pub fn with_admin(admin: AccountId, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut acl = Self::new();
        acl.grant(Role::ADMIN, admin);
        for role in roles {
            acl.grant(role, admin);
        }
        acl
    }

    pub fn has_role(&self, account: AccountId, role: &Role) -> bool {
        self.grants
            .get(&account)
            .is_some_and(|roles| roles.contains(role))
    }

    /// Returns `true` when the grant was new.
    pub fn grant(&mut self, role: Role, account: AccountId) -> bool {
        self.grants.entry(account).or_default().insert(role)
    }

    /// Returns `true` when the account held the role.
    pub fn revoke(&mut self, role: &Role, account: AccountId) -> bool {
        let Some(roles) = self.grants.get_mut(&account) else {
            return false;
        };
        let removed = roles.remove(role);
        if roles.is_empty() {
            self.grants.remove(&account);
        }
        removed
    }

    pub fn roles_of(&self, account: AccountId) -> Vec<Role> {
        self.grants
            .get(&account)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Require `account` to hold `required`.
///
/// - No IO
/// - No panics
pub fn authorize(acl: &AccessControl, account: AccountId, required: &Role) -> Result<(), AuthzError> {
    if acl.has_role(account, required) {
        Ok(())
    } else {
        Err(AuthzError::MissingRole {
            account,
            role: required.clone(),
        })
    }
}
