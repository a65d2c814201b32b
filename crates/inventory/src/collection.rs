use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mintsale_auth::{AccessControl, Role, authorize};
use mintsale_core::{Aggregate, AggregateRoot, AccountId, CollectionId, DomainError, ItemId};
use mintsale_events::{Event, execute};

/// Issuance status of one item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum ItemStatus {
    Available,
    Issued { owner: AccountId },
}

impl ItemStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, ItemStatus::Available)
    }
}

/// Display metadata of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub name: String,
    pub symbol: String,
}

impl Default for CollectionMetadata {
    fn default() -> Self {
        Self {
            name: "Mi Primer NFT".to_string(),
            symbol: "MPRNFT".to_string(),
        }
    }
}

/// Aggregate root: Collection.
///
/// Holds exactly one status slot per id in `ItemId::MIN..=ItemId::MAX`, all
/// available at construction. A slot only ever moves from available to
/// issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    id: CollectionId,
    metadata: CollectionMetadata,
    items: Vec<ItemStatus>,
    remaining: usize,
    acl: AccessControl,
    version: u64,
}

impl Collection {
    /// A fresh collection; `admin` holds both the admin and minter roles.
    pub fn new(id: CollectionId, metadata: CollectionMetadata, admin: AccountId) -> Self {
        Self {
            id,
            metadata,
            items: vec![ItemStatus::Available; ItemId::SUPPLY],
            remaining: ItemId::SUPPLY,
            acl: AccessControl::with_admin(admin, [Role::MINTER]),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> CollectionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn status(&self, id: u32) -> Result<ItemStatus, DomainError> {
        let id = ItemId::new(id)?;
        Ok(self.items[id.index()])
    }

    pub fn is_available(&self, id: u32) -> Result<bool, DomainError> {
        Ok(self.status(id)?.is_available())
    }

    pub fn owner_of(&self, id: u32) -> Result<Option<AccountId>, DomainError> {
        Ok(match self.status(id)? {
            ItemStatus::Available => None,
            ItemStatus::Issued { owner } => Some(owner),
        })
    }

    /// Number of items still available.
    pub fn remaining_count(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Available ids, ascending.
    pub fn available_ids(&self) -> Vec<ItemId> {
        ItemId::all()
            .filter(|id| self.items[id.index()].is_available())
            .collect()
    }

    /// Number of items issued to `owner`.
    pub fn balance_of(&self, owner: AccountId) -> usize {
        self.items
            .iter()
            .filter(|status| matches!(status, ItemStatus::Issued { owner: o } if *o == owner))
            .count()
    }

    pub fn has_role(&self, account: AccountId, role: &Role) -> bool {
        self.acl.has_role(account, role)
    }

    /// Issue `id` to `recipient` in one step.
    pub fn issue(
        &mut self,
        caller: AccountId,
        id: u32,
        recipient: AccountId,
        occurred_at: DateTime<Utc>,
    ) -> Result<ItemIssued, DomainError> {
        let cmd = CollectionCommand::IssueItem(IssueItem {
            caller,
            id,
            recipient,
            occurred_at,
        });
        let events = execute(self, &cmd)?;
        match events.into_iter().next() {
            Some(CollectionEvent::ItemIssued(e)) => Ok(e),
            _ => Err(DomainError::invariant("issue produced no delivery event")),
        }
    }

    pub fn grant_role(
        &mut self,
        caller: AccountId,
        role: Role,
        account: AccountId,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let cmd = CollectionCommand::GrantRole(GrantRole {
            caller,
            role,
            account,
            occurred_at,
        });
        execute(self, &cmd).map(|_| ())
    }

    pub fn revoke_role(
        &mut self,
        caller: AccountId,
        role: Role,
        account: AccountId,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let cmd = CollectionCommand::RevokeRole(RevokeRole {
            caller,
            role,
            account,
            occurred_at,
        });
        execute(self, &cmd).map(|_| ())
    }
}

impl AggregateRoot for Collection {
    type Id = CollectionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: IssueItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueItem {
    pub caller: AccountId,
    /// Raw id as supplied by the caller; range-checked by the handler.
    pub id: u32,
    pub recipient: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: GrantRole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRole {
    pub caller: AccountId,
    pub role: Role,
    pub account: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RevokeRole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeRole {
    pub caller: AccountId,
    pub role: Role,
    pub account: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionCommand {
    IssueItem(IssueItem),
    GrantRole(GrantRole),
    RevokeRole(RevokeRole),
}

/// Event: ItemIssued (the delivery event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemIssued {
    pub collection_id: CollectionId,
    pub id: ItemId,
    pub recipient: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RoleGranted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGranted {
    pub collection_id: CollectionId,
    pub role: Role,
    pub account: AccountId,
    pub granted_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RoleRevoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRevoked {
    pub collection_id: CollectionId,
    pub role: Role,
    pub account: AccountId,
    pub revoked_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionEvent {
    ItemIssued(ItemIssued),
    RoleGranted(RoleGranted),
    RoleRevoked(RoleRevoked),
}

impl Event for CollectionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CollectionEvent::ItemIssued(_) => "inventory.item.issued",
            CollectionEvent::RoleGranted(_) => "inventory.role.granted",
            CollectionEvent::RoleRevoked(_) => "inventory.role.revoked",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CollectionEvent::ItemIssued(e) => e.occurred_at,
            CollectionEvent::RoleGranted(e) => e.occurred_at,
            CollectionEvent::RoleRevoked(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Collection {
    type Command = CollectionCommand;
    type Event = CollectionEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CollectionEvent::ItemIssued(e) => {
                let slot = &mut self.items[e.id.index()];
                if slot.is_available() {
                    self.remaining -= 1;
                }
                *slot = ItemStatus::Issued { owner: e.recipient };
            }
            CollectionEvent::RoleGranted(e) => {
                self.acl.grant(e.role.clone(), e.account);
            }
            CollectionEvent::RoleRevoked(e) => {
                self.acl.revoke(&e.role, e.account);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CollectionCommand::IssueItem(cmd) => self.handle_issue(cmd),
            CollectionCommand::GrantRole(cmd) => self.handle_grant(cmd),
            CollectionCommand::RevokeRole(cmd) => self.handle_revoke(cmd),
        }
    }
}

impl Collection {
    fn handle_issue(&self, cmd: &IssueItem) -> Result<Vec<CollectionEvent>, DomainError> {
        authorize(&self.acl, cmd.caller, &Role::MINTER)?;

        let id = ItemId::new(cmd.id)?;
        if !self.items[id.index()].is_available() {
            return Err(DomainError::AlreadyIssued { id: id.get() });
        }

        Ok(vec![CollectionEvent::ItemIssued(ItemIssued {
            collection_id: self.id,
            id,
            recipient: cmd.recipient,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_grant(&self, cmd: &GrantRole) -> Result<Vec<CollectionEvent>, DomainError> {
        authorize(&self.acl, cmd.caller, &Role::ADMIN)?;

        if self.acl.has_role(cmd.account, &cmd.role) {
            return Ok(vec![]);
        }

        Ok(vec![CollectionEvent::RoleGranted(RoleGranted {
            collection_id: self.id,
            role: cmd.role.clone(),
            account: cmd.account,
            granted_by: cmd.caller,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revoke(&self, cmd: &RevokeRole) -> Result<Vec<CollectionEvent>, DomainError> {
        authorize(&self.acl, cmd.caller, &Role::ADMIN)?;

        if !self.acl.has_role(cmd.account, &cmd.role) {
            return Ok(vec![]);
        }

        Ok(vec![CollectionEvent::RoleRevoked(RoleRevoked {
            collection_id: self.id,
            role: cmd.role.clone(),
            account: cmd.account,
            revoked_by: cmd.caller,
            occurred_at: cmd.occurred_at,
        })])
    }
}
