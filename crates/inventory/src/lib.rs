//! Inventory guard (event-sourced).
//!
//! Owns the fixed set of collectibles and their issued/available status.
//! It is the only component allowed to move an item from available to
//! issued, and it only does so for callers holding [`mintsale_auth::Role::MINTER`].

pub mod collection;

pub use collection::{
    Collection, CollectionCommand, CollectionEvent, CollectionMetadata, GrantRole, IssueItem,
    ItemIssued, ItemStatus, RevokeRole, RoleGranted, RoleRevoked,
};
