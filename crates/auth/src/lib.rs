//! `mintsale-auth`: capability checks for privileged operations.
//!
//! Granting and revoking is an administrative flow owned by whichever
//! aggregate embeds an [`AccessControl`] table; this crate only answers
//! "does this account hold this role".

pub mod authorize;
pub mod roles;

pub use authorize::{AccessControl, AuthzError, authorize};
pub use roles::Role;
