use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for capability checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// May grant and revoke roles, and change one-shot settings.
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));

    /// May issue items from a collection.
    pub const MINTER: Role = Role(Cow::Borrowed("minter"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
