use std::collections::BTreeMap;

use mintsale_core::{AccountId, ItemId};
use mintsale_events::{EventEnvelope, Projection};

use crate::events::SaleEvent;

/// Read model: who owns which item, built from delivery events.
///
/// Replaying envelopes at or below the current position is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipProjection {
    owners: BTreeMap<ItemId, AccountId>,
    position: u64,
}

impl OwnershipProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner_of(&self, id: ItemId) -> Option<AccountId> {
        self.owners.get(&id).copied()
    }

    /// Ids not yet delivered, ascending.
    pub fn remaining(&self) -> Vec<ItemId> {
        ItemId::all().filter(|id| !self.owners.contains_key(id)).collect()
    }

    pub fn owned_by(&self, account: AccountId) -> Vec<ItemId> {
        self.owners
            .iter()
            .filter(|(_, owner)| **owner == account)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn delivered_count(&self) -> usize {
        self.owners.len()
    }
}

impl Projection for OwnershipProjection {
    type Ev = SaleEvent;

    fn apply(&mut self, envelope: &EventEnvelope<SaleEvent>) {
        if envelope.sequence_number() <= self.position {
            return;
        }
        self.position = envelope.sequence_number();

        if let Some(delivered) = envelope.payload().as_delivery() {
            self.owners.insert(delivered.id, delivered.recipient);
        }
    }

    fn position(&self) -> u64 {
        self.position
    }
}
