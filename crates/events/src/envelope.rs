use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mintsale_core::SaleId;

/// Envelope for an event, containing stream metadata.
///
/// - `sale_id` names the stream (one per sale deployment).
/// - `sequence_number` is monotonically increasing per stream, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    sale_id: SaleId,

    /// Monotonically increasing position in the sale stream.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, sale_id: SaleId, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id,
            sale_id,
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn sale_id(&self) -> SaleId {
        self.sale_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
