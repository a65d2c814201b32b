use crate::{Event, EventEnvelope};

/// A projection builds a read model from an append-only event stream.
///
/// Read models are disposable: they can be dropped and rebuilt by replaying
/// the stream. `apply` must be idempotent, because the bus delivers
/// at-least-once and replays overlap with live delivery. Envelopes whose
/// sequence number was already applied are skipped.
pub trait Projection {
    type Ev: Event;

    /// Apply a single event to the projection, updating the read model.
    ///
    /// Events irrelevant to this projection are ignored.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);

    /// Highest sequence number applied so far (0 when empty).
    fn position(&self) -> u64;
}
