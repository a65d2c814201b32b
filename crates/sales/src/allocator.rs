//! Random allocator: picks one available id for non-targeted purchases.
//!
//! Selection is an injected strategy so the engine stays deterministic under
//! test. [`ContextSeededPicker`] is the production strategy; it is
//! **not cryptographically secure**. Anyone who knows the buyer, the draw
//! counter and the timestamp can reproduce the draw.

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use mintsale_core::{AccountId, ItemId, SaleId};

/// Transaction context a draw is derived from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawContext {
    pub sale_id: SaleId,
    pub buyer: AccountId,
    /// Number of random draws that completed before this one.
    pub nonce: u64,
    pub at: DateTime<Utc>,
}

/// Strategy choosing one id from the remaining pool.
pub trait IdPicker {
    /// Return one element of `pool`, or `None` when `pool` is empty.
    fn pick(&mut self, ctx: &DrawContext, pool: &[ItemId]) -> Option<ItemId>;
}

impl<P> IdPicker for Box<P>
where
    P: IdPicker + ?Sized,
{
    fn pick(&mut self, ctx: &DrawContext, pool: &[ItemId]) -> Option<ItemId> {
        (**self).pick(ctx, pool)
    }
}

/// Uniform choice seeded from the draw context and a per-deployment salt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSeededPicker {
    salt: u64,
}

impl ContextSeededPicker {
    /// Picker with a salt from the thread-local generator.
    pub fn new() -> Self {
        Self::with_salt(rand::random())
    }

    /// Fully reproducible picker.
    pub fn with_salt(salt: u64) -> Self {
        Self { salt }
    }

    fn seed(&self, ctx: &DrawContext) -> [u8; 32] {
        let mut seed = [0u8; 32];
        seed[..16].copy_from_slice(ctx.buyer.as_uuid().as_bytes());
        seed[16..24].copy_from_slice(&(ctx.nonce ^ self.salt).to_le_bytes());
        seed[24..].copy_from_slice(&ctx.at.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        for (slot, byte) in seed.iter_mut().zip(ctx.sale_id.as_uuid().as_bytes()) {
            *slot ^= byte;
        }
        seed
    }
}

impl Default for ContextSeededPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl IdPicker for ContextSeededPicker {
    fn pick(&mut self, ctx: &DrawContext, pool: &[ItemId]) -> Option<ItemId> {
        let mut rng = ChaCha8Rng::from_seed(self.seed(ctx));
        pool.choose(&mut rng).copied()
    }
}

/// Deterministic picker: takes `pool[i % pool.len()]` for each `i` of a
/// fixed index sequence, cycling when the sequence runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePicker {
    indices: Vec<usize>,
    cursor: usize,
}

impl SequencePicker {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        let indices: Vec<usize> = indices.into_iter().collect();
        Self {
            indices: if indices.is_empty() { vec![0] } else { indices },
            cursor: 0,
        }
    }

    /// Always the lowest remaining id.
    pub fn lowest() -> Self {
        Self::new([0])
    }
}

impl IdPicker for SequencePicker {
    fn pick(&mut self, _ctx: &DrawContext, pool: &[ItemId]) -> Option<ItemId> {
        if pool.is_empty() {
            return None;
        }
        let index = self.indices[self.cursor % self.indices.len()];
        self.cursor += 1;
        Some(pool[index % pool.len()])
    }
}
