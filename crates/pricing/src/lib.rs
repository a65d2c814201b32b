//! Pricing policy: item id → payment-token price, and the commission split.
//!
//! Pure functions only. Amounts are integers in the smallest unit of the
//! payment token.

pub mod commission;
pub mod tier;

pub use commission::{CommissionRate, Split};
pub use tier::{PricingPolicy, Tier, TierRule};
