//! `mintsale-sales`: the sale engine and its random allocator.
//!
//! Two purchase paths sell items from a 30-item [`Collection`]:
//!
//! - [`SaleEngine::purchase_by_id`]: a chosen id, paid in payment tokens with
//!   a commission routed to the treasury;
//! - [`SaleEngine::purchase_random_by_deposit`] and
//!   [`SaleEngine::receive_native`]: a random id for a fixed native-currency
//!   price, with overpayment refunded.
//!
//! [`SharedSale`] puts the engine behind a lock for concurrent callers.
//!
//! [`Collection`]: mintsale_inventory::Collection

pub mod allocator;
pub mod config;
pub mod engine;
pub mod events;
pub mod projection;
pub mod shared;

pub use allocator::{ContextSeededPicker, DrawContext, IdPicker, SequencePicker};
pub use config::{ConfigError, SaleConfig};
pub use engine::{Collaborators, PurchaseReceipt, SaleEngine};
pub use events::{Currency, ItemDelivered, PaymentSettled, PurchasePath, SaleEvent};
pub use projection::OwnershipProjection;
pub use shared::SharedSale;
