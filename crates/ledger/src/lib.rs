//! Payment collaborators consumed by the sale engine.
//!
//! The engine only depends on the [`PaymentToken`] and [`NativeCurrency`]
//! traits. The in-memory implementations here stand in for the real
//! token contract and native-currency accounts in tests and the CLI.

pub mod balances;
pub mod error;
pub mod native;
pub mod token;

pub use balances::Balances;
pub use error::LedgerError;
pub use native::{InMemoryNative, NativeCurrency};
pub use token::{InMemoryToken, PaymentToken};
