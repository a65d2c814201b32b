//! Process-wide tracing setup shared by the binaries.

/// Subscriber construction (filters, output format).
pub mod subscriber;

pub use subscriber::{LogFormat, init, init_with};
