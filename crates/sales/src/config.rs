//! Sale configuration.
//!
//! Values come from `MINTSALE_*` environment variables; anything unset
//! falls back to [`SaleConfig::default`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mintsale_core::DomainError;
use mintsale_pricing::CommissionRate;

/// 0.01 native units at 18 decimals.
pub const DEFAULT_DEPOSIT_PRICE: u128 = 10_000_000_000_000_000;

pub const ENV_TOKEN_DECIMALS: &str = "MINTSALE_TOKEN_DECIMALS";
pub const ENV_COMMISSION_BPS: &str = "MINTSALE_COMMISSION_BPS";
pub const ENV_DEPOSIT_PRICE: &str = "MINTSALE_DEPOSIT_PRICE";
pub const ENV_NATIVE_COMMISSION_BPS: &str = "MINTSALE_NATIVE_COMMISSION_BPS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is not valid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleConfig {
    /// Decimals of the payment token; tier prices are scaled by 10^decimals.
    pub token_decimals: u32,
    /// Treasury share of token-denominated sales.
    pub commission_bps: u32,
    /// Fixed price of a random item on the native-currency path.
    pub deposit_price: u128,
    /// Treasury share of native-currency sales; `None` sends nothing.
    pub native_commission_bps: Option<u32>,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            token_decimals: 18,
            commission_bps: CommissionRate::TEN_PERCENT.bps(),
            deposit_price: DEFAULT_DEPOSIT_PRICE,
            native_commission_bps: None,
        }
    }
}

impl SaleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            token_decimals: parse_or(&lookup, ENV_TOKEN_DECIMALS, defaults.token_decimals)?,
            commission_bps: parse_or(&lookup, ENV_COMMISSION_BPS, defaults.commission_bps)?,
            deposit_price: parse_or(&lookup, ENV_DEPOSIT_PRICE, defaults.deposit_price)?,
            native_commission_bps: match lookup(ENV_NATIVE_COMMISSION_BPS) {
                Some(raw) => Some(parse(ENV_NATIVE_COMMISSION_BPS, &raw)?),
                None => defaults.native_commission_bps,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.commission()?;
        self.native_commission()?;
        if self.deposit_price == 0 {
            return Err(DomainError::validation("deposit price must be positive").into());
        }
        Ok(())
    }

    pub fn commission(&self) -> Result<CommissionRate, DomainError> {
        CommissionRate::from_bps(self.commission_bps)
    }

    pub fn native_commission(&self) -> Result<Option<CommissionRate>, DomainError> {
        self.native_commission_bps
            .map(CommissionRate::from_bps)
            .transpose()
    }
}

fn parse_or<F, V>(lookup: &F, key: &'static str, default: V) -> Result<V, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    V: core::str::FromStr,
    V::Err: core::fmt::Display,
{
    match lookup(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

fn parse<V>(key: &'static str, raw: &str) -> Result<V, ConfigError>
where
    V: core::str::FromStr,
    V::Err: core::fmt::Display,
{
    raw.trim().parse().map_err(|e: V::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
