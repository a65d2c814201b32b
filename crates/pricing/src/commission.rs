use serde::{Deserialize, Serialize};

use mintsale_core::{DomainError, DomainResult};

const BPS_DENOMINATOR: u32 = 10_000;

/// Commission share in basis points (1/100 of a percent).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CommissionRate(u32);

/// Division of one payment between treasury and engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub commission: u128,
    pub net: u128,
}

impl CommissionRate {
    pub const ZERO: CommissionRate = CommissionRate(0);
    pub const TEN_PERCENT: CommissionRate = CommissionRate(1_000);

    pub fn from_bps(bps: u32) -> DomainResult<Self> {
        if bps > BPS_DENOMINATOR {
            return Err(DomainError::validation(format!(
                "commission must be at most {BPS_DENOMINATOR} bps, got {bps}"
            )));
        }
        Ok(Self(bps))
    }

    pub fn bps(self) -> u32 {
        self.0
    }

    /// Treasury receives the floor of the share; the engine keeps the rest,
    /// so `commission + net == amount` always.
    pub fn split(self, amount: u128) -> Split {
        let denom = u128::from(BPS_DENOMINATOR);
        let bps = u128::from(self.0);
        // Splitting into quotient and remainder keeps the product in range.
        let commission = (amount / denom) * bps + (amount % denom) * bps / denom;
        Split {
            commission,
            net: amount - commission,
        }
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        Self::TEN_PERCENT
    }
}

impl TryFrom<u32> for CommissionRate {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_bps(value)
    }
}

impl From<CommissionRate> for u32 {
    fn from(value: CommissionRate) -> Self {
        value.0
    }
}
