use serde::{Deserialize, Serialize};

use mintsale_core::{DomainError, DomainResult, ItemId};

/// How a tier prices its ids, in whole tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum TierRule {
    /// Every id costs the same.
    Flat { whole: u128 },
    /// Price is the id multiplied by a factor.
    PerId { whole_per_id: u128 },
}

/// A contiguous id sub-range sharing one pricing rule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub first: u32,
    pub last: u32,
    pub rule: TierRule,
}

impl Tier {
    pub fn contains(&self, id: u32) -> bool {
        (self.first..=self.last).contains(&id)
    }

    fn whole_price(&self, id: u32) -> Option<u128> {
        match self.rule {
            TierRule::Flat { whole } => Some(whole),
            TierRule::PerId { whole_per_id } => whole_per_id.checked_mul(u128::from(id)),
        }
    }
}

/// Maps every item id to a price in the smallest token unit.
///
/// Tiers must partition `ItemId::MIN..=ItemId::MAX` with no gaps or
/// overlaps. Prices are computed once at construction, so lookups cannot
/// overflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    tiers: Vec<Tier>,
    decimals: u32,
    prices: Vec<u128>,
}

impl PricingPolicy {
    /// The three-tier schedule: 1..=10 flat 500, 11..=20 at id × 1000,
    /// 21..=30 flat 50000 (whole tokens).
    pub fn standard(decimals: u32) -> DomainResult<Self> {
        Self::new(
            vec![
                Tier {
                    first: 1,
                    last: 10,
                    rule: TierRule::Flat { whole: 500 },
                },
                Tier {
                    first: 11,
                    last: 20,
                    rule: TierRule::PerId { whole_per_id: 1_000 },
                },
                Tier {
                    first: 21,
                    last: 30,
                    rule: TierRule::Flat { whole: 50_000 },
                },
            ],
            decimals,
        )
    }

    pub fn new(tiers: Vec<Tier>, decimals: u32) -> DomainResult<Self> {
        let unit = 10u128
            .checked_pow(decimals)
            .ok_or_else(|| DomainError::validation(format!("token decimals too large: {decimals}")))?;

        let mut expected_first = ItemId::MIN;
        for tier in &tiers {
            if tier.first != expected_first || tier.last < tier.first || tier.last > ItemId::MAX {
                return Err(DomainError::validation(format!(
                    "tiers must be contiguous and ascending (expected a tier starting at {expected_first}, found {}..={})",
                    tier.first, tier.last
                )));
            }
            expected_first = tier.last + 1;
        }
        if expected_first != ItemId::MAX + 1 {
            return Err(DomainError::validation(format!(
                "tiers must cover {}..={}",
                ItemId::MIN,
                ItemId::MAX
            )));
        }

        let mut prices = Vec::with_capacity(ItemId::SUPPLY);
        for id in ItemId::all() {
            let tier = tiers
                .iter()
                .find(|t| t.contains(id.get()))
                .ok_or_else(|| DomainError::invariant(format!("no tier for id {id}")))?;
            let price = tier
                .whole_price(id.get())
                .and_then(|whole| whole.checked_mul(unit))
                .ok_or_else(|| DomainError::validation(format!("price of id {id} overflows")))?;
            if price == 0 {
                return Err(DomainError::validation(format!("price of id {id} must be positive")));
            }
            prices.push(price);
        }

        Ok(Self {
            tiers,
            decimals,
            prices,
        })
    }

    /// Price of `id` in the smallest token unit.
    pub fn price_of(&self, id: u32) -> DomainResult<u128> {
        Ok(self.price_of_item(ItemId::new(id)?))
    }

    pub fn price_of_item(&self, id: ItemId) -> u128 {
        self.prices[id.index()]
    }

    pub fn tier_of(&self, id: ItemId) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.contains(id.get()))
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }
}
