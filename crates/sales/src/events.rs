use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mintsale_core::{AccountId, ItemId, SaleId};
use mintsale_events::Event;

/// How a purchase entered the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchasePath {
    /// Targeted purchase paid in payment tokens.
    ById,
    /// Random purchase through the explicit deposit entry point.
    Deposit,
    /// Random purchase triggered by a bare native-currency payment.
    BarePayment,
}

/// Currency a sale was settled in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Token,
    Native,
}

/// Event: ItemDelivered (exactly one per issuance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDelivered {
    pub sale_id: SaleId,
    pub id: ItemId,
    pub recipient: AccountId,
    pub path: PurchasePath,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentSettled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSettled {
    pub sale_id: SaleId,
    pub id: ItemId,
    pub payer: AccountId,
    pub currency: Currency,
    pub price: u128,
    pub commission: u128,
    pub net: u128,
    pub refund: u128,
    /// `None` when no commission was routed anywhere.
    pub treasury: Option<AccountId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SaleEvent {
    ItemDelivered(ItemDelivered),
    PaymentSettled(PaymentSettled),
}

impl SaleEvent {
    /// The delivery payload, if this is a delivery event.
    pub fn as_delivery(&self) -> Option<&ItemDelivered> {
        match self {
            SaleEvent::ItemDelivered(e) => Some(e),
            SaleEvent::PaymentSettled(_) => None,
        }
    }
}

impl Event for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::ItemDelivered(_) => "sale.item.delivered",
            SaleEvent::PaymentSettled(_) => "sale.payment.settled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::ItemDelivered(e) => e.occurred_at,
            SaleEvent::PaymentSettled(e) => e.occurred_at,
        }
    }
}
