//! `mintsale` command-line front end over an in-memory deployment.
//!
//! Every invocation deploys a fresh sale, so commands within one invocation
//! share state (`buy 1 1` fails the second time) but invocations do not.

pub mod command;
pub mod deploy;

use std::io::Write;

use serde::Serialize;

use mintsale_core::AccountId;
use mintsale_ledger::{NativeCurrency, PaymentToken};
use mintsale_sales::{Currency, PurchasePath, PurchaseReceipt};

pub use command::{Command, USAGE};
pub use deploy::{Demo, deploy};

#[derive(Debug, Serialize)]
struct PriceLine {
    id: u32,
    price: u128,
    available: bool,
}

#[derive(Debug, Serialize)]
struct ReceiptLine {
    id: u32,
    buyer: AccountId,
    path: PurchasePath,
    currency: Currency,
    price: u128,
    commission: u128,
    net: u128,
    refund: u128,
    remaining: usize,
}

#[derive(Debug, Serialize)]
struct FailureLine {
    requested: Option<u32>,
    error: String,
}

#[derive(Debug, Serialize)]
struct Summary {
    remaining: usize,
    buyer_tokens: u128,
    buyer_native: u128,
    treasury_tokens: u128,
    treasury_native: u128,
    sale_tokens: u128,
    sale_native: u128,
}

/// Run one command against `demo`, writing one JSON document per line.
///
/// Rejected purchases are reported as lines rather than errors so a batch
/// keeps going, the way separate transactions would.
pub fn run(command: &Command, demo: &mut Demo, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Help => writeln!(out, "{USAGE}")?,
        Command::Remaining => {
            writeln!(out, "{}", serde_json::to_string(&summary(demo))?)?;
        }
        Command::Price { ids } => {
            let ids: Vec<u32> = if ids.is_empty() {
                (1..=30).collect()
            } else {
                ids.clone()
            };
            for id in ids {
                let line = match (demo.sale.price_of(id), demo.sale.is_available(id)) {
                    (Ok(price), Ok(available)) => serde_json::to_string(&PriceLine { id, price, available })?,
                    (Err(err), _) | (_, Err(err)) => failure(Some(id), err)?,
                };
                writeln!(out, "{line}")?;
            }
        }
        Command::Buy { ids } => {
            for &id in ids {
                let result = demo.sale.purchase_by_id(demo.buyer, id);
                report(out, demo, Some(id), result)?;
            }
        }
        Command::Deposit { amount, count } => {
            let amount = amount.unwrap_or(demo.sale.deposit_price());
            for _ in 0..*count {
                let result = demo.sale.purchase_random_by_deposit(demo.buyer, amount);
                report(out, demo, None, result)?;
            }
        }
        Command::Pay { amount } => {
            let amount = amount.unwrap_or(demo.sale.deposit_price());
            let result = demo.sale.receive_native(demo.buyer, amount);
            report(out, demo, None, result)?;
        }
    }
    Ok(())
}

fn report(
    out: &mut impl Write,
    demo: &Demo,
    requested: Option<u32>,
    result: mintsale_core::DomainResult<PurchaseReceipt>,
) -> anyhow::Result<()> {
    let line = match result {
        Ok(receipt) => serde_json::to_string(&ReceiptLine {
            id: receipt.id.get(),
            buyer: receipt.buyer,
            path: receipt.path,
            currency: receipt.currency,
            price: receipt.price,
            commission: receipt.commission,
            net: receipt.net,
            refund: receipt.refund,
            remaining: demo.sale.remaining_count(),
        })?,
        Err(err) => {
            tracing::warn!("purchase rejected: {}", err);
            failure(requested, err)?
        }
    };
    writeln!(out, "{line}")?;
    Ok(())
}

fn failure(requested: Option<u32>, err: mintsale_core::DomainError) -> anyhow::Result<String> {
    Ok(serde_json::to_string(&FailureLine {
        requested,
        error: err.to_string(),
    })?)
}

fn summary(demo: &Demo) -> Summary {
    let sale = &demo.sale;
    Summary {
        remaining: sale.remaining_count(),
        buyer_tokens: sale.token().balance_of(demo.buyer),
        buyer_native: sale.native().balance_of(demo.buyer),
        treasury_tokens: sale.token().balance_of(demo.treasury),
        treasury_native: sale.native().balance_of(demo.treasury),
        sale_tokens: sale.proceeds(),
        sale_native: sale.native().balance_of(sale.account()),
    }
}
