use anyhow::{Context, bail};

pub const USAGE: &str = "\
usage: mintsale <command> [args]

commands:
  price [id...]            price of each id (all ids when none given)
  buy <id>...              buy the given ids with payment tokens
  deposit [amount] [count] buy `count` random items, sending `amount` each
  pay [amount]             bare native payment (random item)
  remaining                number of items still for sale
  help                     show this text

amounts default to the configured deposit price.";

/// One CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Price { ids: Vec<u32> },
    Buy { ids: Vec<u32> },
    Deposit { amount: Option<u128>, count: usize },
    Pay { amount: Option<u128> },
    Remaining,
    Help,
}

impl Command {
    /// Parse arguments, excluding the program name.
    pub fn parse<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let Some(name) = args.next() else {
            return Ok(Command::Help);
        };
        let rest: Vec<String> = args.collect();

        match name.as_str() {
            "price" => Ok(Command::Price { ids: parse_ids(&rest)? }),
            "buy" => {
                let ids = parse_ids(&rest)?;
                if ids.is_empty() {
                    bail!("buy needs at least one id");
                }
                Ok(Command::Buy { ids })
            }
            "deposit" => {
                expect_at_most(&name, &rest, 2)?;
                let amount = rest.first().map(|raw| parse_amount(raw)).transpose()?;
                let count = match rest.get(1) {
                    Some(raw) => raw
                        .parse()
                        .with_context(|| format!("invalid count {raw:?}"))?,
                    None => 1,
                };
                Ok(Command::Deposit { amount, count })
            }
            "pay" => {
                expect_at_most(&name, &rest, 1)?;
                let amount = rest.first().map(|raw| parse_amount(raw)).transpose()?;
                Ok(Command::Pay { amount })
            }
            "remaining" => {
                expect_at_most(&name, &rest, 0)?;
                Ok(Command::Remaining)
            }
            "help" | "-h" | "--help" => Ok(Command::Help),
            other => bail!("unknown command {other:?}\n\n{USAGE}"),
        }
    }
}

fn expect_at_most(name: &str, rest: &[String], max: usize) -> anyhow::Result<()> {
    if rest.len() > max {
        bail!("{name} takes at most {max} argument(s), got {}", rest.len());
    }
    Ok(())
}

// Range checks belong to the sale; only the syntax is checked here.
fn parse_ids(raw: &[String]) -> anyhow::Result<Vec<u32>> {
    raw.iter()
        .map(|id| id.parse().with_context(|| format!("invalid id {id:?}")))
        .collect()
}

fn parse_amount(raw: &str) -> anyhow::Result<u128> {
    raw.replace('_', "")
        .parse()
        .with_context(|| format!("invalid amount {raw:?}"))
}
