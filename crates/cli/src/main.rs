use mintsale_cli::{Command, deploy, run};
use mintsale_sales::SaleConfig;

fn main() -> anyhow::Result<()> {
    mintsale_observability::init();

    let command = Command::parse(std::env::args().skip(1))?;
    let config = SaleConfig::from_env()?;
    let mut demo = deploy(&config)?;

    let stdout = std::io::stdout();
    run(&command, &mut demo, &mut stdout.lock())
}
