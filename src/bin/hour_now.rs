//! Read the hour-cycling contract's current hour. Read-only: no transaction
//! is signed or broadcast.

use ethers::abi::Token;
use mintkit::config::Settings;
use mintkit::registry::ContractRegistry;
use mintkit::tx::Submitter;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    mintkit::init_logging();

    if let Err(e) = run().await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let registry = ContractRegistry::from_settings(&settings)?;
    let submitter = Submitter::from_settings(&settings)?;

    let entry = registry.get("blm")?;
    let output = submitter.call(entry, "hourNow", &[]).await?;

    match output.first() {
        Some(Token::Uint(hour)) => info!("current cycling hour: {hour}"),
        other => anyhow::bail!("unexpected hourNow output: {other:?}"),
    }
    Ok(())
}
