//! Mint entry point for the Plug contract: one `mint721` to the sender.

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

    let entry = registry.get("plug")?;
    let submission = submitter
        .submit(entry, "mint721", &[Token::Address(submitter.sender())])
        .await?;

    info!(
        "The hash of your transaction is: {:?}; check the mempool to view its status",
        submission.tx_hash
    );
    Ok(())
}
