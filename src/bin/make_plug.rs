//! Deploy a fresh Plug contract and mint against it in one run.

use ethers::abi::Token;
use mintkit::config::Settings;
use mintkit::registry::ContractRegistry;
use mintkit::tx::{Deployer, Submitter};
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
    let deployment = Deployer::new(&submitter).deploy(entry, &[]).await?;

    // Mint against the address the network just assigned, not the registry's.
    let fresh = entry.at(deployment.contract_address);
    let submission = submitter
        .submit(&fresh, "mintPlug", &[Token::Address(submitter.sender())])
        .await?;

    info!(
        "Plug deployed to {:?} and minted in {:?}",
        deployment.contract_address, submission.tx_hash
    );
    Ok(())
}
