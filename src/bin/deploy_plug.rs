//! Deployment entry point for the Plug contract.

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

    info!(
        "Plug contract deployed to address: {:?}",
        deployment.contract_address
    );
    Ok(())
}
