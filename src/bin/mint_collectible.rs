//! Mint entry point for the collectible contract: one `mintCollectible721`
//! to the sender with the fixed metadata URI.

use ethers::abi::Token;
use mintkit::config::Settings;
use mintkit::registry::ContractRegistry;
use mintkit::tx::Submitter;
use tracing::{error, info};

const COLLECTIBLE_TOKEN_URI: &str =
    "https://logik-genesis-api.herokuapp.com/api/other/collectible.json";

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

    let entry = registry.get("collectible")?;
    let submission = submitter
        .submit(
            entry,
            "mintCollectible721",
            &[
                Token::Address(submitter.sender()),
                Token::String(COLLECTIBLE_TOKEN_URI.to_string()),
            ],
        )
        .await?;

    info!(
        "The hash of your transaction is: {:?}; check the mempool to view its status",
        submission.tx_hash
    );
    Ok(())
}
