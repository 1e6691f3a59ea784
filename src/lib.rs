//! mintkit - deployment and minting toolkit for the Plug family of ERC-721
//! contracts
//!
//! Every entry point drives the same pipeline: look the target contract up in
//! the registry, fetch the sender's nonce at the latest confirmed state,
//! encode the call against the contract interface, sign the assembled
//! transaction locally, and broadcast the raw bytes to the configured node.
//! One invocation, one network write; the signing key never leaves the
//! process.

pub mod config;
pub mod error;
pub mod registry;
pub mod tx;

pub use error::{MintError, MintResult};

/// Initialize logging for an entry point.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mintkit=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
