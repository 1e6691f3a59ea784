//! Contract deployment: the submission pipeline plus an
//! await-deployment-confirmation step
//!
//! A creation transaction has no target; the network assigns the new address
//! and reports it in the receipt, which is polled for after broadcast.

use crate::error::{MintError, MintResult};
use crate::registry::ContractEntry;
use crate::tx::submitter::Submitter;

use ethers::abi::Token;
use ethers::providers::{JsonRpcClient, Middleware};
use ethers::types::{Address, Bytes, H256};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Outcome of a confirmed deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub contract_address: Address,
    pub tx_hash: H256,
}

/// Drives a contract-creation transaction through the pipeline and waits for
/// the network to report the new address.
pub struct Deployer<'a, C: JsonRpcClient> {
    submitter: &'a Submitter<C>,
    poll_interval: Duration,
    max_polls: u32,
}

impl<'a, C: JsonRpcClient> Deployer<'a, C> {
    pub fn new(submitter: &'a Submitter<C>) -> Self {
        Self {
            submitter,
            poll_interval: Duration::from_secs(2),
            max_polls: 60,
        }
    }

    pub fn with_polling(mut self, poll_interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_polls = max_polls;
        self
    }

    /// Deploy a registered contract and wait for its address.
    pub async fn deploy(
        &self,
        entry: &ContractEntry,
        constructor_args: &[Token],
    ) -> MintResult<Deployment> {
        let bytecode = entry.bytecode.clone().ok_or_else(|| MintError::Artifact {
            path: entry.name.clone(),
            message: "artifact carries no creation bytecode".to_string(),
        })?;
        let data = encode_creation(entry, bytecode, constructor_args)?;

        let pending = self.submitter.assemble(None, data, entry.gas_limit).await?;
        let raw = self.submitter.sign(&pending)?;
        let submission = self.submitter.broadcast(raw, pending.nonce).await?;

        debug!(
            "creation transaction broadcast: {:?}; awaiting receipt",
            submission.tx_hash
        );

        let contract_address = self.await_confirmation(submission.tx_hash).await?;
        info!(
            "{} contract deployed to address: {:?}",
            entry.name, contract_address
        );

        Ok(Deployment {
            contract_address,
            tx_hash: submission.tx_hash,
        })
    }

    /// Poll for the creation receipt until the network reports the address.
    async fn await_confirmation(&self, tx_hash: H256) -> MintResult<Address> {
        for attempt in 0..self.max_polls {
            if let Some(receipt) = self
                .submitter
                .provider()
                .get_transaction_receipt(tx_hash)
                .await?
            {
                if receipt.status == Some(0.into()) {
                    return Err(MintError::Rejected {
                        message: format!("creation transaction {:?} reverted", tx_hash),
                    });
                }
                if let Some(address) = receipt.contract_address {
                    return Ok(address);
                }
            }

            debug!(
                "creation transaction {:?} not yet mined ({}/{})",
                tx_hash,
                attempt + 1,
                self.max_polls
            );
            sleep(self.poll_interval).await;
        }

        Err(MintError::Timeout {
            operation: format!("confirmation of creation transaction {:?}", tx_hash),
        })
    }
}

/// Creation call data: bytecode, with ABI-encoded constructor arguments
/// appended when the interface declares a constructor.
fn encode_creation(
    entry: &ContractEntry,
    bytecode: Bytes,
    args: &[Token],
) -> MintResult<Bytes> {
    match &entry.abi.constructor {
        Some(constructor) => constructor
            .encode_input(bytecode.to_vec(), args)
            .map(Bytes::from)
            .map_err(|e| {
                MintError::Encode(format!("bad constructor arguments for {}: {}", entry.name, e))
            }),
        None if args.is_empty() => Ok(bytecode),
        None => Err(MintError::Encode(format!(
            "{} has no constructor but arguments were supplied",
            entry.name
        ))),
    }
}
