//! Call encoding and the pending transaction record

use crate::error::{MintError, MintResult};

use ethers::abi::{Function, Token};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U256};

/// Encode a method call against the contract interface into opaque call data.
pub fn encode_call(function: &Function, args: &[Token]) -> MintResult<Bytes> {
    function
        .encode_input(args)
        .map(Bytes::from)
        .map_err(|e| {
            MintError::Encode(format!("bad arguments for {}: {}", function.name, e))
        })
}

/// The assembled transaction record. Constructed fresh per invocation,
/// immutable once built, signed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub from: Address,
    /// Target contract, or `None` for a contract creation.
    pub to: Option<Address>,
    /// The sender's transaction count at the latest confirmed state. Stale by
    /// the time of broadcast if anything else spends from the account.
    pub nonce: U256,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub data: Bytes,
}

impl PendingCall {
    /// Lower into the wire form used for signing: a legacy transaction with
    /// the EIP-155 chain id set.
    pub fn to_typed(&self, chain_id: u64) -> TypedTransaction {
        let mut request = TransactionRequest::new()
            .from(self.from)
            .data(self.data.clone())
            .nonce(self.nonce)
            .gas(self.gas_limit)
            .gas_price(self.gas_price)
            .chain_id(chain_id);

        if let Some(to) = self.to {
            request = request.to(to);
        }

        TypedTransaction::Legacy(request)
    }
}
