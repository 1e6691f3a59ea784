//! The offline-signed submission pipeline
//!
//! One submission is a strictly ordered chain: fetch the sender's nonce at
//! the latest confirmed state, encode the call, assemble the pending record,
//! sign it locally, broadcast the raw bytes. The signing key never leaves the
//! process and the broadcast is the pipeline's single network write.

use crate::config::{NetworkConfig, Settings};
use crate::error::{MintError, MintResult};
use crate::registry::ContractEntry;
use crate::tx::call::{encode_call, PendingCall};

use ethers::abi::Token;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockNumber, Bytes, TransactionRequest, H256, U256};
use tracing::{debug, info};

/// Acknowledgment from the node's transaction pool. Says nothing about
/// on-chain inclusion; confirmation is a separate concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub tx_hash: H256,
    pub nonce: U256,
}

/// Performs one contract-call submission end-to-end and reports the outcome.
///
/// Generic over the transport so tests can drive the pipeline against a
/// stubbed node.
pub struct Submitter<C: JsonRpcClient> {
    provider: Provider<C>,
    wallet: LocalWallet,
    chain_id: u64,
    max_gas_price: U256,
}

impl Submitter<Http> {
    /// Build a submitter against the configured endpoint, loading the signing
    /// key from the environment variable named in the wallet section.
    pub fn from_settings(settings: &Settings) -> MintResult<Self> {
        let provider = Provider::<Http>::try_from(settings.network.rpc_url.as_str())
            .map_err(|e| MintError::Config(format!("invalid rpc url: {}", e)))?;
        let wallet = load_signing_key(&settings.wallet.private_key_env)?;

        info!(
            "submitter initialized for {} with sender {:?}",
            settings.network.name,
            wallet.address()
        );

        Ok(Self::new(provider, wallet, &settings.network))
    }
}

impl<C: JsonRpcClient> Submitter<C> {
    pub fn new(provider: Provider<C>, wallet: LocalWallet, network: &NetworkConfig) -> Self {
        Self {
            provider,
            wallet: wallet.with_chain_id(network.chain_id),
            chain_id: network.chain_id,
            max_gas_price: U256::from(network.max_gas_price_gwei) * U256::from(1_000_000_000u64),
        }
    }

    /// Address whose nonce and balance fund the submissions. Derived from the
    /// signing key, so the two cannot disagree.
    pub fn sender(&self) -> Address {
        self.wallet.address()
    }

    pub fn provider(&self) -> &Provider<C> {
        &self.provider
    }

    /// Submit one contract call and report the pool's acknowledgment.
    ///
    /// Nothing serializes concurrent submissions for the same sender: two
    /// callers that both fetch a nonce before either broadcasts observe the
    /// same value, and the loser is rejected by the node.
    pub async fn submit(
        &self,
        entry: &ContractEntry,
        method: &str,
        args: &[Token],
    ) -> MintResult<Submission> {
        let to = entry.deployed_address()?;
        let function = entry.function(method)?;
        let data = encode_call(function, args)?;

        let pending = self.assemble(Some(to), data, entry.gas_limit).await?;
        let raw = self.sign(&pending)?;
        let submission = self.broadcast(raw, pending.nonce).await?;

        info!(
            "transaction submitted: {} {} -> {:?}",
            entry.name, method, submission.tx_hash
        );
        Ok(submission)
    }

    /// Assemble the immutable pending record: the sender's nonce at the
    /// latest confirmed state, then the current (capped) gas price.
    pub async fn assemble(
        &self,
        to: Option<Address>,
        data: Bytes,
        gas_limit: U256,
    ) -> MintResult<PendingCall> {
        let nonce = self.fetch_nonce().await?;
        let gas_price = self.fetch_gas_price().await?;

        debug!("assembled pending call (nonce {}, gas price {})", nonce, gas_price);

        Ok(PendingCall {
            from: self.sender(),
            to,
            nonce,
            gas_limit,
            gas_price,
            data,
        })
    }

    /// Sign the pending record locally. Pure: depends only on the record and
    /// the key, never on network state.
    pub fn sign(&self, pending: &PendingCall) -> MintResult<Bytes> {
        let tx = pending.to_typed(self.chain_id);
        let signature = self
            .wallet
            .sign_transaction_sync(&tx)
            .map_err(|e| MintError::Signing(e.to_string()))?;
        let raw = tx.rlp_signed(&signature);

        debug!("signed transaction: 0x{}", hex::encode(&raw));
        Ok(raw)
    }

    /// Broadcast the signed bytes: the one network write of the pipeline.
    pub async fn broadcast(&self, raw: Bytes, nonce: U256) -> MintResult<Submission> {
        let tx_hash = *self.provider.send_raw_transaction(raw).await?;
        Ok(Submission { tx_hash, nonce })
    }

    /// Read-only contract call (`eth_call`): no nonce, no signature, no state
    /// change.
    pub async fn call(
        &self,
        entry: &ContractEntry,
        method: &str,
        args: &[Token],
    ) -> MintResult<Vec<Token>> {
        let to = entry.deployed_address()?;
        let function = entry.function(method)?;
        let data = encode_call(function, args)?;

        let tx = TypedTransaction::Legacy(
            TransactionRequest::new()
                .from(self.sender())
                .to(to)
                .data(data),
        );
        let output = self.provider.call(&tx, None).await?;

        function.decode_output(&output).map_err(|e| {
            MintError::Encode(format!("could not decode {} output: {}", method, e))
        })
    }

    async fn fetch_nonce(&self) -> MintResult<U256> {
        let nonce = self
            .provider
            .get_transaction_count(self.sender(), Some(BlockNumber::Latest.into()))
            .await?;
        debug!("fetched sender nonce: {}", nonce);
        Ok(nonce)
    }

    async fn fetch_gas_price(&self) -> MintResult<U256> {
        let price = self.provider.get_gas_price().await?;
        Ok(price.min(self.max_gas_price))
    }
}

/// Load the signing key from the named environment variable. The key is held
/// in process memory only and never persisted or sent anywhere.
pub fn load_signing_key(env_var: &str) -> MintResult<LocalWallet> {
    let hex_key = std::env::var(env_var)
        .map_err(|_| MintError::Wallet(format!("signing key env var {} is not set", env_var)))?;
    parse_signing_key(&hex_key)
}

/// Parse a hex-encoded private key. Malformed keys fail here, before any
/// network traffic happens.
pub fn parse_signing_key(hex_key: &str) -> MintResult<LocalWallet> {
    hex_key
        .trim_start_matches("0x")
        .parse::<LocalWallet>()
        .map_err(|e| MintError::Wallet(format!("invalid signing key: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::Abi;
    use ethers::providers::{JsonRpcError, MockProvider, MockResponse};
    use regex::Regex;

    // Well-known throwaway key; controls nothing.
    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    const GWEI: u64 = 1_000_000_000;

    fn test_network() -> NetworkConfig {
        NetworkConfig {
            name: "testnet".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 4,
            default_gas_limit: 500_000,
            max_gas_price_gwei: 200,
        }
    }

    fn mocked_submitter() -> (Submitter<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        let wallet = parse_signing_key(TEST_KEY).unwrap();
        (Submitter::new(provider, wallet, &test_network()), mock)
    }

    fn plug_entry() -> ContractEntry {
        let abi: Abi = serde_json::from_str(
            r#"[
                {
                    "type": "function",
                    "name": "mint721",
                    "inputs": [{ "name": "recipient", "type": "address" }],
                    "outputs": [{ "name": "", "type": "uint256" }],
                    "stateMutability": "nonpayable"
                },
                {
                    "type": "function",
                    "name": "hourNow",
                    "inputs": [],
                    "outputs": [{ "name": "", "type": "uint8" }],
                    "stateMutability": "view"
                }
            ]"#,
        )
        .unwrap();

        ContractEntry {
            name: "plug".to_string(),
            address: Some(Address::repeat_byte(0xAB)),
            abi,
            bytecode: None,
            gas_limit: U256::from(500_000u64),
        }
    }

    fn mint_args(submitter: &Submitter<MockProvider>) -> Vec<Token> {
        vec![Token::Address(submitter.sender())]
    }

    #[tokio::test]
    async fn submit_returns_the_pool_assigned_hash() {
        let (submitter, mock) = mocked_submitter();
        let expected = H256::from_low_u64_be(0xdead_beef);

        // Responses pop in reverse push order: nonce, gas price, broadcast.
        mock.push(expected).unwrap();
        mock.push(U256::from(GWEI)).unwrap();
        mock.push(U256::from(7u64)).unwrap();

        let submission = submitter
            .submit(&plug_entry(), "mint721", &mint_args(&submitter))
            .await
            .unwrap();

        assert_eq!(submission.tx_hash, expected);
        assert_eq!(submission.nonce, U256::from(7u64));

        // Well-formed hash: 0x followed by 64 lowercase hex digits.
        let rendered = format!("{:?}", submission.tx_hash);
        assert!(Regex::new(r"^0x[0-9a-f]{64}$").unwrap().is_match(&rendered));
    }

    #[tokio::test]
    async fn stale_nonce_is_surfaced_as_a_rejection() {
        let (submitter, mock) = mocked_submitter();

        mock.push_response(MockResponse::Error(JsonRpcError {
            code: -32000,
            message: "nonce too low".to_string(),
            data: None,
        }));
        mock.push(U256::from(GWEI)).unwrap();
        mock.push(U256::from(6u64)).unwrap();

        let err = submitter
            .submit(&plug_entry(), "mint721", &mint_args(&submitter))
            .await
            .unwrap_err();

        assert!(err.is_nonce_mismatch(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn sequential_submissions_use_strictly_increasing_nonces() {
        let (submitter, mock) = mocked_submitter();
        let entry = plug_entry();
        let args = mint_args(&submitter);

        // Second run: the chain has advanced past the first submission.
        mock.push(H256::from_low_u64_be(2)).unwrap();
        mock.push(U256::from(GWEI)).unwrap();
        mock.push(U256::from(6u64)).unwrap();
        // First run.
        mock.push(H256::from_low_u64_be(1)).unwrap();
        mock.push(U256::from(GWEI)).unwrap();
        mock.push(U256::from(5u64)).unwrap();

        let first = submitter.submit(&entry, "mint721", &args).await.unwrap();
        let second = submitter.submit(&entry, "mint721", &args).await.unwrap();

        assert!(second.nonce > first.nonce);
        assert_eq!(second.nonce, first.nonce + 1);
    }

    #[tokio::test]
    async fn interleaved_submissions_reuse_the_nonce() {
        let (submitter, mock) = mocked_submitter();
        let data = Bytes::from_static(b"\x12\x34\x56\x78");
        let to = Some(Address::repeat_byte(0xAB));

        // Both callers fetch before either broadcasts; the node hands out the
        // same account state twice. Nothing in the submitter prevents this.
        mock.push(U256::from(GWEI)).unwrap();
        mock.push(U256::from(5u64)).unwrap();
        mock.push(U256::from(GWEI)).unwrap();
        mock.push(U256::from(5u64)).unwrap();

        let first = submitter
            .assemble(to, data.clone(), U256::from(500_000u64))
            .await
            .unwrap();
        let second = submitter
            .assemble(to, data, U256::from(500_000u64))
            .await
            .unwrap();

        // Collision: whichever of the two broadcasts second will be rejected.
        assert_eq!(first.nonce, second.nonce);
    }

    #[tokio::test]
    async fn malformed_keys_fail_before_any_network_call() {
        let (_provider, mock) = Provider::mocked();

        let err = parse_signing_key("0xdeadbeef").unwrap_err();
        assert!(matches!(err, MintError::Wallet(_)));

        let err = parse_signing_key("not hex at all").unwrap_err();
        assert!(matches!(err, MintError::Wallet(_)));

        // The stub never saw a request.
        assert!(mock.assert_request("eth_getTransactionCount", ()).is_err());
    }

    #[test]
    fn missing_key_env_var_is_a_wallet_error() {
        let err = load_signing_key("MINTKIT_DEFINITELY_UNSET_KEY").unwrap_err();
        assert!(matches!(err, MintError::Wallet(_)));
    }

    #[test]
    fn signing_is_deterministic_and_recoverable() {
        let (provider, _mock) = Provider::mocked();
        let submitter = Submitter::new(provider, parse_signing_key(TEST_KEY).unwrap(), &test_network());

        let pending = PendingCall {
            from: submitter.sender(),
            to: Some(Address::repeat_byte(0x11)),
            nonce: U256::from(1u64),
            gas_limit: U256::from(500_000u64),
            gas_price: U256::from(GWEI),
            data: Bytes::from_static(b"\x12\x34\x56\x78"),
        };

        let first = submitter.sign(&pending).unwrap();
        let second = submitter.sign(&pending).unwrap();
        assert_eq!(first, second);

        // The signature verifies against the sender's address.
        let wallet = parse_signing_key(TEST_KEY).unwrap().with_chain_id(4u64);
        let tx = pending.to_typed(4);
        let signature = wallet.sign_transaction_sync(&tx).unwrap();
        assert_eq!(signature.recover(tx.sighash()).unwrap(), wallet.address());
    }

    #[tokio::test]
    async fn gas_price_is_capped_at_the_configured_maximum() {
        let (submitter, mock) = mocked_submitter();
        let data = Bytes::from_static(b"\x12\x34\x56\x78");

        // Node quotes 900 gwei against a 200 gwei cap.
        mock.push(U256::from(900 * GWEI)).unwrap();
        mock.push(U256::from(0u64)).unwrap();

        let pending = submitter
            .assemble(Some(Address::repeat_byte(0xAB)), data, U256::from(500_000u64))
            .await
            .unwrap();

        assert_eq!(pending.gas_price, U256::from(200 * GWEI));
    }

    #[tokio::test]
    async fn read_only_calls_decode_interface_outputs() {
        let (submitter, mock) = mocked_submitter();

        // hourNow() -> uint8: one word, value 13.
        let mut word = [0u8; 32];
        word[31] = 13;
        mock.push::<Bytes, _>(Bytes::from(word.to_vec())).unwrap();

        let output = submitter.call(&plug_entry(), "hourNow", &[]).await.unwrap();
        assert_eq!(output, vec![Token::Uint(U256::from(13u64))]);
    }

    #[tokio::test]
    async fn unreachable_node_is_a_connectivity_error() {
        let (submitter, _mock) = mocked_submitter();

        // Empty response queue: the stub fails the transport, not the call.
        let err = submitter
            .submit(&plug_entry(), "mint721", &mint_args(&submitter))
            .await
            .unwrap_err();

        assert!(err.is_connectivity(), "unexpected error: {err}");
    }
}
