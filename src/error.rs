//! Error types for the minting toolkit
//!
//! Every failure is surfaced once at the entry point's top level, printed
//! verbatim, and terminates the process with a non-zero status. Nothing is
//! retried.

use ethers::providers::{ProviderError, RpcError};
use thiserror::Error;

/// Main error type for the toolkit
#[derive(Error, Debug)]
pub enum MintError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Artifact error for {path}: {message}")]
    Artifact { path: String, message: String },

    #[error("Contract {name} not found in registry")]
    ContractNotFound { name: String },

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Node rejected submission: {message}")]
    Rejected { message: String },

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },
}

impl MintError {
    /// Whether the node turned the submission away over a nonce conflict.
    pub fn is_nonce_mismatch(&self) -> bool {
        matches!(self, MintError::Rejected { message } if message.contains("nonce"))
    }

    /// Whether the failure was reaching the node at all, as opposed to the
    /// node answering with a rejection.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            MintError::Connection { .. } | MintError::Timeout { .. }
        )
    }
}

/// An error *response* means the node heard us and said no; anything else is
/// a transport fault.
impl From<ProviderError> for MintError {
    fn from(err: ProviderError) -> Self {
        match err.as_error_response() {
            Some(rpc) => MintError::Rejected {
                message: rpc.message.clone(),
            },
            None => MintError::Connection {
                message: err.to_string(),
            },
        }
    }
}

/// Result type for toolkit operations
pub type MintResult<T> = Result<T, MintError>;
