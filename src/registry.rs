//! Deployment registry: one lookup table keyed by contract name
//!
//! Each entry carries the deployed address, the parsed interface description,
//! and (when the artifact provides it) the creation bytecode. The ABI is an
//! externally supplied schema used only for encoding calls and decoding
//! results.

use crate::config::Settings;
use crate::error::{MintError, MintResult};

use ethers::abi::{Abi, Function};
use ethers::types::{Address, Bytes, U256};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One registered contract.
#[derive(Debug, Clone)]
pub struct ContractEntry {
    pub name: String,
    /// Deployed address, if the contract is already on chain.
    pub address: Option<Address>,
    pub abi: Abi,
    /// Creation bytecode, present when the artifact carries it.
    pub bytecode: Option<Bytes>,
    pub gas_limit: U256,
}

impl ContractEntry {
    /// Deployed address, or an error for entries that are deploy-only.
    pub fn deployed_address(&self) -> MintResult<Address> {
        self.address.ok_or_else(|| {
            MintError::Config(format!(
                "contract {} has no deployed address configured",
                self.name
            ))
        })
    }

    /// Resolve a method against the contract interface.
    pub fn function(&self, method: &str) -> MintResult<&Function> {
        self.abi.function(method).map_err(|e| {
            MintError::Encode(format!(
                "method {} not present in {} interface: {}",
                method, self.name, e
            ))
        })
    }

    /// The same entry pinned to a freshly deployed address.
    pub fn at(&self, address: Address) -> ContractEntry {
        ContractEntry {
            address: Some(address),
            ..self.clone()
        }
    }
}

/// Build artifact on disk: either a Hardhat-style object with `abi` and
/// `bytecode` fields, or a bare ABI array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactFile {
    Artifact {
        abi: Abi,
        #[serde(default)]
        bytecode: Option<String>,
    },
    AbiOnly(Abi),
}

/// Contract lookup table built from the configuration.
#[derive(Debug)]
pub struct ContractRegistry {
    entries: HashMap<String, ContractEntry>,
}

impl ContractRegistry {
    /// Read every configured artifact and assemble the registry.
    pub fn from_settings(settings: &Settings) -> MintResult<Self> {
        let mut entries = HashMap::new();

        for (name, contract) in &settings.contracts {
            let (abi, bytecode) = load_artifact(&contract.artifact)?;

            let address = contract
                .address
                .as_deref()
                .map(|raw| {
                    raw.parse::<Address>().map_err(|e| {
                        MintError::Config(format!("invalid address for contract {}: {}", name, e))
                    })
                })
                .transpose()?;

            debug!(
                "registered contract {} ({} functions, bytecode: {})",
                name,
                abi.functions().count(),
                bytecode.is_some()
            );

            entries.insert(
                name.clone(),
                ContractEntry {
                    name: name.clone(),
                    address,
                    abi,
                    bytecode,
                    gas_limit: U256::from(settings.gas_limit_for(contract)),
                },
            );
        }

        Ok(Self { entries })
    }

    /// Look a contract up by name.
    pub fn get(&self, name: &str) -> MintResult<&ContractEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| MintError::ContractNotFound {
                name: name.to_string(),
            })
    }
}

fn load_artifact(path: &Path) -> MintResult<(Abi, Option<Bytes>)> {
    let raw = std::fs::read_to_string(path).map_err(|e| MintError::Artifact {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let parsed: ArtifactFile = serde_json::from_str(&raw).map_err(|e| MintError::Artifact {
        path: path.display().to_string(),
        message: format!("not a valid artifact or ABI: {}", e),
    })?;

    match parsed {
        ArtifactFile::Artifact { abi, bytecode } => {
            let bytecode = match bytecode.as_deref() {
                // Interface-only artifacts carry "0x"
                None | Some("") | Some("0x") => None,
                Some(hexed) => Some(hexed.parse::<Bytes>().map_err(|e| MintError::Artifact {
                    path: path.display().to_string(),
                    message: format!("invalid bytecode: {}", e),
                })?),
            };
            Ok((abi, bytecode))
        }
        ArtifactFile::AbiOnly(abi) => Ok((abi, None)),
    }
}
