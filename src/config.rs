//! Configuration for the minting toolkit
//!
//! Loads one explicit `Settings` value from a TOML file with environment
//! variable substitution. The submitter receives it at construction; nothing
//! reads the environment after startup.

use crate::error::{MintError, MintResult};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub network: NetworkConfig,
    pub wallet: WalletConfig,
    pub contracts: HashMap<String, ContractConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: String,
    /// EIP-155 chain identifier the wallet signs for.
    pub chain_id: u64,
    pub default_gas_limit: u64,
    pub max_gas_price_gwei: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Name of the environment variable holding the hex-encoded signing key.
    /// The key itself never appears in the config file.
    pub private_key_env: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    /// Deployed address; absent for contracts that only get deployed.
    pub address: Option<String>,
    /// Path to the build artifact carrying the ABI (and creation bytecode).
    pub artifact: PathBuf,
    /// Overrides `network.default_gas_limit` for this contract's calls.
    pub gas_limit: Option<u64>,
}

impl Settings {
    /// Load settings from the configuration file. `MINTKIT_CONFIG` overrides
    /// the default path.
    pub fn load() -> MintResult<Self> {
        let config_path = env::var("MINTKIT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
        Self::load_from(&config_path)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> MintResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MintError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        // Substitute environment variables
        let substituted = substitute_env_vars(&raw);

        let settings: Settings = toml::from_str(&substituted).map_err(|e| {
            MintError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> MintResult<()> {
        if self.network.rpc_url.is_empty() {
            return Err(MintError::Config(
                "network.rpc_url is empty (is the endpoint env var set?)".to_string(),
            ));
        }
        if self.network.default_gas_limit == 0 {
            return Err(MintError::Config(
                "network.default_gas_limit must be positive".to_string(),
            ));
        }
        if self.contracts.is_empty() {
            return Err(MintError::Config(
                "at least one contract must be configured".to_string(),
            ));
        }
        for (name, contract) in &self.contracts {
            if contract.gas_limit == Some(0) {
                return Err(MintError::Config(format!(
                    "contract {} has a zero gas limit",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Effective gas limit for a contract entry.
    pub fn gas_limit_for(&self, contract: &ContractConfig) -> u64 {
        contract.gas_limit.unwrap_or(self.network.default_gas_limit)
    }
}

lazy_static! {
    static ref ENV_VAR_RE: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR_RE.captures_iter(input) {
        let var_value = env::var(&cap[1]).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
        [network]
        name = "rinkeby"
        rpc_url = "https://eth-rinkeby.example/v2/key"
        chain_id = 4
        default_gas_limit = 500000
        max_gas_price_gwei = 200

        [wallet]
        private_key_env = "STAGING_PRIVATE_KEY"

        [contracts.plug]
        address = "0x3EC9a755f86540A8FEb3a7368c522d33eEa88415"
        artifact = "artifacts/contracts/Plug.sol/Plug.json"
    "#;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("MINTKIT_TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${MINTKIT_TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(
            result,
            "url = \"https://api.example.com/test_value/endpoint\""
        );
    }

    #[test]
    fn unset_env_vars_substitute_to_empty() {
        let input = "url = \"${MINTKIT_DEFINITELY_UNSET_VAR}\"";
        assert_eq!(substitute_env_vars(input), "url = \"\"");
    }

    #[test]
    fn loads_a_valid_config_file() {
        let file = write_config(VALID_CONFIG);
        let settings = Settings::load_from(file.path()).unwrap();

        assert_eq!(settings.network.chain_id, 4);
        assert_eq!(settings.network.default_gas_limit, 500_000);
        assert_eq!(settings.wallet.private_key_env, "STAGING_PRIVATE_KEY");
        let plug = &settings.contracts["plug"];
        assert_eq!(settings.gas_limit_for(plug), 500_000);
    }

    #[test]
    fn per_contract_gas_limit_overrides_the_default() {
        let config = VALID_CONFIG.to_string()
            + r#"
        [contracts.collectible]
        artifact = "artifacts/contracts/LOGIK721Test.sol/LOGIK721Test.json"
        gas_limit = 2000000
    "#;
        let file = write_config(&config);
        let settings = Settings::load_from(file.path()).unwrap();

        let collectible = &settings.contracts["collectible"];
        assert_eq!(settings.gas_limit_for(collectible), 2_000_000);
        assert!(collectible.address.is_none());
    }

    #[test]
    fn empty_rpc_url_fails_validation() {
        let config = VALID_CONFIG.replace("https://eth-rinkeby.example/v2/key", "");
        let file = write_config(&config);
        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, MintError::Config(_)), "got {err}");
    }

    #[test]
    fn config_without_contracts_fails_validation() {
        let config = r#"
        [network]
        name = "rinkeby"
        rpc_url = "https://eth-rinkeby.example/v2/key"
        chain_id = 4
        default_gas_limit = 500000
        max_gas_price_gwei = 200

        [wallet]
        private_key_env = "STAGING_PRIVATE_KEY"

        [contracts]
    "#;
        let file = write_config(config);
        assert!(Settings::load_from(file.path()).is_err());
    }
}
