//! Environment-driven configuration.
//!
//! | variable | meaning |
//! |---|---|
//! | `CONTRACT_WALLET_ADDRESS` | factory contract |
//! | `ACCOUNT_MODEL_ADDRESS` | template the factory clones |
//! | `PRIVATE_KEY` | hex secp256k1 key of the signing identity |
//! | `PROVIDER_URL` | JSON-RPC endpoint |
//! | `PROVIDER_CHAINID` | chain id transactions are signed for |

use std::fmt;

use chain_eth::address::checksum_address;
use secrecy::SecretString;

use crate::error::WalletError;

pub const FACTORY_ADDRESS_VAR: &str = "CONTRACT_WALLET_ADDRESS";
pub const MODEL_ACCOUNT_VAR: &str = "ACCOUNT_MODEL_ADDRESS";
pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";
pub const PROVIDER_URL_VAR: &str = "PROVIDER_URL";
pub const CHAIN_ID_VAR: &str = "PROVIDER_CHAINID";

pub struct WalletConfig {
    pub factory_address: String,
    pub model_account: String,
    pub private_key: SecretString,
    pub provider_url: String,
    pub chain_id: u64,
}

impl WalletConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, WalletError> {
        // A missing .env file is fine; the variables may be set directly.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WalletError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| WalletError::Configuration(format!("{name} is not set")))
        };

        let address = |name: &str| {
            let raw = required(name)?;
            checksum_address(&raw)
                .map_err(|e| WalletError::Configuration(format!("{name}: {e}")))
        };

        let chain_id = required(CHAIN_ID_VAR)?;
        let chain_id = chain_id.parse::<u64>().map_err(|e| {
            WalletError::Configuration(format!("{CHAIN_ID_VAR}: {chain_id}: {e}"))
        })?;

        Ok(Self {
            factory_address: address(FACTORY_ADDRESS_VAR)?,
            model_account: address(MODEL_ACCOUNT_VAR)?,
            private_key: SecretString::from(required(PRIVATE_KEY_VAR)?),
            provider_url: required(PROVIDER_URL_VAR)?,
            chain_id,
        })
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("factory_address", &self.factory_address)
            .field("model_account", &self.model_account)
            .field("private_key", &"[REDACTED]")
            .field("provider_url", &self.provider_url)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (FACTORY_ADDRESS_VAR, "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512"),
            (MODEL_ACCOUNT_VAR, "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            (
                PRIVATE_KEY_VAR,
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            ),
            (PROVIDER_URL_VAR, "http://127.0.0.1:8545"),
            (CHAIN_ID_VAR, "31337"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<WalletConfig, WalletError> {
        WalletConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn loads_and_checksums_addresses() {
        let config = load(&env()).unwrap();

        assert_eq!(config.factory_address, "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");
        assert_eq!(config.model_account, "0x5FbDB2315678afecb367f032d93F642f64180aa3");
        assert_eq!(config.provider_url, "http://127.0.0.1:8545");
        assert_eq!(config.chain_id, 31337);
        assert!(config.private_key.expose_secret().starts_with("0xac09"));
    }

    #[test]
    fn missing_variable_is_a_configuration_error() {
        let mut vars = env();
        vars.remove(PRIVATE_KEY_VAR);

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, WalletError::Configuration(ref m) if m.contains(PRIVATE_KEY_VAR)));
    }

    #[test]
    fn blank_variable_counts_as_missing() {
        let mut vars = env();
        vars.insert(PROVIDER_URL_VAR, "   ");
        assert!(matches!(load(&vars), Err(WalletError::Configuration(_))));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut vars = env();
        vars.insert(CHAIN_ID_VAR, "mainnet");
        assert!(matches!(load(&vars), Err(WalletError::Configuration(_))));

        let mut vars = env();
        vars.insert(MODEL_ACCOUNT_VAR, "0x1234");
        assert!(matches!(load(&vars), Err(WalletError::Configuration(_))));
    }

    #[test]
    fn debug_redacts_private_key() {
        let config = load(&env()).unwrap();
        let debug = format!("{config:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("ac0974bec"));
    }
}
