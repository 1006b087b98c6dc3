use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use ethereum_types::U256;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use mixer_contracts::{Client, MixerContract, SecretKey};
use mixer_prover::{Artifacts, CommandProver};
use serde::Deserialize;

use crate::{Error, Result};

/// The prefix of environment variables that override the config file
pub const ENV_PREFIX: &str = "MIXER_";

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_CIRCUIT: &str = "build/circuits/withdraw.json";
const DEFAULT_PROVING_KEY: &str = "build/circuits/withdraw_proving_key.bin";
const DEFAULT_CONFIRMATION_POLL_INTERVAL_MS: u64 = 1000;

/// Settings for talking to the ledger and proving withdrawals
///
/// Loaded from a TOML file, with `MIXER_`-prefixed environment variables taking precedence. Nested
/// keys are separated by a double underscore, e.g. `MIXER_DENOMINATION__CURRENCY=eth`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON-RPC endpoint of the node
    pub rpc_url: String,
    /// Address of the mixer contract
    pub contract_address: Option<String>,
    /// Hex secp256k1 key used to sign deposits and withdrawals, read-only when absent
    pub signer_secret_key: Option<String>,
    /// Lower bound for the gas price, in gwei
    pub minimum_gas_price_gwei: Option<u64>,
    /// First block to scan for deposit events
    pub from_block: u64,
    /// Network id written into notes, queried from the node when absent
    pub network_id: Option<u64>,
    /// The fixed deposit value
    pub denomination: DenominationConfig,
    /// Circuit and proving key locations
    pub artifacts: ArtifactsConfig,
    /// External prover program
    pub prover: Option<ProverConfig>,
    /// How often to poll for a submitted transaction
    pub confirmation_poll_interval_ms: u64,
}

/// The value every deposit carries
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DenominationConfig {
    /// Currency symbol written into notes
    pub currency: String,
    /// Human readable amount written into notes
    pub amount: String,
    /// The amount in wei, sent with each deposit
    #[serde(deserialize_with = "wei::deserialize")]
    pub amount_wei: U256,
}

/// Paths to the opaque proving artifacts
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub circuit: PathBuf,
    pub proving_key: PathBuf,
}

/// `<program> <args...> <circuit> <proving key>`, see [`CommandProver`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProverConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_owned(),
            contract_address: None,
            signer_secret_key: None,
            minimum_gas_price_gwei: None,
            from_block: 0,
            network_id: None,
            denomination: DenominationConfig::default(),
            artifacts: ArtifactsConfig::default(),
            prover: None,
            confirmation_poll_interval_ms: DEFAULT_CONFIRMATION_POLL_INTERVAL_MS,
        }
    }
}

impl Default for DenominationConfig {
    fn default() -> Self {
        Self {
            currency: "eth".to_owned(),
            amount: "0.1".to_owned(),
            amount_wei: U256::exp10(17),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            circuit: PathBuf::from(DEFAULT_CIRCUIT),
            proving_key: PathBuf::from(DEFAULT_PROVING_KEY),
        }
    }
}

impl Config {
    /// The providers a config is extracted from: `path` (if it exists), then the environment
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the config from `path` and the environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::figment(path).extract()?;
        Ok(config)
    }

    pub fn confirmation_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_interval_ms)
    }

    pub fn signer(&self) -> Result<Option<SecretKey>> {
        self.signer_secret_key
            .as_deref()
            .map(|key| {
                SecretKey::from_str(key.trim().trim_start_matches("0x")).map_err(|_| {
                    Error::InvalidConfig("signer_secret_key is not a valid secp256k1 key".into())
                })
            })
            .transpose()
    }

    /// A web3 client for [`Config::rpc_url`]
    pub fn client(&self) -> Result<Client> {
        Ok(Client::new(&self.rpc_url, self.minimum_gas_price_gwei)?)
    }

    /// The mixer contract, signing with [`Config::signer_secret_key`] if one is set
    pub fn contract(&self) -> Result<MixerContract> {
        let address = self
            .contract_address
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("contract_address is required".into()))?;

        let contract = MixerContract::load(
            self.client()?,
            address,
            self.signer()?,
            self.denomination.amount_wei,
        )?
        .from_block(self.from_block)
        .confirm_interval(self.confirmation_poll_interval());

        Ok(contract)
    }

    /// Read the circuit and proving key from disk
    pub fn load_artifacts(&self) -> Result<Artifacts> {
        Ok(Artifacts::load(
            &self.artifacts.circuit,
            &self.artifacts.proving_key,
        )?)
    }

    pub fn command_prover(&self) -> Option<CommandProver> {
        self.prover
            .as_ref()
            .map(|prover| CommandProver::new(&prover.program, prover.args.clone()))
    }
}

/// Wei amounts as a TOML/env integer, a decimal string, or a `0x` hex string
mod wei {
    use std::fmt;

    use ethereum_types::U256;
    use serde::{de, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        deserializer.deserialize_any(WeiVisitor)
    }

    struct WeiVisitor;

    impl<'de> de::Visitor<'de> for WeiVisitor {
        type Value = U256;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer, decimal string or 0x-prefixed hex string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
            Ok(U256::from(v))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<U256, E> {
            Ok(U256::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<U256, E> {
            u64::try_from(v)
                .map(U256::from)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
            let parsed = match v.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16).ok(),
                None => U256::from_dec_str(v).ok(),
            };

            parsed.ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}
