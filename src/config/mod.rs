//! Configuration module
//!
//! Chains, contract sets, IBC channel parameters and relayer timing. Loaded
//! from a YAML or JSON file and overridden from `IBC_HARNESS_*` variables.

pub mod env;
mod file;

pub use env::EnvConfig;
pub use file::ConfigFile;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::chain::{Coin, COUNTER_VERSION};
use crate::models::{ContractDescriptor, ContractSet, Ordering, Side};
use crate::relayer::LinkConfig;

/// One chain of the two-chain network
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Display name
    pub name: String,

    pub chain_id: String,

    /// Bech32 address prefix
    pub prefix: String,

    pub rpc_url: String,

    /// REST gateway used for read-only queries
    pub lcd_url: String,

    pub fee_denom: String,

    /// Minimum gas price, e.g. `0.025uosmo`
    pub min_fee: String,

    /// Amount credited to the signing account before deploying
    pub faucet_amount: u64,

    /// Contracts deployed on this chain
    #[serde(default)]
    pub contracts: ContractSet,
}

impl ChainConfig {
    /// Local wasmd node
    pub fn wasmd() -> Self {
        Self {
            name: "wasmd".to_string(),
            chain_id: "testing".to_string(),
            prefix: "wasm".to_string(),
            rpc_url: "http://localhost:26659".to_string(),
            lcd_url: "http://localhost:1317".to_string(),
            fee_denom: "ucosm".to_string(),
            min_fee: "0.025ucosm".to_string(),
            faucet_amount: 4_000_000,
            contracts: ContractSet::new(),
        }
    }

    /// Local osmosis node
    pub fn osmosis() -> Self {
        Self {
            name: "osmosis".to_string(),
            chain_id: "osmo-testing".to_string(),
            prefix: "osmo".to_string(),
            rpc_url: "http://localhost:26653".to_string(),
            lcd_url: "http://localhost:1318".to_string(),
            fee_denom: "uosmo".to_string(),
            min_fee: "0.025uosmo".to_string(),
            faucet_amount: 4_000_000,
            contracts: ContractSet::new(),
        }
    }

    pub fn faucet_coin(&self) -> Coin {
        Coin::new(u128::from(self.faucet_amount), self.fee_denom.clone())
    }
}

/// Both chains, keyed by side
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainsConfig {
    pub a: ChainConfig,
    pub b: ChainConfig,
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            a: ChainConfig::wasmd(),
            b: ChainConfig::osmosis(),
        }
    }
}

/// Channel parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcConfig {
    pub version: String,
    #[serde(default)]
    pub ordering: Ordering,
}

impl Default for IbcConfig {
    fn default() -> Self {
        Self {
            version: COUNTER_VERSION.to_string(),
            ordering: Ordering::Unordered,
        }
    }
}

/// Relayer timing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayerConfig {
    pub handshake_timeout_secs: u64,
    #[serde(default)]
    pub handshake_delay_ms: u64,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_secs: 30,
            handshake_delay_ms: 0,
        }
    }
}

impl RelayerConfig {
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            handshake_delay: Duration::from_millis(self.handshake_delay_ms),
        }
    }
}

/// Everything a harness run needs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub chains: ChainsConfig,

    #[serde(default)]
    pub ibc: IbcConfig,

    #[serde(default)]
    pub relayer: RelayerConfig,

    /// Overrides the default results directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<PathBuf>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            chains: ChainsConfig::default(),
            ibc: IbcConfig::default(),
            relayer: RelayerConfig::default(),
            results_dir: None,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy `descriptor` on both chains
    pub fn with_contract_on_both(mut self, descriptor: ContractDescriptor) -> Result<Self> {
        self.chains.a.contracts.insert(descriptor.clone())?;
        self.chains.b.contracts.insert(descriptor)?;
        Ok(self)
    }

    pub fn chain(&self, side: Side) -> &ChainConfig {
        match side {
            Side::A => &self.chains.a,
            Side::B => &self.chains.b,
        }
    }

    /// "<chain a> <-> <chain b>"
    pub fn network_name(&self) -> String {
        format!("{} <-> {}", self.chains.a.name, self.chains.b.name)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self, env: &EnvConfig) -> Result<()> {
        if let Some(version) = &env.version {
            self.ibc.version = version.clone();
        }
        if let Some(ordering) = &env.ordering {
            self.ibc.ordering = Ordering::from_str(ordering)
                .ok_or_else(|| anyhow::anyhow!("Unknown channel ordering: {ordering}"))?;
        }
        if let Some(timeout) = env.timeout {
            self.relayer.handshake_timeout_secs = timeout;
        }
        if let Some(lcd_url) = &env.lcd_url {
            self.chains.b.lcd_url = lcd_url.clone();
        }
        Ok(())
    }
}
