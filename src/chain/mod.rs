//! Chain collaborator interfaces
//!
//! Signing, fees and broadcasting belong to the chain client behind these
//! traits. The harness ships an in-memory [`MockChain`] and a read-only
//! [`LcdClient`] for live networks.

mod counter;
mod lcd;
mod mock;

pub use counter::{CounterContract, COUNTER_VERSION};
pub use lcd::LcdClient;
pub use mock::MockChain;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// On-chain metadata of an instantiated contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub address: String,
    pub code_id: u64,
    pub creator: String,
    pub label: String,
    pub ibc_port_id: Option<String>,
}

/// Bank balance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Result of a broadcast transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    pub tx_hash: String,
    pub height: u64,
    pub gas_used: u64,
}

/// Read-only chain access
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Smart query against a contract
    async fn query_contract_smart(
        &self,
        address: &str,
        query: &serde_json::Value,
    ) -> Result<serde_json::Value>;

    async fn contract_info(&self, address: &str) -> Result<ContractInfo>;

    async fn balance(&self, address: &str, denom: &str) -> Result<Coin>;
}

/// Chain access through a funded signing account
///
/// All transactions are signed by `sender_address`; callers must not submit
/// from the same client concurrently.
#[async_trait]
pub trait ChainClient: ChainQuery {
    fn chain_id(&self) -> &str;

    fn sender_address(&self) -> &str;

    /// Upload wasm bytecode, returning the code id
    async fn upload(&self, wasm: &[u8], memo: &str) -> Result<u64>;

    /// Instantiate uploaded code, returning the contract address
    async fn instantiate(
        &self,
        code_id: u64,
        args: &serde_json::Value,
        label: &str,
    ) -> Result<String>;

    async fn execute(&self, address: &str, msg: &serde_json::Value) -> Result<TxResult>;
}
