//! End-to-end scenarios
//!
//! Every scenario runs against a fresh in-memory network built from the
//! harness config: two mock chains hosting the counter contract, joined by a
//! mock relayer link.
//!
//! ## Packet flow (1-3)
//! - Counter Sync
//! - Reverse Counter Sync
//! - Error Acknowledgement
//!
//! ## Channel handshake (4)
//! - Handshake Rejected

mod handshake;
mod packet;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::chain::{ChainClient, ChainQuery, CounterContract, MockChain};
use crate::config::{ChainConfig, HarnessConfig};
use crate::harness::{create_channel, deploy_all, ContractRegistry, HarnessError};
use crate::models::{ChannelDescriptor, DeployedContracts, Scenario, Side, StageTiming};
use crate::relayer::MockLink;
use crate::utils::Stopwatch;

/// Logical name and instantiate label of the counter contract
pub const COUNTER_CONTRACT: &str = "counter";

/// Run one scenario, returning its details on success
pub async fn run(scenario: Scenario, ctx: &mut ScenarioContext<'_>) -> Result<Value> {
    match scenario {
        Scenario::CounterSync => packet::counter_sync(ctx).await,
        Scenario::ReverseCounterSync => packet::reverse_counter_sync(ctx).await,
        Scenario::ErrorAcknowledgement => packet::error_acknowledgement(ctx).await,
        Scenario::HandshakeRejected => handshake::handshake_rejected(ctx).await,
    }
}

/// Two funded mock chains with the counter contract registered
pub struct MockNetwork {
    pub a: MockChain,
    pub b: MockChain,
}

impl MockNetwork {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            a: mock_chain(&config.chains.a),
            b: mock_chain(&config.chains.b),
        }
    }

    pub fn chain(&self, side: Side) -> &MockChain {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

fn mock_chain(config: &ChainConfig) -> MockChain {
    let chain = MockChain::new(&config.chain_id, &config.prefix)
        .with_contract(COUNTER_CONTRACT, CounterContract::factory());
    chain.fund(chain.sender_address(), &config.faucet_coin());
    chain
}

/// Counter contracts deployed on both chains
#[derive(Clone, Debug)]
pub struct CounterPair {
    pub deployed_a: DeployedContracts,
    pub deployed_b: DeployedContracts,
    pub address_a: String,
    pub address_b: String,
    pub port_a: String,
    pub port_b: String,
}

impl CounterPair {
    pub fn address(&self, side: Side) -> &str {
        match side {
            Side::A => &self.address_a,
            Side::B => &self.address_b,
        }
    }

    pub fn port(&self, side: Side) -> &str {
        match side {
            Side::A => &self.port_a,
            Side::B => &self.port_b,
        }
    }
}

/// State shared by the stages of one scenario
pub struct ScenarioContext<'a> {
    pub config: &'a HarnessConfig,
    pub network: MockNetwork,
    pub link: MockLink,
    stopwatch: Stopwatch,
}

impl<'a> ScenarioContext<'a> {
    pub fn new(config: &'a HarnessConfig) -> Self {
        let network = MockNetwork::from_config(config);
        let link = MockLink::create_with_new_connections(network.a.clone(), network.b.clone())
            .with_config(config.relayer.link_config());

        Self {
            config,
            network,
            link,
            stopwatch: Stopwatch::new(),
        }
    }

    /// Close the current stage
    pub fn stage(&mut self, name: &str) {
        self.stopwatch.lap(name);
    }

    pub fn stages(&self) -> Vec<StageTiming> {
        self.stopwatch.stages()
    }

    /// Per-stage timings, one line each
    pub fn timings(&self) -> String {
        self.stopwatch.format()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.stopwatch.total_ms()
    }

    /// Deploy both chains' contract sets and locate the counters
    pub async fn deploy_counters(&self) -> Result<CounterPair> {
        let deployed_a = deploy_all(&self.network.a, &self.config.chains.a.contracts).await?;
        let deployed_b = deploy_all(&self.network.b, &self.config.chains.b.contracts).await?;

        let address_a = counter_address(&deployed_a, self.config.chain(Side::A))?;
        let address_b = counter_address(&deployed_b, self.config.chain(Side::B))?;
        let port_a = ContractRegistry::new(&self.network.a)
            .port_of(COUNTER_CONTRACT, &address_a)
            .await?;
        let port_b = ContractRegistry::new(&self.network.b)
            .port_of(COUNTER_CONTRACT, &address_b)
            .await?;

        Ok(CounterPair {
            deployed_a,
            deployed_b,
            address_a,
            address_b,
            port_a,
            port_b,
        })
    }

    /// Open a channel between the counters from `side`
    pub async fn open_channel(
        &self,
        counters: &CounterPair,
        side: Side,
        version: &str,
    ) -> Result<ChannelDescriptor, HarnessError> {
        create_channel(
            &self.link,
            side,
            counters.port(side),
            counters.port(side.opposite()),
            self.config.ibc.ordering,
            version,
        )
        .await
    }

    /// Current count of the counter on `side`
    pub async fn count(&self, counters: &CounterPair, side: Side) -> Result<u64> {
        let response = self
            .network
            .chain(side)
            .query_contract_smart(counters.address(side), &json!({ "get_count": {} }))
            .await?;
        response
            .get("count")
            .and_then(Value::as_u64)
            .with_context(|| format!("Unexpected get_count response: {response}"))
    }

    /// Fail unless the counter on `side` reads `expected`
    pub async fn expect_count(
        &self,
        counters: &CounterPair,
        side: Side,
        expected: u64,
    ) -> Result<()> {
        let count = self.count(counters, side).await?;
        if count != expected {
            return Err(HarnessError::assertion(format!(
                "Expected count {expected} on chain {side}, got {count}"
            ))
            .into());
        }
        Ok(())
    }
}

fn counter_address(
    deployed: &DeployedContracts,
    chain: &ChainConfig,
) -> Result<String, HarnessError> {
    deployed
        .address(COUNTER_CONTRACT)
        .map(str::to_string)
        .ok_or_else(|| {
            HarnessError::deployment(
                COUNTER_CONTRACT,
                format!("not configured on chain '{}'", chain.name),
            )
        })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::ContractDescriptor;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Counter bytecode on disk; keep it alive for the test's duration
    pub fn counter_wasm() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\0asm ibc_counter").unwrap();
        file
    }

    pub fn counter_config(wasm: &NamedTempFile) -> HarnessConfig {
        HarnessConfig::default()
            .with_contract_on_both(ContractDescriptor::new(
                COUNTER_CONTRACT,
                wasm.path(),
                json!({ "count": 0 }),
            ))
            .unwrap()
    }
}
