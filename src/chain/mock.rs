//! In-memory mock chain
//!
//! Stores uploaded code and runs contract behaviour written in Rust in place
//! of a wasm VM. Behaviour is bound by instantiate label: instantiating with
//! label `counter` runs the factory registered under `counter`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::{ChainClient, ChainQuery, Coin, ContractInfo, TxResult};
use crate::models::{ChannelEnd, Ordering};

/// Port prefix of contract-bound IBC ports
const WASM_PORT_PREFIX: &str = "wasm.";

/// Builds a contract instance from its instantiate message
pub type ContractFactory = Arc<dyn Fn(&Value) -> Result<Box<dyn MockContract>> + Send + Sync>;

/// Packet a contract asks the chain to send
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendPacket {
    pub channel_id: String,
    pub data: Vec<u8>,
}

/// Side effects of an execute call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecuteResponse {
    pub packets: Vec<SendPacket>,
}

impl ExecuteResponse {
    pub fn send(mut self, channel_id: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.packets.push(SendPacket {
            channel_id: channel_id.into(),
            data: data.into(),
        });
        self
    }
}

/// Contract behaviour hosted by a [`MockChain`]
pub trait MockContract: Send {
    fn execute(&mut self, sender: &str, msg: &Value) -> Result<ExecuteResponse>;

    fn query(&self, msg: &Value) -> Result<Value>;

    /// Channel open handshake step on this contract's port
    ///
    /// Returns the version this side agrees to, or the rejection reason.
    fn channel_open(
        &mut self,
        channel: &ChannelEnd,
        ordering: Ordering,
        version: &str,
    ) -> std::result::Result<String, String>;

    /// Handle an incoming packet, returning the acknowledgement bytes
    /// Channel is open on both ends (OpenAck/OpenConfirm)
    fn channel_connect(&mut self, _channel: &ChannelEnd) {}

    fn receive_packet(&mut self, channel: &ChannelEnd, data: &[u8]) -> Vec<u8>;

    fn acknowledge_packet(&mut self, _channel: &ChannelEnd, _ack: &[u8]) {}

    fn has_ibc_port(&self) -> bool {
        true
    }
}

/// Packet waiting in a chain's outbox
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PendingPacket {
    pub sequence: u64,
    pub src: ChannelEnd,
    pub data: Vec<u8>,
}

struct ContractEntry {
    info: ContractInfo,
    contract: Box<dyn MockContract>,
}

#[derive(Default)]
struct ChainState {
    height: u64,
    codes: Vec<Vec<u8>>,
    contracts: BTreeMap<String, ContractEntry>,
    factories: HashMap<String, ContractFactory>,
    balances: HashMap<(String, String), u128>,
    /// channel id -> port id
    channels: BTreeMap<String, String>,
    outbox: Vec<PendingPacket>,
    channel_seq: u64,
    packet_seq: u64,
    tx_seq: u64,
    instantiations: usize,
}

impl ChainState {
    fn next_tx(&mut self) -> TxResult {
        self.tx_seq += 1;
        self.height += 1;
        TxResult {
            tx_hash: format!("{:064X}", self.tx_seq),
            height: self.height,
            gas_used: 100_000,
        }
    }

    fn contract_by_port(&mut self, port_id: &str) -> Result<&mut ContractEntry> {
        let address = port_id
            .strip_prefix(WASM_PORT_PREFIX)
            .with_context(|| format!("Port {port_id} is not a contract port"))?;
        self.contracts
            .get_mut(address)
            .with_context(|| format!("No contract bound to port {port_id}"))
    }
}

/// In-memory chain with a single funded signing account
#[derive(Clone)]
pub struct MockChain {
    chain_id: String,
    prefix: String,
    sender: String,
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    /// Create a new mock chain
    pub fn new(chain_id: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            chain_id: chain_id.into(),
            sender: format!("{prefix}1harnesssender"),
            prefix,
            state: Arc::new(Mutex::new(ChainState::default())),
        }
    }

    /// Register contract behaviour for an instantiate label
    pub fn with_contract(self, label: impl Into<String>, factory: ContractFactory) -> Self {
        self.state().factories.insert(label.into(), factory);
        self
    }

    /// Credit an account (faucet)
    pub fn fund(&self, address: &str, coin: &Coin) {
        let mut state = self.state();
        *state
            .balances
            .entry((address.to_string(), coin.denom.clone()))
            .or_default() += coin.amount;
    }

    #[cfg(test)]
    pub fn height(&self) -> u64 {
        self.state().height
    }

    #[cfg(test)]
    pub fn upload_count(&self) -> usize {
        self.state().codes.len()
    }

    #[cfg(test)]
    pub fn instantiate_count(&self) -> usize {
        self.state().instantiations
    }

    /// Packets sent but not yet relayed
    #[cfg(test)]
    pub fn pending_packets(&self) -> usize {
        self.state().outbox.len()
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn next_channel_id(&self) -> String {
        let mut state = self.state();
        let id = format!("channel-{}", state.channel_seq);
        state.channel_seq += 1;
        id
    }

    /// Run one handshake step on the contract behind `channel.port_id`
    pub(crate) fn channel_open(
        &self,
        channel: &ChannelEnd,
        ordering: Ordering,
        version: &str,
    ) -> std::result::Result<String, String> {
        let mut state = self.state();
        let entry = state
            .contract_by_port(&channel.port_id)
            .map_err(|e| e.to_string())?;
        entry.contract.channel_open(channel, ordering, version)
    }

    /// Mark a channel open so contracts can send on it
    pub(crate) fn bind_channel(&self, channel: &ChannelEnd) -> Result<()> {
        let mut state = self.state();
        state
            .contract_by_port(&channel.port_id)?
            .contract
            .channel_connect(channel);
        state
            .channels
            .insert(channel.channel_id.clone(), channel.port_id.clone());
        Ok(())
    }

    pub(crate) fn take_packets(&self) -> Vec<PendingPacket> {
        std::mem::take(&mut self.state().outbox)
    }

    /// Put undelivered packets back at the front of the outbox
    pub(crate) fn requeue_packets(&self, packets: Vec<PendingPacket>) {
        let mut state = self.state();
        let queued = std::mem::replace(&mut state.outbox, packets);
        state.outbox.extend(queued);
    }

    pub(crate) fn receive_packet(&self, dest: &ChannelEnd, data: &[u8]) -> Result<Vec<u8>> {
        let mut state = self.state();
        state.height += 1;
        let entry = state.contract_by_port(&dest.port_id)?;
        Ok(entry.contract.receive_packet(dest, data))
    }

    pub(crate) fn acknowledge_packet(&self, src: &ChannelEnd, ack: &[u8]) -> Result<()> {
        let mut state = self.state();
        state.height += 1;
        let entry = state.contract_by_port(&src.port_id)?;
        entry.contract.acknowledge_packet(src, ack);
        Ok(())
    }
}

#[async_trait]
impl ChainQuery for MockChain {
    async fn query_contract_smart(&self, address: &str, query: &Value) -> Result<Value> {
        let state = self.state();
        let entry = state
            .contracts
            .get(address)
            .with_context(|| format!("Contract not found: {address}"))?;
        entry.contract.query(query)
    }

    async fn contract_info(&self, address: &str) -> Result<ContractInfo> {
        let state = self.state();
        state
            .contracts
            .get(address)
            .map(|entry| entry.info.clone())
            .with_context(|| format!("Contract not found: {address}"))
    }

    async fn balance(&self, address: &str, denom: &str) -> Result<Coin> {
        let state = self.state();
        let amount = state
            .balances
            .get(&(address.to_string(), denom.to_string()))
            .copied()
            .unwrap_or(0);
        Ok(Coin::new(amount, denom))
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn sender_address(&self) -> &str {
        &self.sender
    }

    async fn upload(&self, wasm: &[u8], memo: &str) -> Result<u64> {
        if wasm.is_empty() {
            anyhow::bail!("Empty wasm bytecode");
        }

        let mut state = self.state();
        state.codes.push(wasm.to_vec());
        state.next_tx();
        let code_id = state.codes.len() as u64;
        debug!("[{}] {} -> code {}", self.chain_id, memo, code_id);
        Ok(code_id)
    }

    async fn instantiate(&self, code_id: u64, args: &Value, label: &str) -> Result<String> {
        let mut state = self.state();

        if code_id == 0 || code_id as usize > state.codes.len() {
            anyhow::bail!("Unknown code id {code_id}");
        }

        let factory = state
            .factories
            .get(label)
            .cloned()
            .with_context(|| format!("No mock contract registered for label '{label}'"))?;
        let contract = factory(args).with_context(|| format!("Instantiate of '{label}' failed"))?;

        state.instantiations += 1;
        let address = format!("{}1contract{:04}", self.prefix, state.instantiations);
        let ibc_port_id = contract
            .has_ibc_port()
            .then(|| format!("{WASM_PORT_PREFIX}{address}"));

        let info = ContractInfo {
            address: address.clone(),
            code_id,
            creator: self.sender.clone(),
            label: label.to_string(),
            ibc_port_id,
        };
        state
            .contracts
            .insert(address.clone(), ContractEntry { info, contract });
        state.next_tx();

        Ok(address)
    }

    async fn execute(&self, address: &str, msg: &Value) -> Result<TxResult> {
        let mut guard = self.state();
        let state = &mut *guard;

        let entry = state
            .contracts
            .get_mut(address)
            .with_context(|| format!("Contract not found: {address}"))?;
        let response = entry.contract.execute(&self.sender, msg)?;
        let port_id = entry.info.ibc_port_id.clone().unwrap_or_default();

        for packet in response.packets {
            match state.channels.get(&packet.channel_id) {
                Some(bound) if *bound == port_id => {}
                _ => anyhow::bail!(
                    "Channel {} is not open on port {}",
                    packet.channel_id,
                    port_id
                ),
            }

            state.packet_seq += 1;
            state.outbox.push(PendingPacket {
                sequence: state.packet_seq,
                src: ChannelEnd::new(port_id.clone(), packet.channel_id),
                data: packet.data,
            });
        }

        Ok(state.next_tx())
    }
}
