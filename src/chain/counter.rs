//! IBC counter contract behaviour
//!
//! Mirrors the `ibc_counter` wasm contract: incrementing locally sends an
//! `{"increment":{}}` packet on every open channel, and the counterparty
//! increments its own count when the packet arrives.

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;

use super::mock::{ContractFactory, ExecuteResponse, MockContract};
use crate::harness::ack::{encode_error, encode_result};
use crate::models::{ChannelEnd, Ordering};

/// Channel version spoken by the counter contract
pub const COUNTER_VERSION: &str = "counter-1";

#[derive(Clone, Debug, Default)]
pub struct CounterContract {
    count: u64,
    channels: Vec<String>,
    acks_ok: u64,
    acks_err: u64,
}

impl CounterContract {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    /// Factory reading `{"count": n}` from the instantiate message
    pub fn factory() -> ContractFactory {
        Arc::new(|args: &Value| -> Result<Box<dyn MockContract>> {
            let count = match args.get("count") {
                None => 0,
                Some(value) => value
                    .as_u64()
                    .ok_or_else(|| anyhow::anyhow!("'count' must be an unsigned integer"))?,
            };
            Ok(Box::new(CounterContract::new(count)))
        })
    }

    fn broadcast(&self, data: &Value) -> ExecuteResponse {
        let bytes = data.to_string().into_bytes();
        self.channels
            .iter()
            .fold(ExecuteResponse::default(), |response, channel| {
                response.send(channel.clone(), bytes.clone())
            })
    }
}

impl MockContract for CounterContract {
    fn execute(&mut self, _sender: &str, msg: &Value) -> Result<ExecuteResponse> {
        if msg.get("increment").is_some() {
            self.count += 1;
            return Ok(self.broadcast(&json!({"increment": {}})));
        }

        if let Some(reset) = msg.get("reset") {
            self.count = reset.get("count").and_then(Value::as_u64).unwrap_or(0);
            return Ok(ExecuteResponse::default());
        }

        // arbitrary packet payload, used to provoke error acknowledgements
        if let Some(send) = msg.get("send_packet") {
            let data = send
                .get("data")
                .ok_or_else(|| anyhow::anyhow!("send_packet requires 'data'"))?;
            return Ok(self.broadcast(data));
        }

        anyhow::bail!("Unknown execute message: {msg}")
    }

    fn query(&self, msg: &Value) -> Result<Value> {
        if msg.get("get_count").is_some() {
            return Ok(json!({ "count": self.count }));
        }
        if msg.get("get_acks").is_some() {
            return Ok(json!({ "success": self.acks_ok, "error": self.acks_err }));
        }
        anyhow::bail!("Unknown query: {msg}")
    }

    fn channel_open(
        &mut self,
        _channel: &ChannelEnd,
        ordering: Ordering,
        version: &str,
    ) -> std::result::Result<String, String> {
        if version != COUNTER_VERSION {
            return Err(format!(
                "invalid channel version: expected {COUNTER_VERSION}, got {version}"
            ));
        }
        if ordering != Ordering::Unordered {
            return Err(format!("unsupported channel ordering {ordering}"));
        }
        Ok(version.to_string())
    }

    fn channel_connect(&mut self, channel: &ChannelEnd) {
        if !self.channels.contains(&channel.channel_id) {
            self.channels.push(channel.channel_id.clone());
        }
    }

    fn receive_packet(&mut self, _channel: &ChannelEnd, data: &[u8]) -> Vec<u8> {
        match serde_json::from_slice::<Value>(data) {
            Ok(msg) if msg.get("increment").is_some() => {
                self.count += 1;
                encode_result(&json!({ "count": self.count }))
            }
            Ok(msg) => encode_error(&format!("unknown packet: {msg}")),
            Err(e) => encode_error(&format!("invalid packet: {e}")),
        }
    }

    fn acknowledge_packet(&mut self, _channel: &ChannelEnd, ack: &[u8]) {
        match serde_json::from_slice::<Value>(ack) {
            Ok(ack) if ack.get("result").is_some() => self.acks_ok += 1,
            _ => self.acks_err += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::ack::{decode, DecodedAck};
    use crate::models::AckRecord;

    fn channel() -> ChannelEnd {
        ChannelEnd::new("wasm.counter", "channel-0")
    }

    #[test]
    fn test_factory_reads_count() {
        let factory = CounterContract::factory();
        let contract = factory(&json!({"count": 5})).unwrap();
        assert_eq!(contract.query(&json!({"get_count": {}})).unwrap(), json!({"count": 5}));

        assert!(factory(&json!({"count": "five"})).is_err());
        assert!(factory(&json!({})).is_ok());
    }

    #[test]
    fn test_increment_broadcasts_on_open_channels() {
        let mut counter = CounterContract::new(0);
        let response = counter.execute("sender", &json!({"increment": {}})).unwrap();
        assert!(response.packets.is_empty());

        counter
            .channel_open(&channel(), Ordering::Unordered, COUNTER_VERSION)
            .unwrap();
        let response = counter.execute("sender", &json!({"increment": {}})).unwrap();
        assert!(response.packets.is_empty());

        counter.channel_connect(&channel());
        let response = counter.execute("sender", &json!({"increment": {}})).unwrap();
        assert_eq!(response.packets.len(), 1);
        assert_eq!(response.packets[0].channel_id, "channel-0");
        assert_eq!(counter.query(&json!({"get_count": {}})).unwrap()["count"], 3);
    }

    #[test]
    fn test_channel_open_checks_version_and_ordering() {
        let mut counter = CounterContract::new(0);
        assert!(counter
            .channel_open(&channel(), Ordering::Unordered, "counter-2")
            .is_err());
        assert!(counter
            .channel_open(&channel(), Ordering::Ordered, COUNTER_VERSION)
            .is_err());
    }

    #[test]
    fn test_receive_packet_acks() {
        let mut counter = CounterContract::new(0);

        let ack = counter.receive_packet(&channel(), br#"{"increment":{}}"#);
        let decoded = decode(&AckRecord::from_bytes(ack)).unwrap();
        assert_eq!(decoded, DecodedAck::Result(json!({"count": 1})));

        let ack = counter.receive_packet(&channel(), br#"{"decrement":{}}"#);
        let decoded = decode(&AckRecord::from_bytes(ack)).unwrap();
        assert!(decoded.error().unwrap().starts_with("unknown packet"));
    }

    #[test]
    fn test_acknowledgements_are_counted() {
        let mut counter = CounterContract::new(0);
        counter.acknowledge_packet(&channel(), &encode_result(&json!({"count": 1})));
        counter.acknowledge_packet(&channel(), &encode_error("boom"));

        let acks = counter.query(&json!({"get_acks": {}})).unwrap();
        assert_eq!(acks, json!({"success": 1, "error": 1}));
    }
}
