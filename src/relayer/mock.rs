//! In-memory relayer link between two mock chains
//!
//! Channel handshakes call into the contracts on both ends; relaying drains
//! each chain's outbox, delivers to the counterparty and carries the
//! acknowledgement back.

use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use super::{LinkError, RelayerLink};
use crate::chain::{ChainClient, MockChain};
use crate::models::{AckRecord, ChannelEnd, ChannelInfo, Ordering, RelayOutcome, Side};

/// Upper bound on relay rounds; acks that trigger packets could loop forever
const MAX_RELAY_ROUNDS: usize = 16;

/// Link timing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkConfig {
    pub handshake_timeout: Duration,
    /// Simulated block time between handshake steps
    pub handshake_delay: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(30),
            handshake_delay: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
struct ChannelPair {
    a: ChannelEnd,
    b: ChannelEnd,
}

impl ChannelPair {
    fn end(&self, side: Side) -> &ChannelEnd {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

/// Relayer link over a fresh connection between two [`MockChain`]s
pub struct MockLink {
    a: MockChain,
    b: MockChain,
    connection_id: String,
    config: LinkConfig,
    channels: Mutex<Vec<ChannelPair>>,
}

impl MockLink {
    /// Connect two chains with a new client and connection on each side
    pub fn create_with_new_connections(a: MockChain, b: MockChain) -> Self {
        let connection_id = "connection-0".to_string();
        info!(
            "Connected {} <-> {} over {}",
            a.chain_id(),
            b.chain_id(),
            connection_id
        );
        Self {
            a,
            b,
            connection_id,
            config: LinkConfig::default(),
            channels: Mutex::new(Vec::new()),
        }
    }

    pub fn with_config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn chain(&self, side: Side) -> &MockChain {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels().len()
    }

    fn channels(&self) -> MutexGuard<'_, Vec<ChannelPair>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn handshake(
        &self,
        side: Side,
        local_port: &str,
        remote_port: &str,
        ordering: Ordering,
        version: &str,
    ) -> Result<ChannelInfo, LinkError> {
        let src_chain = self.chain(side);
        let dest_chain = self.chain(side.opposite());
        let rejected = |chain: &MockChain, port_id: &str, reason: String| {
            LinkError::HandshakeRejected {
                chain_id: chain.chain_id().to_string(),
                port_id: port_id.to_string(),
                reason,
            }
        };

        // OpenInit
        let src = ChannelEnd::new(local_port, src_chain.next_channel_id());
        let init_version = src_chain
            .channel_open(&src, ordering, version)
            .map_err(|reason| rejected(src_chain, local_port, reason))?;
        debug!("ChanOpenInit {} on {}", src, src_chain.chain_id());
        sleep(self.config.handshake_delay).await;

        // OpenTry
        let dest = ChannelEnd::new(remote_port, dest_chain.next_channel_id());
        let negotiated = dest_chain
            .channel_open(&dest, ordering, &init_version)
            .map_err(|reason| rejected(dest_chain, remote_port, reason))?;
        debug!("ChanOpenTry {} on {}", dest, dest_chain.chain_id());
        sleep(self.config.handshake_delay).await;

        // OpenAck + OpenConfirm; no await until the pair is recorded
        sleep(self.config.handshake_delay).await;
        src_chain.bind_channel(&src)?;
        dest_chain.bind_channel(&dest)?;
        info!(
            "Channel open on {}: {} <-> {} ({})",
            self.connection_id, src, dest, negotiated
        );

        let pair = match side {
            Side::A => ChannelPair {
                a: src.clone(),
                b: dest.clone(),
            },
            Side::B => ChannelPair {
                a: dest.clone(),
                b: src.clone(),
            },
        };
        self.channels().push(pair);

        Ok(ChannelInfo {
            src,
            dest,
            ordering,
            version: negotiated,
        })
    }

    fn counterparty(&self, from: Side, src: &ChannelEnd) -> Option<ChannelEnd> {
        self.channels()
            .iter()
            .find(|pair| pair.end(from) == src)
            .map(|pair| pair.end(from.opposite()).clone())
    }

    /// Deliver everything queued on `from`, returning (packets, acks)
    ///
    /// Packets that were not delivered go back on the outbox on error.
    fn relay_from(&self, from: Side) -> Result<(usize, Vec<AckRecord>), LinkError> {
        let src_chain = self.chain(from);
        let dest_chain = self.chain(from.opposite());
        let packets = src_chain.take_packets();

        let routed: Result<Vec<ChannelEnd>, String> = packets
            .iter()
            .map(|packet| {
                self.counterparty(from, &packet.src)
                    .ok_or_else(|| packet.src.to_string())
            })
            .collect();
        let routed = match routed {
            Ok(routed) => routed,
            Err(src) => {
                src_chain.requeue_packets(packets);
                return Err(anyhow!("No open channel for {src}").into());
            }
        };

        let total = packets.len();
        let mut acks = Vec::with_capacity(total);
        let mut pending = packets.into_iter().zip(routed);

        while let Some((packet, dest)) = pending.next() {
            let ack = match dest_chain.receive_packet(&dest, &packet.data) {
                Ok(ack) => ack,
                Err(e) => {
                    let mut undelivered = vec![packet];
                    undelivered.extend(pending.map(|(packet, _)| packet));
                    src_chain.requeue_packets(undelivered);
                    return Err(e.into());
                }
            };
            if let Err(e) = src_chain.acknowledge_packet(&packet.src, &ack) {
                src_chain.requeue_packets(pending.map(|(packet, _)| packet).collect());
                return Err(e.into());
            }

            acks.push(AckRecord {
                acknowledgement: ack,
                sequence: packet.sequence,
                src_channel: packet.src.channel_id,
                dest_channel: dest.channel_id,
            });
        }

        Ok((total, acks))
    }
}

#[async_trait]
impl RelayerLink for MockLink {
    async fn create_channel(
        &self,
        side: Side,
        local_port: &str,
        remote_port: &str,
        ordering: Ordering,
        version: &str,
    ) -> Result<ChannelInfo, LinkError> {
        info!(
            "Opening {} channel {} -> {} ({})",
            ordering, local_port, remote_port, version
        );

        let handshake = self.handshake(side, local_port, remote_port, ordering, version);
        timeout(self.config.handshake_timeout, handshake)
            .await
            .map_err(|_| LinkError::Timeout(self.config.handshake_timeout))?
    }

    async fn relay_all(&self) -> Result<RelayOutcome, LinkError> {
        let mut outcome = RelayOutcome::default();

        for _ in 0..MAX_RELAY_ROUNDS {
            let (packets_from_a, acks_from_b) = self.relay_from(Side::A)?;
            let (packets_from_b, acks_from_a) = self.relay_from(Side::B)?;
            let round = RelayOutcome {
                packets_from_a,
                packets_from_b,
                acks_from_a,
                acks_from_b,
            };

            if round.is_empty() {
                info!(
                    "Relayed {} packets from A, {} from B",
                    outcome.packets_from_a, outcome.packets_from_b
                );
                return Ok(outcome);
            }
            outcome.merge(round);
        }

        Err(LinkError::Chain(anyhow!(
            "Packets still pending after {MAX_RELAY_ROUNDS} relay rounds"
        )))
    }
}
