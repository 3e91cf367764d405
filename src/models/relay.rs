//! Relay outcome models

use serde::{Deserialize, Serialize};

use super::channel::Side;

/// Acknowledgement written by the receiving chain for one packet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckRecord {
    /// Raw acknowledgement bytes
    pub acknowledgement: Vec<u8>,

    /// Sequence of the acknowledged packet
    pub sequence: u64,

    /// Channel the packet was sent from
    pub src_channel: String,

    /// Channel the packet was received on
    pub dest_channel: String,
}

impl AckRecord {
    /// Record with no packet metadata
    pub fn from_bytes(acknowledgement: impl Into<Vec<u8>>) -> Self {
        Self {
            acknowledgement: acknowledgement.into(),
            sequence: 0,
            src_channel: String::new(),
            dest_channel: String::new(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.acknowledgement
    }
}

/// Result of a single relay invocation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayOutcome {
    pub packets_from_a: usize,
    pub packets_from_b: usize,
    pub acks_from_a: Vec<AckRecord>,
    pub acks_from_b: Vec<AckRecord>,
}

impl RelayOutcome {
    /// Packets sent from `side`
    pub fn packets_from(&self, side: Side) -> usize {
        match side {
            Side::A => self.packets_from_a,
            Side::B => self.packets_from_b,
        }
    }

    /// Acks written by `side`
    pub fn acks_from(&self, side: Side) -> &[AckRecord] {
        match side {
            Side::A => &self.acks_from_a,
            Side::B => &self.acks_from_b,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.packets_from_a == 0
            && self.packets_from_b == 0
            && self.acks_from_a.is_empty()
            && self.acks_from_b.is_empty()
    }

    /// Merge another relay pass into this one
    pub fn merge(&mut self, other: RelayOutcome) {
        self.packets_from_a += other.packets_from_a;
        self.packets_from_b += other.packets_from_b;
        self.acks_from_a.extend(other.acks_from_a);
        self.acks_from_b.extend(other.acks_from_b);
    }
}
