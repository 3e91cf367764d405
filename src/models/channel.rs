//! IBC channel models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a two-chain link
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Channel ordering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ordering {
    #[default]
    Unordered,
    Ordered,
}

impl Ordering {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unordered" | "order_unordered" => Some(Ordering::Unordered),
            "ordered" | "order_ordered" => Some(Ordering::Ordered),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Ordering::Unordered => "ORDER_UNORDERED",
            Ordering::Ordered => "ORDER_ORDERED",
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One end of a channel
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelEnd {
    pub port_id: String,
    pub channel_id: String,
}

impl ChannelEnd {
    pub fn new(port_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            port_id: port_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

impl fmt::Display for ChannelEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port_id, self.channel_id)
    }
}

/// Channel as reported by a relayer once the handshake completed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub src: ChannelEnd,
    pub dest: ChannelEnd,
    pub ordering: Ordering,
    pub version: String,
}

/// A channel brought up by the harness
///
/// `own` is the side the handshake was initiated from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    pub own: ChannelEnd,
    pub counterparty: ChannelEnd,
    pub ordering: Ordering,
    pub version: String,
}

impl From<ChannelInfo> for ChannelDescriptor {
    fn from(info: ChannelInfo) -> Self {
        Self {
            own: info.src,
            counterparty: info.dest,
            ordering: info.ordering,
            version: info.version,
        }
    }
}

impl fmt::Display for ChannelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <-> {} ({}, {})",
            self.own, self.counterparty, self.ordering, self.version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::A.opposite(), Side::B);
        assert_eq!(Side::B.opposite(), Side::A);
    }

    #[test]
    fn test_ordering_from_str() {
        assert_eq!(Ordering::from_str("unordered"), Some(Ordering::Unordered));
        assert_eq!(Ordering::from_str("ORDER_ORDERED"), Some(Ordering::Ordered));
        assert_eq!(Ordering::from_str("sorted"), None);
    }

    #[test]
    fn test_descriptor_from_info() {
        let info = ChannelInfo {
            src: ChannelEnd::new("wasm.counter", "channel-0"),
            dest: ChannelEnd::new("osmo.counter", "channel-3"),
            ordering: Ordering::Unordered,
            version: "counter-1".to_string(),
        };

        let descriptor = ChannelDescriptor::from(info);
        assert_eq!(descriptor.own.channel_id, "channel-0");
        assert_eq!(descriptor.counterparty.channel_id, "channel-3");
        assert_eq!(
            descriptor.to_string(),
            "wasm.counter/channel-0 <-> osmo.counter/channel-3 (ORDER_UNORDERED, counter-1)"
        );
    }
}
