//! Relayer collaborator interface
//!
//! A link joins two chains over an existing connection. It opens channels
//! and relays every pending packet and acknowledgement in both directions.

mod mock;

pub use mock::{LinkConfig, MockLink};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::{ChannelInfo, Ordering, RelayOutcome, Side};

/// Relayer link errors
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("{chain_id} rejected channel open on {port_id}: {reason}")]
    HandshakeRejected {
        chain_id: String,
        port_id: String,
        reason: String,
    },

    #[error("Handshake did not complete within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Chain(#[from] anyhow::Error),
}

#[async_trait]
pub trait RelayerLink: Send + Sync {
    /// Open a channel from `side`'s `local_port` to the other side's `remote_port`
    async fn create_channel(
        &self,
        side: Side,
        local_port: &str,
        remote_port: &str,
        ordering: Ordering,
        version: &str,
    ) -> Result<ChannelInfo, LinkError>;

    /// Relay all pending packets and their acknowledgements
    async fn relay_all(&self) -> Result<RelayOutcome, LinkError>;
}
