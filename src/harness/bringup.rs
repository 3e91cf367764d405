//! Channel bring-up over an existing connection

use tracing::info;

use super::error::HarnessError;
use crate::models::{ChannelDescriptor, Ordering, Side};
use crate::relayer::{LinkError, RelayerLink};

/// Opens channels through a relayer link
pub struct ChannelBringup<'a, L: RelayerLink + ?Sized> {
    link: &'a L,
}

impl<'a, L: RelayerLink + ?Sized> ChannelBringup<'a, L> {
    pub fn new(link: &'a L) -> Self {
        Self { link }
    }

    /// Run one channel-open handshake from `side` and wait for both ends
    ///
    /// The link's own timeout applies. A channel that came up with a
    /// different version than requested counts as a failed handshake.
    pub async fn create_channel(
        &self,
        side: Side,
        local_port: &str,
        remote_port: &str,
        ordering: Ordering,
        version: &str,
    ) -> Result<ChannelDescriptor, HarnessError> {
        let handshake_error = |reason: String| HarnessError::Handshake {
            local_port: local_port.to_string(),
            remote_port: remote_port.to_string(),
            reason,
        };

        let info = self
            .link
            .create_channel(side, local_port, remote_port, ordering, version)
            .await
            .map_err(|e| match e {
                LinkError::Timeout(after) => HarnessError::Timeout(after),
                LinkError::HandshakeRejected { .. } => handshake_error(e.to_string()),
                LinkError::Chain(inner) => handshake_error(format!("{inner:#}")),
            })?;

        if info.version != version {
            return Err(handshake_error(format!(
                "version negotiated to '{}', expected '{}'",
                info.version, version
            )));
        }

        let descriptor = ChannelDescriptor::from(info);
        info!("Channel open: {}", descriptor);
        Ok(descriptor)
    }
}

/// Free-function form of [`ChannelBringup::create_channel`]
pub async fn create_channel<L: RelayerLink + ?Sized>(
    link: &L,
    side: Side,
    local_port: &str,
    remote_port: &str,
    ordering: Ordering,
    version: &str,
) -> Result<ChannelDescriptor, HarnessError> {
    ChannelBringup::new(link)
        .create_channel(side, local_port, remote_port, ordering, version)
        .await
}
