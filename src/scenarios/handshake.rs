//! Channel handshake scenarios
//!
//! Scenario 4: Handshake Rejected

use anyhow::Result;
use serde_json::{json, Value};
use tracing::info;

use super::ScenarioContext;
use crate::harness::HarnessError;
use crate::models::Side;

/// A version no counter contract speaks
const UNSUPPORTED_VERSION: &str = "counter-0";

/// Scenario 4: opening a channel with an unsupported version must fail and
/// leave no channel behind
pub async fn handshake_rejected(ctx: &mut ScenarioContext<'_>) -> Result<Value> {
    let counters = ctx.deploy_counters().await?;
    ctx.stage("deploy");

    let rejection = match ctx
        .open_channel(&counters, Side::A, UNSUPPORTED_VERSION)
        .await
    {
        Err(HarnessError::Handshake { reason, .. }) => reason,
        Err(other) => return Err(other.into()),
        Ok(channel) => {
            return Err(HarnessError::assertion(format!(
                "Channel {channel} opened with unsupported version {UNSUPPORTED_VERSION}"
            ))
            .into())
        }
    };
    info!("Handshake rejected as expected: {}", rejection);
    ctx.stage("channel");

    if ctx.link.channel_count() != 0 {
        return Err(HarnessError::assertion("Rejected handshake left an open channel").into());
    }
    ctx.stage("assert");

    Ok(json!({
        "version": UNSUPPORTED_VERSION,
        "rejection": rejection,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::fixtures::{counter_config, counter_wasm};

    #[tokio::test]
    async fn test_handshake_rejected() {
        let wasm = counter_wasm();
        let config = counter_config(&wasm);
        let mut ctx = ScenarioContext::new(&config);

        let details = handshake_rejected(&mut ctx).await.unwrap();
        assert_eq!(details["version"], UNSUPPORTED_VERSION);
        assert!(details["rejection"]
            .as_str()
            .unwrap()
            .contains("invalid channel version"));
    }
}
