//! Packet flow scenarios
//!
//! Scenarios 1-3: Counter Sync, Reverse Counter Sync, Error Acknowledgement

use anyhow::Result;
use serde_json::{json, Value};
use tracing::info;

use super::ScenarioContext;
use crate::chain::{ChainClient, ChainQuery};
use crate::harness::ack::decode;
use crate::harness::{expect_relayed, parse_ack_success, HarnessError};
use crate::models::Side;
use crate::relayer::RelayerLink;

/// Scenario 1: increment on A, relay, both counters read 1
pub async fn counter_sync(ctx: &mut ScenarioContext<'_>) -> Result<Value> {
    sync_from(ctx, Side::A).await
}

/// Scenario 2: increment on B, relay, A follows
pub async fn reverse_counter_sync(ctx: &mut ScenarioContext<'_>) -> Result<Value> {
    sync_from(ctx, Side::B).await
}

async fn sync_from(ctx: &mut ScenarioContext<'_>, from: Side) -> Result<Value> {
    let to = from.opposite();

    let counters = ctx.deploy_counters().await?;
    ctx.stage("deploy");

    let version = ctx.config.ibc.version.clone();
    let channel = ctx.open_channel(&counters, from, &version).await?;
    ctx.stage("channel");

    info!("Incrementing counter on chain {}", from);
    ctx.network
        .chain(from)
        .execute(counters.address(from), &json!({ "increment": {} }))
        .await?;
    ctx.expect_count(&counters, from, 1).await?;
    // not relayed yet
    ctx.expect_count(&counters, to, 0).await?;
    ctx.stage("trigger");

    let outcome = ctx.link.relay_all().await?;
    ctx.stage("relay");

    expect_relayed(&outcome, from, 1, true)?;
    let ack = parse_ack_success(&outcome.acks_from(to)[0])?;
    if ack != json!({ "count": 1 }) {
        return Err(HarnessError::assertion(format!(
            "Expected ack payload {{\"count\":1}}, got {ack}"
        ))
        .into());
    }
    ctx.expect_count(&counters, from, 1).await?;
    ctx.expect_count(&counters, to, 1).await?;
    ctx.stage("assert");

    Ok(json!({
        "contracts": {
            "a": counters.deployed_a.to_json(),
            "b": counters.deployed_b.to_json(),
        },
        "channel": channel,
        "ack": ack,
    }))
}

/// Scenario 3: a packet the counterparty cannot handle comes back as an
/// error acknowledgement
pub async fn error_acknowledgement(ctx: &mut ScenarioContext<'_>) -> Result<Value> {
    let counters = ctx.deploy_counters().await?;
    ctx.stage("deploy");

    let version = ctx.config.ibc.version.clone();
    let channel = ctx.open_channel(&counters, Side::A, &version).await?;
    ctx.stage("channel");

    ctx.network
        .a
        .execute(
            counters.address(Side::A),
            &json!({ "send_packet": { "data": { "decrement": {} } } }),
        )
        .await?;
    ctx.stage("trigger");

    let outcome = ctx.link.relay_all().await?;
    ctx.stage("relay");

    expect_relayed(&outcome, Side::A, 1, false)?;
    let decoded = decode(&outcome.acks_from_b[0])?;
    let error = decoded.error().unwrap_or_default().to_string();
    if !error.contains("unknown packet") {
        return Err(HarnessError::assertion(format!(
            "Expected an 'unknown packet' error ack, got '{error}'"
        ))
        .into());
    }

    // the sender saw the error ack, the receiver did not count anything
    let acks = ctx
        .network
        .a
        .query_contract_smart(counters.address(Side::A), &json!({ "get_acks": {} }))
        .await?;
    if acks != json!({ "success": 0, "error": 1 }) {
        return Err(HarnessError::assertion(format!(
            "Expected one error ack recorded on chain A, got {acks}"
        ))
        .into());
    }
    ctx.expect_count(&counters, Side::B, 0).await?;
    ctx.stage("assert");

    Ok(json!({
        "channel": channel,
        "error": error,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::fixtures::{counter_config, counter_wasm};
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_counter_sync() {
        let wasm = counter_wasm();
        let config = counter_config(&wasm);
        let mut ctx = ScenarioContext::new(&config);

        let details = assert_ok!(counter_sync(&mut ctx).await);
        assert_eq!(details["ack"], json!({"count": 1}));
        assert_eq!(details["channel"]["version"], "counter-1");
        assert_eq!(details["channel"]["ordering"], "unordered");

        let stages: Vec<_> = ctx.stages().into_iter().map(|s| s.stage).collect();
        assert_eq!(stages, vec!["deploy", "channel", "trigger", "relay", "assert"]);
    }

    #[tokio::test]
    async fn test_reverse_counter_sync() {
        let wasm = counter_wasm();
        let config = counter_config(&wasm);
        let mut ctx = ScenarioContext::new(&config);

        let details = assert_ok!(reverse_counter_sync(&mut ctx).await);
        let own_port = details["channel"]["own"]["port_id"].as_str().unwrap();
        assert!(own_port.starts_with("wasm.osmo1"));
    }

    #[tokio::test]
    async fn test_error_acknowledgement() {
        let wasm = counter_wasm();
        let config = counter_config(&wasm);
        let mut ctx = ScenarioContext::new(&config);

        let details = assert_ok!(error_acknowledgement(&mut ctx).await);
        assert!(details["error"]
            .as_str()
            .unwrap()
            .starts_with("unknown packet"));
    }

    #[tokio::test]
    async fn test_unsupported_configured_version_fails_handshake() {
        let wasm = counter_wasm();
        let mut config = counter_config(&wasm);
        config.ibc.version = "counter-2".to_string();
        let mut ctx = ScenarioContext::new(&config);

        let err = counter_sync(&mut ctx).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Handshake { .. })
        ));
    }
}
