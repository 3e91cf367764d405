//! LCD (REST) query client
//!
//! Read-only access to live chains through the Cosmos SDK REST gateway.
//! Transactions are never signed here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use super::{ChainQuery, Coin, ContractInfo};

/// LCD client errors
#[derive(Error, Debug)]
pub enum LcdError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("LCD returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

#[derive(Deserialize)]
struct SmartQueryResponse {
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct ContractResponse {
    address: String,
    contract_info: RawContractInfo,
}

#[derive(Deserialize)]
struct RawContractInfo {
    code_id: String,
    creator: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    ibc_port_id: Option<String>,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: RawCoin,
}

#[derive(Deserialize)]
struct RawCoin {
    denom: String,
    amount: String,
}

/// REST client for a single chain's LCD endpoint
#[derive(Clone)]
pub struct LcdClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl LcdClient {
    /// Create a client with a 30 second timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create LCD client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /cosmwasm/wasm/v1/contract/{addr}/smart/{query}`
    ///
    /// The query is URL-safe base64 so it survives as a path segment.
    pub fn smart_query_url(&self, address: &str, query: &serde_json::Value) -> String {
        format!(
            "{}/cosmwasm/wasm/v1/contract/{}/smart/{}",
            self.base_url,
            address,
            URL_SAFE.encode(query.to_string())
        )
    }

    pub fn contract_url(&self, address: &str) -> String {
        format!("{}/cosmwasm/wasm/v1/contract/{}", self.base_url, address)
    }

    pub fn balance_url(&self, address: &str, denom: &str) -> String {
        format!(
            "{}/cosmos/bank/v1beta1/balances/{}/by_denom?denom={}",
            self.base_url, address, denom
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, LcdError> {
        debug!("GET {}", url);
        let start = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                LcdError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                LcdError::ConnectionRefused(url.to_string())
            } else {
                LcdError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LcdError::RequestFailed(e.to_string()))?;

        debug!(
            "Response: {} in {}ms",
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(LcdError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| LcdError::InvalidResponse(e.to_string()))
    }
}

fn parse_contract_info(response: ContractResponse) -> Result<ContractInfo, LcdError> {
    let raw_code_id = &response.contract_info.code_id;
    let code_id = raw_code_id
        .parse()
        .map_err(|_| LcdError::InvalidResponse(format!("code_id {raw_code_id}")))?;

    Ok(ContractInfo {
        address: response.address,
        code_id,
        creator: response.contract_info.creator,
        label: response.contract_info.label,
        ibc_port_id: response.contract_info.ibc_port_id.filter(|p| !p.is_empty()),
    })
}

fn parse_coin(raw: RawCoin) -> Result<Coin, LcdError> {
    let amount = raw
        .amount
        .parse()
        .map_err(|_| LcdError::InvalidResponse(format!("amount {}", raw.amount)))?;
    Ok(Coin::new(amount, raw.denom))
}

#[async_trait]
impl ChainQuery for LcdClient {
    async fn query_contract_smart(
        &self,
        address: &str,
        query: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let response: SmartQueryResponse = self
            .get_json(&self.smart_query_url(address, query))
            .await
            .with_context(|| format!("Smart query against {address} failed"))?;
        Ok(response.data)
    }

    async fn contract_info(&self, address: &str) -> Result<ContractInfo> {
        let response: ContractResponse = self
            .get_json(&self.contract_url(address))
            .await
            .with_context(|| format!("Contract info for {address} failed"))?;
        Ok(parse_contract_info(response)?)
    }

    async fn balance(&self, address: &str, denom: &str) -> Result<Coin> {
        let response: BalanceResponse = self
            .get_json(&self.balance_url(address, denom))
            .await
            .with_context(|| format!("Balance of {address} failed"))?;
        Ok(parse_coin(response.balance)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urls() {
        let client = LcdClient::with_timeout("https://lcd.osmotest5.osmosis.zone/", 30).unwrap();
        assert_eq!(client.base_url(), "https://lcd.osmotest5.osmosis.zone");

        assert_eq!(
            client.contract_url("osmo1abc"),
            "https://lcd.osmotest5.osmosis.zone/cosmwasm/wasm/v1/contract/osmo1abc"
        );
        assert_eq!(
            client.balance_url("osmo1abc", "uausdc"),
            "https://lcd.osmotest5.osmosis.zone/cosmos/bank/v1beta1/balances/osmo1abc/by_denom?denom=uausdc"
        );

        let url = client.smart_query_url("osmo1abc", &json!({"get_count": {}}));
        let encoded = url.rsplit('/').next().unwrap();
        let decoded = URL_SAFE.decode(encoded).unwrap();
        assert_eq!(decoded, br#"{"get_count":{}}"#);
    }

    #[test]
    fn test_parse_contract_info() {
        let response: ContractResponse = serde_json::from_value(json!({
            "address": "wasm1contract",
            "contract_info": {
                "code_id": "12",
                "creator": "wasm1creator",
                "admin": "",
                "label": "counter",
                "ibc_port_id": "wasm.wasm1contract"
            }
        }))
        .unwrap();

        let info = parse_contract_info(response).unwrap();
        assert_eq!(info.code_id, 12);
        assert_eq!(info.ibc_port_id.as_deref(), Some("wasm.wasm1contract"));
    }

    #[test]
    fn test_parse_contract_without_port() {
        let response: ContractResponse = serde_json::from_value(json!({
            "address": "wasm1contract",
            "contract_info": {"code_id": "1", "creator": "wasm1creator", "ibc_port_id": ""}
        }))
        .unwrap();

        assert_eq!(parse_contract_info(response).unwrap().ibc_port_id, None);
    }

    #[test]
    fn test_parse_coin() {
        let coin = parse_coin(RawCoin {
            denom: "uosmo".to_string(),
            amount: "4000000".to_string(),
        })
        .unwrap();
        assert_eq!(coin, Coin::new(4_000_000, "uosmo"));

        assert!(parse_coin(RawCoin {
            denom: "uosmo".to_string(),
            amount: "lots".to_string(),
        })
        .is_err());
    }
}
