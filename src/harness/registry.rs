//! Contract upload and instantiation bookkeeping

use tracing::{debug, info, warn};

use super::error::HarnessError;
use crate::chain::ChainClient;
use crate::models::{ContractSet, DeployedContract, DeployedContracts};

/// Deploys contract sets through a single signing client
pub struct ContractRegistry<'a, C: ChainClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ChainClient + ?Sized> ContractRegistry<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Upload and instantiate every contract, in insertion order
    ///
    /// Fails fast on the first contract that cannot be deployed. Contracts
    /// deployed before the failure stay on chain but are not returned.
    pub async fn deploy_all(
        &self,
        contracts: &ContractSet,
    ) -> Result<DeployedContracts, HarnessError> {
        if let Some(name) = contracts.find_duplicate() {
            return Err(HarnessError::deployment(name, "duplicate logical name"));
        }

        if contracts.is_empty() {
            warn!("No contracts configured for {}", self.client.chain_id());
        }

        info!(
            "Deploying {} contract(s) on {}...",
            contracts.len(),
            self.client.chain_id()
        );

        let mut deployed = Vec::with_capacity(contracts.len());

        for descriptor in contracts.iter() {
            let name = descriptor.name.as_str();

            let wasm = tokio::fs::read(&descriptor.path).await.map_err(|e| {
                HarnessError::deployment(
                    name,
                    format!("cannot read {}: {e}", descriptor.path.display()),
                )
            })?;
            debug!("Read {} bytes of bytecode for {}", wasm.len(), name);

            let code_id = self
                .client
                .upload(&wasm, &format!("Upload {name}"))
                .await
                .map_err(|e| HarnessError::deployment(name, format!("upload failed: {e:#}")))?;

            let address = self
                .client
                .instantiate(code_id, &descriptor.instantiate_args, descriptor.label())
                .await
                .map_err(|e| {
                    HarnessError::deployment(name, format!("instantiate failed: {e:#}"))
                })?;

            if address.is_empty() {
                return Err(HarnessError::deployment(name, "chain returned an empty address"));
            }

            info!("  ✓ {} (code {}) at {}", name, code_id, address);
            deployed.push(DeployedContract {
                name: name.to_string(),
                code_id,
                address,
            });
        }

        Ok(DeployedContracts::from_entries(deployed))
    }

    /// IBC port bound to a deployed contract
    pub async fn port_of(&self, name: &str, address: &str) -> Result<String, HarnessError> {
        let info = self
            .client
            .contract_info(address)
            .await
            .map_err(|e| HarnessError::deployment(name, format!("contract info failed: {e:#}")))?;

        info.ibc_port_id
            .filter(|port| !port.is_empty())
            .ok_or_else(|| HarnessError::deployment(name, "contract has no IBC port"))
    }
}

/// Free-function form of [`ContractRegistry::deploy_all`]
pub async fn deploy_all<C: ChainClient + ?Sized>(
    client: &C,
    contracts: &ContractSet,
) -> Result<DeployedContracts, HarnessError> {
    ContractRegistry::new(client).deploy_all(contracts).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainQuery, Coin, ContractInfo, CounterContract, MockChain, TxResult};
    use crate::models::ContractDescriptor;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio_test::{assert_err, assert_ok};

    /// Client that accepts every upload but never reports an address
    struct NoAddressClient;

    #[async_trait]
    impl ChainQuery for NoAddressClient {
        async fn query_contract_smart(
            &self,
            _address: &str,
            _query: &Value,
        ) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }

        async fn contract_info(&self, address: &str) -> anyhow::Result<ContractInfo> {
            anyhow::bail!("Contract not found: {address}")
        }

        async fn balance(&self, _address: &str, denom: &str) -> anyhow::Result<Coin> {
            Ok(Coin::new(0, denom))
        }
    }

    #[async_trait]
    impl ChainClient for NoAddressClient {
        fn chain_id(&self) -> &str {
            "stub-1"
        }

        fn sender_address(&self) -> &str {
            "stub1sender"
        }

        async fn upload(&self, _wasm: &[u8], _memo: &str) -> anyhow::Result<u64> {
            Ok(1)
        }

        async fn instantiate(
            &self,
            _code_id: u64,
            _args: &Value,
            _label: &str,
        ) -> anyhow::Result<String> {
            Ok(String::new())
        }

        async fn execute(&self, _address: &str, _msg: &Value) -> anyhow::Result<TxResult> {
            anyhow::bail!("execute is not supported")
        }
    }

    fn bytecode() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\0asm counter").unwrap();
        file
    }

    fn chain() -> MockChain {
        MockChain::new("wasmd-1", "wasm").with_contract("counter", CounterContract::factory())
    }

    #[tokio::test]
    async fn test_deploy_all_returns_same_keys() {
        let wasm = bytecode();
        let chain = chain();
        let contracts = ContractSet::new()
            .with(ContractDescriptor::new("counter", wasm.path(), json!({"count": 0})))
            .unwrap();

        let deployed = assert_ok!(ContractRegistry::new(&chain).deploy_all(&contracts).await);

        assert_eq!(deployed.names(), vec!["counter"]);
        let address = deployed.address("counter").unwrap();
        assert!(!address.is_empty());
        assert_eq!(chain.upload_count(), 1);
        assert_eq!(chain.instantiate_count(), 1);
    }

    #[tokio::test]
    async fn test_deploy_all_preserves_insertion_order() {
        let wasm = bytecode();
        let chain = chain();
        let contracts = ContractSet::new()
            .with(
                ContractDescriptor::new("second", wasm.path(), json!({"count": 5}))
                    .with_label("counter"),
            )
            .unwrap()
            .with(
                ContractDescriptor::new("first", wasm.path(), json!({"count": 0}))
                    .with_label("counter"),
            )
            .unwrap();

        let deployed = ContractRegistry::new(&chain)
            .deploy_all(&contracts)
            .await
            .unwrap();

        assert_eq!(deployed.names(), vec!["second", "first"]);
        assert_eq!(deployed.code_id("second"), Some(1));
        assert_eq!(deployed.code_id("first"), Some(2));
    }

    #[tokio::test]
    async fn test_unreadable_bytecode_names_the_contract() {
        let chain = chain();
        let contracts = ContractSet::new()
            .with(ContractDescriptor::new(
                "counter",
                "/nonexistent/counter.wasm",
                json!({}),
            ))
            .unwrap();

        let err = assert_err!(ContractRegistry::new(&chain).deploy_all(&contracts).await);
        match err {
            HarnessError::Deployment { name, reason } => {
                assert_eq!(name, "counter");
                assert!(reason.contains("cannot read"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(chain.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_names_the_contract() {
        let empty = NamedTempFile::new().unwrap();
        let chain = chain();
        let contracts = ContractSet::new()
            .with(ContractDescriptor::new("counter", empty.path(), json!({"count": 0})))
            .unwrap();

        let err = assert_err!(ContractRegistry::new(&chain).deploy_all(&contracts).await);
        match err {
            HarnessError::Deployment { name, reason } => {
                assert_eq!(name, "counter");
                assert!(reason.contains("upload failed"));
                assert!(reason.contains("Empty wasm bytecode"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(chain.upload_count(), 0);
        assert_eq!(chain.instantiate_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_address_is_a_deployment_error() {
        let wasm = bytecode();
        let contracts = ContractSet::new()
            .with(ContractDescriptor::new("counter", wasm.path(), json!({"count": 0})))
            .unwrap();

        let err = assert_err!(deploy_all(&NoAddressClient, &contracts).await);
        match err {
            HarnessError::Deployment { name, reason } => {
                assert_eq!(name, "counter");
                assert!(reason.contains("empty address"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_instantiate_failure_is_fail_fast() {
        let wasm = bytecode();
        let chain = chain();
        let contracts = ContractSet::new()
            .with(ContractDescriptor::new("counter", wasm.path(), json!({"count": 0})))
            .unwrap()
            .with(ContractDescriptor::new("unknown", wasm.path(), json!({})))
            .unwrap()
            .with(ContractDescriptor::new("never", wasm.path(), json!({})).with_label("counter"))
            .unwrap();

        let err = ContractRegistry::new(&chain)
            .deploy_all(&contracts)
            .await
            .unwrap_err();

        assert!(matches!(err, HarnessError::Deployment { ref name, .. } if name == "unknown"));
        // the first contract stays deployed, the third is never attempted
        assert_eq!(chain.instantiate_count(), 1);
        assert_eq!(chain.upload_count(), 2);
    }

    #[tokio::test]
    async fn test_port_of_deployed_counter() {
        let wasm = bytecode();
        let chain = chain();
        let contracts = ContractSet::new()
            .with(ContractDescriptor::new("counter", wasm.path(), json!({"count": 0})))
            .unwrap();

        let registry = ContractRegistry::new(&chain);
        let deployed = registry.deploy_all(&contracts).await.unwrap();
        let address = deployed.address("counter").unwrap();

        let port = registry.port_of("counter", address).await.unwrap();
        assert_eq!(port, format!("wasm.{address}"));

        assert!(registry.port_of("counter", "wasm1missing").await.is_err());
    }
}
