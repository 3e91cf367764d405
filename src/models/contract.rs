//! Contract models
//!
//! Describes contracts to deploy and the addresses they end up at.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A contract to upload and instantiate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractDescriptor {
    /// Logical name, unique within a [`ContractSet`]
    pub name: String,

    /// Path to the compiled wasm bytecode
    pub path: PathBuf,

    /// Instantiate message
    #[serde(default = "empty_object")]
    pub instantiate_args: serde_json::Value,

    /// Instantiate label, defaults to the logical name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

impl ContractDescriptor {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        instantiate_args: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            instantiate_args,
            label: None,
        }
    }

    #[cfg(test)]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label passed to instantiate
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Ordered set of contract descriptors keyed by logical name
///
/// Iteration follows insertion order so deployments are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractSet {
    contracts: Vec<ContractDescriptor>,
}

impl ContractSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor, rejecting duplicate names
    pub fn insert(&mut self, descriptor: ContractDescriptor) -> Result<()> {
        if self.get(&descriptor.name).is_some() {
            anyhow::bail!("Duplicate contract name: {}", descriptor.name);
        }
        self.contracts.push(descriptor);
        Ok(())
    }

    /// Builder-style insert
    #[cfg(test)]
    pub fn with(mut self, descriptor: ContractDescriptor) -> Result<Self> {
        self.insert(descriptor)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ContractDescriptor> {
        self.contracts.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContractDescriptor> {
        self.contracts.iter()
    }

    #[cfg(test)]
    pub fn names(&self) -> Vec<&str> {
        self.contracts.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// First duplicated name, if any (sets built through serde skip `insert`)
    pub fn find_duplicate(&self) -> Option<&str> {
        self.contracts.iter().enumerate().find_map(|(i, c)| {
            self.contracts[..i]
                .iter()
                .any(|prev| prev.name == c.name)
                .then_some(c.name.as_str())
        })
    }
}

/// One deployed contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub name: String,
    pub code_id: u64,
    pub address: String,
}

impl fmt::Display for DeployedContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {}) at {}", self.name, self.code_id, self.address)
    }
}

/// Name -> address mapping produced by a full deployment
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContracts {
    entries: Vec<DeployedContract>,
}

impl DeployedContracts {
    pub(crate) fn from_entries(entries: Vec<DeployedContract>) -> Self {
        Self { entries }
    }

    /// Address of a deployed contract
    pub fn address(&self, name: &str) -> Option<&str> {
        self.get(name).map(|c| c.address.as_str())
    }

    /// Code id of a deployed contract
    #[cfg(test)]
    pub fn code_id(&self, name: &str) -> Option<u64> {
        self.get(name).map(|c| c.code_id)
    }

    pub fn get(&self, name: &str) -> Option<&DeployedContract> {
        self.entries.iter().find(|c| c.name == name)
    }

    #[cfg(test)]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|c| c.name.as_str()).collect()
    }

    /// Name -> address view for logging and reports
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|c| (c.name.clone(), serde_json::Value::String(c.address.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}
