//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{Context, Result};
use reqwest::Url;
use serde_json::json;
use std::path::{Path, PathBuf};

use super::{EnvConfig, HarnessConfig};
use crate::models::ContractDescriptor;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./ibc-harness.yaml",
    "./ibc-harness.yml",
    "./.ibc-harness.yaml",
    "./.ibc-harness/config.yaml",
    "~/.config/ibc-harness/config.yaml",
    "~/.ibc-harness.yaml",
];

/// Supported config file format versions
const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Path of the bundled counter contract in the example config
const COUNTER_WASM: &str = "./artifacts/ibc_counter.wasm";

fn validate_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).with_context(|| format!("'{url}' is not a URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("'{url}' must use http or https");
    }
    Ok(())
}

/// Gas price such as `0.025uosmo`, denominated in the fee denom
fn validate_min_fee(min_fee: &str, fee_denom: &str) -> Result<()> {
    let amount = min_fee
        .strip_suffix(fee_denom)
        .with_context(|| format!("'{min_fee}' is not denominated in {fee_denom}"))?;
    match amount.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(()),
        _ => anyhow::bail!("'{min_fee}' does not start with a decimal gas price"),
    }
}

/// Loading and saving of [`HarnessConfig`] files
pub struct ConfigFile;

impl ConfigFile {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<HarnessConfig> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(HarnessConfig::new()),
        }
    }

    /// Resolve the config file from an explicit path, the environment or the
    /// standard locations, then apply environment overrides
    pub fn resolve(explicit: Option<&str>, env: &EnvConfig) -> Result<HarnessConfig> {
        let mut config = match explicit.or(env.config_file.as_deref()) {
            Some(path) => Self::load(path)?,
            None => Self::load_default()?,
        };
        config.apply_env(env)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<HarnessConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: HarnessConfig = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        Self::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(config: &HarnessConfig, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(config).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(config).context("Failed to serialize config")?
        };

        // Create parent directory if needed
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(config: &HarnessConfig) -> Result<()> {
        if !SUPPORTED_VERSIONS.contains(&config.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", config.version);
        }

        if config.ibc.version.is_empty() {
            anyhow::bail!("IBC channel version must not be empty");
        }

        if config.relayer.handshake_timeout_secs == 0 {
            anyhow::bail!("relayer.handshake_timeout_secs must be greater than 0");
        }

        if config.chains.a.chain_id == config.chains.b.chain_id {
            anyhow::bail!(
                "Both chains use chain id '{}'; a link needs two distinct chains",
                config.chains.a.chain_id
            );
        }

        for chain in [&config.chains.a, &config.chains.b] {
            if chain.prefix.is_empty() {
                anyhow::bail!("Chain '{}' has an empty address prefix", chain.name);
            }
            for (field, url) in [("rpc_url", &chain.rpc_url), ("lcd_url", &chain.lcd_url)] {
                validate_url(url)
                    .with_context(|| format!("Chain '{}' has an invalid {field}", chain.name))?;
            }
            validate_min_fee(&chain.min_fee, &chain.fee_denom)
                .with_context(|| format!("Chain '{}' has an invalid min_fee", chain.name))?;
            if let Some(name) = chain.contracts.find_duplicate() {
                anyhow::bail!("Duplicate contract '{}' on chain '{}'", name, chain.name);
            }
            for contract in chain.contracts.iter() {
                if contract.path.as_os_str().is_empty() {
                    anyhow::bail!(
                        "Contract '{}' on chain '{}' has an empty bytecode path",
                        contract.name,
                        chain.name
                    );
                }
            }
        }

        Ok(())
    }

    /// Generate example configuration
    ///
    /// Deploys the counter contract on both chains, as the packet scenarios
    /// expect.
    pub fn example() -> Result<HarnessConfig> {
        HarnessConfig::default().with_contract_on_both(ContractDescriptor::new(
            "counter",
            COUNTER_WASM,
            json!({ "count": 0 }),
        ))
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ordering;
    use tempfile::tempdir;

    #[test]
    fn test_example_config() {
        let config = ConfigFile::example().unwrap();
        assert_eq!(config.chains.a.contracts.names(), vec!["counter"]);
        assert_eq!(config.chains.b.contracts.names(), vec!["counter"]);
        assert!(ConfigFile::validate(&config).is_ok());
    }

    #[test]
    fn test_config_file_save_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = ConfigFile::example().unwrap();
        ConfigFile::save(&config, &path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_file_save_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = ConfigFile::example().unwrap();
        config.ibc.ordering = Ordering::Ordered;
        ConfigFile::save(&config, &path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.ibc.ordering, Ordering::Ordered);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.yaml");
        std::fs::write(
            &path,
            "version: \"1.0\"\nibc:\n  version: counter-1\n  ordering: unordered\n",
        )
        .unwrap();

        let config = ConfigFile::load(&path).unwrap();
        assert_eq!(config.chains.b.prefix, "osmo");
        assert_eq!(config.relayer.handshake_timeout_secs, 30);
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut config = HarnessConfig::default();
        config.version = "9.9".to_string();
        assert!(ConfigFile::validate(&config).is_err());

        let mut config = HarnessConfig::default();
        config.chains.b.chain_id = config.chains.a.chain_id.clone();
        assert!(ConfigFile::validate(&config).is_err());

        let mut config = HarnessConfig::default();
        config.relayer.handshake_timeout_secs = 0;
        assert!(ConfigFile::validate(&config).is_err());

        let config = HarnessConfig::default()
            .with_contract_on_both(ContractDescriptor::new("counter", "", json!({})))
            .unwrap();
        assert!(ConfigFile::validate(&config).is_err());
    }

    #[test]
    fn test_validate_endpoints_and_fees() {
        assert!(ConfigFile::validate(&HarnessConfig::default()).is_ok());

        let mut config = HarnessConfig::default();
        config.chains.a.rpc_url = "localhost:26659".to_string();
        let err = ConfigFile::validate(&config).unwrap_err();
        assert!(format!("{err:#}").contains("invalid rpc_url"));

        let mut config = HarnessConfig::default();
        config.chains.b.lcd_url = "ftp://localhost:1318".to_string();
        let err = ConfigFile::validate(&config).unwrap_err();
        assert!(format!("{err:#}").contains("must use http or https"));

        let mut config = HarnessConfig::default();
        config.chains.b.min_fee = "0.025ucosm".to_string();
        let err = ConfigFile::validate(&config).unwrap_err();
        assert!(format!("{err:#}").contains("not denominated in uosmo"));

        let mut config = HarnessConfig::default();
        config.chains.a.min_fee = "cheapucosm".to_string();
        assert!(ConfigFile::validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_contracts_from_file_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup.json");
        let config = json!({
            "version": "1.0",
            "chains": {
                "a": {
                    "name": "wasmd", "chain_id": "testing", "prefix": "wasm",
                    "rpc_url": "http://localhost:26659", "lcd_url": "http://localhost:1317",
                    "fee_denom": "ucosm", "min_fee": "0.025ucosm", "faucet_amount": 4000000,
                    "contracts": [
                        {"name": "counter", "path": "a.wasm"},
                        {"name": "counter", "path": "b.wasm"}
                    ]
                },
                "b": {
                    "name": "osmosis", "chain_id": "osmo-testing", "prefix": "osmo",
                    "rpc_url": "http://localhost:26653", "lcd_url": "http://localhost:1318",
                    "fee_denom": "uosmo", "min_fee": "0.025uosmo", "faucet_amount": 4000000
                }
            }
        });
        std::fs::write(&path, config.to_string()).unwrap();

        let err = ConfigFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("Duplicate contract 'counter'"));
    }

    #[test]
    fn test_resolve_explicit_path_with_env() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        ConfigFile::save(&ConfigFile::example().unwrap(), &path).unwrap();

        let env = EnvConfig {
            timeout: Some(7),
            ..Default::default()
        };
        let config = ConfigFile::resolve(path.to_str(), &env).unwrap();
        assert_eq!(config.relayer.handshake_timeout_secs, 7);
    }

    #[test]
    fn test_expand_path() {
        let path = expand_path("./test.yaml");
        assert_eq!(path, PathBuf::from("./test.yaml"));
    }
}
