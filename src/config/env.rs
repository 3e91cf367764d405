//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "IBC_HARNESS";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Config file from IBC_HARNESS_CONFIG
    pub config_file: Option<String>,
    /// Channel version from IBC_HARNESS_VERSION
    pub version: Option<String>,
    /// Channel ordering from IBC_HARNESS_ORDERING
    pub ordering: Option<String>,
    /// Handshake timeout from IBC_HARNESS_TIMEOUT
    pub timeout: Option<u64>,
    /// Output format from IBC_HARNESS_FORMAT
    pub format: Option<String>,
    /// Log level from IBC_HARNESS_LOG
    pub log: Option<String>,
    /// LCD endpoint from IBC_HARNESS_LCD_URL
    pub lcd_url: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            config_file: get_env("CONFIG"),
            version: get_env("VERSION"),
            ordering: get_env("ORDERING"),
            timeout: get_env_parse("TIMEOUT"),
            format: get_env("FORMAT"),
            log: get_env("LOG"),
            lcd_url: get_env("LCD_URL"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.config_file.is_some()
            || self.version.is_some()
            || self.ordering.is_some()
            || self.timeout.is_some()
            || self.format.is_some()
            || self.log.is_some()
            || self.lcd_url.is_some()
    }

    /// Get output format with fallback
    pub fn format_or(&self, default: &str) -> String {
        self.format.clone().unwrap_or_else(|| default.to_string())
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_CONFIG:      {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_VERSION:     {:?}", ENV_PREFIX, self.version);
        println!("  {}_ORDERING:    {:?}", ENV_PREFIX, self.ordering);
        println!("  {}_TIMEOUT:     {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_FORMAT:      {:?}", ENV_PREFIX, self.format);
        println!("  {}_LOG:         {:?}", ENV_PREFIX, self.log);
        println!("  {}_LCD_URL:     {:?}", ENV_PREFIX, self.lcd_url);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Builder for setting environment variables in tests
#[cfg(test)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    /// Create a new environment builder
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    pub fn version(self, version: impl Into<String>) -> Self {
        self.var("VERSION", version)
    }

    pub fn ordering(self, ordering: impl Into<String>) -> Self {
        self.var("ORDERING", ordering)
    }

    pub fn timeout(self, timeout: u64) -> Self {
        self.var("TIMEOUT", timeout.to_string())
    }

    pub fn format(self, format: impl Into<String>) -> Self {
        self.var("FORMAT", format)
    }

    pub fn lcd_url(self, url: impl Into<String>) -> Self {
        self.var("LCD_URL", url)
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

#[cfg(test)]
impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all IBC_HARNESS environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_CONFIG       Path to configuration file");
    println!("  {ENV_PREFIX}_VERSION      IBC channel version (default counter-1)");
    println!("  {ENV_PREFIX}_ORDERING     Channel ordering (unordered, ordered)");
    println!("  {ENV_PREFIX}_TIMEOUT      Channel handshake timeout in seconds");
    println!("  {ENV_PREFIX}_FORMAT       Output format (table, json, csv)");
    println!("  {ENV_PREFIX}_LOG          Log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_LCD_URL      LCD endpoint for queries");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_LCD_URL=https://lcd.osmotest5.osmosis.zone");
    println!("  ibc-harness query balance osmo1... --denom uosmo");
}
