//! Scenario execution runner
//!
//! Manages the execution of end-to-end scenarios.

use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::HarnessConfig;
use crate::harness::HarnessError;
use crate::models::{RunSummary, Scenario, ScenarioResult};
use crate::scenarios::{self, ScenarioContext};

/// Sequential scenario runner
pub struct ScenarioRunner {
    config: HarnessConfig,
    skip: Vec<Scenario>,
}

impl ScenarioRunner {
    /// Create a new scenario runner
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            skip: Vec::new(),
        }
    }

    /// Skip scenarios
    pub fn with_skip(mut self, skip: Vec<Scenario>) -> Self {
        self.skip = skip;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run a single scenario
    ///
    /// Failed assertions are reported as FAIL, every other error as ERROR.
    pub async fn run_scenario(&self, scenario: Scenario) -> ScenarioResult {
        if self.skip.contains(&scenario) {
            return ScenarioResult::skip(scenario, "Skipped by configuration");
        }

        info!("Running {}", scenario);

        let mut ctx = ScenarioContext::new(&self.config);
        let outcome = scenarios::run(scenario, &mut ctx).await;
        let duration_ms = ctx.elapsed_ms();
        debug!("{} timings:\n{}", scenario, ctx.timings());

        let result = match outcome {
            Ok(details) => ScenarioResult::pass(scenario, duration_ms).with_details(details),
            Err(e) => match e.downcast_ref::<HarnessError>() {
                Some(HarnessError::Assertion(message)) => {
                    warn!("{} failed: {}", scenario, message);
                    ScenarioResult::fail(scenario, duration_ms, message.clone())
                }
                other => {
                    let kind = other.map(HarnessError::kind).unwrap_or("unexpected");
                    error!("{} failed with {} error: {:#}", scenario, kind, e);
                    ScenarioResult::error(scenario, duration_ms, format!("{e:#}"))
                }
            },
        };

        result.with_stages(ctx.stages())
    }

    /// Run all scenarios sequentially
    pub async fn run_all(&self) -> RunSummary {
        self.run_scenarios(&Scenario::all()).await
    }

    /// Run specific scenarios
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> RunSummary {
        info!(
            "Running {} scenario(s) on {}",
            scenarios.len(),
            self.config.network_name()
        );

        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());

        for &scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            info!("  {}", result);
            results.push(result);
        }

        let summary = RunSummary::new(self.config.network_name(), results);

        info!(
            "Run completed in {}ms - Pass: {}/{} ({:.1}%)",
            start.elapsed().as_millis(),
            summary.passed,
            summary.total,
            summary.pass_rate()
        );

        summary
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::models::{ContractDescriptor, ScenarioStatus};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config(wasm: &NamedTempFile) -> HarnessConfig {
        HarnessConfig::default()
            .with_contract_on_both(ContractDescriptor::new(
                "counter",
                wasm.path(),
                json!({ "count": 0 }),
            ))
            .unwrap()
    }

    fn wasm() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\0asm").unwrap();
        file
    }

    #[tokio::test]
    async fn test_run_all_passes() {
        let wasm = wasm();
        let summary = ScenarioRunner::new(config(&wasm)).run_all().await;

        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 4, "{summary}");
        assert!(summary.is_all_passed());
        assert_eq!(summary.network, "wasmd <-> osmosis");
        assert_eq!(summary.results[0].stages.len(), 5);
    }

    #[tokio::test]
    async fn test_skip() {
        let wasm = wasm();
        let runner = ScenarioRunner::new(config(&wasm)).with_skip(vec![Scenario::CounterSync]);

        let result = runner.run_scenario(Scenario::CounterSync).await;
        assert_eq!(result.status, ScenarioStatus::Skip);
    }

    #[tokio::test]
    async fn test_missing_bytecode_is_an_error() {
        let config = HarnessConfig::default()
            .with_contract_on_both(ContractDescriptor::new(
                "counter",
                "/nonexistent/ibc_counter.wasm",
                json!({}),
            ))
            .unwrap();

        let result = ScenarioRunner::new(config)
            .run_scenario(Scenario::CounterSync)
            .await;
        assert_eq!(result.status, ScenarioStatus::Error);
        assert!(result.message.unwrap().contains("counter"));
        assert!(result.stages.is_empty());
    }

    #[tokio::test]
    async fn test_count_mismatch_is_a_failure() {
        // chain B starts at 5 instead of 0
        let wasm = wasm();
        let mut config = config(&wasm);
        let mut contracts = crate::models::ContractSet::new();
        contracts
            .insert(ContractDescriptor::new("counter", wasm.path(), json!({ "count": 5 })))
            .unwrap();
        config.chains.b.contracts = contracts;

        let result = ScenarioRunner::new(config)
            .run_scenario(Scenario::CounterSync)
            .await;
        assert_eq!(result.status, ScenarioStatus::Fail);
        assert!(result.message.unwrap().contains("Expected"));
    }
}
