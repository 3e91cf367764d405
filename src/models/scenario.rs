//! Scenario result models
//!
//! Defines the end-to-end scenarios, their results and run summaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// End-to-end scenarios exercised against a two-chain network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    // Packet flow (1-3)
    CounterSync,
    ReverseCounterSync,
    ErrorAcknowledgement,

    // Channel handshake (4)
    HandshakeRejected,
}

impl Scenario {
    /// Scenario number (1-4)
    pub fn number(&self) -> u8 {
        match self {
            Scenario::CounterSync => 1,
            Scenario::ReverseCounterSync => 2,
            Scenario::ErrorAcknowledgement => 3,
            Scenario::HandshakeRejected => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::CounterSync => "Counter Sync",
            Scenario::ReverseCounterSync => "Reverse Counter Sync",
            Scenario::ErrorAcknowledgement => "Error Acknowledgement",
            Scenario::HandshakeRejected => "Handshake Rejected",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Scenario::HandshakeRejected => "Handshake",
            _ => "Packet",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::CounterSync => {
                "Increment the counter on chain A, relay, both counters read 1"
            }
            Scenario::ReverseCounterSync => {
                "Increment the counter on chain B, relay, chain A follows"
            }
            Scenario::ErrorAcknowledgement => {
                "Send a packet the counterparty cannot handle and expect an error ack"
            }
            Scenario::HandshakeRejected => {
                "Open a channel with an unsupported version and expect a rejection"
            }
        }
    }

    pub fn all() -> Vec<Scenario> {
        vec![
            Scenario::CounterSync,
            Scenario::ReverseCounterSync,
            Scenario::ErrorAcknowledgement,
            Scenario::HandshakeRejected,
        ]
    }

    pub fn from_number(n: u8) -> Option<Scenario> {
        Self::all().into_iter().find(|s| s.number() == n)
    }

    /// Parse from number or snake_case name
    pub fn from_str(s: &str) -> Option<Scenario> {
        if let Ok(n) = s.parse::<u8>() {
            return Self::from_number(n);
        }
        match s.to_lowercase().replace('-', "_").as_str() {
            "counter_sync" => Some(Scenario::CounterSync),
            "reverse_counter_sync" => Some(Scenario::ReverseCounterSync),
            "error_acknowledgement" | "error_ack" => Some(Scenario::ErrorAcknowledgement),
            "handshake_rejected" => Some(Scenario::HandshakeRejected),
            _ => None,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scenario {}: {}", self.number(), self.name())
    }
}

/// Scenario execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

impl ScenarioStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            ScenarioStatus::Pass => "✓",
            ScenarioStatus::Fail => "✗",
            ScenarioStatus::Skip => "○",
            ScenarioStatus::Error => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScenarioStatus::Pass)
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioStatus::Pass => write!(f, "PASS"),
            ScenarioStatus::Fail => write!(f, "FAIL"),
            ScenarioStatus::Skip => write!(f, "SKIP"),
            ScenarioStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Time spent in one stage (deploy, channel, trigger, relay, assert)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: String,
    pub duration_ms: u64,
}

/// Result of a single scenario execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    #[serde(default)]
    pub stages: Vec<StageTiming>,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl ScenarioResult {
    pub fn pass(scenario: Scenario, duration_ms: u64) -> Self {
        Self {
            scenario,
            status: ScenarioStatus::Pass,
            duration_ms,
            stages: Vec::new(),
            message: None,
            details: None,
        }
    }

    pub fn fail(scenario: Scenario, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            scenario,
            status: ScenarioStatus::Fail,
            duration_ms,
            stages: Vec::new(),
            message: Some(message.into()),
            details: None,
        }
    }

    pub fn skip(scenario: Scenario, reason: impl Into<String>) -> Self {
        Self {
            scenario,
            status: ScenarioStatus::Skip,
            duration_ms: 0,
            stages: Vec::new(),
            message: Some(reason.into()),
            details: None,
        }
    }

    pub fn error(scenario: Scenario, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            scenario,
            status: ScenarioStatus::Error,
            duration_ms,
            stages: Vec::new(),
            message: Some(error.into()),
            details: None,
        }
    }

    pub fn with_stages(mut self, stages: Vec<StageTiming>) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.scenario,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of one harness run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// "<chain a> <-> <chain b>"
    pub network: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub total_duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl RunSummary {
    pub fn new(network: impl Into<String>, results: Vec<ScenarioResult>) -> Self {
        let count = |status: ScenarioStatus| results.iter().filter(|r| r.status == status).count();

        Self {
            network: network.into(),
            total: results.len(),
            passed: count(ScenarioStatus::Pass),
            failed: count(ScenarioStatus::Fail),
            skipped: count(ScenarioStatus::Skip),
            errors: count(ScenarioStatus::Error),
            total_duration_ms: results.iter().map(|r| r.duration_ms).sum(),
            results,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    /// Skipped scenarios do not count against a run
    pub fn is_all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network: {}", self.network)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {} | Error: {}",
            self.total, self.passed, self.failed, self.skipped, self.errors
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.total_duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_numbers() {
        assert_eq!(Scenario::CounterSync.number(), 1);
        assert_eq!(Scenario::HandshakeRejected.number(), 4);
        assert_eq!(Scenario::all().len(), 4);
    }

    #[test]
    fn test_scenario_from_str() {
        assert_eq!(Scenario::from_str("1"), Some(Scenario::CounterSync));
        assert_eq!(Scenario::from_str("error-ack"), Some(Scenario::ErrorAcknowledgement));
        assert_eq!(
            Scenario::from_str("reverse_counter_sync"),
            Some(Scenario::ReverseCounterSync)
        );
        assert_eq!(Scenario::from_str("9"), None);
        assert_eq!(Scenario::from_str("unknown"), None);
    }

    #[test]
    fn test_run_summary() {
        let results = vec![
            ScenarioResult::pass(Scenario::CounterSync, 100),
            ScenarioResult::fail(Scenario::ReverseCounterSync, 50, "Expected 1 acks, got 0"),
            ScenarioResult::skip(Scenario::HandshakeRejected, "not selected"),
        ];

        let summary = RunSummary::new("wasmd <-> osmosis", results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total_duration_ms, 150);
        assert!(!summary.is_all_passed());
    }

    #[test]
    fn test_result_display() {
        let result = ScenarioResult::error(Scenario::CounterSync, 12, "boom");
        assert_eq!(result.to_string(), "! Scenario 1: Counter Sync [12ms] - boom");
    }
}
