//! Timer utilities
//!
//! Stage timing for scenario runs.

use std::time::{Duration, Instant};

use crate::models::StageTiming;

/// Stopwatch with lap timing
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
    laps: Vec<(String, Duration)>,
}

impl Stopwatch {
    /// Create a new stopwatch
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            laps: Vec::new(),
        }
    }

    /// Record a lap
    pub fn lap(&mut self, label: impl Into<String>) {
        let label = label.into();
        let elapsed = self.start.elapsed();
        tracing::debug!("stage '{}' done at {}ms", label, elapsed.as_millis());
        self.laps.push((label, elapsed));
    }

    /// Get total elapsed time
    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn total_ms(&self) -> u64 {
        self.total().as_millis() as u64
    }

    /// Get lap times (duration of each lap, not cumulative)
    pub fn lap_times(&self) -> Vec<(String, Duration)> {
        let mut result = Vec::new();
        let mut prev = Duration::ZERO;

        for (label, cumulative) in &self.laps {
            let lap_time = *cumulative - prev;
            result.push((label.clone(), lap_time));
            prev = *cumulative;
        }

        result
    }

    /// Lap times as stage timings
    pub fn stages(&self) -> Vec<StageTiming> {
        self.lap_times()
            .into_iter()
            .map(|(stage, duration)| StageTiming {
                stage,
                duration_ms: duration.as_millis() as u64,
            })
            .collect()
    }

    /// Format laps as string
    pub fn format(&self) -> String {
        let mut output = String::new();
        for (label, duration) in self.lap_times() {
            output.push_str(&format!("{}: {}ms\n", label, duration.as_millis()));
        }
        output.push_str(&format!("Total: {}ms", self.total().as_millis()));
        output
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_stopwatch() {
        let mut sw = Stopwatch::new();
        sleep(Duration::from_millis(10));
        sw.lap("deploy");
        sleep(Duration::from_millis(10));
        sw.lap("relay");

        assert_eq!(sw.lap_times().len(), 2);

        let stages = sw.stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].stage, "deploy");
        assert!(stages[1].duration_ms >= 10);
        assert!(sw.total_ms() >= 20);
    }

    #[test]
    fn test_format() {
        let mut sw = Stopwatch::new();
        sw.lap("channel");
        let formatted = sw.format();
        assert!(formatted.starts_with("channel: "));
        assert!(formatted.contains("Total: "));
    }
}
