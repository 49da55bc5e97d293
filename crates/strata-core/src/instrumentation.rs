//! Runtime counters
//!
//! The runtime bumps these as it works and logs them once at shutdown:
//!
//! ```text
//! INFO strata_core::instrumentation: runtime_metrics tasks_launched=3 void_results=1 ...
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Runtime Metrics
// ============================================================================

/// Counters for one runtime, logged at teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMetrics {
    /// Successful `execute_task` calls (the top-level task included)
    pub tasks_launched: u64,
    /// Launches whose body returned an error
    pub tasks_failed: u64,
    pub void_results: u64,
    pub value_results: u64,
    pub regions_materialized: u64,
    pub regions_destroyed: u64,
    /// Total bytes allocated across all materialized field buffers
    pub bytes_materialized: u64,
    /// Futures dropped at teardown
    pub futures_released: u64,
}

impl RuntimeMetrics {
    pub(crate) fn record_result(&mut self, void: bool) {
        self.tasks_launched += 1;
        if void {
            self.void_results += 1;
        } else {
            self.value_results += 1;
        }
    }

    pub(crate) fn record_materialized(&mut self, bytes: usize) {
        self.regions_materialized += 1;
        self.bytes_materialized += bytes as u64;
    }

    /// Renders the counters as a single-line JSON object.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Log metrics using tracing
    pub fn log(&self) {
        tracing::info!(
            tasks_launched = self.tasks_launched,
            tasks_failed = self.tasks_failed,
            void_results = self.void_results,
            value_results = self.value_results,
            regions_materialized = self.regions_materialized,
            regions_destroyed = self.regions_destroyed,
            bytes_materialized = self.bytes_materialized,
            futures_released = self.futures_released,
            "runtime_metrics"
        );
    }
}
