//! Caller-side aggregation of a result list.

use serde::Serialize;

use crate::model::result::ProbeResult;
use crate::model::status::HealthStatus;

/// Status counts and worst-of rollup over a set of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub total: usize,
    pub up: usize,
    pub degraded: usize,
    pub down: usize,
    pub unknown: usize,
    pub overall: HealthStatus,
}

impl HealthSummary {
    pub fn from_results(results: &[ProbeResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            up: 0,
            degraded: 0,
            down: 0,
            unknown: 0,
            overall: HealthStatus::worst(results.iter().map(|r| r.status())),
        };

        for result in results {
            match result.status() {
                HealthStatus::Up => summary.up += 1,
                HealthStatus::Degraded => summary.degraded += 1,
                HealthStatus::Down => summary.down += 1,
                HealthStatus::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    /// True when every component reported UP.
    pub fn all_up(&self) -> bool {
        self.total > 0 && self.up == self.total
    }
}
