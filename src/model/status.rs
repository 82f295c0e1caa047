//! Component health status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health status reported for a single component.
///
/// Severity order is `Up > Degraded > Down > Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Up,
    Degraded,
    Down,
    Unknown,
}

impl HealthStatus {
    /// Numeric severity rank, higher is healthier.
    pub fn rank(self) -> u8 {
        match self {
            HealthStatus::Up => 3,
            HealthStatus::Degraded => 2,
            HealthStatus::Down => 1,
            HealthStatus::Unknown => 0,
        }
    }

    /// Status code string used in serialized records.
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Up => "UP",
            HealthStatus::Degraded => "DEGRADED",
            HealthStatus::Down => "DOWN",
            HealthStatus::Unknown => "UNKNOWN",
        }
    }

    /// True for statuses a circuit breaker records as a success.
    pub fn is_operational(self) -> bool {
        matches!(self, HealthStatus::Up | HealthStatus::Degraded)
    }

    /// Pick the lowest-severity status among the inputs.
    ///
    /// An empty input yields `Unknown`.
    pub fn worst<I>(statuses: I) -> HealthStatus
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        statuses
            .into_iter()
            .min_by_key(|s| s.rank())
            .unwrap_or(HealthStatus::Unknown)
    }
}

impl PartialOrd for HealthStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HealthStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(HealthStatus::Up > HealthStatus::Degraded);
        assert!(HealthStatus::Degraded > HealthStatus::Down);
        assert!(HealthStatus::Down > HealthStatus::Unknown);
    }

    #[test]
    fn test_worst() {
        let worst = HealthStatus::worst([HealthStatus::Up, HealthStatus::Down, HealthStatus::Degraded]);
        assert_eq!(worst, HealthStatus::Down);

        assert_eq!(HealthStatus::worst([HealthStatus::Up, HealthStatus::Up]), HealthStatus::Up);
        assert_eq!(HealthStatus::worst(Vec::new()), HealthStatus::Unknown);
        assert_eq!(
            HealthStatus::worst([HealthStatus::Down, HealthStatus::Unknown]),
            HealthStatus::Unknown
        );
    }

    #[test]
    fn test_serializes_as_status_code() {
        let json = serde_json::to_string(&HealthStatus::Degraded).unwrap();
        assert_eq!(json, "\"DEGRADED\"");
    }
}
