//! Wrapped output of a report cycle.

use serde::Serialize;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::model::time::{serialize_duration_millis, serialize_epoch_millis};
use crate::model::{HealthSummary, ProbeResult};

/// Results of one cycle plus the caller-side rollup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Also recorded on the cycle's tracing span.
    pub report_id: Uuid,
    #[serde(serialize_with = "serialize_epoch_millis")]
    pub generated_at: SystemTime,
    #[serde(rename = "durationMs", serialize_with = "serialize_duration_millis")]
    pub duration: Duration,
    pub summary: HealthSummary,
    pub results: Vec<ProbeResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_serializes_flat_report() {
        let results = vec![
            ProbeResult::up("db", "database", Duration::from_millis(5)),
            ProbeResult::down("broker", "kafka", "refused"),
        ];
        let report = HealthReport {
            report_id: Uuid::nil(),
            generated_at: UNIX_EPOCH + Duration::from_secs(1),
            duration: Duration::from_millis(42),
            summary: HealthSummary::from_results(&results),
            results,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["reportId"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["generatedAt"], 1000);
        assert_eq!(json["durationMs"], 42);
        assert_eq!(json["summary"]["down"], 1);
        assert_eq!(json["results"][1]["status"], "DOWN");
    }
}
