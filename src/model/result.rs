//! Immutable probe outcome.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use crate::model::status::HealthStatus;
use crate::model::time::{serialize_duration_millis, serialize_epoch_millis};

/// Metadata key set on results served from an expired cache entry.
pub const META_STALE: &str = "stale";
/// Metadata key naming the kind of synthetic failure.
pub const META_ERROR_TYPE: &str = "errorType";

/// Outcome of one probe execution.
///
/// Built once through [`ProbeResultBuilder`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    component_name: String,
    component_type: String,
    status: HealthStatus,
    #[serde(serialize_with = "serialize_epoch_millis")]
    timestamp: SystemTime,
    #[serde(rename = "latencyMs", serialize_with = "serialize_duration_millis")]
    latency: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    /// Ordered by key regardless of the order entries were added.
    metadata: BTreeMap<String, Value>,
}

impl ProbeResult {
    /// Start building a result for the given component.
    pub fn builder(
        component_name: impl Into<String>,
        component_type: impl Into<String>,
    ) -> ProbeResultBuilder {
        ProbeResultBuilder::new(component_name, component_type)
    }

    /// Shorthand for a healthy result with the given latency.
    pub fn up(
        component_name: impl Into<String>,
        component_type: impl Into<String>,
        latency: Duration,
    ) -> Self {
        Self::builder(component_name, component_type)
            .status(HealthStatus::Up)
            .latency(latency)
            .build()
    }

    /// Shorthand for a failed result carrying an error message.
    pub fn down(
        component_name: impl Into<String>,
        component_type: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::builder(component_name, component_type)
            .status(HealthStatus::Down)
            .error(error)
            .build()
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Look up a single metadata value.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// True when this result was served from an expired cache entry.
    pub fn is_stale(&self) -> bool {
        matches!(self.metadata.get(META_STALE), Some(Value::Bool(true)))
    }

    /// Builder seeded with every field of this result, for deriving a new value.
    pub fn to_builder(&self) -> ProbeResultBuilder {
        ProbeResultBuilder {
            component_name: self.component_name.clone(),
            component_type: self.component_type.clone(),
            status: self.status,
            timestamp: Some(self.timestamp),
            latency: self.latency,
            error_message: self.error_message.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Builder for [`ProbeResult`].
#[derive(Debug, Clone)]
pub struct ProbeResultBuilder {
    component_name: String,
    component_type: String,
    status: HealthStatus,
    timestamp: Option<SystemTime>,
    latency: Duration,
    error_message: Option<String>,
    metadata: BTreeMap<String, Value>,
}

impl ProbeResultBuilder {
    fn new(component_name: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            component_type: component_type.into(),
            status: HealthStatus::Unknown,
            timestamp: None,
            latency: Duration::ZERO,
            error_message: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn status(mut self, status: HealthStatus) -> Self {
        self.status = status;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Insert a metadata entry; a repeated key overwrites the previous value.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Freeze the builder. The timestamp defaults to now.
    pub fn build(self) -> ProbeResult {
        ProbeResult {
            component_name: self.component_name,
            component_type: self.component_type,
            status: self.status,
            timestamp: self.timestamp.unwrap_or_else(SystemTime::now),
            latency: self.latency,
            error_message: self.error_message,
            metadata: self.metadata,
        }
    }
}
