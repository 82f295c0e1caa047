//! Wall-clock serialization helpers.

use serde::Serializer;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, clamped at zero.
pub fn epoch_millis(ts: SystemTime) -> u64 {
    ts.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub(crate) fn serialize_epoch_millis<S: Serializer>(
    ts: &SystemTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(epoch_millis(*ts))
}

pub(crate) fn serialize_opt_epoch_millis<S: Serializer>(
    ts: &Option<SystemTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_some(&epoch_millis(*ts)),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn serialize_duration_millis<S: Serializer>(
    d: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(d.as_millis() as u64)
}
