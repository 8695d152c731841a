//! Tolerant decoder for the `replikator-ctl --output json --list` payload.
//!
//! Wire layout:
//!
//! ```text
//! {
//!   "DatabaseGlobalState": {
//!     "eReplicationState": "Running",
//!     "iReplicationLag": "12.5",
//!     "sAllocatedForDb": "...",
//!     "sTotalStorageCapacity": "...", "sFree": "...",
//!     "sTotalMemCapacity": "...",     "sFreeMem": "...",
//!     "DatabaseInstanceState": [
//!       {
//!         "DatabaseProperties": { "sInstanceId": "db1" },
//!         "eState": "Running",
//!         "sSizeTotal": "...", "sMemAllocated": "...", "sMemUsed": "..."
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! Decoding never fails. Unknown keys are ignored, and a value of the wrong
//! shape is treated as absent. A payload that is not JSON at all decodes to
//! [`GlobalSnapshot::default`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::types::{GlobalSnapshot, ReplicaSnapshot};

/// Decode a status payload into a snapshot.
pub fn parse_status(raw: &str) -> GlobalSnapshot {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => from_object::<Envelope>(value).state.into(),
        Err(e) => {
            debug!(error = %e, bytes = raw.len(), "status payload is not decodable, using empty snapshot");
            GlobalSnapshot::default()
        }
    }
}

#[derive(Default, Deserialize)]
struct Envelope {
    #[serde(rename = "DatabaseGlobalState", default, deserialize_with = "lenient")]
    state: WireGlobalState,
}

#[derive(Default, Deserialize)]
struct WireGlobalState {
    #[serde(rename = "DatabaseInstanceState", default, deserialize_with = "lenient_list")]
    instances: Vec<WireInstanceState>,
    #[serde(rename = "eReplicationState", default, deserialize_with = "lenient_text")]
    replication_state: String,
    #[serde(rename = "iReplicationLag", default, deserialize_with = "lenient_text")]
    replication_lag: String,
    #[serde(rename = "sAllocatedForDb", default, deserialize_with = "lenient_text")]
    replication_disk_usage: String,
    #[serde(rename = "sTotalStorageCapacity", default, deserialize_with = "lenient_text")]
    disk_capacity: String,
    #[serde(rename = "sFree", default, deserialize_with = "lenient_text")]
    disk_free: String,
    #[serde(rename = "sTotalMemCapacity", default, deserialize_with = "lenient_text")]
    memory_capacity: String,
    #[serde(rename = "sFreeMem", default, deserialize_with = "lenient_text")]
    memory_free: String,
}

#[derive(Default, Deserialize)]
struct WireInstanceState {
    #[serde(rename = "DatabaseProperties", default, deserialize_with = "lenient")]
    properties: WireProperties,
    #[serde(rename = "eState", default, deserialize_with = "lenient_text")]
    state: String,
    #[serde(rename = "sSizeTotal", default, deserialize_with = "lenient_text")]
    disk_usage: String,
    #[serde(rename = "sMemAllocated", default, deserialize_with = "lenient_text")]
    memory_allocated: String,
    #[serde(rename = "sMemUsed", default, deserialize_with = "lenient_text")]
    memory_used: String,
}

#[derive(Default, Deserialize)]
struct WireProperties {
    #[serde(rename = "sInstanceId", default, deserialize_with = "lenient_text")]
    instance_id: String,
}

impl From<WireGlobalState> for GlobalSnapshot {
    fn from(w: WireGlobalState) -> Self {
        GlobalSnapshot {
            replication_state: w.replication_state,
            replication_lag: w.replication_lag,
            replication_disk_usage: w.replication_disk_usage,
            disk_capacity: w.disk_capacity,
            disk_free: w.disk_free,
            memory_capacity: w.memory_capacity,
            memory_free: w.memory_free,
            replicas: w.instances.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<WireInstanceState> for ReplicaSnapshot {
    fn from(w: WireInstanceState) -> Self {
        ReplicaSnapshot {
            instance_id: w.properties.instance_id,
            state: w.state,
            disk_usage: w.disk_usage,
            memory_allocated: w.memory_allocated,
            memory_used: w.memory_used,
        }
    }
}

// ── Lenient field decoders ─────────────────────────────────────

/// Text field: anything other than a JSON string decodes as empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// Decode a JSON object into `T`. Any other shape, including an array
/// (which derived structs would otherwise read positionally), is the default.
fn from_object<T>(value: Value) -> T
where
    T: DeserializeOwned + Default,
{
    match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    }
}

/// Nested object: a value of the wrong shape decodes as the default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(from_object(Value::deserialize(deserializer)?))
}

/// List field: a non-array decodes as empty. Malformed elements keep their
/// slot as a default value so the element count matches the payload.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(from_object)
            .collect(),
        _ => Vec::new(),
    })
}
