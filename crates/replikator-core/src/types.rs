//! Decoded status snapshot types.
//!
//! Every numeric field is kept as the text the tool reported. Conversion
//! to numbers happens in the metrics translator, where each field has its
//! own fallback.

/// One decoded `--list` payload: the global replication state plus every
/// replica the tool currently knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalSnapshot {
    /// Replication state, e.g. `Running` or `Stopped`.
    pub replication_state: String,
    /// Replication lag from the master server.
    pub replication_lag: String,
    /// Disk allocated to the replication process.
    pub replication_disk_usage: String,
    pub disk_capacity: String,
    pub disk_free: String,
    pub memory_capacity: String,
    pub memory_free: String,
    /// Replicas in the order the tool listed them.
    pub replicas: Vec<ReplicaSnapshot>,
}

/// State of a single replica (database instance).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicaSnapshot {
    pub instance_id: String,
    /// Lifecycle state, e.g. `Running`.
    pub state: String,
    pub disk_usage: String,
    pub memory_allocated: String,
    pub memory_used: String,
}
