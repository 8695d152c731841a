//! Snapshot → gauge translation and text exposition.

use std::sync::{Mutex, PoisonError};

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use replikator_core::GlobalSnapshot;

use crate::fields;
use crate::http::HttpMetrics;

/// Gauge families derived from the replikator status, plus HTTP metrics,
/// in a registry owned by this instance.
pub struct ReplikatorMetrics {
    registry: Registry,

    // Replication, labeled by global state.
    replication_lag: GaugeVec,
    replication_disk_usage: GaugeVec,

    // Host resources.
    disk_capacity: Gauge,
    disk_free: Gauge,
    memory_capacity: Gauge,
    memory_free: Gauge,

    // Replicas, labeled by replica id and replica state.
    replica_disk_usage: GaugeVec,
    replica_memory_allocated: GaugeVec,
    replica_memory_used: GaugeVec,

    http: HttpMetrics,

    /// Serializes refresh and render so a reader never sees a family
    /// between reset and repopulate.
    scrape_lock: Mutex<()>,
}

fn gauge(registry: &Registry, name: &str, help: &str) -> prometheus::Result<Gauge> {
    let gauge = Gauge::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> prometheus::Result<GaugeVec> {
    let vec = GaugeVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

impl ReplikatorMetrics {
    /// Create and register every metric family.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let replica_labels = &["replica", "state"];

        Ok(Self {
            replication_lag: gauge_vec(
                &registry,
                "replikator_replication_lag",
                "Replication lag from master server",
                &["state"],
            )?,
            replication_disk_usage: gauge_vec(
                &registry,
                "replikator_replication_disk_usage",
                "Disk usage by the replication process",
                &["state"],
            )?,
            disk_capacity: gauge(&registry, "replikator_disk_capacity", "Disk capacity")?,
            disk_free: gauge(&registry, "replikator_disk_free", "Free disk")?,
            memory_capacity: gauge(&registry, "replikator_memory_capacity", "Memory capacity")?,
            memory_free: gauge(&registry, "replikator_memory_free", "Free memory")?,
            replica_disk_usage: gauge_vec(
                &registry,
                "replikator_replica_disk_usage",
                "Disk usage by a replica",
                replica_labels,
            )?,
            replica_memory_allocated: gauge_vec(
                &registry,
                "replikator_replica_memory_allocated",
                "Memory allocated for a replica",
                replica_labels,
            )?,
            replica_memory_used: gauge_vec(
                &registry,
                "replikator_replica_memory_used",
                "Memory used by a replica",
                replica_labels,
            )?,
            http: HttpMetrics::register(&registry)?,
            registry,
            scrape_lock: Mutex::new(()),
        })
    }

    pub fn http(&self) -> &HttpMetrics {
        &self.http
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Replace all status gauges with values from `snapshot`.
    pub fn refresh(&self, snapshot: &GlobalSnapshot) {
        let _guard = self.scrape_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.apply(snapshot);
    }

    /// Render every registered family in the text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let _guard = self.scrape_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.encode()
    }

    /// Refresh from `snapshot` and render, without letting another scrape
    /// interleave between the two.
    pub fn scrape(&self, snapshot: &GlobalSnapshot) -> anyhow::Result<String> {
        let _guard = self.scrape_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.apply(snapshot);
        self.encode()
    }

    fn apply(&self, snapshot: &GlobalSnapshot) {
        let state = fields::state_label(&snapshot.replication_state);

        self.replication_lag.reset();
        self.replication_lag
            .with_label_values(&[state.as_str()])
            .set(fields::replication_lag(&snapshot.replication_lag));

        self.replication_disk_usage.reset();
        self.replication_disk_usage
            .with_label_values(&[state.as_str()])
            .set(fields::replication_disk_usage(&snapshot.replication_disk_usage));

        self.disk_capacity
            .set(fields::host_resource("disk_capacity", &snapshot.disk_capacity));
        self.disk_free
            .set(fields::host_resource("disk_free", &snapshot.disk_free));
        self.memory_capacity
            .set(fields::host_resource("memory_capacity", &snapshot.memory_capacity));
        self.memory_free
            .set(fields::host_resource("memory_free", &snapshot.memory_free));

        // The replica set can shrink between scrapes; drop every old series.
        self.replica_disk_usage.reset();
        self.replica_memory_allocated.reset();
        self.replica_memory_used.reset();

        for replica in &snapshot.replicas {
            let replica_state = fields::state_label(&replica.state);
            let labels = [replica.instance_id.as_str(), replica_state.as_str()];

            self.replica_disk_usage
                .with_label_values(&labels)
                .set(fields::replica_resource("disk_usage", &replica.disk_usage));
            self.replica_memory_allocated
                .with_label_values(&labels)
                .set(fields::replica_resource("memory_allocated", &replica.memory_allocated));
            self.replica_memory_used
                .with_label_values(&labels)
                .set(fields::replica_resource("memory_used", &replica.memory_used));
        }

        debug!(
            state = %state,
            replicas = snapshot.replicas.len(),
            "replikator gauges refreshed"
        );
    }

    fn encode(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
