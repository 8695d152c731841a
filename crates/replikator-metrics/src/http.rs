//! HTTP request metrics, recorded by the API middleware.

use std::time::Duration;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

/// Route label used when a request matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

#[derive(Clone)]
pub struct HttpMetrics {
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

impl HttpMetrics {
    /// Create the HTTP families and register them in `registry`.
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Count of all HTTP requests"),
            &["code", "method"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of HTTP requests in seconds",
            ),
            &["path", "method"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            requests_total,
            request_duration,
        })
    }

    /// Record one finished request. `path` is the route template.
    pub fn observe(&self, path: &str, method: &str, status: u16, elapsed: Duration) {
        self.requests_total
            .with_label_values(&[status.to_string().as_str(), method])
            .inc();
        self.request_duration
            .with_label_values(&[path, method])
            .observe(elapsed.as_secs_f64());
    }
}
