//! Request logging and HTTP metrics middleware.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use replikator_metrics::ReplikatorMetrics;
use replikator_metrics::http::UNMATCHED_PATH;

use crate::METRICS_PATH;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Log each request and its response, and record HTTP metrics for every
/// route except the scrape endpoint.
pub async fn track_requests(
    State(metrics): State<Arc<ReplikatorMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
    let started = Instant::now();

    let method = request.method().clone();
    let uri = request.uri().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_PATH.to_string(), |p| p.as_str().to_string());
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_string(), |ci| ci.0.to_string());

    info!(id, %method, %uri, %remote, "request");

    let response = next.run(request).await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    if path != METRICS_PATH {
        metrics
            .http()
            .observe(&path, method.as_str(), status, elapsed);
    }

    info!(
        id,
        %method,
        %uri,
        %remote,
        status,
        elapsed_secs = elapsed.as_secs_f64(),
        "response"
    );

    response
}
