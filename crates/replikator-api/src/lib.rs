//! replikator-api — REST front end for `replikator-ctl`.
//!
//! Every endpoint except `/metrics` returns the tool's raw JSON output with
//! HTTP 200, whether or not the tool reported success. Operations that
//! target one replikator are serialized on its name.
//!
//! # API Routes
//!
//! | Method | Path | Description | Lock |
//! |---|---|---|---|
//! | GET | `/replikators` | List all replikators | none |
//! | PUT | `/replikator/{name}?fromReplica={src}` | Create from an existing replica | name |
//! | PUT | `/replikator/{name}` | Create a replikator | name |
//! | PUT | `/replikator/{name}/stop` | Stop a replikator | name |
//! | PUT | `/replikator/{name}/start` | Start a replikator | name |
//! | GET | `/replikator/{name}` | Get replikator status | name |
//! | DELETE | `/replikator/{name}` | Delete a replikator | name |
//! | GET | `/metrics` | Prometheus exposition | none |

pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, put};
use replikator_exec::{CommandGateway, Executor};
use replikator_metrics::ReplikatorMetrics;

/// Route of the Prometheus scrape endpoint. Scrapes are not counted in the
/// HTTP request metrics.
pub const METRICS_PATH: &str = "/metrics";

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub executor: Executor,
    pub metrics: Arc<ReplikatorMetrics>,
}

impl ApiState {
    /// Wire an executor and a fresh metrics registry around `gateway`.
    pub fn new(gateway: Arc<dyn CommandGateway>) -> prometheus::Result<Self> {
        Ok(Self {
            executor: Executor::new(gateway),
            metrics: Arc::new(ReplikatorMetrics::new()?),
        })
    }
}

/// Build the complete API router (REST + metrics).
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/replikators", get(handlers::list_replikators))
        .route(
            "/replikator/{name}",
            put(handlers::create_replikator)
                .get(handlers::get_replikator)
                .delete(handlers::delete_replikator),
        )
        .route("/replikator/{name}/stop", put(handlers::stop_replikator))
        .route("/replikator/{name}/start", put(handlers::start_replikator))
        .route(METRICS_PATH, get(handlers::prometheus_metrics))
        .layer(axum::middleware::from_fn_with_state(
            state.metrics.clone(),
            middleware::track_requests,
        ))
        .with_state(state)
}
