//! REST API handlers.
//!
//! Each handler maps a route onto one `replikator-ctl` operation and
//! returns the tool's output verbatim as `application/json`. A failed tool
//! run still answers 200 with the tool's stderr as the body; only problems
//! inside this service produce other status codes.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{error, warn};

use replikator_core::parse_status;
use replikator_exec::{Invocation, Operation};

use crate::ApiState;

/// Error body for requests this service rejects itself.
#[derive(serde::Serialize)]
struct ApiError {
    success: bool,
    error: String,
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiError {
            success: false,
            error: msg.to_string(),
        }),
    )
        .into_response()
}

/// The tool's output, passed through untouched.
fn tool_response(invocation: Invocation) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        invocation.output,
    )
        .into_response()
}

/// Reject values that would be split into extra tool arguments.
fn validate_argument(field: &str, value: &str) -> Result<(), Response> {
    if value.is_empty() || value.starts_with('-') || value.chars().any(char::is_whitespace) {
        return Err(error_response(
            &format!("invalid {field}: {value:?}"),
            StatusCode::BAD_REQUEST,
        ));
    }
    Ok(())
}

async fn run(state: &ApiState, op: Operation) -> Response {
    match state.executor.run(&op).await {
        Ok(invocation) => {
            if !invocation.succeeded {
                warn!(operation = %op, "replikator reported failure");
            }
            tool_response(invocation)
        }
        Err(e) => {
            error!(operation = %op, error = %e, "replikator call failed");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Run a single-replikator operation after validating its name.
async fn run_named(state: &ApiState, name: String, op: fn(String) -> Operation) -> Response {
    if let Err(resp) = validate_argument("name", &name) {
        return resp;
    }
    run(state, op(name)).await
}

// ── Replikators ────────────────────────────────────────────────

/// GET /replikators
pub async fn list_replikators(State(state): State<ApiState>) -> Response {
    run(&state, Operation::List).await
}

/// Query parameters for PUT /replikator/{name}.
#[derive(Debug, Default, Deserialize)]
pub struct CreateParams {
    #[serde(rename = "fromReplica")]
    pub from_replica: Option<String>,
}

/// PUT /replikator/{name}[?fromReplica={src}]
pub async fn create_replikator(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Query(params): Query<CreateParams>,
) -> Response {
    if let Err(resp) = validate_argument("name", &name) {
        return resp;
    }

    let op = match params.from_replica.filter(|src| !src.is_empty()) {
        Some(source) => {
            if let Err(resp) = validate_argument("fromReplica", &source) {
                return resp;
            }
            Operation::CreateFromReplica { name, source }
        }
        None => Operation::Create { name },
    };
    run(&state, op).await
}

/// PUT /replikator/{name}/stop
pub async fn stop_replikator(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    run_named(&state, name, |name| Operation::Stop { name }).await
}

/// PUT /replikator/{name}/start
pub async fn start_replikator(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    run_named(&state, name, |name| Operation::Start { name }).await
}

/// GET /replikator/{name}
pub async fn get_replikator(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    run_named(&state, name, |name| Operation::Status { name }).await
}

/// DELETE /replikator/{name}
pub async fn delete_replikator(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    run_named(&state, name, |name| Operation::Delete { name }).await
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
///
/// Lists replikators (unserialized), decodes the status, refreshes the
/// gauges and renders the registry. A tool failure degrades to fallback
/// values rather than failing the scrape.
pub async fn prometheus_metrics(State(state): State<ApiState>) -> Response {
    let raw = match state.executor.run(&Operation::List).await {
        Ok(invocation) => invocation.output,
        Err(e) => {
            error!(error = %e, "replikator list for metrics failed");
            String::new()
        }
    };
    let snapshot = parse_status(&raw);

    match state.metrics.scrape(&snapshot) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, replikator_metrics::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "metrics encoding failed");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
