//! replikator-metrics — Prometheus gauges for replikator status.
//!
//! Translates a decoded [`GlobalSnapshot`](replikator_core::GlobalSnapshot)
//! into a fixed set of gauge families and renders them in the Prometheus
//! text exposition format. Also tracks per-route HTTP request metrics.
//!
//! # Architecture
//!
//! ```text
//! ReplikatorMetrics (private Registry)
//!   ├── scrape(snapshot) → refresh gauges + render text, one critical section
//!   ├── fields::*        ← per-field numeric conversion with named fallbacks
//!   └── HttpMetrics      ← request counter + latency histogram
//! ```
//!
//! Every refresh resets the labeled families before repopulating them, so a
//! replica that disappears from the tool's output also disappears from the
//! exposition.

pub mod fields;
pub mod http;
pub mod translator;

pub use http::HttpMetrics;
pub use translator::ReplikatorMetrics;

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
