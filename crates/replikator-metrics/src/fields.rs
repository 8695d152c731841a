//! Per-field numeric conversion.
//!
//! The tool reports every number as text. Each field has its own fallback
//! for text that does not parse (including an absent field, which decodes
//! as empty text). The fallbacks differ on purpose: an unknown replication
//! lag must not read as "no lag", so it maps to [`REPLICATION_LAG_UNKNOWN`]
//! rather than zero.

use tracing::trace;

/// Replication lag reported when the tool's value is missing or malformed.
pub const REPLICATION_LAG_UNKNOWN: f64 = -1.0;

/// Value used for any other missing or malformed numeric field.
pub const MISSING_VALUE: f64 = 0.0;

/// `inf`, `infinity` or `nan`, in any case, optionally signed.
fn is_non_finite_literal(raw: &str) -> bool {
    let word = raw
        .strip_prefix(['+', '-'])
        .unwrap_or(raw)
        .to_ascii_lowercase();
    matches!(word.as_str(), "inf" | "infinity" | "nan")
}

/// Parse `raw`, or return `fallback`. Out-of-range magnitudes such as
/// `1e400` count as unparsable; only the explicit literals yield inf/NaN.
fn parse_or(field: &'static str, raw: &str, fallback: f64) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() || is_non_finite_literal(raw) => value,
        _ => {
            trace!(field, raw, fallback, "unparsable metric value");
            fallback
        }
    }
}

/// `iReplicationLag` → seconds of lag, or -1 when unknown.
pub fn replication_lag(raw: &str) -> f64 {
    parse_or("replication_lag", raw, REPLICATION_LAG_UNKNOWN)
}

/// `sAllocatedForDb` → disk used by replication, or 0.
pub fn replication_disk_usage(raw: &str) -> f64 {
    parse_or("replication_disk_usage", raw, MISSING_VALUE)
}

/// Global disk and memory capacity/free figures, or 0.
pub fn host_resource(field: &'static str, raw: &str) -> f64 {
    parse_or(field, raw, MISSING_VALUE)
}

/// Per-replica disk and memory figures, or 0.
pub fn replica_resource(field: &'static str, raw: &str) -> f64 {
    parse_or(field, raw, MISSING_VALUE)
}

/// Normalize a state string for use as a label value.
pub fn state_label(raw: &str) -> String {
    raw.to_lowercase()
}
