//! replikator-core — shared types for the Replikator API.
//!
//! Decodes the `replikator-ctl --output json --list` payload into
//! [`GlobalSnapshot`] values and holds the server configuration.
//!
//! Decoding is deliberately forgiving: the tool's JSON is loosely typed,
//! and a scrape must never fail because one field changed shape.

pub mod config;
pub mod error;
pub mod status;
pub mod types;

pub use config::ServerConfig;
pub use error::{ConfigError, ConfigResult};
pub use status::parse_status;
pub use types::{GlobalSnapshot, ReplicaSnapshot};
