//! Error types for the execution layer.

use thiserror::Error;

/// Result type alias for execution operations.
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors raised by the execution layer itself.
///
/// A failing `replikator-ctl` run is not an error here: it is reported
/// through [`crate::Invocation::succeeded`] along with the tool's stderr.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("replikator command must not be empty")]
    EmptyCommand,

    #[error("replikator task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}
