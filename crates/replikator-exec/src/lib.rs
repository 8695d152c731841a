//! replikator-exec — runs `replikator-ctl` on behalf of the API.
//!
//! # Architecture
//!
//! ```text
//! Executor
//!   ├── KeyedLocks      ← one async mutex per resource name, created lazily
//!   └── CommandGateway  ← blocking process call, run on the blocking pool
//! ```
//!
//! Operations that address a single replikator hold that replikator's lock
//! for the full lifetime of the external process, so two calls for the same
//! name never overlap. Calls for different names, and unkeyed calls such as
//! `--list`, run in parallel.

pub mod command;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod keyed;

pub use command::Operation;
pub use error::{ExecError, ExecResult};
pub use executor::{Executor, Invocation};
pub use gateway::{CommandGateway, ProcessGateway};
pub use keyed::{KeyGuard, KeyedLocks};
