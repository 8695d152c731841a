//! Executor — serialized, non-blocking access to the command gateway.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::command::Operation;
use crate::error::ExecResult;
use crate::gateway::CommandGateway;
use crate::keyed::KeyedLocks;

/// Result of one tool invocation: stdout if it succeeded, stderr otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub output: String,
    pub succeeded: bool,
}

impl From<Result<String, String>> for Invocation {
    fn from(result: Result<String, String>) -> Self {
        match result {
            Ok(output) => Invocation { output, succeeded: true },
            Err(output) => Invocation { output, succeeded: false },
        }
    }
}

/// Runs tool calls on the blocking pool, serialized per resource key.
#[derive(Clone)]
pub struct Executor {
    gateway: Arc<dyn CommandGateway>,
    locks: Arc<KeyedLocks>,
}

impl Executor {
    pub fn new(gateway: Arc<dyn CommandGateway>) -> Self {
        Self {
            gateway,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Run an operation under its resource lock.
    pub async fn run(&self, op: &Operation) -> ExecResult<Invocation> {
        self.execute(op.lock_key(), op.args()).await
    }

    /// Run `args` through the gateway while holding the lock for `key`.
    ///
    /// The lock guard moves into the blocking task, so it stays held until
    /// the process exits even if the caller stops waiting. An empty key
    /// runs without locking.
    pub async fn execute(&self, key: &str, args: String) -> ExecResult<Invocation> {
        let guard = self.locks.lock(key).await;
        let gateway = self.gateway.clone();
        let started = Instant::now();

        debug!(key, %args, "invoking replikator");
        let result = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            gateway.invoke(&args)
        })
        .await?;

        let invocation = Invocation::from(result);
        debug!(
            key,
            succeeded = invocation.succeeded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "replikator call finished"
        );
        Ok(invocation)
    }

    /// Call the gateway directly, without touching the lock table.
    pub async fn execute_unkeyed(&self, args: String) -> ExecResult<Invocation> {
        self.execute("", args).await
    }

    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }
}
