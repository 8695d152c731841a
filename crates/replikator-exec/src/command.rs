//! The `replikator-ctl` verbs used by the API.

use std::fmt;

/// Output format flag passed on every call.
const OUTPUT_JSON: &str = "--output json";

/// A single `replikator-ctl` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// List every replikator and the global replication state.
    List,
    Create { name: String },
    /// Create a replikator seeded from an existing replica.
    CreateFromReplica { name: String, source: String },
    Stop { name: String },
    /// Start (`--run`) a stopped replikator.
    Start { name: String },
    Status { name: String },
    Delete { name: String },
}

impl Operation {
    /// The resource this operation is serialized on. Empty for unkeyed
    /// operations.
    pub fn lock_key(&self) -> &str {
        match self {
            Operation::List => "",
            Operation::Create { name }
            | Operation::CreateFromReplica { name, .. }
            | Operation::Stop { name }
            | Operation::Start { name }
            | Operation::Status { name }
            | Operation::Delete { name } => name,
        }
    }

    /// Argument string handed to the gateway.
    pub fn args(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List => write!(f, "{OUTPUT_JSON} --list"),
            Operation::Create { name } => write!(f, "{OUTPUT_JSON} --create {name}"),
            Operation::CreateFromReplica { name, source } => {
                write!(f, "{OUTPUT_JSON} --create {name} --from-replica {source}")
            }
            Operation::Stop { name } => write!(f, "{OUTPUT_JSON} --stop {name}"),
            Operation::Start { name } => write!(f, "{OUTPUT_JSON} --run {name}"),
            Operation::Status { name } => write!(f, "{OUTPUT_JSON} --get-status {name}"),
            Operation::Delete { name } => write!(f, "{OUTPUT_JSON} --delete {name}"),
        }
    }
}
