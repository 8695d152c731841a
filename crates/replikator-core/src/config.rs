//! Server configuration.
//!
//! Loaded in layers: built-in defaults, then an optional TOML file, then
//! command-line overrides applied by the daemon.
//!
//! ```toml
//! listen = ":8080"
//! replikator = "sudo replikator-ctl"
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default listen address. A bare `:port` binds every interface.
pub const DEFAULT_LISTEN: &str = ":8080";

/// Default command used to invoke the replication tool.
pub const DEFAULT_REPLIKATOR: &str = "sudo replikator-ctl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    pub listen: String,
    /// Executable (plus any prefix arguments) used to run `replikator-ctl`.
    pub replikator: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            replikator: DEFAULT_REPLIKATOR.to_string(),
        }
    }
}

impl ServerConfig {
    /// Read a config file. Keys missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply command-line overrides on top of this config.
    pub fn with_overrides(mut self, listen: Option<String>, replikator: Option<String>) -> Self {
        if let Some(listen) = listen {
            self.listen = listen;
        }
        if let Some(replikator) = replikator {
            self.replikator = replikator;
        }
        self
    }

    /// Resolve the listen address. Accepts `host:port` and the bare `:port` form.
    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        let listen = self.listen.trim();
        if let Some(port) = listen.strip_prefix(':') {
            let port: u16 = port
                .parse()
                .map_err(|_| ConfigError::ListenAddress(self.listen.clone()))?;
            return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
        }
        listen
            .parse()
            .map_err(|_| ConfigError::ListenAddress(self.listen.clone()))
    }

    /// Check that the config can be used to start a server.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.replikator.split_whitespace().next().is_none() {
            return Err(ConfigError::EmptyCommand);
        }
        self.socket_addr()?;
        Ok(())
    }
}
