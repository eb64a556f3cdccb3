// =============================================================================
// CLI & Config
// =============================================================================

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "er-hub", version, about = "Event repository query service")]
pub struct Args {
    /// Storage connection URL; the scheme selects the driver
    #[arg(long, env = "CONNECTION_STRING")]
    pub connection_string: String,

    /// HTTP port
    #[arg(long, env = "API_PORT", default_value_t = 8080)]
    pub api_port: u16,

    /// HTTP bind host
    #[arg(long, default_value = "0.0.0.0")]
    pub bind_host: String,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR); RUST_LOG overrides it
    #[arg(long, env = "LOGLEVEL", default_value = "INFO")]
    pub log_level: String,

    /// Also append logs to this file
    #[arg(long, env = "LOG_FILE_PATH")]
    pub log_file_path: Option<PathBuf>,

    /// Path to config file
    #[arg(long, default_value = "er-hub.toml")]
    pub config: PathBuf,

    /// JSON array of events to load into a memory:// database at startup
    #[arg(long)]
    pub seed: Option<PathBuf>,
}

impl Args {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.api_port)
    }
}

#[derive(Deserialize, Default, Clone, Debug)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    /// Deadline for every storage call made on behalf of a request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Config {
    /// Read `path` if it exists; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| format!("invalid config file {}: {e}", path.display()).into())
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
