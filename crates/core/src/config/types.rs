use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Origin the images are fetched from. Joined verbatim with each
    /// destination path, so it usually ends with a slash.
    pub origin_host: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
}

/// Record database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("records.db")
}

/// Mirroring pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MirrorConfig {
    /// Local prefix every image reference is placed under.
    #[serde(default = "default_local_dest")]
    pub local_dest: String,
    /// Number of download workers.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Capacity of the input stage.
    #[serde(default = "default_input_buffer")]
    pub input_buffer: usize,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            local_dest: default_local_dest(),
            pool_size: default_pool_size(),
            input_buffer: default_input_buffer(),
            request_timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_local_dest() -> String {
    "uploads".to_string()
}

fn default_pool_size() -> usize {
    10
}

fn default_input_buffer() -> usize {
    10_000
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("imgmirror/{}", env!("CARGO_PKG_VERSION"))
}
