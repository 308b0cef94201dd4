//! Server tuning knobs. No config-file or CLI parsing lives here — callers
//! construct a `ServerConfig` directly (see `bin/hsmd.rs`), matching the
//! "no outer configuration surface" scope decision.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_connections: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub idle_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_connections: 100,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}
