//! Command-line and environment configuration

use clap::Parser;
use mongoscope_mongodb::PoolConfig;
use std::net::SocketAddr;
use std::time::Duration;

/// Read-only HTTP gateway over a MongoDB cluster
///
/// Every option can also be set through the environment (or a `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(name = "mongoscope")]
#[command(about = "Read-only HTTP gateway over a MongoDB cluster")]
pub struct Config {
    /// MongoDB connection string
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    pub mongodb_uri: String,

    /// Address to bind to
    #[arg(long, env = "MONGOSCOPE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Reject database and collection names MongoDB would not accept
    #[arg(long, env = "MONGOSCOPE_VALIDATE_NAMES", default_value_t = false)]
    pub validate_names: bool,

    /// Application name reported to the cluster
    #[arg(long, env = "MONGOSCOPE_APP_NAME", default_value = "mongoscope")]
    pub app_name: String,

    /// Connect timeout in seconds (driver default when unset)
    #[arg(long, env = "MONGOSCOPE_CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: Option<u64>,
}

impl Config {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            server_selection_timeout: None,
            app_name: Some(self.app_name.clone()),
        }
    }
}
