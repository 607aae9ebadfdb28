//! MongoDB connection management
//!
//! The gateway connects lazily: nothing happens at startup, and the first
//! request to need the cluster pays for the connect. [`ConnectionManager`]
//! guarantees that concurrent first requests share a single in-flight
//! connect instead of racing each other.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use mongodb::{options::ClientOptions, Client};
use mongoscope_common::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};

use crate::catalog::{Catalog, MongoCatalog};

/// Client options applied on top of the connection string
///
/// Pool sizing is left to the driver.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Connection timeout (default: driver default)
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout (default: driver default)
    pub server_selection_timeout: Option<Duration>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            server_selection_timeout: None,
            app_name: Some("mongoscope".to_string()),
        }
    }
}

impl PoolConfig {
    fn apply(self, client_options: &mut ClientOptions) {
        if let Some(connect) = self.connect_timeout {
            client_options.connect_timeout = Some(connect);
        }
        if let Some(server_sel) = self.server_selection_timeout {
            client_options.server_selection_timeout = Some(server_sel);
        }
        if let Some(app) = self.app_name {
            client_options.app_name = Some(app);
        }
    }
}

/// Something that can open a [`Catalog`]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Catalog>>;
}

/// Connects to a cluster through the MongoDB driver
#[derive(Debug, Clone)]
pub struct MongoConnector {
    connection_string: String,
    config: PoolConfig,
}

impl MongoConnector {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self::with_config(connection_string, PoolConfig::default())
    }

    pub fn with_config(connection_string: impl Into<String>, config: PoolConfig) -> Self {
        Self {
            connection_string: connection_string.into(),
            config,
        }
    }
}

#[async_trait]
impl Connector for MongoConnector {
    async fn connect(&self) -> Result<Arc<dyn Catalog>> {
        let mut client_options = ClientOptions::parse(self.connection_string.as_str()).await?;
        self.config.clone().apply(&mut client_options);

        let client = Client::with_options(client_options)?;
        let catalog = MongoCatalog::new(client);

        // The driver connects on first use; ping so a bad cluster fails here
        catalog.ping().await?;
        tracing::info!("Connected to MongoDB");

        Ok(Arc::new(catalog))
    }
}

/// A connect in flight, awaited by every caller that arrived while it ran
type ConnectAttempt = Shared<BoxFuture<'static, Result<Arc<dyn Catalog>>>>;

/// Process-wide, lazily opened connection
///
/// The first successful connect is memoized. At most one connect is in flight
/// at a time; a failed one is not memoized: every caller waiting on that
/// attempt sees the error, and the next call starts a new attempt.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    catalog: OnceCell<Arc<dyn Catalog>>,
    pending: Mutex<Option<ConnectAttempt>>,
}

impl ConnectionManager {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
            catalog: OnceCell::new(),
            pending: Mutex::new(None),
        }
    }

    /// Manager over an already-open catalog
    pub fn connected(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            connector: Arc::new(Preconnected(catalog.clone())),
            catalog: OnceCell::new_with(Some(catalog)),
            pending: Mutex::new(None),
        }
    }

    /// The shared catalog, connecting first if nobody has yet
    pub async fn acquire(&self) -> Result<Arc<dyn Catalog>> {
        if let Some(catalog) = self.catalog.get() {
            return Ok(catalog.clone());
        }

        let attempt = {
            let mut pending = self.pending.lock().await;
            if let Some(catalog) = self.catalog.get() {
                return Ok(catalog.clone());
            }
            match pending.as_ref() {
                Some(attempt) => attempt.clone(),
                None => {
                    let connector = self.connector.clone();
                    let attempt = async move {
                        tracing::debug!("Opening connection");
                        connector.connect().await
                    }
                    .boxed()
                    .shared();
                    *pending = Some(attempt.clone());
                    attempt
                }
            }
        };

        let outcome = attempt.clone().await;

        let mut pending = self.pending.lock().await;
        if let Ok(catalog) = &outcome {
            // Already set if another waiter on this attempt got here first
            let _ = self.catalog.set(catalog.clone());
        }
        // A newer attempt may have replaced ours; leave that one alone
        if pending
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&attempt))
        {
            *pending = None;
        }

        outcome
    }

    /// Whether a connection has been established
    pub fn is_connected(&self) -> bool {
        self.catalog.initialized()
    }
}

struct Preconnected(Arc<dyn Catalog>);

#[async_trait]
impl Connector for Preconnected {
    async fn connect(&self) -> Result<Arc<dyn Catalog>> {
        Ok(self.0.clone())
    }
}
