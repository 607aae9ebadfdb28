//! Application state shared across handlers

use mongoscope_mongodb::{
    Catalog, ConnectionManager, Connector, ValidatedCollectionName, ValidatedDatabaseName,
};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    connection: ConnectionManager,
    validate_names: bool,
}

impl AppState {
    pub fn new(connector: impl Connector + 'static, validate_names: bool) -> Self {
        Self::from_manager(ConnectionManager::new(connector), validate_names)
    }

    pub fn from_manager(connection: ConnectionManager, validate_names: bool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                connection,
                validate_names,
            }),
        }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.inner.connection
    }

    /// The shared catalog; `message` is what the client sees if connecting fails
    pub async fn catalog(&self, message: &'static str) -> ApiResult<Arc<dyn Catalog>> {
        self.inner
            .connection
            .acquire()
            .await
            .map_err(ApiError::upstream(message))
    }

    pub fn check_database(&self, database: &str) -> ApiResult<()> {
        if self.inner.validate_names {
            ValidatedDatabaseName::new(database).map_err(ApiError::InvalidName)?;
        }
        Ok(())
    }

    pub fn check_namespace(&self, database: &str, collection: &str) -> ApiResult<()> {
        self.check_database(database)?;
        if self.inner.validate_names {
            ValidatedCollectionName::new(collection).map_err(ApiError::InvalidName)?;
        }
        Ok(())
    }
}
