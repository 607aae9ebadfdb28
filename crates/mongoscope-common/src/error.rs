//! Error types for mongoscope

use thiserror::Error;

/// Result type alias for mongoscope operations
pub type Result<T> = std::result::Result<T, MongoscopeError>;

/// Unified error type for all mongoscope operations
#[derive(Error, Debug, Clone)]
pub enum MongoscopeError {
    #[error("MongoDB error: {0}")]
    MongoDB(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// MongoDB-specific error conversions (when mongodb-errors feature is enabled)
#[cfg(feature = "mongodb-errors")]
impl From<mongodb::error::Error> for MongoscopeError {
    fn from(err: mongodb::error::Error) -> Self {
        MongoscopeError::MongoDB(err.to_string())
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::ser::Error> for MongoscopeError {
    fn from(err: bson::ser::Error) -> Self {
        MongoscopeError::Serialization(format!("BSON serialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::de::Error> for MongoscopeError {
    fn from(err: bson::de::Error) -> Self {
        MongoscopeError::Serialization(format!("BSON deserialization error: {}", err))
    }
}
