//! MongoDB access layer for mongoscope
//!
//! This crate provides everything the HTTP gateway needs to read from a cluster.
//!
//! # Features
//! - Lazy, race-free connection management
//! - A `Catalog` seam with driver-backed and in-memory implementations
//! - Query builder evaluated by the driver or locally
//! - Timestamp extraction from ObjectIds and oplog timestamps
//! - BSON → JSON conversion for responses
//! - Optional database/collection name validation

pub mod catalog;
pub mod connection;
pub mod conversion;
pub mod inspect;
pub mod memory;
pub mod query;
pub mod timestamp;
pub mod validation;

pub use catalog::{Catalog, MongoCatalog};
pub use connection::{ConnectionManager, Connector, MongoConnector, PoolConfig};
pub use conversion::{bson_to_json, document_to_json};
pub use memory::InMemoryCatalog;
pub use mongoscope_common::{MongoscopeError, Result};
pub use query::QueryBuilder;
pub use timestamp::{to_iso_string, HasEmbeddedTimestamp};
pub use validation::{ValidatedCollectionName, ValidatedDatabaseName};
