//! mongoscope HTTP gateway
//!
//! Read-only introspection endpoints over a MongoDB cluster: databases,
//! collections, collection data and last-update times.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use server::{create_router, init_logging, run_server};
pub use state::AppState;
