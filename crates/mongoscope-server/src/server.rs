//! Axum setup and router configuration

use axum::{routing::get, Router};
use mongoscope_mongodb::MongoConnector;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{info, warn, Level};

use crate::config::Config;
use crate::routes;
use crate::state::AppState;

/// Build the router over `state`
///
/// Routes here and in [`routes::ENDPOINTS`] must match.
pub fn create_router(state: AppState) -> Router {
    // Any origin may read
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)),
        )
        .layer(cors);

    Router::new()
        .route("/", get(routes::root))
        .route("/endpoints", get(routes::list_endpoints))
        .route("/databases", get(routes::list_databases))
        .route("/databases/{db}/collections", get(routes::list_collections))
        .route(
            "/databases/{db}/collections/{collection}/data",
            get(routes::collection_data),
        )
        .route(
            "/databases/{db}/collections/{collection}/batch-update-time",
            get(routes::batch_update_time),
        )
        .route(
            "/databases/{db}/collections/{collection}/batch-update-time-oplog",
            get(routes::batch_update_time_oplog),
        )
        .with_state(state)
        .layer(middleware)
}

/// Run the server until Ctrl+C or SIGTERM
///
/// No connection is opened here; the first request that needs the cluster connects.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let connector = MongoConnector::with_config(config.mongodb_uri.clone(), config.pool_config());
    let state = AppState::new(connector, config.validate_names);
    let app = create_router(state);

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server is running on port {}", addr.port());
    if config.validate_names {
        info!("Database and collection name validation enabled");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize logging: RUST_LOG first, then `level`, then info
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Unable to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
