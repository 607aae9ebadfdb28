//! Route handlers
//!
//! Each handler resolves the shared catalog, issues one query and maps the
//! outcome to a response. Failures carry a fixed client-facing message.

use axum::{
    extract::{Path, State},
    Json,
};
use mongoscope_mongodb::{document_to_json, inspect, to_iso_string};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DATABASES_FAILURE: &str = "Error fetching databases";
const COLLECTIONS_FAILURE: &str = "Error fetching collections";
const DATA_FAILURE: &str = "Error fetching data";
const LAST_UPDATE_FAILURE: &str = "Error fetching last update time";
const NO_DOCUMENTS: &str = "No documents found in this collection";
const NO_UPDATES: &str = "No updates found in this collection";

/// A documented route, as listed by `GET /endpoints`
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub path: &'static str,
    pub description: &'static str,
}

/// Every route the server answers. Keep in step with `server::create_router`.
pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        path: "/databases",
        description: "List all databases",
    },
    Endpoint {
        path: "/databases/:db/collections",
        description: "List all collections in a database",
    },
    Endpoint {
        path: "/databases/:db/collections/:collection/data",
        description: "Get all data from a collection in a database",
    },
    Endpoint {
        path: "/databases/:db/collections/:collection/batch-update-time",
        description: "Get the last update time of documents in a collection",
    },
    Endpoint {
        path: "/databases/:db/collections/:collection/batch-update-time-oplog",
        description: "Get the last insert or update time of a collection from the oplog",
    },
    Endpoint {
        path: "/endpoints",
        description: "List available endpoints",
    },
    Endpoint {
        path: "/",
        description: "Root route",
    },
];

/// Plain-text listing of [`ENDPOINTS`]
pub fn endpoints_text() -> String {
    let mut text = String::from("Available endpoints:\n");
    for endpoint in ENDPOINTS {
        text.push_str(&format!("- GET {}: {}\n", endpoint.path, endpoint.description));
    }
    text
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastUpdateResponse {
    pub last_update_time: String,
}

pub async fn root() -> &'static str {
    "Hello World!"
}

pub async fn list_endpoints() -> String {
    info!("Sent endpoints list");
    endpoints_text()
}

#[instrument(skip(state))]
pub async fn list_databases(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let catalog = state.catalog(DATABASES_FAILURE).await?;
    let names = inspect::list_user_databases(catalog.as_ref())
        .await
        .map_err(ApiError::upstream(DATABASES_FAILURE))?;

    info!("Sent databases: {:?}", names);
    Ok(Json(names))
}

#[instrument(skip(state))]
pub async fn list_collections(
    State(state): State<AppState>,
    Path(database): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    state.check_database(&database)?;
    let catalog = state.catalog(COLLECTIONS_FAILURE).await?;
    let names = inspect::list_collections(catalog.as_ref(), &database)
        .await
        .map_err(ApiError::upstream(COLLECTIONS_FAILURE))?;

    info!("Sent collections: {:?}", names);
    Ok(Json(names))
}

#[instrument(skip(state))]
pub async fn collection_data(
    State(state): State<AppState>,
    Path((database, collection)): Path<(String, String)>,
) -> ApiResult<Json<Vec<JsonValue>>> {
    state.check_namespace(&database, &collection)?;
    let catalog = state.catalog(DATA_FAILURE).await?;
    let documents = inspect::collection_data(catalog.as_ref(), &database, &collection)
        .await
        .map_err(ApiError::upstream(DATA_FAILURE))?;

    info!(
        "Sent {} documents from {} in database {}",
        documents.len(),
        collection,
        database
    );
    Ok(Json(documents.iter().map(document_to_json).collect()))
}

#[instrument(skip(state))]
pub async fn batch_update_time(
    State(state): State<AppState>,
    Path((database, collection)): Path<(String, String)>,
) -> ApiResult<Json<LastUpdateResponse>> {
    state.check_namespace(&database, &collection)?;
    let catalog = state.catalog(LAST_UPDATE_FAILURE).await?;
    let timestamp = inspect::last_update_by_id(catalog.as_ref(), &database, &collection)
        .await
        .map_err(ApiError::upstream(LAST_UPDATE_FAILURE))?
        .ok_or(ApiError::NotFound(NO_DOCUMENTS))?;

    let last_update_time = to_iso_string(timestamp);
    info!(
        "Sent last update time for {} in database {}: {}",
        collection, database, last_update_time
    );
    Ok(Json(LastUpdateResponse { last_update_time }))
}

#[instrument(skip(state))]
pub async fn batch_update_time_oplog(
    State(state): State<AppState>,
    Path((database, collection)): Path<(String, String)>,
) -> ApiResult<Json<LastUpdateResponse>> {
    state.check_namespace(&database, &collection)?;
    let catalog = state.catalog(LAST_UPDATE_FAILURE).await?;
    let timestamp = inspect::last_update_by_oplog(catalog.as_ref(), &database, &collection)
        .await
        .map_err(ApiError::upstream(LAST_UPDATE_FAILURE))?
        .ok_or(ApiError::NotFound(NO_UPDATES))?;

    let last_update_time = to_iso_string(timestamp);
    info!(
        "Sent oplog update time for {} in database {}: {}",
        collection, database, last_update_time
    );
    Ok(Json(LastUpdateResponse { last_update_time }))
}
