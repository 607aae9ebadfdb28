//! Error types for mongoscope-server
//!
//! Clients only ever see fixed text. The underlying error goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongoscope_common::MongoscopeError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Body returned when a name fails validation
pub const INVALID_NAME_MESSAGE: &str = "Invalid database or collection name";

#[derive(Error, Debug)]
pub enum ApiError {
    /// The query legitimately matched nothing
    #[error("{0}")]
    NotFound(&'static str),

    /// The driver, network or cluster failed
    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        #[source]
        source: MongoscopeError,
    },

    /// A database or collection name was rejected before reaching the driver
    #[error("{0}")]
    InvalidName(#[source] MongoscopeError),
}

impl ApiError {
    /// Wrap a failure with the fixed text the client will see
    ///
    /// The source is logged here rather than in `into_response`, so the line
    /// lands in the calling handler's span along with its path parameters.
    pub fn upstream(message: &'static str) -> impl FnOnce(MongoscopeError) -> ApiError {
        move |source| {
            tracing::error!(error = %source, "{}", message);
            ApiError::Upstream { message, source }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidName(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            ApiError::NotFound(message) => message,
            ApiError::Upstream { message, .. } => message,
            ApiError::InvalidName(source) => {
                tracing::warn!(error = %source, "Rejected request");
                INVALID_NAME_MESSAGE
            }
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_upstream_hides_source() {
        let err = ApiError::upstream("Error fetching data")(MongoscopeError::MongoDB(
            "auth failed for user root:hunter2".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Error fetching data");
    }

    #[tokio::test]
    async fn test_not_found() {
        let response = ApiError::NotFound("No documents found in this collection").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_text(response).await,
            "No documents found in this collection"
        );
    }

    #[tokio::test]
    async fn test_invalid_name() {
        let response = ApiError::InvalidName(MongoscopeError::Validation(
            "Collection name cannot contain '$' character".to_string(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, INVALID_NAME_MESSAGE);
    }

    #[test]
    fn test_display_keeps_detail_for_logs() {
        let err = ApiError::upstream("Error fetching databases")(MongoscopeError::Connection(
            "timeout".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Error fetching databases: Connection error: timeout"
        );
    }
}
