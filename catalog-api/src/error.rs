use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::infrastructure::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// Malformed or oversized multipart body; keeps the extractor's status.
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// A server-side failure of a named operation, e.g. "Error adding product".
    #[error("{summary}: {source}")]
    Operation {
        summary: &'static str,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Wraps server-side failures with the summary reported to the client.
    /// Client errors pass through untouched.
    pub fn during(self, summary: &'static str) -> Self {
        match self {
            AppError::Validation(_) | AppError::Multipart(_) | AppError::Operation { .. } => self,
            other => AppError::Operation {
                summary,
                source: Box::new(other),
            },
        }
    }

    /// The underlying diagnostic without the variant prefix.
    pub fn details(&self) -> String {
        match self {
            AppError::Validation(m) | AppError::Internal(m) => m.clone(),
            AppError::Multipart(e) => e.body_text(),
            AppError::Storage(e) => e.to_string(),
            AppError::Database(e) => e.to_string(),
            AppError::Config(e) => e.to_string(),
            AppError::Io(e) => e.to_string(),
            AppError::Operation { source, .. } => source.details(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(message) => {
                tracing::warn!(error = %message, "Rejected submission");
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            AppError::Multipart(e) => {
                tracing::warn!(error = %e, status = %e.status(), "Malformed request body");
                (
                    e.status(),
                    json!({ "error": "Invalid request body", "details": e.body_text() }),
                )
            }
            other => {
                let summary = match other {
                    AppError::Operation { summary, .. } => *summary,
                    AppError::Storage(_) => "Storage error",
                    AppError::Database(_) => "Database error",
                    AppError::Config(_) => "Configuration error",
                    _ => "Internal server error",
                };
                tracing::error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": summary, "details": other.details() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_is_a_client_error_without_details() {
        let (status, body) = render(AppError::Validation("Missing fields".into())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing fields" }));
    }

    #[tokio::test]
    async fn operation_failure_reports_summary_and_details() {
        let error = AppError::Database(sqlx::Error::PoolTimedOut).during("Error adding product");
        let (status, body) = render(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error adding product");
        assert_eq!(body["details"], sqlx::Error::PoolTimedOut.to_string());
    }

    #[tokio::test]
    async fn storage_and_database_failures_share_one_shape() {
        let storage = AppError::Storage(StorageError::Upload("bucket unreachable".into()))
            .during("Error adding product");
        let (status, body) = render(storage).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error adding product");
        assert!(body["details"].as_str().unwrap().contains("bucket unreachable"));
    }

    #[test]
    fn during_leaves_client_errors_alone() {
        let error = AppError::Validation("Missing fields".into()).during("Error adding product");

        assert!(matches!(error, AppError::Validation(_)));
    }
}
