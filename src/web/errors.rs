//! Error types and handling for web handlers

use axum::{Json as AxumJson, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::core::error::PipelineError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Both 'prompt' and 'endpoint' fields are required")]
    MissingFields,

    #[error("{0}")]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFields => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = AxumJson(serde_json::json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_missing_fields_status_code() {
        assert_eq!(ApiError::MissingFields.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_fields_message() {
        assert_eq!(
            ApiError::MissingFields.to_string(),
            "Both 'prompt' and 'endpoint' fields are required"
        );
    }

    #[test]
    fn test_pipeline_errors_map_to_internal() {
        let error = ApiError::from(PipelineError::SchemaFetch("connection refused".to_string()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            error.to_string(),
            "failed to fetch schema: connection refused"
        );
    }

    #[test]
    fn test_execution_error_message_is_preserved() {
        let error = ApiError::from(PipelineError::Execution("field x unknown".to_string()));
        assert_eq!(
            error.to_string(),
            "GraphQL execution returned errors: field x unknown"
        );
    }
}
