//! HTTP handlers for the translation API

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::AppState;
use crate::core::pipeline::QueryOutcome;
use crate::web::{errors::ApiError, types::QueryRequest};

#[axum_macros::debug_handler]
pub async fn query_handler(
    State(app_state): State<AppState>,
    body: Option<Json<QueryRequest>>,
) -> Result<Response, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let (prompt, endpoint) = request
        .resolve(app_state.default_endpoint.as_deref())
        .ok_or(ApiError::MissingFields)?;

    tracing::info!(%endpoint, "translating prompt");

    match app_state.pipeline.run(&prompt, &endpoint).await? {
        QueryOutcome::Executed {
            query,
            result,
            retry,
        } => {
            let mut payload = json!({
                "prompt": prompt,
                "graphql_query": query,
                "result": result,
            });
            if let Some(retry) = retry {
                payload["retried_with_error_feedback"] = json!(true);
                payload["original_validation_errors"] = json!(retry.original_errors);
            }
            Ok(Json(payload).into_response())
        }
        QueryOutcome::Rejected {
            first_query,
            retry_query,
            errors,
        } => {
            tracing::warn!(error_count = errors.len(), "all candidates failed validation");
            let payload = json!({
                "prompt": prompt,
                "graphql_query_attempted": first_query,
                "graphql_query_retry": retry_query,
                "validation_errors": errors,
            });
            Ok((StatusCode::BAD_REQUEST, Json(payload)).into_response())
        }
    }
}
