//! HTTP client for the caller-supplied GraphQL endpoint
//!
//! Covers both halves of the conversation with the target server: the
//! introspection fetch that seeds the pipeline, and the execution of a
//! validated query at the end of it.

use cynic::QueryBuilder;
use cynic_introspection::IntrospectionQuery;
use reqwest::Client;
use serde_json::{Value, json};

use crate::core::error::PipelineError;

/// Raw introspection response body, kept verbatim for one request.
///
/// The summarizer reads the `data.__schema.types` subtree; the validator
/// decodes the whole payload into an executable schema.
#[derive(Debug, Clone)]
pub struct IntrospectionResult {
    raw: Value,
}

impl IntrospectionResult {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The `data.__schema.types` subtree, if the payload has the expected shape.
    pub fn types(&self) -> Option<&Value> {
        self.raw.pointer("/data/__schema/types")
    }
}

#[derive(Clone)]
pub struct GraphQlClient {
    client: Client,
}

impl GraphQlClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Run the standard introspection query against `endpoint`.
    ///
    /// Single attempt, no retry. A transport failure, non-success status,
    /// non-JSON body, or GraphQL-level error entry fails the whole request.
    pub async fn introspect(&self, endpoint: &str) -> Result<IntrospectionResult, PipelineError> {
        let operation = IntrospectionQuery::build(());

        let response = self
            .client
            .post(endpoint)
            .json(&operation)
            .send()
            .await
            .map_err(|e| PipelineError::SchemaFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(PipelineError::SchemaFetch(format!(
                "introspection request returned {status}: {body}"
            )));
        }

        let raw: Value = response.json().await.map_err(|e| {
            PipelineError::SchemaFetch(format!("introspection response was not valid JSON: {e}"))
        })?;

        if let Some(errors) = graphql_errors(&raw) {
            return Err(PipelineError::SchemaFetch(format!(
                "introspection returned errors: {errors}"
            )));
        }

        Ok(IntrospectionResult::new(raw))
    }

    /// Execute a validated query against `endpoint` and return the parsed body.
    pub async fn execute(&self, endpoint: &str, query: &str) -> Result<Value, PipelineError> {
        let response = self
            .client
            .post(endpoint)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(PipelineError::Transport(format!("{status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Transport(format!("response was not valid JSON: {e}")))?;

        if let Some(errors) = graphql_errors(&body) {
            return Err(PipelineError::Execution(errors));
        }

        Ok(body)
    }
}

impl Default for GraphQlClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string())
}

/// Collect the `message` of every entry in a top-level `errors` array.
///
/// Returns `None` when the array is absent or empty; an empty `errors`
/// array counts as success.
fn graphql_errors(body: &Value) -> Option<String> {
    let errors = body.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }

    Some(
        errors
            .iter()
            .map(|entry| {
                entry
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("; "),
    )
}
