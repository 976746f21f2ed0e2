//! Static validation of candidate queries
//!
//! The raw introspection payload is rebuilt into an executable schema (via
//! SDL) and the candidate document is checked against it: field existence,
//! argument presence and type compatibility, fragment and selection
//! correctness. Nothing here ever executes a query.

use apollo_compiler::validation::Valid;
use apollo_compiler::{ExecutableDocument, Schema};
use cynic::GraphQlResponse;
use cynic_introspection::IntrospectionQuery;

use crate::core::error::PipelineError;
use crate::core::graphql_client::IntrospectionResult;

/// Rebuild an executable schema from the raw introspection payload.
pub fn build_schema(introspection: &IntrospectionResult) -> Result<Valid<Schema>, PipelineError> {
    let response: GraphQlResponse<IntrospectionQuery> =
        serde_json::from_value(introspection.raw().clone()).map_err(|e| {
            PipelineError::MalformedIntrospection(format!(
                "could not decode introspection payload: {e}"
            ))
        })?;

    let data = response.data.ok_or_else(|| {
        PipelineError::MalformedIntrospection(
            "introspection response contained no data".to_string(),
        )
    })?;

    let sdl = data
        .into_schema()
        .map_err(|e| {
            PipelineError::MalformedIntrospection(format!("could not rebuild schema: {e}"))
        })?
        .to_sdl();

    Schema::parse_and_validate(sdl, "schema.graphql").map_err(|e| {
        PipelineError::MalformedIntrospection(format!(
            "rebuilt schema failed validation: {}",
            e.errors
        ))
    })
}

/// Validate a candidate query against the schema.
///
/// Returns every collected diagnostic as a human-readable string; an empty
/// vector means the candidate is structurally valid. A candidate that does
/// not even parse comes back as validation entries, not a process error.
pub fn validate(candidate: &str, schema: &Valid<Schema>) -> Vec<String> {
    match ExecutableDocument::parse_and_validate(schema, candidate, "query.graphql") {
        Ok(_) => Vec::new(),
        Err(invalid) => invalid
            .errors
            .iter()
            .map(|diagnostic| diagnostic.to_string())
            .collect(),
    }
}
