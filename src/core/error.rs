//! Pipeline error taxonomy
//!
//! Every failure an internal component can raise. The web layer converts
//! these into HTTP status/payload pairs, so none escapes a handler
//! unhandled.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Introspection could not be fetched: transport failure, non-success
    /// status, a non-JSON body, or GraphQL-level errors in the response.
    #[error("failed to fetch schema: {0}")]
    SchemaFetch(String),

    /// The fetched payload does not have the expected introspection shape.
    #[error("unexpected introspection payload: {0}")]
    MalformedIntrospection(String),

    /// The completion call failed or returned an unusable response.
    #[error("language model call failed: {0}")]
    Model(String),

    /// The target endpoint rejected the execution request at the HTTP level.
    #[error("query execution failed: {0}")]
    Transport(String),

    /// The target endpoint answered with a success status but reported
    /// GraphQL errors in the body.
    #[error("GraphQL execution returned errors: {0}")]
    Execution(String),
}
