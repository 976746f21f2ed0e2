//! Core pipeline modules: introspection, summarization, synthesis, validation

pub mod error;
pub mod graphql_client;
pub mod model;
pub mod pipeline;
pub mod summary;
pub mod synthesis;
pub mod validation;
