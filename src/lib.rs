//! Natural-language → GraphQL translation service
//!
//! Accepts a prompt and a GraphQL endpoint, introspects the endpoint,
//! compresses the schema into a model-sized summary, asks a language model
//! for a candidate query, statically validates the candidate against the
//! real schema (with one feedback-driven regeneration on failure), executes
//! it and returns the result.

use clap::Parser;
use std::sync::Arc;

pub mod core;
pub mod web;

use crate::core::model::{ModelConfig, OpenAiBackend};
use crate::core::pipeline::Pipeline;

/// Constants used throughout the application
pub const DEFAULT_PORT: u16 = 10000;
pub const SUMMARY_FIELD_LIMIT: usize = 3;
pub const RETRY_BUDGET: usize = 1;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(
        short,
        long,
        help = "Port to listen on (overrides the PORT environment variable)"
    )]
    pub port: Option<u16>,

    #[arg(
        long,
        help = "Completion model name (overrides the OPENAI_MODEL environment variable)"
    )]
    pub model: Option<String>,

    #[arg(
        long,
        default_value_t = SUMMARY_FIELD_LIMIT,
        help = "Fields listed per object type in the schema summary"
    )]
    pub summary_fields: usize,

    #[arg(
        long,
        default_value_t = RETRY_BUDGET,
        help = "Feedback regeneration rounds after a failed validation"
    )]
    pub retry_budget: usize,
}

impl Args {
    /// Listen port: CLI flag, then the PORT environment variable, then the
    /// fixed default.
    pub fn listen_port(&self) -> u16 {
        self.port
            .or_else(|| std::env::var("PORT").ok().and_then(|port| port.parse().ok()))
            .unwrap_or(DEFAULT_PORT)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub default_endpoint: Option<String>,
}

impl AppState {
    /// Create a new AppState from command-line arguments and the environment
    pub fn new(args: &Args) -> anyhow::Result<Self> {
        let config = ModelConfig::from_env(args.model.clone())?;
        tracing::info!(model = %config.model, "completion backend configured");

        let default_endpoint = std::env::var("GRAPHQL_ENDPOINT")
            .ok()
            .filter(|endpoint| !endpoint.trim().is_empty());
        match &default_endpoint {
            Some(endpoint) => tracing::info!(%endpoint, "default GraphQL endpoint configured"),
            None => tracing::info!("no default GraphQL endpoint; requests must supply one"),
        }

        let backend = Arc::new(OpenAiBackend::new(config));

        Ok(Self {
            pipeline: Arc::new(Pipeline::new(
                backend,
                args.summary_fields,
                args.retry_budget,
            )),
            default_endpoint,
        })
    }
}
