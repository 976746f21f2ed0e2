//! Shared type definitions for the web module

use serde::Deserialize;

/// Inbound translation request body.
#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    pub prompt: Option<String>,
    pub endpoint: Option<String>,
}

impl QueryRequest {
    /// Resolve the request into a usable prompt/endpoint pair.
    ///
    /// The endpoint falls back to the process-wide default when the body
    /// omits it; an absent or blank prompt never resolves.
    pub fn resolve(self, default_endpoint: Option<&str>) -> Option<(String, String)> {
        let prompt = self.prompt.filter(|prompt| !prompt.trim().is_empty())?;
        let endpoint = self
            .endpoint
            .filter(|endpoint| !endpoint.trim().is_empty())
            .or_else(|| default_endpoint.map(str::to_string))?;

        Some((prompt, endpoint))
    }
}
