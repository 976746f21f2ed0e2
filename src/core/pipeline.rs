//! Request orchestration
//!
//! One request walks fetch → summarize → synthesize → validate →
//! (feedback retry) → execute. The retry budget bounds the worst case to
//! `1 + retry_budget` completion calls and validation passes; with the
//! default budget of one, a request never costs more than two model calls.

use std::sync::Arc;

use apollo_compiler::Schema;
use apollo_compiler::validation::Valid;
use serde_json::Value;

use crate::core::error::PipelineError;
use crate::core::graphql_client::GraphQlClient;
use crate::core::model::CompletionBackend;
use crate::core::summary::summarize;
use crate::core::synthesis::{synthesize, synthesize_with_feedback};
use crate::core::validation::{build_schema, validate};

/// Diagnostics attached to a successful response when a feedback round ran.
#[derive(Debug, Clone)]
pub struct RetryDiagnostics {
    pub original_errors: String,
}

/// Terminal outcome of a translation request.
#[derive(Debug)]
pub enum QueryOutcome {
    /// A candidate passed validation and was executed.
    Executed {
        query: String,
        result: Value,
        retry: Option<RetryDiagnostics>,
    },
    /// Every candidate within the retry budget failed validation.
    Rejected {
        first_query: String,
        retry_query: String,
        errors: Vec<String>,
    },
}

pub struct Pipeline {
    graphql: GraphQlClient,
    backend: Arc<dyn CompletionBackend>,
    summary_field_limit: usize,
    retry_budget: usize,
}

impl Pipeline {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        summary_field_limit: usize,
        retry_budget: usize,
    ) -> Self {
        Self {
            graphql: GraphQlClient::new(),
            backend,
            summary_field_limit,
            retry_budget,
        }
    }

    /// Translate `prompt` into a validated query against `endpoint`, execute
    /// it, and return the outcome.
    pub async fn run(&self, prompt: &str, endpoint: &str) -> Result<QueryOutcome, PipelineError> {
        let introspection = self.graphql.introspect(endpoint).await?;
        let summary = summarize(&introspection, self.summary_field_limit)?;
        let schema = build_schema(&introspection)?;
        tracing::debug!(summary_bytes = summary.len(), "schema fetched and summarized");

        match generate(
            self.backend.as_ref(),
            prompt,
            &summary,
            &schema,
            self.retry_budget,
        )
        .await?
        {
            Generation::Accepted { query, retry } => {
                let result = self.graphql.execute(endpoint, &query).await?;
                Ok(QueryOutcome::Executed {
                    query,
                    result,
                    retry,
                })
            }
            Generation::Rejected {
                first_query,
                retry_query,
                errors,
            } => Ok(QueryOutcome::Rejected {
                first_query,
                retry_query,
                errors,
            }),
        }
    }
}

#[derive(Debug)]
enum Generation {
    Accepted {
        query: String,
        retry: Option<RetryDiagnostics>,
    },
    Rejected {
        first_query: String,
        retry_query: String,
        errors: Vec<String>,
    },
}

/// Synthesize and validate candidates until one passes or the budget runs out.
async fn generate(
    backend: &dyn CompletionBackend,
    prompt: &str,
    summary: &str,
    schema: &Valid<Schema>,
    retry_budget: usize,
) -> Result<Generation, PipelineError> {
    let first_query = synthesize(backend, prompt, summary).await?;
    let mut errors = validate(&first_query, schema);

    if errors.is_empty() {
        return Ok(Generation::Accepted {
            query: first_query,
            retry: None,
        });
    }

    let mut last_query = first_query.clone();
    for round in 0..retry_budget {
        let error_text = errors.join("\n");
        tracing::info!(round, "candidate failed validation, regenerating with feedback");

        let retried = synthesize_with_feedback(backend, prompt, summary, &error_text).await?;
        let retried_errors = validate(&retried, schema);

        if retried_errors.is_empty() {
            return Ok(Generation::Accepted {
                query: retried,
                retry: Some(RetryDiagnostics {
                    original_errors: error_text,
                }),
            });
        }

        last_query = retried;
        errors = retried_errors;
    }

    Ok(Generation::Rejected {
        first_query,
        retry_query: last_query,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FIXTURE_SDL: &str = r#"
        type Query {
          users: [User]
        }

        type User {
          id: ID
          name: String
        }
    "#;

    const VALID_QUERY: &str = "query { users { id name } }";
    const INVALID_QUERY: &str = "query { users { usrname } }";
    const ANOTHER_INVALID_QUERY: &str = "query { accounts { id } }";

    fn fixture_schema() -> Valid<Schema> {
        Schema::parse_and_validate(FIXTURE_SDL, "fixture.graphql")
            .expect("fixture schema is valid")
    }

    struct ScriptedBackend {
        responses: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, _instruction: &str) -> Result<String, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(PipelineError::Model(
                    "scripted backend ran out of responses".to_string(),
                ));
            }
            Ok(responses.remove(0))
        }
    }

    #[tokio::test]
    async fn test_first_valid_candidate_needs_one_call() {
        let backend = ScriptedBackend::new(&[VALID_QUERY]);
        let generation = generate(&backend, "list users", "", &fixture_schema(), 1)
            .await
            .unwrap();

        match generation {
            Generation::Accepted { query, retry } => {
                assert_eq!(query, VALID_QUERY);
                assert!(retry.is_none());
            }
            Generation::Rejected { .. } => panic!("expected accepted candidate"),
        }
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_candidate_retries_with_feedback() {
        let backend = ScriptedBackend::new(&[INVALID_QUERY, VALID_QUERY]);
        let generation = generate(&backend, "list users", "", &fixture_schema(), 1)
            .await
            .unwrap();

        match generation {
            Generation::Accepted { query, retry } => {
                assert_eq!(query, VALID_QUERY);
                let retry = retry.expect("retry diagnostics recorded");
                assert!(retry.original_errors.contains("usrname"));
            }
            Generation::Rejected { .. } => panic!("expected accepted candidate"),
        }
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_rejects_after_exhausting_retry_budget() {
        // More scripted responses than the budget allows; only two may be used.
        let backend = ScriptedBackend::new(&[
            INVALID_QUERY,
            ANOTHER_INVALID_QUERY,
            VALID_QUERY,
            VALID_QUERY,
        ]);
        let generation = generate(&backend, "list users", "", &fixture_schema(), 1)
            .await
            .unwrap();

        match generation {
            Generation::Rejected {
                first_query,
                retry_query,
                errors,
            } => {
                assert_eq!(first_query, INVALID_QUERY);
                assert_eq!(retry_query, ANOTHER_INVALID_QUERY);
                assert!(!errors.is_empty());
            }
            Generation::Accepted { .. } => panic!("expected rejected generation"),
        }
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_retry_budget_rejects_immediately() {
        let backend = ScriptedBackend::new(&[INVALID_QUERY, VALID_QUERY]);
        let generation = generate(&backend, "list users", "", &fixture_schema(), 0)
            .await
            .unwrap();

        match generation {
            Generation::Rejected {
                first_query,
                retry_query,
                ..
            } => {
                assert_eq!(first_query, INVALID_QUERY);
                assert_eq!(retry_query, INVALID_QUERY);
            }
            Generation::Accepted { .. } => panic!("expected rejected generation"),
        }
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let backend = ScriptedBackend::new(&[]);
        let error = generate(&backend, "list users", "", &fixture_schema(), 1)
            .await
            .unwrap_err();
        assert!(matches!(error, PipelineError::Model(_)));
    }
}
