//! Instruction templates for query synthesis
//!
//! Two fixed templates: the initial ask, and a corrective ask that feeds the
//! validator's errors back to the model. The model output is trimmed and
//! otherwise passed through untouched; downstream validation is the only
//! gate on it.

use crate::core::error::PipelineError;
use crate::core::model::CompletionBackend;

/// Produce a candidate query for `question` from the schema summary.
pub async fn synthesize(
    backend: &dyn CompletionBackend,
    question: &str,
    schema_summary: &str,
) -> Result<String, PipelineError> {
    let instruction = format!(
        "Below is a summary of the GraphQL schema:\n\
         {schema_summary}\n\n\
         Based on the schema summary, write a valid GraphQL query for the following question:\n\
         {question}\n\n\
         Return only the GraphQL query."
    );

    Ok(backend.complete(&instruction).await?.trim().to_string())
}

/// Produce a corrected candidate after a failed validation round.
pub async fn synthesize_with_feedback(
    backend: &dyn CompletionBackend,
    question: &str,
    schema_summary: &str,
    error_text: &str,
) -> Result<String, PipelineError> {
    let instruction = format!(
        "Below is a summary of the GraphQL schema:\n\
         {schema_summary}\n\n\
         A previous GraphQL query for the following question failed validation against the schema.\n\
         Question:\n\
         {question}\n\n\
         Validation errors:\n\
         {error_text}\n\n\
         Write a corrected GraphQL query for the question. Return only the GraphQL query."
    );

    Ok(backend.complete(&instruction).await?.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingBackend {
        seen: Mutex<Vec<String>>,
        response: String,
    }

    impl RecordingBackend {
        fn new(response: &str) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                response: response.to_string(),
            }
        }

        fn last_instruction(&self) -> String {
            self.seen.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl CompletionBackend for RecordingBackend {
        async fn complete(&self, instruction: &str) -> Result<String, PipelineError> {
            self.seen.lock().unwrap().push(instruction.to_string());
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn test_synthesize_embeds_summary_and_question() {
        let backend = RecordingBackend::new("query { users { id } }");
        let query = synthesize(&backend, "list all users", "User {\n  id: ID\n}")
            .await
            .unwrap();

        assert_eq!(query, "query { users { id } }");
        let instruction = backend.last_instruction();
        assert!(instruction.contains("User {\n  id: ID\n}"));
        assert!(instruction.contains("list all users"));
        assert!(instruction.ends_with("Return only the GraphQL query."));
    }

    #[tokio::test]
    async fn test_synthesize_trims_model_output() {
        let backend = RecordingBackend::new("\n  query { users { id } }  \n");
        let query = synthesize(&backend, "list users", "").await.unwrap();
        assert_eq!(query, "query { users { id } }");
    }

    #[tokio::test]
    async fn test_feedback_instruction_embeds_errors() {
        let backend = RecordingBackend::new("query { users { name } }");
        let query = synthesize_with_feedback(
            &backend,
            "list all users' names",
            "User {\n  name: String\n}",
            "cannot query field `usrname` on type `User`",
        )
        .await
        .unwrap();

        assert_eq!(query, "query { users { name } }");
        let instruction = backend.last_instruction();
        assert!(instruction.contains("list all users' names"));
        assert!(instruction.contains("cannot query field `usrname` on type `User`"));
        assert!(instruction.contains("failed validation"));
    }
}
