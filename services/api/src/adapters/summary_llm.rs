//! services/api/src/adapters/summary_llm.rs
//!
//! This module contains the adapter for the course-summarizing LLM.
//! It implements the `SummaryGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use course_summary_core::ports::{PortError, PortResult, SummaryGenerationService};
use course_summary_core::validation::vet_summary_text;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `SummaryGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiSummaryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSummaryAdapter {
    /// Creates a new `OpenAiSummaryAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `SummaryGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SummaryGenerationService for OpenAiSummaryAdapter {
    /// Issues one chat-completion request asking the model to summarize the
    /// course description. Any transport failure, an empty result, or a
    /// refusal-style answer all surface as `PortError::Upstream`; no retry
    /// is attempted.
    async fn summarize(&self, course_description: &str) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(format!(
                "Summarize this online course: [{}]",
                course_description
            ))
            .build()
            .map_err(|e| PortError::Upstream(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| {
                PortError::Upstream(format!("Failed to generate summary: {}", e))
            })?;

        // Extract the text content from the first choice in the response.
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Upstream(
                    "Summary LLM response contained no text content".to_string(),
                )
            })?;

        vet_summary_text(&content)
            .map_err(|cause| PortError::Upstream(format!("Failed to generate summary: {}", cause)))
    }
}
