use async_trait::async_trait;
use crate::config::*;
use crate::error::{LLMError, Result};

/// A hosted text-generation service
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Chat completion
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Send one prompt and return the completion text.
    ///
    /// Blank completions count as failures.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.chat(ChatRequest::user(prompt)).await?;
        if response.content.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }
        Ok(response.content)
    }
}
