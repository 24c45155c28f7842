use async_trait::async_trait;
use crate::config::*;
use crate::error::{LLMError, Result};
use crate::providers::trait_impl::Provider;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use parking_lot::RwLock;

/// Gemini `generateContent` client
pub struct GoogleProvider {
    api_key: Arc<RwLock<Option<String>>>,
    client: Client,
    config: LLMConfig,
}

impl GoogleProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            api_key: Arc::new(RwLock::new(None)),
            client,
            config,
        })
    }

    pub fn with_api_key(config: LLMConfig, api_key: String) -> Result<Self> {
        let provider = Self::new(config)?;
        provider.set_api_key(api_key);
        Ok(provider)
    }

    pub fn set_api_key(&self, key: String) {
        if key.trim().is_empty() {
            tracing::warn!("Empty API key provided for Google");
            return;
        }
        *self.api_key.write() = Some(key);
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub(crate) fn get_api_key(&self) -> Result<String> {
        self.api_key
            .read()
            .as_ref()
            .cloned()
            .ok_or_else(|| LLMError::MissingApiKey("Google".to_string()))
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let api_key = self.get_api_key()?;
        let model = request.model.unwrap_or_else(|| self.config.model.clone());

        let contents: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        MessageRole::System => "user", // Gemini has no system role in contents
                        MessageRole::User => "user",
                        MessageRole::Assistant => "model",
                    },
                    "parts": [{"text": m.content}]
                })
            })
            .collect();

        let temperature = request.temperature.unwrap_or(self.config.temperature);
        let mut generation_config = json!({
            "temperature": temperature.clamp(0.0, 2.0),
        });
        if let Some(max_tokens) = request.max_tokens.or(self.config.max_tokens) {
            generation_config["maxOutputTokens"] = json!(max_tokens.min(8192));
        }

        let body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });

        let base_url = &self.config.base_url;
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(LLMError::InvalidResponse("Invalid base URL".to_string()));
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            base_url,
            urlencoding::encode(&model),
            urlencoding::encode(&api_key)
        );

        tracing::debug!("Calling Gemini model {}", model);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LLMError::AuthenticationFailed,
                StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimit,
                _ => LLMError::InvalidResponse(format!("HTTP {}: {}", status, text)),
            });
        }

        let json: serde_json::Value = response.json().await?;

        if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
            return Err(LLMError::Provider(format!("Prompt blocked: {}", reason)));
        }

        // A candidate may split its answer over several parts
        let content = json["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }

        let usage = json.get("usageMetadata").and_then(|u| {
            Some(Usage {
                prompt_tokens: u["promptTokenCount"].as_u64()? as u32,
                completion_tokens: u["candidatesTokenCount"].as_u64()? as u32,
                total_tokens: u["totalTokenCount"].as_u64()? as u32,
            })
        });

        Ok(ChatResponse {
            content,
            model,
            usage,
            finish_reason: json["candidates"][0]["finishReason"].as_str().map(|s| s.to_string()),
        })
    }
}
