//! Advisory pipeline: resolve language, build prompt, generate, clean and verify

use crate::cleaner;
use crate::error::LLMError;
use crate::prompt::build_prompt;
use crate::providers::Provider;
use ecobot_core::{resolve, LanguageEntry};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Which generation call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenerationStage {
    Advisory,
    Verification,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationStage::Advisory => write!(f, "advisory"),
            GenerationStage::Verification => write!(f, "verification"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("Item description is empty")]
    EmptyItem,

    #[error("Generation failed during {stage} pass: {source}")]
    Generation {
        stage: GenerationStage,
        #[source]
        source: LLMError,
    },
}

impl AdvisoryError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AdvisoryError::EmptyItem => "EMPTY_ITEM",
            AdvisoryError::Generation { .. } => "GENERATION_FAILED",
        }
    }

    /// Text suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            AdvisoryError::EmptyItem => "Please enter a valid e-waste item.".to_string(),
            AdvisoryError::Generation { source, .. } => format!("Error generating response: {}", source),
        }
    }
}

/// One incoming query
#[derive(Debug, Clone)]
pub struct AdvisoryRequest {
    pub item: String,
    pub language: &'static LanguageEntry,
}

impl AdvisoryRequest {
    /// Validate the item and resolve the language token (unknown tokens become English)
    pub fn new(item: &str, language_token: &str) -> Result<Self, AdvisoryError> {
        let item = item.trim();
        if item.is_empty() {
            return Err(AdvisoryError::EmptyItem);
        }

        Ok(Self {
            item: item.to_string(),
            language: resolve(language_token),
        })
    }
}

/// Result of a successful advisory query
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryResponse {
    pub item: String,
    pub language: &'static LanguageEntry,
    pub raw_text: String,
    pub cleaned_text: String,
    /// True when the verification pass ran
    pub verified: bool,
}

/// Runs the whole query pipeline against a generation provider
#[derive(Clone)]
pub struct Advisor {
    provider: Arc<dyn Provider>,
}

impl Advisor {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Resolve `language_token` and produce the advisory for `item`
    pub async fn advise(&self, item: &str, language_token: &str) -> Result<AdvisoryResponse, AdvisoryError> {
        let request = AdvisoryRequest::new(item, language_token)?;
        self.advise_request(request).await
    }

    pub async fn advise_request(&self, request: AdvisoryRequest) -> Result<AdvisoryResponse, AdvisoryError> {
        let AdvisoryRequest { item, language } = request;
        info!("Advisory requested for {:?} in {}", item, language.display_name);

        let prompt = build_prompt(&item, language);
        let raw_text = self
            .provider
            .generate(&prompt)
            .await
            .map_err(|source| AdvisoryError::Generation {
                stage: GenerationStage::Advisory,
                source,
            })?;
        debug!("Received {} bytes of advisory text", raw_text.len());

        let processed = cleaner::process(self.provider.as_ref(), &raw_text, language)
            .await
            .map_err(|source| AdvisoryError::Generation {
                stage: GenerationStage::Verification,
                source,
            })?;

        Ok(AdvisoryResponse {
            item,
            language,
            raw_text,
            cleaned_text: processed.text,
            verified: processed.verified,
        })
    }
}
