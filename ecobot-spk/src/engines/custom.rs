//! Custom online engine built from a closure
//! Lets callers plug their own synthesis service into the fallback chain

use crate::engines::TtsEngine;
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

type SynthesizeFn = dyn Fn(&str, &str) -> Result<Bytes, SpeechError> + Send + Sync;

/// Custom TTS engine wrapper
pub struct CustomTtsEngine {
    name: String,
    synthesize_fn: Arc<SynthesizeFn>,
    is_available_fn: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl CustomTtsEngine {
    /// `synthesize_fn` receives the text and the language code
    pub fn new<F1, F2>(name: impl Into<String>, synthesize_fn: F1, is_available_fn: F2) -> Self
    where
        F1: Fn(&str, &str) -> Result<Bytes, SpeechError> + Send + Sync + 'static,
        F2: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            synthesize_fn: Arc::new(synthesize_fn),
            is_available_fn: Arc::new(is_available_fn),
        }
    }

    /// Engine that always fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            "failing",
            move |_text: &str, _code: &str| Err(SpeechError::Api(message.clone())),
            || true,
        )
    }

    /// Engine that reports itself unavailable, so the synthesizer never calls it
    pub fn unavailable(name: impl Into<String>) -> Self {
        let name = name.into();
        let message = format!("{} is unavailable", name);
        Self::new(
            name,
            move |_text: &str, _code: &str| Err(SpeechError::Engine(message.clone())),
            || false,
        )
    }
}

#[async_trait]
impl TtsEngine for CustomTtsEngine {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<Bytes, SpeechError> {
        if text.is_empty() {
            return Err(SpeechError::Engine("Text cannot be empty".to_string()));
        }

        if text.len() > 100_000 {
            return Err(SpeechError::Engine("Text too long (max 100KB)".to_string()));
        }

        (self.synthesize_fn)(text, language_code)
    }

    fn is_available(&self) -> bool {
        (self.is_available_fn)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
