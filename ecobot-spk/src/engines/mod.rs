//! Speech engine implementations

pub mod api;
pub mod custom;
pub mod native;

use crate::error::SpeechError;
use crate::playback::{Playback, StopSignal};
use crate::voices::VoiceDescriptor;
use async_trait::async_trait;
use bytes::Bytes;

/// Networked engine that turns text into encoded audio
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Synthesize `text` in the language identified by `language_code`
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<Bytes, SpeechError>;

    /// Check if engine is available
    fn is_available(&self) -> bool;

    /// Get engine name
    fn name(&self) -> &str;
}

/// Local engine that speaks directly to the audio device
#[async_trait]
pub trait LocalSpeechEngine: Send + Sync {
    /// Installed voices
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError>;

    /// Speak `text` and wait until it finishes or `stop` fires.
    ///
    /// `voice_id` of `None` uses the engine's default voice.
    async fn speak(
        &self,
        text: &str,
        voice_id: Option<&str>,
        rate: u32,
        stop: &StopSignal,
    ) -> Result<Playback, SpeechError>;

    fn name(&self) -> &str;
}

/// Drop control characters except line breaks and tabs
pub(crate) fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}
