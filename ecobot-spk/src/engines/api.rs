//! Online speech engine backed by the Google Translate TTS endpoint

use crate::config::SpeechConfig;
use crate::engines::{sanitize_text, TtsEngine};
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// The endpoint rejects requests longer than this many characters
pub const MAX_CHUNK_CHARS: usize = 100;

const MAX_TEXT_BYTES: usize = 100_000;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; ecobot)";

/// Networked MP3 synthesis, one request per text chunk
pub struct GoogleTranslateTts {
    client: Client,
    endpoint: String,
}

impl GoogleTranslateTts {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, SpeechError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(SpeechError::Config(format!("Invalid speech endpoint {:?}", endpoint)));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SpeechError::Engine(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &SpeechConfig) -> Result<Self, SpeechError> {
        Self::new(config.online_endpoint.clone(), config.timeout_secs)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language_code: &str,
        idx: usize,
        total: usize,
    ) -> Result<Bytes, SpeechError> {
        let url = format!("{}/translate_tts", self.endpoint);
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language_code),
                ("q", chunk),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SpeechError::Api(format!("Speech request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Api(format!(
                "Speech endpoint returned HTTP {} for language {:?}",
                status, language_code
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Api(format!("Failed to read speech audio: {}", e)))?;

        if audio.is_empty() {
            return Err(SpeechError::Api("Speech endpoint returned no audio".to_string()));
        }

        Ok(audio)
    }
}

#[async_trait]
impl TtsEngine for GoogleTranslateTts {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<Bytes, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::Api("Text cannot be empty".to_string()));
        }

        if text.len() > MAX_TEXT_BYTES {
            return Err(SpeechError::Api("Text too long (max 100KB)".to_string()));
        }

        let code_ok = !language_code.is_empty()
            && language_code.len() <= 16
            && language_code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !code_ok {
            return Err(SpeechError::Api(format!("Unsupported language code {:?}", language_code)));
        }

        let chunks = split_for_tts(&sanitize_text(text), MAX_CHUNK_CHARS);
        debug!("Requesting {} speech chunk(s) in {}", chunks.len(), language_code);

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let part = self.fetch_chunk(chunk, language_code, idx, chunks.len()).await?;
            audio.extend_from_slice(&part);
        }

        Ok(Bytes::from(audio))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "google-translate"
    }
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Words are packed greedily. A chunk is closed early at a sentence end once
/// it is at least half full, so requests tend to end on whole sentences.
/// Words longer than `max_chars` are cut on character boundaries.
pub fn split_for_tts(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;

        if ends_sentence(word) && current_len * 2 >= max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn ends_sentence(word: &str) -> bool {
    word.ends_with(['.', '!', '?', ';', ':', '।', '。', '？', '！'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(split_for_tts("Recycle the battery.", 100), vec!["Recycle the battery."]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(split_for_tts("  \n ", 100).is_empty());
    }

    #[test]
    fn test_long_word_is_cut() {
        let word = "x".repeat(250);
        let chunks = split_for_tts(&word, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn test_breaks_after_sentence() {
        let text = format!("{}. Next sentence here", "a".repeat(60));
        let chunks = split_for_tts(&text, 100);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].ends_with('.'));
        assert_eq!(chunks[1], "Next sentence here");
    }

    #[test]
    fn test_multibyte_counts_chars() {
        let text = "वर्गीकरण ".repeat(30);
        for chunk in split_for_tts(&text, 100) {
            assert!(chunk.chars().count() <= 100);
        }
    }

    proptest! {
        #[test]
        fn prop_chunks_fit_and_keep_words(words in prop::collection::vec("[a-z]{1,20}[.!?]?", 0..60)) {
            let text = words.join(" ");
            let chunks = split_for_tts(&text, MAX_CHUNK_CHARS);
            for chunk in &chunks {
                prop_assert!(!chunk.is_empty());
                prop_assert!(chunk.chars().count() <= MAX_CHUNK_CHARS);
            }
            let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
            let original: Vec<&str> = text.split_whitespace().collect();
            prop_assert_eq!(rejoined, original);
        }
    }
}
