//! Response verifier and cleaner

use crate::error::Result;
use crate::prompt::translation_prompt;
use crate::providers::Provider;
use ecobot_core::LanguageEntry;
use tracing::debug;

/// Characters used for emphasis by markdown-ish output (`*x*`, `**x**`, `_x_`, `__x__`)
const EMPHASIS_MARKERS: [char; 2] = ['*', '_'];

/// Text after cleaning, plus whether a verification pass ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedText {
    pub text: String,
    pub verified: bool,
}

/// Remove every emphasis marker character.
pub fn strip_emphasis(text: &str) -> String {
    text.chars().filter(|c| !EMPHASIS_MARKERS.contains(c)).collect()
}

/// Trim each line, drop blank ones and join with a single `\n`.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip emphasis, then normalize line structure.
pub fn clean(text: &str) -> String {
    normalize_lines(&strip_emphasis(text))
}

/// Clean generated text and, for non-default languages, run one verification
/// pass that re-translates the cleaned text into the target language.
///
/// Exactly one extra generation call is made for non-default languages and
/// none for the default. A failed verification call is returned as an error.
pub async fn process(provider: &dyn Provider, raw_text: &str, lang: &LanguageEntry) -> Result<ProcessedText> {
    let cleaned = clean(raw_text);

    if lang.is_default() {
        return Ok(ProcessedText {
            text: cleaned,
            verified: false,
        });
    }

    debug!("Running verification pass for {}", lang.display_name);
    let translated = provider.generate(&translation_prompt(&cleaned, lang)).await?;

    Ok(ProcessedText {
        text: clean(&translated),
        verified: true,
    })
}
