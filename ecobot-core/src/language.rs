//! Language catalog and resolver
//!
//! The catalog is a fixed, immutable table. Every lookup hands out
//! `&'static LanguageEntry`, so it can be shared across request handlers
//! without locking.

use serde::Serialize;

/// Code of the universal fallback language.
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// One supported language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LanguageEntry {
    /// Short canonical identifier (e.g. "en")
    pub code: &'static str,
    /// Human-readable name used in prompts (e.g. "English")
    pub display_name: &'static str,
    /// Identifier handed to the speech engines
    pub speech_code: &'static str,
}

impl LanguageEntry {
    const fn new(code: &'static str, display_name: &'static str, speech_code: &'static str) -> Self {
        Self {
            code,
            display_name,
            speech_code,
        }
    }

    pub fn is_default(&self) -> bool {
        self.code == DEFAULT_LANGUAGE_CODE
    }
}

static CATALOG: [LanguageEntry; 20] = [
    LanguageEntry::new("en", "English", "en"),
    LanguageEntry::new("hi", "Hindi", "hi"),
    LanguageEntry::new("bn", "Bengali", "bn"),
    LanguageEntry::new("ta", "Tamil", "ta"),
    LanguageEntry::new("te", "Telugu", "te"),
    LanguageEntry::new("mr", "Marathi", "mr"),
    LanguageEntry::new("gu", "Gujarati", "gu"),
    LanguageEntry::new("kn", "Kannada", "kn"),
    LanguageEntry::new("ml", "Malayalam", "ml"),
    LanguageEntry::new("pa", "Punjabi", "pa"),
    LanguageEntry::new("ur", "Urdu", "ur"),
    LanguageEntry::new("es", "Spanish", "es"),
    LanguageEntry::new("fr", "French", "fr"),
    LanguageEntry::new("de", "German", "de"),
    LanguageEntry::new("pt", "Portuguese", "pt"),
    LanguageEntry::new("it", "Italian", "it"),
    LanguageEntry::new("ru", "Russian", "ru"),
    LanguageEntry::new("ja", "Japanese", "ja"),
    LanguageEntry::new("ar", "Arabic", "ar"),
    LanguageEntry::new("zh", "Chinese", "zh-CN"),
];

/// All supported languages, default first.
pub fn catalog() -> &'static [LanguageEntry] {
    &CATALOG
}

/// The fallback entry ("en").
pub fn default_language() -> &'static LanguageEntry {
    &CATALOG[0]
}

/// Exact code lookup.
pub fn lookup_code(code: &str) -> Option<&'static LanguageEntry> {
    CATALOG.iter().find(|entry| entry.code == code)
}

/// Map a user-supplied token (code or display name) to a catalog entry.
///
/// Exact code match is tried first, then a case-insensitive display name
/// match. Anything else resolves to the default language; this never fails.
pub fn resolve(token: &str) -> &'static LanguageEntry {
    let token = token.trim();

    if let Some(entry) = lookup_code(token) {
        return entry;
    }

    if let Some(entry) = CATALOG
        .iter()
        .find(|entry| entry.display_name.eq_ignore_ascii_case(token))
    {
        return entry;
    }

    tracing::debug!("Unknown language token {:?}, using {}", token, DEFAULT_LANGUAGE_CODE);
    default_language()
}
