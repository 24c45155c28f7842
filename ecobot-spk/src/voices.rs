//! Ranked voice search over an offline engine's voice list

use serde::Serialize;
use std::fmt;

/// One installed offline voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceDescriptor {
    /// Identifier handed back to the engine when speaking
    pub id: String,
    /// Human-readable voice name
    pub name: String,
    /// Language tags the voice declares (e.g. "en-us", "hi", "zh_CN")
    pub languages: Vec<String>,
}

impl VoiceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, languages: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            languages,
        }
    }
}

/// How well a voice matches a speech code. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MatchRank {
    /// The voice id contains the speech code
    IdContains = 1,
    /// Primary language subtags agree ("zh-CN" and "zh")
    PrimaryLanguage = 2,
    /// A declared language equals the speech code
    ExactLanguage = 3,
}

/// Result of a voice search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VoiceSelection {
    Matched { voice: VoiceDescriptor, rank: MatchRank },
    /// Nothing matched; the engine's default voice is used
    Default { warning: String },
}

impl VoiceSelection {
    /// Voice id to pass to the engine, `None` for the engine default
    pub fn voice_id(&self) -> Option<&str> {
        match self {
            VoiceSelection::Matched { voice, .. } => Some(voice.id.as_str()),
            VoiceSelection::Default { .. } => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            VoiceSelection::Matched { .. } => None,
            VoiceSelection::Default { warning } => Some(warning.as_str()),
        }
    }
}

impl fmt::Display for VoiceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceSelection::Matched { voice, .. } => write!(f, "{} ({})", voice.name, voice.id),
            VoiceSelection::Default { .. } => write!(f, "default voice"),
        }
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('_', "-")
}

fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Rank a single voice against a speech code.
pub fn rank_voice(voice: &VoiceDescriptor, speech_code: &str) -> Option<MatchRank> {
    let code = normalize_tag(speech_code);
    if code.is_empty() {
        return None;
    }

    let languages: Vec<String> = voice.languages.iter().map(|l| normalize_tag(l)).collect();

    if languages.iter().any(|l| *l == code) {
        return Some(MatchRank::ExactLanguage);
    }

    let primary = primary_subtag(&code);
    if languages
        .iter()
        .any(|l| !l.is_empty() && primary_subtag(l) == primary)
    {
        return Some(MatchRank::PrimaryLanguage);
    }

    if normalize_tag(&voice.id).contains(&code) {
        return Some(MatchRank::IdContains);
    }

    None
}

/// Pick the best voice for `speech_code`.
///
/// The highest rank wins and earlier voices win ties. When nothing matches,
/// the selection carries a warning for the caller to surface.
pub fn select_voice(voices: &[VoiceDescriptor], speech_code: &str) -> VoiceSelection {
    let mut best: Option<(&VoiceDescriptor, MatchRank)> = None;

    for voice in voices {
        if let Some(rank) = rank_voice(voice, speech_code) {
            if best.map_or(true, |(_, current)| rank > current) {
                best = Some((voice, rank));
            }
        }
    }

    match best {
        Some((voice, rank)) => VoiceSelection::Matched {
            voice: voice.clone(),
            rank,
        },
        None => VoiceSelection::Default {
            warning: format!(
                "No offline voice matches language code {:?} ({} voices checked); using the engine default voice",
                speech_code,
                voices.len()
            ),
        },
    }
}
