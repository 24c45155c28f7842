//! ecobot-spk: spoken output for advisories
//!
//! Provides text-to-speech with:
//! - An online engine (Google Translate TTS), played in-process with `rodio`
//!   (`audio` feature) or through a configured player command
//! - A native offline engine (espeak-ng, say, System.Speech)
//! - Ranked voice search for the offline engine
//! - User cancellation through [`StopSignal`]

pub mod config;
pub mod engines;
pub mod error;
pub mod playback;
pub mod synthesizer;
pub mod voices;

pub use config::SpeechConfig;
pub use engines::api::GoogleTranslateTts;
pub use engines::custom::CustomTtsEngine;
pub use engines::native::{NativeBackend, NativeSpeechEngine};
pub use engines::{LocalSpeechEngine, TtsEngine};
pub use error::SpeechError;
pub use playback::{default_player, AudioPlayer, CommandPlayer, Playback, StopSignal};
#[cfg(feature = "audio")]
pub use playback::RodioPlayer;
pub use synthesizer::{EngineKind, SpeechOutcome, SpeechReport, SpeechState, SpeechSynthesizer, SpeechTask};
pub use voices::{select_voice, MatchRank, VoiceDescriptor, VoiceSelection};
