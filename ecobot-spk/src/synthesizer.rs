//! Speech output with online-then-offline fallback
//!
//! One `speak` call walks a small state machine:
//!
//! ```text
//! Pending -> OnlineAttempted -> OfflineAttempted -> Exhausted
//!    |             |                  |
//!    +-- Played / SuppressedByUser ---+
//! ```
//!
//! Each engine is tried at most once. The online engine is skipped when it
//! reports itself unavailable or no audio player exists. Online audio is
//! written to a uniquely named temporary file that is removed on every exit
//! path.

use crate::config::SpeechConfig;
use crate::engines::api::GoogleTranslateTts;
use crate::engines::native::NativeSpeechEngine;
use crate::engines::{LocalSpeechEngine, TtsEngine};
use crate::error::SpeechError;
use crate::playback::{default_player, AudioPlayer, Playback, StopSignal};
use crate::voices::{select_voice, VoiceSelection};
use ecobot_core::LanguageEntry;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Final result of one `speak` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeechOutcome {
    Played,
    SuppressedByUser,
    Failed,
}

/// Engine that produced the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineKind {
    Online,
    Offline,
}

/// Engine-selection state of a speech task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeechState {
    Pending,
    OnlineAttempted,
    OfflineAttempted,
    Exhausted,
}

/// What happened during a `speak` call
#[derive(Debug, Clone, Serialize)]
pub struct SpeechReport {
    pub outcome: SpeechOutcome,
    /// Engine that played or was interrupted; `None` when both failed
    pub engine: Option<EngineKind>,
    /// Offline voice choice, when the offline engine ran
    pub voice: Option<VoiceSelection>,
    pub online_error: Option<String>,
    pub offline_error: Option<String>,
}

impl SpeechReport {
    fn new() -> Self {
        Self {
            outcome: SpeechOutcome::Failed,
            engine: None,
            voice: None,
            online_error: None,
            offline_error: None,
        }
    }

    fn finish(mut self, playback: Playback, engine: EngineKind) -> Self {
        self.outcome = match playback {
            Playback::Completed => SpeechOutcome::Played,
            Playback::Interrupted => SpeechOutcome::SuppressedByUser,
        };
        self.engine = Some(engine);
        self
    }

    /// Warning from the voice search, if it fell back to the default voice
    pub fn voice_warning(&self) -> Option<&str> {
        self.voice.as_ref().and_then(VoiceSelection::warning)
    }
}

/// One unit of speech work, owned by the synthesizer for a single call
#[derive(Debug, Clone)]
pub struct SpeechTask {
    pub text: String,
    pub speech_code: String,
    pub state: SpeechState,
}

impl SpeechTask {
    pub fn new(text: impl Into<String>, speech_code: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speech_code: speech_code.into(),
            state: SpeechState::Pending,
        }
    }
}

/// Speaks text through the online engine, falling back to the offline one
pub struct SpeechSynthesizer {
    config: Arc<SpeechConfig>,
    online: Arc<dyn TtsEngine>,
    offline: Arc<dyn LocalSpeechEngine>,
    player: Option<Arc<dyn AudioPlayer>>,
}

impl SpeechSynthesizer {
    /// Build with the default engines for this platform
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        if !config.enabled {
            return Err(SpeechError::Config("Speech synthesis is disabled".to_string()));
        }

        let online = Arc::new(GoogleTranslateTts::from_config(&config)?);
        let offline = Arc::new(NativeSpeechEngine::new());
        let player = default_player(config.player_command.clone());
        if player.is_none() {
            warn!("No audio player available; speech will use the offline engine only");
        }

        Ok(Self {
            config: Arc::new(config),
            online,
            offline,
            player,
        })
    }

    /// Build from explicit engines
    pub fn with_engines(
        config: SpeechConfig,
        online: Arc<dyn TtsEngine>,
        offline: Arc<dyn LocalSpeechEngine>,
        player: Arc<dyn AudioPlayer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            online,
            offline,
            player: Some(player),
        }
    }

    /// Replace the online engine
    pub fn with_online_engine(mut self, online: Arc<dyn TtsEngine>) -> Self {
        self.online = online;
        self
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    /// Speak `text` in `lang`, honouring `stop` during synthesis and playback.
    ///
    /// Never fails: engine errors end up in the report.
    pub async fn speak(&self, text: &str, lang: &LanguageEntry, stop: &StopSignal) -> SpeechReport {
        let mut task = SpeechTask::new(text, lang.speech_code);
        let mut report = SpeechReport::new();

        if task.text.trim().is_empty() {
            report.online_error = Some("Nothing to speak".to_string());
            return report;
        }

        loop {
            match task.state {
                SpeechState::Pending => {
                    task.state = SpeechState::OnlineAttempted;
                    let player = match self.online_player() {
                        Ok(player) => player,
                        Err(reason) => {
                            debug!("Skipping online speech: {}", reason);
                            report.online_error = Some(reason);
                            continue;
                        }
                    };
                    match self.speak_online(&task, player, stop).await {
                        Ok(playback) => return report.finish(playback, EngineKind::Online),
                        Err(e) => {
                            warn!("Online speech failed, falling back to offline engine: {}", e);
                            report.online_error = Some(e.to_string());
                        }
                    }
                }
                SpeechState::OnlineAttempted => {
                    task.state = SpeechState::OfflineAttempted;
                    let (voice, result) = self.speak_offline(&task, stop).await;
                    report.voice = Some(voice);
                    match result {
                        Ok(playback) => return report.finish(playback, EngineKind::Offline),
                        Err(e) => {
                            warn!("Offline speech failed: {}", e);
                            report.offline_error = Some(e.to_string());
                        }
                    }
                }
                SpeechState::OfflineAttempted => {
                    task.state = SpeechState::Exhausted;
                }
                SpeechState::Exhausted => {
                    info!("All speech engines failed");
                    report.outcome = SpeechOutcome::Failed;
                    return report;
                }
            }
        }
    }

    /// The player for online audio, or why the online engine cannot be used
    fn online_player(&self) -> Result<&dyn AudioPlayer, String> {
        if !self.online.is_available() {
            return Err(format!("Online engine {} is unavailable", self.online.name()));
        }
        self.player
            .as_deref()
            .ok_or_else(|| "No audio player available for online speech".to_string())
    }

    async fn speak_online(
        &self,
        task: &SpeechTask,
        player: &dyn AudioPlayer,
        stop: &StopSignal,
    ) -> Result<Playback, SpeechError> {
        let audio = tokio::select! {
            audio = self.online.synthesize(&task.text, &task.speech_code) => audio?,
            _ = stop.stopped() => return Ok(Playback::Interrupted),
        };

        let mut file = self.create_temp_file()?;
        file.write_all(&audio)?;
        file.flush()?;
        debug!("Wrote {} bytes of audio to {}", audio.len(), file.path().display());

        let result = player.play(file.path(), stop).await;

        let path = file.path().to_path_buf();
        match file.close() {
            Ok(()) => debug!("Removed {}", path.display()),
            Err(e) => warn!("Failed to remove temporary audio file {}: {}", path.display(), e),
        }

        result
    }

    async fn speak_offline(
        &self,
        task: &SpeechTask,
        stop: &StopSignal,
    ) -> (VoiceSelection, Result<Playback, SpeechError>) {
        let voices = match self.offline.list_voices().await {
            Ok(voices) => voices,
            Err(e) => {
                warn!("Could not list offline voices: {}", e);
                Vec::new()
            }
        };

        let selection = select_voice(&voices, &task.speech_code);
        match &selection {
            VoiceSelection::Matched { voice, rank } => {
                debug!("Offline voice {} ({:?}) for {}", voice.id, rank, task.speech_code)
            }
            VoiceSelection::Default { warning } => warn!("{}", warning),
        }

        let result = self
            .offline
            .speak(&task.text, selection.voice_id(), self.config.rate, stop)
            .await;
        (selection, result)
    }

    fn create_temp_file(&self) -> Result<NamedTempFile, SpeechError> {
        let dir = self.config.temp_dir();
        tempfile::Builder::new()
            .prefix("ecobot-speech-")
            .suffix(".mp3")
            .tempfile_in(&dir)
            .map_err(|e| {
                SpeechError::Engine(format!(
                    "Failed to create temporary audio file in {}: {}",
                    dir.display(),
                    e
                ))
            })
    }
}
