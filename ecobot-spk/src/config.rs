//! Configuration for speech output

use ecobot_core::SpeechSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Enable speech output
    pub enabled: bool,

    /// Offline engine speech rate (words per minute, 0-500, default 150)
    pub rate: u32,

    /// Base URL of the online speech endpoint
    pub online_endpoint: String,

    /// Online request timeout in seconds
    pub timeout_secs: u64,

    /// Directory for temporary audio files (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,

    /// Player argv; the audio file path is appended as the last argument
    pub player_command: Option<Vec<String>>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        SpeechConfig::from(&SpeechSettings::default())
    }
}

impl From<&SpeechSettings> for SpeechConfig {
    fn from(settings: &SpeechSettings) -> Self {
        Self {
            enabled: settings.enabled,
            rate: settings.rate,
            online_endpoint: settings.online_endpoint.trim_end_matches('/').to_string(),
            timeout_secs: settings.timeout_secs,
            temp_dir: settings.temp_dir.clone(),
            player_command: settings.player_command.clone(),
        }
    }
}

impl SpeechConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.rate > 500 {
            return Err("Speech rate must be between 0 and 500 WPM".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Online speech timeout must be greater than 0".to_string());
        }

        if !(self.online_endpoint.starts_with("http://") || self.online_endpoint.starts_with("https://")) {
            return Err(format!(
                "Online speech endpoint must be an http(s) URL, got {:?}",
                self.online_endpoint
            ));
        }

        if let Some(ref dir) = self.temp_dir {
            if dir.as_os_str().is_empty() {
                return Err("Temporary audio directory cannot be empty".to_string());
            }
        }

        if let Some(ref cmd) = self.player_command {
            if cmd.first().map_or(true, |program| program.trim().is_empty()) {
                return Err("Player command needs a program name".to_string());
            }
        }

        Ok(())
    }

    /// Where temporary audio files are created
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
