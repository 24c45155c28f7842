// Configuration for the EcoBot binaries

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Dotenv file consulted by [`EcobotConfig::load`]
pub const DOTENV_FILE: &str = ".env";

/// Top-level configuration shared by the CLI and the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EcobotConfig {
    pub llm: LlmSettings,
    pub speech: SpeechSettings,
    pub server: ServerSettings,
}

/// Generation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Gemini API key; normally supplied through the environment
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Speech output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub enabled: bool,
    /// Offline engine speech rate (words per minute, 0-500)
    pub rate: u32,
    pub online_endpoint: String,
    pub timeout_secs: u64,
    /// Where temporary audio files go (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
    /// Command used to play MP3 files; the path is appended as last argument
    pub player_command: Option<Vec<String>>,
}

/// HTTP service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.4,
            max_tokens: 2048,
            timeout_secs: 30,
        }
    }
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 150,
            online_endpoint: "https://translate.google.com".to_string(),
            timeout_secs: 15,
            temp_dir: None,
            player_command: None,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl EcobotConfig {
    /// Load configuration from file (TOML or JSON)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parse configuration text, trying JSON first and TOML second
    pub fn from_str(content: &str) -> Result<Self> {
        if let Ok(config) = serde_json::from_str::<EcobotConfig>(content) {
            return Ok(config);
        }

        toml::from_str::<EcobotConfig>(content).map_err(|e| Error::Parse(e.to_string()))
    }

    /// File (if given) or defaults, then environment overrides, then validation.
    ///
    /// Variables from `./.env` fill in anything the process environment lacks.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_dotenv(path, Path::new(DOTENV_FILE))
    }

    /// Like [`EcobotConfig::load`] with an explicit dotenv file
    pub fn load_with_dotenv(path: Option<&Path>, dotenv: &Path) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let file_vars = read_dotenv(dotenv)?;
        config.apply_env_from(|key| std::env::var(key).ok().or_else(|| file_vars.get(key).cloned()));
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from process environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using the given variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY")) {
            self.llm.api_key = Some(key);
        }

        if let Some(model) = non_empty("ECOBOT_MODEL") {
            self.llm.model = model;
        }

        if let Some(host) = non_empty("ECOBOT_HOST") {
            self.server.host = host;
        }

        if let Some(port) = non_empty("ECOBOT_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!("Ignoring invalid ECOBOT_PORT value {:?}", port),
            }
        }

        if let Some(rate) = non_empty("ECOBOT_SPEECH_RATE") {
            match rate.parse::<u32>() {
                Ok(r) => self.speech.rate = r,
                Err(_) => tracing::warn!("Ignoring invalid ECOBOT_SPEECH_RATE value {:?}", rate),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(Error::Configuration("Model name cannot be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Configuration(
                "Temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(Error::Configuration("max_tokens must be greater than 0".to_string()));
        }

        if self.llm.timeout_secs == 0 || self.speech.timeout_secs == 0 {
            return Err(Error::Configuration("Timeouts must be greater than 0".to_string()));
        }

        for (name, url) in [
            ("llm.base_url", &self.llm.base_url),
            ("speech.online_endpoint", &self.speech.online_endpoint),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Configuration(format!(
                    "{} must be an http(s) URL, got {:?}",
                    name, url
                )));
            }
        }

        if self.speech.rate > 500 {
            return Err(Error::Configuration(
                "Speech rate must be between 0 and 500 WPM".to_string(),
            ));
        }

        if let Some(cmd) = &self.speech.player_command {
            if cmd.first().map_or(true, |program| program.trim().is_empty()) {
                return Err(Error::Configuration(
                    "speech.player_command needs a program name".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// The generation API key. Refusing to start without it is the caller's job.
    pub fn require_api_key(&self) -> Result<&str> {
        self.llm
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration(
                    "No API key found. Please set GEMINI_API_KEY in your environment".to_string(),
                )
            })
    }
}

/// Variables from a dotenv file; a missing file yields none
pub fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }

    let vars = dotenvy::from_path_iter(path)
        .and_then(|iter| iter.collect::<std::result::Result<HashMap<_, _>, _>>())
        .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
    tracing::debug!("Read {} variables from {}", vars.len(), path.display());
    Ok(vars)
}
