//! ecobot-core: shared building blocks for the EcoBot advisory assistant
//!
//! - Language catalog and resolver
//! - Workspace configuration
//! - Common error type

pub mod config;
pub mod error;
pub mod language;

pub use config::{read_dotenv, EcobotConfig, LlmSettings, ServerSettings, SpeechSettings};
pub use error::{Error, Result};
pub use language::{catalog, default_language, lookup_code, resolve, LanguageEntry, DEFAULT_LANGUAGE_CODE};
