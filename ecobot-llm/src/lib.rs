//! ecobot-llm: generation client and advisory pipeline

pub mod advisor;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod prompt;
pub mod providers;


pub use advisor::{Advisor, AdvisoryError, AdvisoryRequest, AdvisoryResponse, GenerationStage};
pub use config::*;
pub use error::*;
pub use providers::{GoogleProvider, Provider};
