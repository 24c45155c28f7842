// EcoBot command-line assistant

mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::{run_session, Console};
use ecobot_core::{catalog, EcobotConfig};
use ecobot_llm::{Advisor, GoogleProvider, LLMConfig};
use ecobot_spk::{CustomTtsEngine, SpeechConfig, SpeechSynthesizer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecobot")]
#[command(about = "Multilingual e-waste management advisor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the advisory without speaking it
    #[arg(long)]
    mute: bool,

    /// Speak with the native offline voice only
    #[arg(long)]
    offline: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported language codes
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_target(false)
        .init();

    if let Some(Commands::Languages) = cli.command {
        print_languages();
        return Ok(());
    }

    let config = EcobotConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // No prompting without a generation credential
    let api_key = config.require_api_key()?.to_string();
    let provider = GoogleProvider::with_api_key(LLMConfig::from(&config.llm), api_key)
        .context("Failed to create generation client")?;
    let advisor = Advisor::new(Arc::new(provider));

    let speech = if cli.mute || !config.speech.enabled {
        debug!("Speech output disabled");
        None
    } else {
        build_speech(SpeechConfig::from(&config.speech), cli.offline)
    };

    let mut console = Console::stdio();
    run_session(&mut console, &advisor, speech.as_ref()).await
}

fn build_speech(config: SpeechConfig, offline_only: bool) -> Option<SpeechSynthesizer> {
    let synth = match SpeechSynthesizer::new(config) {
        Ok(synth) => synth,
        Err(e) => {
            warn!("Speech disabled: {}", e);
            return None;
        }
    };

    if offline_only {
        return Some(synth.with_online_engine(Arc::new(CustomTtsEngine::unavailable("offline-mode"))));
    }
    Some(synth)
}

fn print_languages() {
    println!("Supported languages:");
    for entry in catalog() {
        let marker = if entry.is_default() { " (default)" } else { "" };
        println!("  {:<4} {}{}", entry.code, entry.display_name, marker);
    }
}
