// EcoBot interactive session
// Prompts for an item and a language, prints the advisory and speaks it

use anyhow::Result;
use ecobot_core::{catalog, default_language, lookup_code, LanguageEntry};
use ecobot_llm::{Advisor, AdvisoryError};
use ecobot_spk::{EngineKind, SpeechOutcome, SpeechReport, SpeechSynthesizer, StopSignal};
use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};
use tracing::debug;

/// Line-oriented prompt/response console
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Show `label` and read one trimmed line; `None` at end of input
    pub fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// Map a typed language code to a catalog entry.
///
/// Empty input silently means the default. An unknown code also yields the
/// default, together with a warning for the user.
pub fn choose_language(input: &str) -> (&'static LanguageEntry, Option<String>) {
    let code = input.trim().to_lowercase();
    if code.is_empty() {
        return (default_language(), None);
    }

    match lookup_code(&code) {
        Some(entry) => (entry, None),
        None => (
            default_language(),
            Some(format!(
                "Invalid language code '{}'. Defaulting to {}.",
                input.trim(),
                default_language().display_name
            )),
        ),
    }
}

/// Lines to show the user after a speech attempt
pub fn speech_messages(report: &SpeechReport) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(warning) = report.voice_warning() {
        lines.push(format!("Note: {}", warning));
    }

    match report.outcome {
        SpeechOutcome::Played => {
            if report.engine == Some(EngineKind::Offline) {
                lines.push("(Spoken with the offline voice.)".to_string());
            }
        }
        SpeechOutcome::SuppressedByUser => lines.push("Speech stopped by user.".to_string()),
        SpeechOutcome::Failed => {
            let reason = report
                .offline_error
                .as_deref()
                .or(report.online_error.as_deref())
                .unwrap_or("no speech engine available");
            lines.push(format!("Speech failed: {}", reason));
        }
    }

    lines
}

/// Speak `text`, letting Ctrl+C stop playback
pub async fn speak_interruptible(synth: &SpeechSynthesizer, text: &str, lang: &LanguageEntry) -> SpeechReport {
    let stop = StopSignal::new();
    let watcher = {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.stop();
            }
        })
    };

    let report = synth.speak(text, lang, &stop).await;
    watcher.abort();
    report
}

/// One question-and-answer round
pub async fn run_session<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    advisor: &Advisor,
    speech: Option<&SpeechSynthesizer>,
) -> Result<()> {
    let Some(item) = console.prompt("Enter the e-waste item: ")? else {
        return Ok(());
    };
    if item.is_empty() {
        console.say(&AdvisoryError::EmptyItem.user_message())?;
        return Ok(());
    }

    let codes: Vec<&str> = catalog().iter().map(|entry| entry.code).collect();
    let language_input = console
        .prompt(&format!("Enter language code ({}): ", codes.join(", ")))?
        .unwrap_or_default();
    let (language, warning) = choose_language(&language_input);
    if let Some(warning) = warning {
        console.say(&warning)?;
    }

    let advisory = match advisor.advise(&item, language.code).await {
        Ok(advisory) => advisory,
        Err(err) => {
            debug!("Advisory failed: {:?}", err);
            console.say(&err.user_message())?;
            return Ok(());
        }
    };

    console.say("")?;
    console.say("EcoBot Response:")?;
    console.say(&advisory.cleaned_text)?;

    if let Some(synth) = speech {
        console.say("")?;
        console.say("Speaking... (press Ctrl+C to stop)")?;
        let report = speak_interruptible(synth, &advisory.cleaned_text, language).await;
        for line in speech_messages(&report) {
            console.say(&line)?;
        }
    }

    Ok(())
}
