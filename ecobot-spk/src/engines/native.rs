//! Native platform speech engine
//!
//! Drives the operating system's command-line synthesizer: `espeak-ng` on
//! Linux, `say` on macOS and `System.Speech` through PowerShell on Windows.
//! Text always goes over stdin so it never touches an argument list.

use crate::engines::{sanitize_text, LocalSpeechEngine};
use crate::error::SpeechError;
use crate::playback::{detach_from_terminal, supervise, Playback, StopSignal};
use crate::voices::VoiceDescriptor;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

const MAX_TEXT_BYTES: usize = 100_000;

/// Command-line synthesizer used by [`NativeSpeechEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeBackend {
    EspeakNg,
    Say,
    WindowsSapi,
}

impl NativeBackend {
    /// Backend for the platform this binary was built for
    pub fn for_platform() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(NativeBackend::Say)
        } else if cfg!(target_os = "windows") {
            Some(NativeBackend::WindowsSapi)
        } else if cfg!(unix) {
            Some(NativeBackend::EspeakNg)
        } else {
            None
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            NativeBackend::EspeakNg => "espeak-ng",
            NativeBackend::Say => "say",
            NativeBackend::WindowsSapi => "powershell",
        }
    }
}

/// Offline speech through the platform synthesizer
pub struct NativeSpeechEngine {
    backend: Option<NativeBackend>,
}

impl Default for NativeSpeechEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeSpeechEngine {
    pub fn new() -> Self {
        let backend = NativeBackend::for_platform();
        match backend {
            Some(b) => info!("Native speech engine using {}", b.program()),
            None => warn!("Native speech not supported on this platform"),
        }
        Self { backend }
    }

    pub fn with_backend(backend: Option<NativeBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Option<NativeBackend> {
        self.backend
    }

    fn require_backend(&self) -> Result<NativeBackend, SpeechError> {
        self.backend
            .ok_or_else(|| SpeechError::Engine("Native speech not supported on this platform".to_string()))
    }
}

#[async_trait]
impl LocalSpeechEngine for NativeSpeechEngine {
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        let backend = self.require_backend()?;
        let mut cmd = Command::new(backend.program());
        match backend {
            NativeBackend::EspeakNg => {
                cmd.arg("--voices");
            }
            NativeBackend::Say => {
                cmd.arg("-v").arg("?");
            }
            NativeBackend::WindowsSapi => {
                cmd.args(["-NoProfile", "-NonInteractive", "-Command", windows::LIST_VOICES_SCRIPT]);
            }
        }

        let output = cmd.stdin(Stdio::null()).output().await.map_err(|e| spawn_error(backend, e))?;
        if !output.status.success() {
            return Err(SpeechError::Engine(format!(
                "{} could not list voices: {}",
                backend.program(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        let voices = match backend {
            NativeBackend::EspeakNg => parse_espeak_voices(&listing),
            NativeBackend::Say => parse_say_voices(&listing),
            NativeBackend::WindowsSapi => parse_sapi_voices(&listing),
        };
        debug!("{} reported {} voices", backend.program(), voices.len());
        Ok(voices)
    }

    async fn speak(
        &self,
        text: &str,
        voice_id: Option<&str>,
        rate: u32,
        stop: &StopSignal,
    ) -> Result<Playback, SpeechError> {
        let backend = self.require_backend()?;

        if text.trim().is_empty() {
            return Err(SpeechError::Engine("Text cannot be empty".to_string()));
        }
        if text.len() > MAX_TEXT_BYTES {
            return Err(SpeechError::Engine("Text too long (max 100KB)".to_string()));
        }
        if stop.is_stopped() {
            return Ok(Playback::Interrupted);
        }

        let rate = rate.min(500);
        let mut cmd = Command::new(backend.program());
        match backend {
            NativeBackend::EspeakNg => {
                cmd.arg("-s").arg(rate.to_string());
                if let Some(id) = voice_id {
                    cmd.arg("-v").arg(id);
                }
                cmd.arg("--stdin");
            }
            NativeBackend::Say => {
                cmd.arg("-r").arg(rate.to_string());
                if let Some(id) = voice_id {
                    cmd.arg("-v").arg(id);
                }
                cmd.arg("-f").arg("-");
            }
            NativeBackend::WindowsSapi => {
                let script = windows::speak_script(voice_id, rate);
                cmd.args(["-NoProfile", "-NonInteractive", "-Command", script.as_str()]);
            }
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let mut child = detach_from_terminal(&mut cmd)
            .spawn()
            .map_err(|e| spawn_error(backend, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(sanitize_text(text).as_bytes())
                .await
                .map_err(|e| SpeechError::Engine(format!("Failed to send text to {}: {}", backend.program(), e)))?;
            // Closing stdin tells the synthesizer the text is complete
            drop(stdin);
        }

        debug!("Speaking {} bytes with {} (voice {:?}, rate {})", text.len(), backend.program(), voice_id, rate);
        supervise(child, stop, backend.program(), SpeechError::Engine).await
    }

    fn name(&self) -> &str {
        "native"
    }
}

fn spawn_error(backend: NativeBackend, e: std::io::Error) -> SpeechError {
    if e.kind() == ErrorKind::NotFound {
        SpeechError::Engine(format!("{} is not installed", backend.program()))
    } else {
        SpeechError::Engine(format!("Failed to run {}: {}", backend.program(), e))
    }
}

/// Parse `espeak-ng --voices` output.
///
/// Columns: `Pty Language Age/Gender VoiceName File Other Languages`. The
/// language column doubles as the voice id since `-v` accepts it.
pub fn parse_espeak_voices(listing: &str) -> Vec<VoiceDescriptor> {
    listing
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 || fields[0] == "Pty" {
                return None;
            }

            let language = fields[1];
            let mut languages = vec![language.to_string()];
            // "(en 2)(en-r 5)": alternate language then its priority
            let others = fields.get(5..).map(|rest| rest.join(" ")).unwrap_or_default();
            for group in others.split('(').skip(1) {
                if let Some(tag) = group.split_whitespace().next() {
                    let tag = tag.trim_end_matches(')');
                    if !tag.is_empty() {
                        languages.push(tag.to_string());
                    }
                }
            }

            Some(VoiceDescriptor::new(language, fields[3].replace('_', " "), languages))
        })
        .collect()
}

/// Parse `say -v '?'` output: `Name  locale  # sample sentence`.
pub fn parse_say_voices(listing: &str) -> Vec<VoiceDescriptor> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim();
            let (name, locale) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || locale.is_empty() {
                return None;
            }
            Some(VoiceDescriptor::new(name, name, vec![locale.to_string()]))
        })
        .collect()
}

/// Parse the `Name|Culture` lines printed by the PowerShell listing script.
pub fn parse_sapi_voices(listing: &str) -> Vec<VoiceDescriptor> {
    listing
        .lines()
        .filter_map(|line| {
            let (name, culture) = line.trim().split_once('|')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let languages = match culture.trim() {
                "" => Vec::new(),
                c => vec![c.to_string()],
            };
            Some(VoiceDescriptor::new(name, name, languages))
        })
        .collect()
}

mod windows {
    pub const LIST_VOICES_SCRIPT: &str = "Add-Type -AssemblyName System.Speech; \
$s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
$s.GetInstalledVoices() | ForEach-Object { $_.VoiceInfo.Name + '|' + $_.VoiceInfo.Culture.Name }";

    /// SpeechSynthesizer.Rate runs from -10 to 10 with 0 near 150 WPM
    pub fn sapi_rate(rate: u32) -> i32 {
        ((rate as i32 - 150) / 15).clamp(-10, 10)
    }

    pub fn speak_script(voice_id: Option<&str>, rate: u32) -> String {
        let select = voice_id
            .map(|id| format!("$s.SelectVoice('{}'); ", id.replace('\'', "''")))
            .unwrap_or_default();
        format!(
            "Add-Type -AssemblyName System.Speech; \
$s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
{}$s.Rate = {}; \
$s.Speak([Console]::In.ReadToEnd())",
            select,
            sapi_rate(rate)
        )
    }

}
