//! Audio playback and user cancellation

use crate::error::SpeechError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, warn};

/// How a playback attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Completed,
    Interrupted,
}

/// Clonable user stop request.
///
/// All clones share one flag. Once stopped, the flag stays set.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request a stop
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once a stop has been requested
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on a stop
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

/// Plays an audio file to the speakers
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play `path` to completion, or until `stop` fires
    async fn play(&self, path: &Path, stop: &StopSignal) -> Result<Playback, SpeechError>;

    fn name(&self) -> &str;
}

/// Put `cmd` in its own process group so a terminal Ctrl+C reaches only us.
///
/// The child is then stopped through [`StopSignal`] instead of dying from SIGINT.
pub(crate) fn detach_from_terminal(cmd: &mut Command) -> &mut Command {
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

/// Wait for `child` to exit, killing it if `stop` fires first.
///
/// A child that exits abnormally after a stop request counts as interrupted.
pub(crate) async fn supervise(
    mut child: Child,
    stop: &StopSignal,
    program: &str,
    fail: fn(String) -> SpeechError,
) -> Result<Playback, SpeechError> {
    tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|e| fail(format!("Failed to wait for {}: {}", program, e)))?;
            if status.success() {
                Ok(Playback::Completed)
            } else if stop.is_stopped() {
                debug!("{} ended with {} after a stop request", program, status);
                Ok(Playback::Interrupted)
            } else {
                Err(fail(format!("{} exited with {}", program, status)))
            }
        }
        _ = stop.stopped() => {
            debug!("Stop requested, killing {}", program);
            if let Err(e) = child.kill().await {
                warn!("Failed to kill {}: {}", program, e);
            }
            Ok(Playback::Interrupted)
        }
    }
}

/// Player used when nothing is configured: an explicit command when given,
/// otherwise the in-process decoder if the `audio` feature is built in.
pub fn default_player(command: Option<Vec<String>>) -> Option<Arc<dyn AudioPlayer>> {
    if let Some(argv) = command.filter(|argv| !argv.is_empty()) {
        return Some(Arc::new(CommandPlayer::new(argv)));
    }

    builtin_player()
}

#[cfg(feature = "audio")]
fn builtin_player() -> Option<Arc<dyn AudioPlayer>> {
    Some(Arc::new(RodioPlayer::new()))
}

#[cfg(not(feature = "audio"))]
fn builtin_player() -> Option<Arc<dyn AudioPlayer>> {
    None
}

/// Plays audio through a configured command; the file path is appended last
pub struct CommandPlayer {
    argv: Vec<String>,
}

impl CommandPlayer {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play(&self, path: &Path, stop: &StopSignal) -> Result<Playback, SpeechError> {
        if stop.is_stopped() {
            return Ok(Playback::Interrupted);
        }

        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| SpeechError::Config("Player command needs a program name".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = detach_from_terminal(&mut cmd).spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SpeechError::Playback(format!("Audio player {} is not installed", program))
            } else {
                SpeechError::Playback(format!("Failed to start {}: {}", program, e))
            }
        })?;

        debug!("Playing {} with {}", path.display(), program);
        supervise(child, stop, program, SpeechError::Playback).await
    }

    fn name(&self) -> &str {
        "command"
    }
}

#[cfg(feature = "audio")]
pub use self::rodio_player::RodioPlayer;

#[cfg(feature = "audio")]
mod rodio_player {
    use super::{AudioPlayer, Playback, StopSignal};
    use crate::error::SpeechError;
    use async_trait::async_trait;
    use rodio::{Decoder, OutputStream, Sink};
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;
    use std::time::Duration;
    use tracing::debug;

    const POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// Decodes the file in-process and plays it on the default output device
    #[derive(Debug, Default)]
    pub struct RodioPlayer;

    impl RodioPlayer {
        pub fn new() -> Self {
            Self
        }
    }

    /// Stops the blocking playback thread if the `play` future is dropped
    struct HaltOnDrop(StopSignal);

    impl Drop for HaltOnDrop {
        fn drop(&mut self) {
            self.0.stop();
        }
    }

    fn play_blocking(path: &Path, halt: &StopSignal) -> Result<Playback, SpeechError> {
        let file = File::open(path)
            .map_err(|e| SpeechError::Playback(format!("Failed to open {}: {}", path.display(), e)))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| SpeechError::Playback(format!("Failed to decode {}: {}", path.display(), e)))?;

        // The stream must outlive the sink
        let (_stream, handle) = OutputStream::try_default()
            .map_err(|e| SpeechError::Playback(format!("No audio output device: {}", e)))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| SpeechError::Playback(format!("Failed to create audio sink: {}", e)))?;

        sink.append(source);
        while !sink.empty() {
            if halt.is_stopped() {
                sink.stop();
                return Ok(Playback::Interrupted);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        Ok(Playback::Completed)
    }

    #[async_trait]
    impl AudioPlayer for RodioPlayer {
        async fn play(&self, path: &Path, stop: &StopSignal) -> Result<Playback, SpeechError> {
            if stop.is_stopped() {
                return Ok(Playback::Interrupted);
            }

            let halt = StopSignal::new();
            let _guard = HaltOnDrop(halt.clone());
            let mut task = tokio::task::spawn_blocking({
                let path = path.to_path_buf();
                let halt = halt.clone();
                move || play_blocking(&path, &halt)
            });

            let joined = tokio::select! {
                joined = &mut task => joined,
                _ = stop.stopped() => {
                    debug!("Stop requested, halting playback");
                    halt.stop();
                    task.await
                }
            };

            let result = joined.map_err(|e| SpeechError::Playback(format!("Playback task failed: {}", e)))?;
            if stop.is_stopped() && result.is_ok() {
                return Ok(Playback::Interrupted);
            }
            result
        }

        fn name(&self) -> &str {
            "rodio"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_missing_file_is_playback_error() {
            let player = RodioPlayer::new();
            let result = player
                .play(Path::new("/nonexistent/ecobot.mp3"), &StopSignal::new())
                .await;
            assert!(matches!(result, Err(SpeechError::Playback(msg)) if msg.contains("Failed to open")));
        }

        #[tokio::test]
        async fn test_already_stopped() {
            let stop = StopSignal::new();
            stop.stop();
            let result = RodioPlayer::new().play(Path::new("/nonexistent/ecobot.mp3"), &stop).await;
            assert_eq!(result.unwrap(), Playback::Interrupted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_abnormal_exit_after_stop_is_interrupted() {
        // Child killed by SIGINT while the stop flag is already up, as with a terminal Ctrl+C
        for _ in 0..20 {
            let stop = StopSignal::new();
            stop.stop();
            let child = Command::new("sh")
                .args(["-c", "kill -INT $$"])
                .kill_on_drop(true)
                .spawn()
                .unwrap();

            let result = supervise(child, &stop, "espeak-ng", SpeechError::Engine).await;
            assert_eq!(result.unwrap(), Playback::Interrupted);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_abnormal_exit_without_stop_is_error() {
        let child = Command::new("sh").args(["-c", "kill -INT $$"]).spawn().unwrap();
        let result = supervise(child, &StopSignal::new(), "espeak-ng", SpeechError::Engine).await;
        match result {
            Err(SpeechError::Engine(msg)) => assert!(msg.contains("espeak-ng exited with")),
            other => panic!("expected engine error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_player_prefers_command() {
        let player = default_player(Some(vec!["mpg123".to_string(), "-q".to_string()])).unwrap();
        assert_eq!(player.name(), "command");
    }

    #[test]
    fn test_default_player_without_command() {
        let player = default_player(None);
        assert_eq!(player.is_some(), cfg!(feature = "audio"));
        assert_eq!(default_player(Some(vec![])).is_some(), cfg!(feature = "audio"));
    }
}
