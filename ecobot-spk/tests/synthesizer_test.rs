//! Fallback chain tests with substitute engines

use async_trait::async_trait;
use bytes::Bytes;
use ecobot_core::resolve;
use ecobot_spk::{
    AudioPlayer, CustomTtsEngine, EngineKind, LocalSpeechEngine, Playback, SpeechConfig, SpeechError,
    SpeechOutcome, SpeechSynthesizer, StopSignal, VoiceDescriptor, VoiceSelection,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Copy)]
enum PlayerMode {
    Complete,
    Fail,
    /// Block until the stop signal fires
    WaitForStop,
}

struct FakePlayer {
    mode: PlayerMode,
    played: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakePlayer {
    fn new(mode: PlayerMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            played: Mutex::new(Vec::new()),
        })
    }

    fn played(&self) -> Vec<(PathBuf, bool)> {
        self.played.lock().clone()
    }
}

#[async_trait]
impl AudioPlayer for FakePlayer {
    async fn play(&self, path: &Path, stop: &StopSignal) -> Result<Playback, SpeechError> {
        self.played.lock().push((path.to_path_buf(), path.exists()));
        match self.mode {
            PlayerMode::Complete => Ok(Playback::Completed),
            PlayerMode::Fail => Err(SpeechError::Playback("no audio device".to_string())),
            PlayerMode::WaitForStop => {
                stop.stopped().await;
                Ok(Playback::Interrupted)
            }
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct FakeOffline {
    voices: Vec<VoiceDescriptor>,
    fail: bool,
    wait_for_stop: bool,
    spoken: Mutex<Vec<(String, Option<String>, u32)>>,
}

impl FakeOffline {
    fn working(voices: Vec<VoiceDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            voices,
            fail: false,
            wait_for_stop: false,
            spoken: Mutex::new(Vec::new()),
        })
    }

    fn broken() -> Arc<Self> {
        Arc::new(Self {
            voices: Vec::new(),
            fail: true,
            wait_for_stop: false,
            spoken: Mutex::new(Vec::new()),
        })
    }

    fn blocking() -> Arc<Self> {
        Arc::new(Self {
            voices: Vec::new(),
            fail: false,
            wait_for_stop: true,
            spoken: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.spoken.lock().len()
    }
}

#[async_trait]
impl LocalSpeechEngine for FakeOffline {
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        Ok(self.voices.clone())
    }

    async fn speak(
        &self,
        text: &str,
        voice_id: Option<&str>,
        rate: u32,
        stop: &StopSignal,
    ) -> Result<Playback, SpeechError> {
        self.spoken
            .lock()
            .push((text.to_string(), voice_id.map(String::from), rate));
        if self.fail {
            return Err(SpeechError::Engine("no audio driver".to_string()));
        }
        if self.wait_for_stop {
            stop.stopped().await;
            return Ok(Playback::Interrupted);
        }
        Ok(Playback::Completed)
    }

    fn name(&self) -> &str {
        "fake-offline"
    }
}

fn online_ok(calls: Arc<Mutex<Vec<String>>>) -> Arc<CustomTtsEngine> {
    Arc::new(CustomTtsEngine::new(
        "fake-online",
        move |_text: &str, code: &str| {
            calls.lock().push(code.to_string());
            Ok(Bytes::from_static(b"ID3fake-mp3"))
        },
        || true,
    ))
}

fn config_in(dir: &Path) -> SpeechConfig {
    SpeechConfig {
        temp_dir: Some(dir.to_path_buf()),
        rate: 150,
        ..SpeechConfig::default()
    }
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn test_online_success_plays_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let codes = Arc::new(Mutex::new(Vec::new()));
    let player = FakePlayer::new(PlayerMode::Complete);
    let offline = FakeOffline::working(vec![]);
    let synth = SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        online_ok(codes.clone()),
        offline.clone(),
        player.clone(),
    );

    let report = synth.speak("Recycle it.", resolve("zh"), &StopSignal::new()).await;

    assert_eq!(report.outcome, SpeechOutcome::Played);
    assert_eq!(report.engine, Some(EngineKind::Online));
    assert_eq!(*codes.lock(), vec!["zh-CN".to_string()]);
    assert_eq!(offline.calls(), 0);

    let played = player.played();
    assert_eq!(played.len(), 1);
    let (path, existed) = &played[0];
    assert!(*existed, "audio file should exist while playing");
    assert!(path.starts_with(dir.path()));
    assert!(path.extension().map_or(false, |e| e == "mp3"));
    assert!(!path.exists());
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_online_failure_falls_back_to_offline() {
    let dir = tempfile::tempdir().unwrap();
    let offline = FakeOffline::working(vec![
        VoiceDescriptor::new("en", "English", vec!["en".to_string()]),
        VoiceDescriptor::new("hi", "Hindi", vec!["hi".to_string()]),
    ]);
    let synth = SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        Arc::new(CustomTtsEngine::failing("network unreachable")),
        offline.clone(),
        FakePlayer::new(PlayerMode::Complete),
    );

    let report = synth.speak("नमस्ते", resolve("hi"), &StopSignal::new()).await;

    assert_eq!(report.outcome, SpeechOutcome::Played);
    assert_eq!(report.engine, Some(EngineKind::Offline));
    assert!(report.online_error.as_deref().unwrap().contains("network unreachable"));
    assert!(report.offline_error.is_none());

    let spoken = offline.spoken.lock().clone();
    assert_eq!(spoken, vec![("नमस्ते".to_string(), Some("hi".to_string()), 150)]);
    assert!(matches!(report.voice, Some(VoiceSelection::Matched { .. })));
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_playback_failure_falls_back_and_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let player = FakePlayer::new(PlayerMode::Fail);
    let offline = FakeOffline::working(vec![]);
    let synth = SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        online_ok(Arc::new(Mutex::new(Vec::new()))),
        offline.clone(),
        player.clone(),
    );

    let report = synth.speak("text", resolve("en"), &StopSignal::new()).await;

    assert_eq!(report.outcome, SpeechOutcome::Played);
    assert_eq!(report.engine, Some(EngineKind::Offline));
    assert!(report.online_error.as_deref().unwrap().contains("no audio device"));
    assert_eq!(offline.calls(), 1);

    let (path, existed) = player.played()[0].clone();
    assert!(existed);
    assert!(!path.exists());
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_no_matching_voice_uses_default_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let offline = FakeOffline::working(vec![VoiceDescriptor::new("en", "English", vec!["en".to_string()])]);
    let synth = SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        Arc::new(CustomTtsEngine::failing("offline")),
        offline.clone(),
        FakePlayer::new(PlayerMode::Complete),
    );

    let report = synth.speak("こんにちは", resolve("ja"), &StopSignal::new()).await;

    assert_eq!(report.outcome, SpeechOutcome::Played);
    assert!(report.voice_warning().unwrap().contains("\"ja\""));
    assert_eq!(offline.spoken.lock()[0].1, None);
}

#[tokio::test]
async fn test_both_engines_fail() {
    let dir = tempfile::tempdir().unwrap();
    let offline = FakeOffline::broken();
    let synth = SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        Arc::new(CustomTtsEngine::failing("HTTP 400")),
        offline.clone(),
        FakePlayer::new(PlayerMode::Complete),
    );

    let report = synth.speak("text", resolve("fr"), &StopSignal::new()).await;

    assert_eq!(report.outcome, SpeechOutcome::Failed);
    assert_eq!(report.engine, None);
    assert!(report.online_error.is_some());
    assert!(report.offline_error.as_deref().unwrap().contains("no audio driver"));
    // Each engine is tried exactly once
    assert_eq!(offline.calls(), 1);
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_interrupted_online_playback_is_suppressed() {
    let dir = tempfile::tempdir().unwrap();
    let player = FakePlayer::new(PlayerMode::WaitForStop);
    let offline = FakeOffline::working(vec![]);
    let synth = SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        online_ok(Arc::new(Mutex::new(Vec::new()))),
        offline.clone(),
        player.clone(),
    );

    let stop = StopSignal::new();
    let stopper = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stopper.stop();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), synth.speak("long text", resolve("en"), &stop))
        .await
        .expect("speak should return after stop");

    assert_eq!(report.outcome, SpeechOutcome::SuppressedByUser);
    assert_eq!(report.engine, Some(EngineKind::Online));
    assert_eq!(offline.calls(), 0);

    let (path, existed) = player.played()[0].clone();
    assert!(existed);
    assert!(!path.exists());
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_interrupted_offline_speech_is_suppressed() {
    let dir = tempfile::tempdir().unwrap();
    let synth = SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        Arc::new(CustomTtsEngine::failing("offline")),
        FakeOffline::blocking(),
        FakePlayer::new(PlayerMode::Complete),
    );

    let stop = StopSignal::new();
    let stopper = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stopper.stop();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), synth.speak("text", resolve("de"), &stop))
        .await
        .expect("speak should return after stop");

    assert_eq!(report.outcome, SpeechOutcome::SuppressedByUser);
    assert_eq!(report.engine, Some(EngineKind::Offline));
}

#[tokio::test]
async fn test_concurrent_calls_use_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let player = FakePlayer::new(PlayerMode::Complete);
    let synth = Arc::new(SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        online_ok(Arc::new(Mutex::new(Vec::new()))),
        FakeOffline::working(vec![]),
        player.clone(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let synth = synth.clone();
            tokio::spawn(async move { synth.speak(&format!("item {}", i), resolve("en"), &StopSignal::new()).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().outcome, SpeechOutcome::Played);
    }

    let mut paths: Vec<PathBuf> = player.played().into_iter().map(|(p, _)| p).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 8);
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_empty_text_is_failed_without_engine_calls() {
    let dir = tempfile::tempdir().unwrap();
    let offline = FakeOffline::working(vec![]);
    let player = FakePlayer::new(PlayerMode::Complete);
    let synth = SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        online_ok(Arc::new(Mutex::new(Vec::new()))),
        offline.clone(),
        player.clone(),
    );

    let report = synth.speak("  \n", resolve("en"), &StopSignal::new()).await;

    assert_eq!(report.outcome, SpeechOutcome::Failed);
    assert_eq!(offline.calls(), 0);
    assert!(player.played().is_empty());
}

#[test]
fn test_disabled_config_rejected() {
    let config = SpeechConfig {
        enabled: false,
        ..SpeechConfig::default()
    };
    assert!(matches!(SpeechSynthesizer::new(config), Err(SpeechError::Config(_))));
}

#[test]
fn test_invalid_config_rejected() {
    let config = SpeechConfig {
        rate: 900,
        ..SpeechConfig::default()
    };
    assert!(matches!(SpeechSynthesizer::new(config), Err(SpeechError::Config(_))));
}

#[tokio::test]
async fn test_unavailable_online_engine_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let codes = Arc::new(Mutex::new(Vec::new()));
    let player = FakePlayer::new(PlayerMode::Complete);
    let offline = FakeOffline::working(vec![VoiceDescriptor::new("de", "German", vec!["de".to_string()])]);
    let synth = SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        online_ok(codes.clone()),
        offline.clone(),
        player.clone(),
    )
    .with_online_engine(Arc::new(CustomTtsEngine::unavailable("offline-mode")));

    let report = synth.speak("Hallo", resolve("de"), &StopSignal::new()).await;

    assert_eq!(report.outcome, SpeechOutcome::Played);
    assert_eq!(report.engine, Some(EngineKind::Offline));
    assert_eq!(
        report.online_error.as_deref(),
        Some("Online engine offline-mode is unavailable")
    );
    assert!(codes.lock().is_empty());
    assert!(player.played().is_empty());
    assert_eq!(offline.calls(), 1);
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_abandoned_call_removes_audio_file() {
    let dir = tempfile::tempdir().unwrap();
    let player = FakePlayer::new(PlayerMode::WaitForStop);
    let synth = SpeechSynthesizer::with_engines(
        config_in(dir.path()),
        online_ok(Arc::new(Mutex::new(Vec::new()))),
        FakeOffline::working(vec![]),
        player.clone(),
    );

    // Nobody ever stops; the caller gives up and drops the future mid-playback
    let abandoned = tokio::time::timeout(
        Duration::from_millis(100),
        synth.speak("long text", resolve("en"), &StopSignal::new()),
    )
    .await;
    assert!(abandoned.is_err());

    let (path, existed) = player.played()[0].clone();
    assert!(existed, "playback should have started before the call was dropped");
    assert!(!path.exists());
    assert!(dir_is_empty(dir.path()));
}
