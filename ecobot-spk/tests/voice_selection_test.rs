//! Ranked offline voice search

use ecobot_spk::voices::rank_voice;
use ecobot_spk::{select_voice, MatchRank, VoiceDescriptor, VoiceSelection};

fn voice(id: &str, languages: &[&str]) -> VoiceDescriptor {
    VoiceDescriptor::new(id, id, languages.iter().map(|l| l.to_string()).collect())
}

#[test]
fn test_exact_language_beats_earlier_weaker_matches() {
    let voices = vec![
        voice("zh-yue", &["zh-yue"]),
        voice("cmn", &["zh_CN"]),
    ];
    match select_voice(&voices, "zh-CN") {
        VoiceSelection::Matched { voice, rank } => {
            assert_eq!(voice.id, "cmn");
            assert_eq!(rank, MatchRank::ExactLanguage);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_primary_subtag_match() {
    let voices = vec![voice("Alex", &["en_US"]), voice("Amelie", &["fr_CA"])];
    let selection = select_voice(&voices, "fr");
    assert_eq!(selection.voice_id(), Some("Amelie"));
    assert!(selection.warning().is_none());
}

#[test]
fn test_id_substring_is_weakest() {
    let legacy = voice("HKEY_LOCAL_MACHINE\\TTS_MS_HI-IN_KALPANA", &[]);
    assert_eq!(rank_voice(&legacy, "hi"), Some(MatchRank::IdContains));

    let voices = vec![legacy.clone(), voice("Lekha", &["hi_IN"])];
    assert_eq!(select_voice(&voices, "hi").voice_id(), Some("Lekha"));
}

#[test]
fn test_list_order_breaks_ties() {
    let voices = vec![voice("first", &["de"]), voice("second", &["de"])];
    assert_eq!(select_voice(&voices, "de").voice_id(), Some("first"));
}

#[test]
fn test_no_match_falls_back_with_warning() {
    let voices = vec![voice("en", &["en"])];
    let selection = select_voice(&voices, "ta");
    assert_eq!(selection.voice_id(), None);
    let warning = selection.warning().unwrap();
    assert!(warning.contains("\"ta\""));
    assert!(warning.contains("default voice"));
}

#[test]
fn test_empty_inputs() {
    assert!(matches!(select_voice(&[], "en"), VoiceSelection::Default { .. }));
    assert_eq!(rank_voice(&voice("en", &["en"]), ""), None);
}

#[test]
fn test_display() {
    let selection = select_voice(&[VoiceDescriptor::new("hi", "Hindi", vec!["hi".to_string()])], "hi");
    assert_eq!(selection.to_string(), "Hindi (hi)");
    assert_eq!(select_voice(&[], "hi").to_string(), "default voice");
}
