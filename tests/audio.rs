// Integration tests (native) for the audio layer's pure pieces: note-key
// normalization, sample URL spelling variants and the live-voice registry.
// Actual Web Audio playback is browser-only and not exercised here.

use keyfall::audio::{VoiceRegistry, flat_equivalent, normalize_note_key, sample_url_candidates};
use keyfall::keymap::{LogicalKey, OctaveBand};

const KEY: LogicalKey = LogicalKey::new('A', OctaveBand::Mid);

#[test]
fn note_keys_normalize_case_and_shape() {
    assert_eq!(normalize_note_key("C4"), "C4");
    assert_eq!(normalize_note_key("c4"), "C4");
    assert_eq!(normalize_note_key("c#4"), "C#4");
    assert_eq!(normalize_note_key("A#5"), "A#5");
}

#[test]
fn unparseable_note_keys_fall_back_to_uppercase() {
    assert_eq!(normalize_note_key("H4"), "H4");
    assert_eq!(normalize_note_key("c10"), "C10");
    assert_eq!(normalize_note_key(""), "");
}

#[test]
fn flat_equivalents_exist_where_the_host_names_them() {
    assert_eq!(flat_equivalent('C'), Some("Db"));
    assert_eq!(flat_equivalent('D'), Some("Eb"));
    assert_eq!(flat_equivalent('F'), Some("Gb"));
    assert_eq!(flat_equivalent('G'), Some("Ab"));
    assert_eq!(flat_equivalent('A'), Some("Bb"));
    assert_eq!(flat_equivalent('E'), None);
    assert_eq!(flat_equivalent('B'), None);
}

#[test]
fn natural_notes_have_one_url_spelling() {
    let urls = sample_url_candidates("A4", "https://host/piano", "mp3");
    assert_eq!(urls, ["https://host/piano/A4.mp3"]);
}

#[test]
fn sharp_notes_try_every_spelling_in_order() {
    let urls = sample_url_candidates("C#4", "https://host/piano", "mp3");
    assert_eq!(
        urls,
        [
            "https://host/piano/Cs4.mp3",
            "https://host/piano/Csharp4.mp3",
            "https://host/piano/C%234.mp3",
            "https://host/piano/Db4.mp3",
        ]
    );
}

#[test]
fn sharp_without_flat_equivalent_skips_that_variant() {
    let urls = sample_url_candidates("E#4", "https://host/piano", "mp3");
    assert_eq!(
        urls,
        [
            "https://host/piano/Es4.mp3",
            "https://host/piano/Esharp4.mp3",
            "https://host/piano/E%234.mp3",
        ]
    );
}

#[test]
fn unparseable_note_key_gets_a_single_verbatim_url() {
    let urls = sample_url_candidates("X9", "https://host/piano", "ogg");
    assert_eq!(urls, ["https://host/piano/X9.ogg"]);
}

#[test]
fn registry_keeps_one_live_voice_per_key() {
    let mut registry: VoiceRegistry<&'static str> = VoiceRegistry::new();
    let g1 = registry.next_generation();
    assert!(registry.install(KEY, g1, "first").is_none());
    assert_eq!(registry.live_count(), 1);

    // A second press stops the first voice before starting the second.
    let superseded = registry.take(KEY);
    assert_eq!(superseded, Some("first"));
    let g2 = registry.next_generation();
    assert!(registry.install(KEY, g2, "second").is_none());
    assert_eq!(registry.live_count(), 1);
    assert!(registry.is_live(KEY));
}

#[test]
fn stale_ended_notification_never_evicts_a_newer_voice() {
    let mut registry: VoiceRegistry<&'static str> = VoiceRegistry::new();
    let g1 = registry.next_generation();
    registry.install(KEY, g1, "first");
    let g2 = registry.next_generation();
    let old = registry.install(KEY, g2, "second");
    assert_eq!(old, Some("first"));

    // The first voice's ended callback arrives late: no effect.
    assert_eq!(registry.finish(KEY, g1), None);
    assert!(registry.is_live(KEY));

    // The current voice's callback clears its own entry.
    assert_eq!(registry.finish(KEY, g2), Some("second"));
    assert!(!registry.is_live(KEY));
    assert_eq!(registry.live_count(), 0);
}

#[test]
fn take_on_release_then_finish_is_harmless() {
    let mut registry: VoiceRegistry<u32> = VoiceRegistry::new();
    let g = registry.next_generation();
    registry.install(KEY, g, 7);
    assert_eq!(registry.take(KEY), Some(7));
    assert_eq!(registry.finish(KEY, g), None);
    assert_eq!(registry.take(KEY), None);
}
