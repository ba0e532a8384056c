// Integration tests (native) for the note catalog: key-table expansion,
// note-name parsing and the MIDI/frequency derivations.

use std::collections::HashSet;

use keyfall::catalog::{KEY_BINDINGS, NoteCatalog, midi_to_frequency, parse_note};
use keyfall::keymap::{LogicalKey, OctaveBand};

#[test]
fn catalog_builds_from_standard_table() {
    let catalog = NoteCatalog::build().expect("standard table must parse");
    // 7 three-band whites + the single-variant semicolon + 5 three-band blacks.
    assert_eq!(catalog.len(), 7 * 3 + 1 + 5 * 3);
}

#[test]
fn midi_round_trips_through_note_name() {
    let catalog = NoteCatalog::build().unwrap();
    for def in catalog.definitions() {
        let parsed = parse_note(&def.note_name)
            .unwrap_or_else(|e| panic!("generated note name should parse: {e}"));
        assert_eq!(parsed.midi, def.midi, "note {}", def.note_name);
    }
}

#[test]
fn frequency_increases_with_midi() {
    let catalog = NoteCatalog::build().unwrap();
    for pair in catalog.definitions().windows(2) {
        assert!(pair[0].midi < pair[1].midi);
        assert!(pair[0].frequency_hz < pair[1].frequency_hz);
    }
}

#[test]
fn concert_pitch_is_exact() {
    assert!((midi_to_frequency(69) - 440.0).abs() < 1e-9);
    let catalog = NoteCatalog::build().unwrap();
    let a4 = &catalog.definitions()[catalog.find_note("A4").unwrap()];
    assert_eq!(a4.midi, 69);
    assert!((a4.frequency_hz - 440.0).abs() < 1e-9);
}

#[test]
fn middle_c_midi_number() {
    assert_eq!(parse_note("C4").unwrap().midi, 60);
    assert_eq!(parse_note("C#4").unwrap().midi, 61);
    assert_eq!(parse_note("B3").unwrap().midi, 59);
}

#[test]
fn every_logical_key_owns_one_definition() {
    let catalog = NoteCatalog::build().unwrap();
    let mut seen = HashSet::new();
    for def in catalog.definitions() {
        assert!(
            seen.insert(def.logical_key),
            "duplicate logical key {}",
            def.logical_key
        );
        assert_eq!(
            catalog.get(def.logical_key).map(|d| d.note_name.as_str()),
            Some(def.note_name.as_str())
        );
    }
}

#[test]
fn top_edge_key_has_single_high_variant() {
    let catalog = NoteCatalog::build().unwrap();
    let semis: Vec<_> = catalog
        .definitions()
        .iter()
        .filter(|d| d.logical_key.base == ';')
        .collect();
    assert_eq!(semis.len(), 1);
    assert_eq!(semis[0].logical_key.band, OctaveBand::High);
    assert_eq!(semis[0].note_name, "C6");
    assert_eq!(semis[0].label, ";+");
}

#[test]
fn labels_carry_band_suffix() {
    let catalog = NoteCatalog::build().unwrap();
    let label_of = |base, band| catalog.get(LogicalKey::new(base, band)).unwrap().label.clone();
    assert_eq!(label_of('A', OctaveBand::Low), "A-");
    assert_eq!(label_of('A', OctaveBand::Mid), "A");
    assert_eq!(label_of('A', OctaveBand::High), "A+");
}

#[test]
fn accidentals_are_tagged() {
    let catalog = NoteCatalog::build().unwrap();
    for def in catalog.definitions() {
        assert_eq!(def.is_accidental, def.note_name.contains('#'));
    }
    let accidentals = catalog
        .definitions()
        .iter()
        .filter(|d| d.is_accidental)
        .count();
    assert_eq!(accidentals, 5 * 3);
}

#[test]
fn malformed_note_names_are_rejected() {
    for bad in ["", "H4", "c4", "C#", "C", "C44", "Cb4", "C#x", "4C"] {
        assert!(parse_note(bad).is_err(), "should reject {bad:?}");
    }
}

#[test]
fn octave_bands_shift_by_twelve() {
    let catalog = NoteCatalog::build().unwrap();
    let midi_of = |base, band| catalog.get(LogicalKey::new(base, band)).unwrap().midi;
    for binding in KEY_BINDINGS.iter().filter(|b| b.key != ';') {
        let mid = midi_of(binding.key, OctaveBand::Mid);
        assert_eq!(midi_of(binding.key, OctaveBand::Low), mid - 12);
        assert_eq!(midi_of(binding.key, OctaveBand::High), mid + 12);
    }
}

#[test]
fn note_lookup_misses_cleanly() {
    let catalog = NoteCatalog::build().unwrap();
    assert!(catalog.find_note("C9").is_none());
    assert!(catalog.get(LogicalKey::new('Q', OctaveBand::Mid)).is_none());
}
