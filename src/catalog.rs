//! Note catalog: the compact physical-key table expanded into the full set of
//! playable note definitions across three octave bands.
//!
//! Every binding except the top-edge semicolon key yields Low/Mid/High
//! variants at octave shifts −1/0/+1; the semicolon key yields only its High
//! variant (its plain and Space-held presses fold onto the `A` key, see
//! [`crate::keymap::resolve_logical_key`]). Malformed note names in the table
//! are a programmer error and fail catalog construction outright.

use std::collections::HashMap;
use std::fmt;

use crate::keymap::{LogicalKey, OctaveBand};

/// Physical key → base note binding, independent of octave band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: char,
    pub note: &'static str,
}

const fn bind(key: char, note: &'static str) -> KeyBinding {
    KeyBinding { key, note }
}

/// Home-row naturals plus the accidental row above them.
pub const KEY_BINDINGS: &[KeyBinding] = &[
    // White keys
    bind('A', "C4"),
    bind('S', "D4"),
    bind('D', "E4"),
    bind('F', "F4"),
    bind('J', "G4"),
    bind('K', "A4"),
    bind('L', "B4"),
    bind(';', "C5"),
    // Black keys
    bind('W', "C#4"),
    bind('E', "D#4"),
    bind('T', "F#4"),
    bind('I', "G#4"),
    bind('O', "A#4"),
];

/// The binding that only generates its High variant.
pub const TOP_EDGE_KEY: char = ';';

/// One playable note: immutable once built, one instance per
/// (physical key × octave band) combination.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDefinition {
    #[cfg_attr(feature = "serde", serde(skip))]
    pub logical_key: LogicalKey,
    /// Display label: the base key char, `-` suffixed for Low, `+` for High.
    pub label: String,
    /// Scientific pitch name, e.g. `"C#4"`.
    pub note_name: String,
    pub midi: i32,
    pub frequency_hz: f64,
    pub is_accidental: bool,
}

/// Malformed note name in the key table. Fatal at catalog construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteParseError {
    pub input: String,
}

impl fmt::Display for NoteParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid note name: \"{}\"", self.input)
    }
}

impl std::error::Error for NoteParseError {}

/// Fields of a parsed scientific pitch name (`^[A-G](#?)\d$`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedNote {
    pub letter: char,
    pub sharp: bool,
    pub octave: i32,
    pub midi: i32,
}

fn semitone_offset(letter: char, sharp: bool) -> i32 {
    let natural = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => unreachable!("parse_note only admits A-G"),
    };
    natural + if sharp { 1 } else { 0 }
}

/// Parse `^[A-G](#?)\d$` by hand; anything else is an error.
pub fn parse_note(name: &str) -> Result<ParsedNote, NoteParseError> {
    let err = || NoteParseError {
        input: name.to_string(),
    };
    let mut chars = name.chars();
    let letter = chars.next().ok_or_else(err)?;
    if !('A'..='G').contains(&letter) {
        return Err(err());
    }
    let next = chars.next().ok_or_else(err)?;
    let (sharp, octave_char) = if next == '#' {
        (true, chars.next().ok_or_else(err)?)
    } else {
        (false, next)
    };
    if !octave_char.is_ascii_digit() || chars.next().is_some() {
        return Err(err());
    }
    let octave = octave_char.to_digit(10).unwrap() as i32;
    let midi = (octave + 1) * 12 + semitone_offset(letter, sharp);
    Ok(ParsedNote {
        letter,
        sharp,
        octave,
        midi,
    })
}

/// A440 equal temperament.
pub fn midi_to_frequency(midi: i32) -> f64 {
    440.0 * 2f64.powf((midi - 69) as f64 / 12.0)
}

fn shifted_note_name(parsed: &ParsedNote, octave_shift: i32) -> String {
    format!(
        "{}{}{}",
        parsed.letter,
        if parsed.sharp { "#" } else { "" },
        parsed.octave + octave_shift
    )
}

/// The full set of note definitions, sorted by ascending MIDI number, indexed
/// by logical key and by note name.
#[derive(Debug, Clone)]
pub struct NoteCatalog {
    defs: Vec<NoteDefinition>,
    by_logical: HashMap<LogicalKey, usize>,
}

impl NoteCatalog {
    /// Build from the standard key table.
    pub fn build() -> Result<Self, NoteParseError> {
        Self::from_bindings(KEY_BINDINGS)
    }

    pub fn from_bindings(bindings: &[KeyBinding]) -> Result<Self, NoteParseError> {
        let mut defs = Vec::new();
        for binding in bindings {
            let parsed = parse_note(binding.note)?;
            if binding.key == TOP_EDGE_KEY {
                defs.push(make_definition(binding, &parsed, OctaveBand::High));
                continue;
            }
            defs.push(make_definition(binding, &parsed, OctaveBand::Low));
            defs.push(make_definition(binding, &parsed, OctaveBand::Mid));
            defs.push(make_definition(binding, &parsed, OctaveBand::High));
        }
        defs.sort_by_key(|d| d.midi);

        let mut by_logical = HashMap::with_capacity(defs.len());
        for (index, def) in defs.iter().enumerate() {
            let prior = by_logical.insert(def.logical_key, index);
            debug_assert!(prior.is_none(), "duplicate logical key {}", def.logical_key);
        }
        Ok(Self { defs, by_logical })
    }

    /// Definitions in ascending MIDI order.
    pub fn definitions(&self) -> &[NoteDefinition] {
        &self.defs
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn index_of(&self, key: LogicalKey) -> Option<usize> {
        self.by_logical.get(&key).copied()
    }

    pub fn get(&self, key: LogicalKey) -> Option<&NoteDefinition> {
        self.index_of(key).map(|i| &self.defs[i])
    }

    pub fn by_index(&self, index: usize) -> &NoteDefinition {
        &self.defs[index]
    }

    /// Index of the definition whose pitch name matches. Note names are
    /// unique across the catalog (the octave bands interleave without
    /// colliding), so the first match is the only match.
    pub fn find_note(&self, note_name: &str) -> Option<usize> {
        self.defs.iter().position(|d| d.note_name == note_name)
    }
}

fn make_definition(binding: &KeyBinding, parsed: &ParsedNote, band: OctaveBand) -> NoteDefinition {
    let shift = band.octave_shift();
    let midi = parsed.midi + shift * 12;
    let label = match band {
        OctaveBand::Low => format!("{}-", binding.key),
        OctaveBand::Mid => binding.key.to_string(),
        OctaveBand::High => format!("{}+", binding.key),
    };
    NoteDefinition {
        logical_key: LogicalKey::new(binding.key, band),
        label,
        note_name: shifted_note_name(parsed, shift),
        midi,
        frequency_hz: midi_to_frequency(midi),
        is_accidental: parsed.sharp,
    }
}
