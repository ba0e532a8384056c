//! Keyboard input normalization and logical-key resolution.
//!
//! A raw DOM key string plus modifier state (Shift / held Space) selects one
//! logical key: the base character of the physical key joined with the octave
//! band the modifiers pick. Both functions here are pure and total — unmapped
//! input passes through verbatim and later catalog lookups simply miss.

use std::borrow::Cow;
use std::fmt;

/// Octave band a logical key belongs to, selected by modifier state at press
/// time. Shift raises one band, held Space lowers one band; Shift wins when
/// both are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OctaveBand {
    Low,
    Mid,
    High,
}

impl OctaveBand {
    /// Octave shift relative to the base note of the key table.
    pub fn octave_shift(self) -> i32 {
        match self {
            OctaveBand::Low => -1,
            OctaveBand::Mid => 0,
            OctaveBand::High => 1,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            OctaveBand::Low => "_LOW",
            OctaveBand::Mid => "_MID",
            OctaveBand::High => "_HIGH",
        }
    }
}

/// A (base key + octave band) identity, distinct from the raw physical key.
/// Exactly one note definition owns each logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogicalKey {
    pub base: char,
    pub band: OctaveBand,
}

impl LogicalKey {
    pub const fn new(base: char, band: OctaveBand) -> Self {
        Self { base, band }
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.band.suffix())
    }
}

/// Collapse a raw DOM key value into its canonical base form.
///
/// "Space"/"Spacebar" and the literal space all become `" "`; single
/// alphabetic characters become uppercase; `":"` becomes `";"` (shifted-key
/// artifact on some layouts); everything else, "Enter" included, passes
/// through unchanged.
pub fn normalize_key(raw: &str) -> Cow<'_, str> {
    match raw {
        "Space" | "Spacebar" => Cow::Borrowed(" "),
        ":" => Cow::Borrowed(";"),
        _ => {
            let mut chars = raw.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if c.is_ascii_alphabetic() {
                    return Cow::Owned(c.to_ascii_uppercase().to_string());
                }
            }
            Cow::Borrowed(raw)
        }
    }
}

/// Attach the octave band the modifier state selects.
///
/// The semicolon key sits on the top edge of the layout: it only owns a High
/// variant, so Shift keeps it there while plain and Space-held presses fold
/// onto the `A` key's High and Mid bands (the same pitches, one octave wrap
/// down).
pub fn resolve_logical_key(base: char, shift_held: bool, space_held: bool) -> LogicalKey {
    if base == ';' {
        if shift_held {
            LogicalKey::new(';', OctaveBand::High)
        } else if space_held {
            LogicalKey::new('A', OctaveBand::Mid)
        } else {
            LogicalKey::new('A', OctaveBand::High)
        }
    } else {
        let band = if shift_held {
            OctaveBand::High
        } else if space_held {
            OctaveBand::Low
        } else {
            OctaveBand::Mid
        };
        LogicalKey::new(base, band)
    }
}
