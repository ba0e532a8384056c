//! Keyfall core crate.
//!
//! A browser falling-tiles piano rhythm game. A fixed melody is compiled into
//! a frame-accurate spawn schedule; tiles fall toward a hit band above an
//! on-screen keyboard; physical keys (with Shift/Space octave modifiers) map
//! to logical notes that both hit-test tiles and trigger sampled piano
//! voices. The pure engine lives in [`keymap`], [`catalog`], [`schedule`] and
//! [`session`]; [`audio`] wraps the Web Audio API; [`game`] is the DOM/canvas
//! host adapter.

use wasm_bindgen::prelude::*;

pub mod audio;
pub mod catalog;
pub mod game;
pub mod keymap;
pub mod schedule;
pub mod session;

use schedule::MelodyEvent;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
}

// -----------------------------------------------------------------------------
// Melody dataset: Twinkle Twinkle Little Star, one beat per quarter note.
// Notes must name pitches the key table owns (see catalog::KEY_BINDINGS).
// -----------------------------------------------------------------------------

const fn ev(note: &'static str, beats: u32) -> MelodyEvent {
    MelodyEvent { note, beats }
}

#[rustfmt::skip]
pub const MELODY: &[MelodyEvent] = &[
    ev("C4", 1), ev("C4", 1), ev("G4", 1), ev("G4", 1), ev("A4", 1), ev("A4", 1), ev("G4", 2),
    ev("F4", 1), ev("F4", 1), ev("E4", 1), ev("E4", 1), ev("D4", 1), ev("D4", 1), ev("C4", 2),
    ev("G4", 1), ev("G4", 1), ev("F4", 1), ev("F4", 1), ev("E4", 1), ev("E4", 1), ev("D4", 2),
    ev("G4", 1), ev("G4", 1), ev("F4", 1), ev("F4", 1), ev("E4", 1), ev("E4", 1), ev("D4", 2),
    ev("C4", 1), ev("C4", 1), ev("G4", 1), ev("G4", 1), ev("A4", 1), ev("A4", 1), ev("G4", 2),
    ev("F4", 1), ev("F4", 1), ev("E4", 1), ev("E4", 1), ev("D4", 1), ev("D4", 1), ev("C4", 2),
];

// -----------------------------------------------------------------------------
// Unified entrypoint
// -----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    game::start()
}
