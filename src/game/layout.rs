//! Keyboard geometry: placement of white and black keys in world coordinates.
//!
//! World space is a square of ±[`SCENE_SCALE`] units centered on the origin.
//! Whites lay out left to right in pitch order, blacks sit between their
//! neighboring naturals, and the whole keyboard is centered, scaled into a
//! fixed band and pinned near the bottom of the scene. The one quantity the
//! core game pulls from here is the representative tile height.

use std::collections::HashMap;

use crate::catalog::NoteCatalog;

pub const SCENE_SCALE: f64 = 1.0;

const WHITE_KEY_WIDTH: f64 = 0.45;
const WHITE_KEY_HEIGHT: f64 = 2.6;
const WHITE_KEY_GAP: f64 = 0.05;
const BLACK_KEY_WIDTH: f64 = WHITE_KEY_WIDTH * 0.6;
const BLACK_KEY_HEIGHT: f64 = WHITE_KEY_HEIGHT * 0.62;

/// Placement of one key, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPlacement {
    pub def_index: usize,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

/// The full keyboard, in draw order: whites first, blacks on top.
#[derive(Debug, Clone)]
pub struct KeyboardLayout {
    keys: Vec<KeyPlacement>,
    by_def: HashMap<usize, usize>,
    tile_height: f64,
}

impl KeyboardLayout {
    pub fn build(catalog: &NoteCatalog) -> Self {
        let defs = catalog.definitions();
        let mut keys: Vec<KeyPlacement> = Vec::with_capacity(defs.len());
        let mut natural_position: HashMap<String, f64> = HashMap::new();

        let mut white_index = 0usize;
        for (def_index, def) in defs.iter().enumerate() {
            if def.is_accidental {
                continue;
            }
            let center_x = white_index as f64 * (WHITE_KEY_WIDTH + WHITE_KEY_GAP);
            keys.push(KeyPlacement {
                def_index,
                center_x,
                center_y: WHITE_KEY_HEIGHT * 0.5,
                width: WHITE_KEY_WIDTH,
                height: WHITE_KEY_HEIGHT,
            });
            natural_position.insert(def.note_name.clone(), center_x);
            white_index += 1;
        }

        for (def_index, def) in defs.iter().enumerate() {
            if !def.is_accidental {
                continue;
            }
            let natural = def.note_name.replace('#', "");
            let Some(&base_center) = natural_position.get(&natural) else {
                continue;
            };
            let neighbor = next_natural_note(&natural);
            let neighbor_center = natural_position
                .get(&neighbor)
                .copied()
                .unwrap_or(base_center + WHITE_KEY_WIDTH + WHITE_KEY_GAP);
            keys.push(KeyPlacement {
                def_index,
                center_x: base_center + 0.5 * (neighbor_center - base_center),
                center_y: WHITE_KEY_HEIGHT - BLACK_KEY_HEIGHT * 0.5,
                width: BLACK_KEY_WIDTH,
                height: BLACK_KEY_HEIGHT,
            });
        }

        center_scale_and_pin(&mut keys);

        // Reference tile height: twice the width of a natural key. Whites are
        // laid out first, so the first placement is a natural when any exists.
        let tile_height = keys
            .first()
            .map(|k| k.width * 2.0)
            .unwrap_or(0.1 * SCENE_SCALE);

        let by_def = keys
            .iter()
            .enumerate()
            .map(|(slot, k)| (k.def_index, slot))
            .collect();
        Self {
            keys,
            by_def,
            tile_height,
        }
    }

    pub fn keys(&self) -> &[KeyPlacement] {
        &self.keys
    }

    pub fn placement_for(&self, def_index: usize) -> Option<&KeyPlacement> {
        self.by_def.get(&def_index).map(|&slot| &self.keys[slot])
    }

    pub fn tile_height(&self) -> f64 {
        self.tile_height
    }

    /// Tiles spawn at the top edge of the scene.
    pub fn spawn_y(&self) -> f64 {
        SCENE_SCALE
    }

    /// Width of the band the keyboard is scaled into (also the hit band's).
    pub fn keyboard_width(&self) -> f64 {
        SCENE_SCALE * 1.8
    }
}

fn center_scale_and_pin(keys: &mut [KeyPlacement]) {
    if keys.is_empty() {
        return;
    }

    let mut min_left = f64::INFINITY;
    let mut max_right = f64::NEG_INFINITY;
    let mut min_bottom = f64::INFINITY;
    let mut max_top = f64::NEG_INFINITY;
    for key in keys.iter() {
        min_left = min_left.min(key.center_x - key.width * 0.5);
        max_right = max_right.max(key.center_x + key.width * 0.5);
        min_bottom = min_bottom.min(key.center_y - key.height * 0.5);
        max_top = max_top.max(key.center_y + key.height * 0.5);
    }

    let offset = (min_left + max_right) * 0.5;
    for key in keys.iter_mut() {
        key.center_x -= offset;
        key.center_y -= WHITE_KEY_HEIGHT * 0.5;
    }

    let width_span = max_right - min_left;
    let height_span = max_top - min_bottom;
    let scale_x = if width_span > 0.0 {
        SCENE_SCALE * 1.8 / width_span
    } else {
        1.0
    };
    let scale_y = if height_span > 0.0 {
        SCENE_SCALE * 0.8 / height_span
    } else {
        1.0
    };
    for key in keys.iter_mut() {
        key.center_x *= scale_x;
        key.width *= scale_x;
        key.center_y *= scale_y;
        key.height *= scale_y;
    }

    let current_bottom = keys
        .iter()
        .map(|k| k.center_y - k.height * 0.5)
        .fold(f64::INFINITY, f64::min);
    let delta_y = -SCENE_SCALE * 0.9 - current_bottom;
    for key in keys.iter_mut() {
        key.center_y += delta_y;
    }
}

/// Next natural note name upward, wrapping the octave after B.
fn next_natural_note(note: &str) -> String {
    let mut chars = note.chars();
    let (Some(letter), Some(octave_char)) = (chars.next(), chars.next()) else {
        return note.to_string();
    };
    if chars.next().is_some() || !octave_char.is_ascii_digit() {
        return note.to_string();
    }
    let order = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];
    let Some(index) = order.iter().position(|&c| c == letter) else {
        return note.to_string();
    };
    let next_letter = order[(index + 1) % order.len()];
    let octave = octave_char.to_digit(10).unwrap();
    let next_octave = if letter == 'B' { octave + 1 } else { octave };
    format!("{next_letter}{next_octave}")
}
