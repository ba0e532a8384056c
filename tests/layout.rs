// Integration tests (native) for keyboard geometry: key placement, scaling
// and the tile-height derivation the session depends on.

use keyfall::catalog::NoteCatalog;
use keyfall::game::layout::{KeyboardLayout, SCENE_SCALE};

fn build() -> (NoteCatalog, KeyboardLayout) {
    let catalog = NoteCatalog::build().unwrap();
    let layout = KeyboardLayout::build(&catalog);
    (catalog, layout)
}

#[test]
fn every_definition_gets_a_placement() {
    let (catalog, layout) = build();
    assert_eq!(layout.keys().len(), catalog.len());
    for key in layout.keys() {
        let found = layout.placement_for(key.def_index).unwrap();
        assert_eq!(found.def_index, key.def_index);
    }
}

#[test]
fn whites_draw_first_then_blacks() {
    let (catalog, layout) = build();
    let first_black = layout
        .keys()
        .iter()
        .position(|k| catalog.by_index(k.def_index).is_accidental)
        .unwrap();
    assert!(
        layout.keys()[first_black..]
            .iter()
            .all(|k| catalog.by_index(k.def_index).is_accidental),
        "accidentals must follow all naturals in draw order"
    );
    assert_eq!(first_black, 22);
}

#[test]
fn whites_ascend_left_to_right() {
    let (catalog, layout) = build();
    let whites: Vec<_> = layout
        .keys()
        .iter()
        .filter(|k| !catalog.by_index(k.def_index).is_accidental)
        .collect();
    for pair in whites.windows(2) {
        assert!(pair[0].center_x < pair[1].center_x);
        assert!(catalog.by_index(pair[0].def_index).midi < catalog.by_index(pair[1].def_index).midi);
    }
}

#[test]
fn black_keys_sit_between_their_naturals() {
    let (catalog, layout) = build();
    let center_of = |note: &str| {
        let def_index = catalog.find_note(note).unwrap();
        layout.placement_for(def_index).unwrap().center_x
    };
    let midpoint = (center_of("C4") + center_of("D4")) * 0.5;
    assert!((center_of("C#4") - midpoint).abs() < 1e-9);
    let midpoint = (center_of("F4") + center_of("G4")) * 0.5;
    assert!((center_of("F#4") - midpoint).abs() < 1e-9);
}

#[test]
fn keyboard_fits_its_band() {
    let (_, layout) = build();
    let mut min_left = f64::INFINITY;
    let mut max_right = f64::NEG_INFINITY;
    let mut min_bottom = f64::INFINITY;
    for key in layout.keys() {
        min_left = min_left.min(key.center_x - key.width * 0.5);
        max_right = max_right.max(key.center_x + key.width * 0.5);
        min_bottom = min_bottom.min(key.center_y - key.height * 0.5);
    }
    assert!((max_right - min_left - SCENE_SCALE * 1.8).abs() < 1e-9);
    assert!((min_left + max_right).abs() < 1e-9, "centered on the origin");
    assert!((min_bottom - (-SCENE_SCALE * 0.9)).abs() < 1e-9);
}

#[test]
fn tile_height_is_twice_a_natural_key_width() {
    let (catalog, layout) = build();
    let white = layout
        .keys()
        .iter()
        .find(|k| !catalog.by_index(k.def_index).is_accidental)
        .unwrap();
    assert!((layout.tile_height() - white.width * 2.0).abs() < 1e-12);
}

#[test]
fn spawn_sits_at_the_top_of_the_scene() {
    let (_, layout) = build();
    assert_eq!(layout.spawn_y(), SCENE_SCALE);
    assert!(layout.spawn_y() > 0.0);
}
