// Integration tests (native) for keyboard normalization and logical-key
// resolution. These avoid wasm-specific functionality and exercise pure Rust
// logic so they can run under `cargo test` on the host.

use keyfall::keymap::{LogicalKey, OctaveBand, normalize_key, resolve_logical_key};

#[test]
fn space_spellings_collapse_to_space() {
    assert_eq!(normalize_key("Space"), " ");
    assert_eq!(normalize_key("Spacebar"), " ");
    assert_eq!(normalize_key(" "), " ");
}

#[test]
fn single_letters_uppercase() {
    assert_eq!(normalize_key("a"), "A");
    assert_eq!(normalize_key("A"), "A");
    assert_eq!(normalize_key("z"), "Z");
}

#[test]
fn colon_folds_to_semicolon() {
    assert_eq!(normalize_key(":"), ";");
    assert_eq!(normalize_key(";"), ";");
}

#[test]
fn enter_and_unmapped_pass_through() {
    assert_eq!(normalize_key("Enter"), "Enter");
    assert_eq!(normalize_key("ArrowUp"), "ArrowUp");
    assert_eq!(normalize_key("1"), "1");
    assert_eq!(normalize_key(""), "");
}

#[test]
fn modifiers_select_band() {
    assert_eq!(
        resolve_logical_key('A', false, false),
        LogicalKey::new('A', OctaveBand::Mid)
    );
    assert_eq!(
        resolve_logical_key('A', true, false),
        LogicalKey::new('A', OctaveBand::High)
    );
    assert_eq!(
        resolve_logical_key('A', false, true),
        LogicalKey::new('A', OctaveBand::Low)
    );
}

#[test]
fn shift_wins_over_space() {
    assert_eq!(
        resolve_logical_key('K', true, true),
        LogicalKey::new('K', OctaveBand::High)
    );
}

#[test]
fn semicolon_top_edge_rules() {
    // Plain press folds onto A's High band (the same pitch).
    assert_eq!(
        resolve_logical_key(';', false, false),
        LogicalKey::new('A', OctaveBand::High)
    );
    // Space wraps down onto A's Mid band.
    assert_eq!(
        resolve_logical_key(';', false, true),
        LogicalKey::new('A', OctaveBand::Mid)
    );
    // Shift keeps the semicolon key's own High variant, Space or not.
    assert_eq!(
        resolve_logical_key(';', true, false),
        LogicalKey::new(';', OctaveBand::High)
    );
    assert_eq!(
        resolve_logical_key(';', true, true),
        LogicalKey::new(';', OctaveBand::High)
    );
}

#[test]
fn resolution_is_deterministic() {
    for base in ['A', 'S', 'D', 'F', 'J', 'K', 'L', ';', 'W', 'E', 'T', 'I', 'O'] {
        for shift in [false, true] {
            for space in [false, true] {
                let first = resolve_logical_key(base, shift, space);
                let second = resolve_logical_key(base, shift, space);
                assert_eq!(first, second, "base {base} shift {shift} space {space}");
            }
        }
    }
}

#[test]
fn logical_key_display_form() {
    assert_eq!(LogicalKey::new('A', OctaveBand::Mid).to_string(), "A_MID");
    assert_eq!(LogicalKey::new(';', OctaveBand::High).to_string(), ";_HIGH");
    assert_eq!(LogicalKey::new('W', OctaveBand::Low).to_string(), "W_LOW");
}
