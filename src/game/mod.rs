//! Host adapter: wasm entry point, DOM/canvas wiring, keyboard listeners and
//! the requestAnimationFrame loop that drives the session.
//!
//! The adapter owns a [`GameSession`] value plus everything the session
//! deliberately does not know about: the audio player, the live-voice
//! registry, key highlight state, press-time physical→logical bindings, the
//! difficulty selection and the canvas renderer. Each frame it ticks the
//! session and redraws when the returned change-set says something moved.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, HtmlSelectElement, KeyboardEvent, window,
};

use crate::audio::{SamplePlayer, Voice, VoiceRegistry};
use crate::catalog::NoteCatalog;
use crate::keymap::{LogicalKey, normalize_key, resolve_logical_key};
use crate::schedule::Difficulty;
use crate::session::{ErrorLog, GameSession, SessionParams, TileSkin};

pub mod layout;
use layout::KeyboardLayout;

const CANVAS_ID: &str = "kf-canvas";
const STATUS_ID: &str = "kf-status";
const DIFFICULTY_ID: &str = "kf-difficulty";

const CANVAS_WIDTH: u32 = 960;
const CANVAS_HEIGHT: u32 = 640;

const BPM: f64 = 80.0;
const TARGET_FPS: f64 = 60.0;

const IDLE_HINT: &str = "Press Enter to start, or just play the keys";

/// Runtime state for one page-lifetime of the game.
struct GameState {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    catalog: NoteCatalog,
    layout: KeyboardLayout,
    session: GameSession,
    errors: ErrorLog,
    player: SamplePlayer,
    voices: Rc<RefCell<VoiceRegistry<Voice>>>,
    /// Logical keys currently held, for highlight rendering.
    active_keys: HashSet<LogicalKey>,
    /// Press-time physical→logical bindings so release finds the same key the
    /// press resolved to, whatever the modifiers do in between.
    bindings: HashMap<char, LogicalKey>,
    space_held: bool,
    /// Applied at the next session start, never mid-flight.
    difficulty: Difficulty,
    needs_redraw: bool,
}

thread_local! {
    static GAME_STATE: std::cell::RefCell<Option<GameState>> = std::cell::RefCell::new(None);
}

/// Build the catalog and layout, wire the DOM, and start the frame loop.
/// A malformed key table fails here, before anything is on screen.
pub fn start() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let catalog = NoteCatalog::build().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let layout = KeyboardLayout::build(&catalog);

    // Create / reuse the game canvas.
    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id(CANVAS_ID);
        c.set_width(CANVAS_WIDTH);
        c.set_height(CANVAS_HEIGHT);
        c.set_attribute("style", "position:fixed; left:50%; top:50%; transform:translate(-50%,-50%); box-shadow:0 0 32px 0 rgba(0,0,0,0.18); border-radius:18px; border:2px solid #222; background:#101018; z-index:20;").ok();
        doc.body().unwrap().append_child(&c)?;
        c
    };
    let ctx: CanvasRenderingContext2d = canvas.get_context("2d")?.unwrap().dyn_into()?;
    ctx.set_text_align("center");

    let player = SamplePlayer::new();
    player.preload(catalog.definitions());

    ensure_overlays(&doc)?;

    let state = GameState {
        canvas,
        ctx,
        catalog,
        layout,
        session: GameSession::new(),
        errors: ErrorLog::new(),
        player,
        voices: Rc::new(RefCell::new(VoiceRegistry::new())),
        active_keys: HashSet::new(),
        bindings: HashMap::new(),
        space_held: false,
        difficulty: Difficulty::default(),
        needs_redraw: true,
    };
    GAME_STATE.with(|cell| cell.replace(Some(state)));

    // Keyboard listeners
    {
        let closure = Closure::wrap(Box::new(move |evt: KeyboardEvent| {
            if evt.repeat() {
                return;
            }
            let raw = raw_key_of(&evt);
            let mut consumed = false;
            GAME_STATE.with(|cell| {
                if let Some(state) = cell.borrow_mut().as_mut() {
                    let space_held = state.space_held;
                    consumed = on_key_down(state, &raw, evt.shift_key(), space_held);
                }
            });
            if consumed || evt.code() == "Space" {
                evt.prevent_default();
            }
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let closure = Closure::wrap(Box::new(move |evt: KeyboardEvent| {
            let raw = raw_key_of(&evt);
            let mut consumed = false;
            GAME_STATE.with(|cell| {
                if let Some(state) = cell.borrow_mut().as_mut() {
                    consumed = on_key_up(state, &raw);
                }
            });
            if consumed {
                evt.prevent_default();
            }
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    start_frame_loop();
    Ok(())
}

/// Some layouts report a shifted semicolon as another key entirely; the
/// physical code is authoritative for that one.
fn raw_key_of(evt: &KeyboardEvent) -> String {
    if evt.code() == "Semicolon" {
        ";".to_string()
    } else {
        evt.key()
    }
}

// --- Input handling ----------------------------------------------------------

fn on_key_down(state: &mut GameState, raw: &str, shift_held: bool, space_held: bool) -> bool {
    let base = normalize_key(raw);
    match base.as_ref() {
        " " => {
            state.space_held = true;
            false
        }
        "Enter" => {
            if state.session.is_active() {
                stop_session(state);
            } else {
                start_session(state);
            }
            true
        }
        other => {
            let mut chars = other.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return false;
            };
            let logical = resolve_logical_key(c, shift_held, space_held);
            let Some(def_index) = state.catalog.index_of(logical) else {
                return false;
            };

            // Hit test first (no-op while idle), then highlight and sound —
            // hitting a tile and sounding the note are independent effects of
            // the same press.
            state.session.handle_key_down(logical);
            state.active_keys.insert(logical);
            state.bindings.insert(c, logical);
            play_key_voice(state, logical, def_index);
            state.needs_redraw = true;
            true
        }
    }
}

fn on_key_up(state: &mut GameState, raw: &str) -> bool {
    let base = normalize_key(raw);
    if base.as_ref() == " " {
        state.space_held = false;
        return false;
    }
    let mut chars = base.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return false;
    };
    let Some(logical) = state.bindings.remove(&c) else {
        return false;
    };
    state.active_keys.remove(&logical);
    if let Some(voice) = state.voices.borrow_mut().take(logical) {
        voice.stop();
    }
    state.needs_redraw = true;
    true
}

/// A new press supersedes any live voice on the same logical key: the old
/// voice is stopped before the new one starts, and the ended callback clears
/// only its own generation.
fn play_key_voice(state: &mut GameState, logical: LogicalKey, def_index: usize) {
    if let Some(old) = state.voices.borrow_mut().take(logical) {
        old.stop();
    }
    let generation = state.voices.borrow_mut().next_generation();
    let voices = Rc::clone(&state.voices);
    let on_ended = move || {
        voices.borrow_mut().finish(logical, generation);
    };
    if let Some(voice) = state.player.play(state.catalog.by_index(def_index), on_ended) {
        state.voices.borrow_mut().install(logical, generation, voice);
    }
}

fn start_session(state: &mut GameState) {
    let params = SessionParams {
        bpm: BPM,
        frame_rate: TARGET_FPS,
        travel_beats: state.difficulty.travel_beats(),
        spawn_y: state.layout.spawn_y(),
        tile_height: state.layout.tile_height(),
    };
    state.session.start(crate::MELODY, params);
    state.needs_redraw = true;
}

fn stop_session(state: &mut GameState) {
    state.session.stop();
    state.needs_redraw = true;
}

// --- Frame loop --------------------------------------------------------------

type FrameCallback = std::rc::Rc<std::cell::RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_frame_loop() {
    let f: FrameCallback = std::rc::Rc::new(std::cell::RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        GAME_STATE.with(|cell| {
            if let Some(state) = cell.borrow_mut().as_mut() {
                frame_tick(state);
            }
        });
        if let Some(w) = window() {
            let _ =
                w.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = window() {
        let _ = w.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}

fn frame_tick(state: &mut GameState) {
    let report = state.session.tick(&state.catalog, &mut state.errors);
    if report.auto_stopped {
        state.needs_redraw = true;
    }
    if report.dirty || state.needs_redraw {
        if let Err(err) = render(state) {
            let message = format!("frame render failed: {err:?}");
            state.errors.report(&message);
        }
        state.needs_redraw = false;
    }
    update_status(state);
}

// --- Rendering ---------------------------------------------------------------

fn skin_fill(skin: TileSkin, active: bool) -> &'static str {
    match (skin, active) {
        (TileSkin::Natural, false) => "#f5f5f5",
        (TileSkin::Natural, true) => "#95c3ff",
        (TileSkin::Accidental, false) => "#111111",
        (TileSkin::Accidental, true) => "#5ec9ff",
        (TileSkin::Falling, _) => "#4287f5",
    }
}

/// World rect (center + size) → canvas-pixel rect (top-left + size).
fn world_rect(w: f64, h: f64, ppu: f64, cx: f64, cy: f64, ww: f64, wh: f64) -> (f64, f64, f64, f64) {
    (
        w * 0.5 + (cx - ww * 0.5) * ppu,
        h * 0.5 - (cy + wh * 0.5) * ppu,
        ww * ppu,
        wh * ppu,
    )
}

fn render(state: &mut GameState) -> Result<(), JsValue> {
    let ctx = &state.ctx;
    let w = state.canvas.width() as f64;
    let h = state.canvas.height() as f64;
    let ppu = h / (2.0 * layout::SCENE_SCALE);

    ctx.set_fill_style_str("#101018");
    ctx.fill_rect(0.0, 0.0, w, h);

    // Keys: whites first, blacks on top (layout order), held keys highlighted.
    for placement in state.layout.keys() {
        let def = state.catalog.by_index(placement.def_index);
        let skin = if def.is_accidental {
            TileSkin::Accidental
        } else {
            TileSkin::Natural
        };
        let active = state.active_keys.contains(&def.logical_key);
        let (x, y, rw, rh) = world_rect(
            w,
            h,
            ppu,
            placement.center_x,
            placement.center_y,
            placement.width,
            placement.height,
        );
        ctx.set_fill_style_str(skin_fill(skin, active));
        ctx.fill_rect(x, y, rw, rh);
        ctx.set_stroke_style_str("#222");
        ctx.set_line_width(1.5);
        ctx.stroke_rect(x, y, rw, rh);

        ctx.set_font("11px 'Fira Code', monospace");
        ctx.set_fill_style_str(if def.is_accidental { "#dddddd" } else { "#333333" });
        let label_y = if def.is_accidental {
            y + rh * 0.5
        } else {
            y + rh - 8.0
        };
        ctx.fill_text(&def.label, x + rw * 0.5, label_y).ok();
    }

    // Hit band, while a session is running.
    if let Some(band) = state.session.hit_band() {
        let (x, y, rw, rh) = world_rect(
            w,
            h,
            ppu,
            0.0,
            band.center_y,
            state.layout.keyboard_width(),
            band.height,
        );
        ctx.set_fill_style_str("rgba(77,153,255,0.20)");
        ctx.fill_rect(x, y, rw, rh);
    }

    // Falling tiles, above everything else.
    let tile_height = state.layout.tile_height();
    for tile in state.session.tiles() {
        let Some(placement) = state.layout.placement_for(tile.def_index) else {
            continue;
        };
        let (x, y, rw, rh) = world_rect(
            w,
            h,
            ppu,
            placement.center_x,
            tile.center_y,
            placement.width,
            tile_height,
        );
        ctx.set_fill_style_str(skin_fill(tile.skin, false));
        ctx.fill_rect(x, y, rw, rh);
        ctx.set_stroke_style_str("#1a3a6b");
        ctx.set_line_width(1.5);
        ctx.stroke_rect(x, y, rw, rh);
    }

    Ok(())
}

// --- DOM overlays ------------------------------------------------------------

fn ensure_overlays(doc: &web_sys::Document) -> Result<(), JsValue> {
    if doc.get_element_by_id(STATUS_ID).is_none() {
        if let Some(body) = doc.body() {
            let div = doc.create_element("div")?;
            div.set_id(STATUS_ID);
            div.set_text_content(Some(IDLE_HINT));
            div.set_attribute("style", "position:fixed; top:10px; left:12px; font-family:'Fira Code', monospace; font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:6px; color:#ffd166; z-index:45; letter-spacing:0.5px;").ok();
            body.append_child(&div)?;
        }
    }
    if doc.get_element_by_id(DIFFICULTY_ID).is_none() {
        if let Some(body) = doc.body() {
            let select: HtmlSelectElement = doc.create_element("select")?.dyn_into()?;
            select.set_id(DIFFICULTY_ID);
            select.set_attribute("style", "position:fixed; top:10px; right:12px; font-family:'Fira Code', monospace; font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:6px; color:#ffd166; z-index:45;").ok();
            for difficulty in Difficulty::ALL {
                let option = doc.create_element("option")?;
                option.set_text_content(Some(difficulty.label()));
                select.append_child(&option)?;
            }
            select.set_selected_index(Difficulty::default().index() as i32);
            body.append_child(&select)?;

            let select_changed = select.clone();
            let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
                let index = select_changed.selected_index().max(0) as usize;
                GAME_STATE.with(|cell| {
                    if let Some(state) = cell.borrow_mut().as_mut() {
                        state.difficulty = Difficulty::from_index(index);
                    }
                });
            }) as Box<dyn FnMut(_)>);
            select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
    }
    Ok(())
}

fn update_status(state: &GameState) {
    if let Some(doc) = window().and_then(|w| w.document()) {
        if let Some(el) = doc.get_element_by_id(STATUS_ID) {
            let text = if state.session.is_active() {
                format!("Score: {}", state.session.score())
            } else {
                IDLE_HINT.to_string()
            };
            el.set_text_content(Some(&text));
        }
    }
}
