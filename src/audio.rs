//! Sampled-piano playback over the Web Audio API.
//!
//! Samples are fetched per note from a remote soundfont host, decoded once and
//! cached by normalized note key. Loading is always background work: a press
//! whose sample has not arrived yet stays silent and triggers a load for next
//! time, never blocking the input path. Each playing sample is a [`Voice`]
//! with an attack ramp in and a release ramp out; the pure [`VoiceRegistry`]
//! keeps at most one live voice per logical key.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AudioBuffer, AudioBufferSourceNode, AudioContext, AudioContextState, GainNode, Response,
};

use crate::catalog::NoteDefinition;
use crate::keymap::LogicalKey;

const SAMPLE_HOST: &str =
    "https://gleitz.github.io/midi-js-soundfonts/FluidR3_GM/acoustic_grand_piano-mp3";
const MIN_GAIN: f64 = 0.0001;

#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub base_path: String,
    pub extension: String,
    pub master_gain: f32,
    pub attack_seconds: f64,
    pub release_seconds: f64,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            base_path: SAMPLE_HOST.to_string(),
            extension: "mp3".to_string(),
            master_gain: 0.6,
            attack_seconds: 0.01,
            release_seconds: 0.7,
        }
    }
}

// --- Note spelling helpers (pure) --------------------------------------------

fn split_note(note: &str) -> Option<(char, bool, char)> {
    let mut chars = note.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !('A'..='G').contains(&letter) {
        return None;
    }
    let next = chars.next()?;
    let (sharp, octave) = if next == '#' {
        (true, chars.next()?)
    } else {
        (false, next)
    };
    if !octave.is_ascii_digit() || chars.next().is_some() {
        return None;
    }
    Some((letter, sharp, octave))
}

/// Canonical cache key for a note: uppercase letter, optional `#`, octave
/// digit. Unparseable input falls back to plain uppercasing.
pub fn normalize_note_key(note: &str) -> String {
    match split_note(note) {
        Some((letter, sharp, octave)) => {
            format!("{letter}{}{octave}", if sharp { "#" } else { "" })
        }
        None => note.to_ascii_uppercase(),
    }
}

/// Enharmonic flat spelling for a sharpened letter, where the host names one.
pub fn flat_equivalent(letter: char) -> Option<&'static str> {
    match letter {
        'C' => Some("Db"),
        'D' => Some("Eb"),
        'F' => Some("Gb"),
        'G' => Some("Ab"),
        'A' => Some("Bb"),
        _ => None,
    }
}

/// Ordered URL spellings to try for one note. Sample hosts disagree on how a
/// sharp is written, so sharps expand to every spelling the host might use,
/// enharmonic flat included.
pub fn sample_url_candidates(note_key: &str, base_path: &str, extension: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    match split_note(note_key) {
        Some((letter, true, octave)) => {
            names.push(format!("{letter}s{octave}"));
            names.push(format!("{letter}sharp{octave}"));
            names.push(format!("{letter}#{octave}"));
            if let Some(flat) = flat_equivalent(letter) {
                names.push(format!("{flat}{octave}"));
            }
        }
        Some((letter, false, octave)) => names.push(format!("{letter}{octave}")),
        None => names.push(note_key.to_ascii_uppercase()),
    }
    names
        .iter()
        .map(|name| format!("{base_path}/{}.{extension}", name.replace('#', "%23")))
        .collect()
}

// --- Voice registry (pure) ---------------------------------------------------

#[derive(Debug)]
struct LiveVoice<H> {
    generation: u64,
    handle: H,
}

/// At most one live voice per logical key. A new press installs a fresh
/// generation and hands back the superseded handle for stopping; an ended
/// notification clears its entry only while the generation still matches, so
/// a stale completion never evicts a newer voice.
#[derive(Debug)]
pub struct VoiceRegistry<H> {
    voices: HashMap<LogicalKey, LiveVoice<H>>,
    generation: u64,
}

impl<H> Default for VoiceRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> VoiceRegistry<H> {
    pub fn new() -> Self {
        Self {
            voices: HashMap::new(),
            generation: 0,
        }
    }

    /// Reserve the generation a new voice will be installed under. The ended
    /// callback quotes it back through [`VoiceRegistry::finish`].
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Install a voice, returning any superseded handle for the caller to
    /// stop.
    pub fn install(&mut self, key: LogicalKey, generation: u64, handle: H) -> Option<H> {
        self.voices
            .insert(key, LiveVoice { generation, handle })
            .map(|v| v.handle)
    }

    /// Remove and return the live voice for a key, if any.
    pub fn take(&mut self, key: LogicalKey) -> Option<H> {
        self.voices.remove(&key).map(|v| v.handle)
    }

    /// Clear the entry for a finished voice, but only if it is still the one
    /// that finished.
    pub fn finish(&mut self, key: LogicalKey, generation: u64) -> Option<H> {
        match self.voices.get(&key) {
            Some(live) if live.generation == generation => self.take(key),
            _ => None,
        }
    }

    pub fn is_live(&self, key: LogicalKey) -> bool {
        self.voices.contains_key(&key)
    }

    pub fn live_count(&self) -> usize {
        self.voices.len()
    }
}

// --- Web Audio playback ------------------------------------------------------

/// One playing sample instance, independently stoppable.
pub struct Voice {
    context: AudioContext,
    source: AudioBufferSourceNode,
    gain: GainNode,
    release_seconds: f64,
    stopped: Rc<Cell<bool>>,
}

impl Voice {
    /// Ramp the voice out over the release time. Idempotent; a voice that
    /// already ended on its own is left alone.
    pub fn stop(&self) {
        if self.stopped.replace(true) {
            return;
        }
        let now = self.context.current_time();
        let gain = self.gain.gain();
        let _ = gain.cancel_scheduled_values(now);
        let current = gain.value();
        let _ = gain.set_value_at_time(current, now);
        let release_end = now + self.release_seconds;
        let _ = gain.exponential_ramp_to_value_at_time(MIN_GAIN as f32, release_end);
        let _ = self.source.stop_with_when(release_end + 0.02);
    }
}

#[derive(Clone)]
struct AudioCore {
    context: AudioContext,
    master: GainNode,
}

struct PlayerInner {
    options: PlayerOptions,
    core: RefCell<Option<AudioCore>>,
    buffers: RefCell<HashMap<String, AudioBuffer>>,
    /// Note keys with a fetch/decode in flight; suppresses duplicate loads.
    pending: RefCell<HashSet<String>>,
    /// URLs that failed once are never retried within the session.
    failed_urls: RefCell<HashSet<String>>,
}

/// Loads and plays sampled piano notes from a single remote timbre set.
pub struct SamplePlayer {
    inner: Rc<PlayerInner>,
}

impl Default for SamplePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplePlayer {
    pub fn new() -> Self {
        Self::with_options(PlayerOptions::default())
    }

    pub fn with_options(options: PlayerOptions) -> Self {
        Self {
            inner: Rc::new(PlayerInner {
                options,
                core: RefCell::new(None),
                buffers: RefCell::new(HashMap::new()),
                pending: RefCell::new(HashSet::new()),
                failed_urls: RefCell::new(HashSet::new()),
            }),
        }
    }

    /// Kick off background loads for every distinct note in the set. Best
    /// effort; failures are swallowed.
    pub fn preload(&self, definitions: &[NoteDefinition]) {
        let unique: HashSet<String> = definitions
            .iter()
            .map(|def| normalize_note_key(&def.note_name))
            .collect();
        for note_key in unique {
            self.request_buffer(note_key);
        }
    }

    /// Play a note if its sample is cached, returning the voice handle.
    /// An uncached note triggers a background load for future presses and
    /// returns `None` — this press is silent. `on_ended` fires exactly once,
    /// when the sample runs out or after a stop ramp completes.
    pub fn play(
        &self,
        definition: &NoteDefinition,
        on_ended: impl FnOnce() + 'static,
    ) -> Option<Voice> {
        let core = self.ensure_core()?;
        let note_key = normalize_note_key(&definition.note_name);
        let cached = self.inner.buffers.borrow().get(&note_key).cloned();
        let Some(buffer) = cached else {
            // Trigger load for future presses.
            self.request_buffer(note_key.clone());
            log::warn!("sample not ready for \"{note_key}\"");
            return None;
        };
        match play_buffer(&core, &buffer, &self.inner.options, on_ended) {
            Ok(voice) => Some(voice),
            Err(err) => {
                log::warn!("playback failed for \"{note_key}\": {err:?}");
                None
            }
        }
    }

    fn ensure_core(&self) -> Option<AudioCore> {
        ensure_core(&self.inner)
    }

    fn request_buffer(&self, note_key: String) {
        if self.inner.buffers.borrow().contains_key(&note_key) {
            return;
        }
        if !self.inner.pending.borrow_mut().insert(note_key.clone()) {
            // A load for this note is already in flight.
            return;
        }
        let inner = Rc::clone(&self.inner);
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(buffer) = load_buffer(&inner, &note_key).await {
                inner.buffers.borrow_mut().insert(note_key.clone(), buffer);
            }
            inner.pending.borrow_mut().remove(&note_key);
        });
    }
}

/// Lazily create the shared context and master gain. Resumes a context the
/// browser has suspended pending a user gesture.
fn ensure_core(inner: &Rc<PlayerInner>) -> Option<AudioCore> {
    if let Some(core) = inner.core.borrow().as_ref() {
        if core.context.state() == AudioContextState::Suspended {
            let _ = core.context.resume();
        }
        return Some(core.clone());
    }
    let context = AudioContext::new().ok()?;
    let master = context.create_gain().ok()?;
    master.gain().set_value(inner.options.master_gain);
    master
        .connect_with_audio_node(&context.destination())
        .ok()?;
    let core = AudioCore { context, master };
    *inner.core.borrow_mut() = Some(core.clone());
    Some(core)
}

async fn load_buffer(inner: &Rc<PlayerInner>, note_key: &str) -> Option<AudioBuffer> {
    let context = ensure_core(inner)?.context;
    let urls = sample_url_candidates(note_key, &inner.options.base_path, &inner.options.extension);
    for url in urls {
        if inner.failed_urls.borrow().contains(&url) {
            continue;
        }
        match fetch_and_decode(&context, &url).await {
            Ok(buffer) => return Some(buffer),
            Err(err) => {
                if inner.failed_urls.borrow_mut().insert(url.clone()) {
                    log::warn!("failed to load sample \"{url}\": {err:?}");
                }
            }
        }
    }
    None
}

async fn fetch_and_decode(context: &AudioContext, url: &str) -> Result<AudioBuffer, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url)).await?.dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }
    let array_buffer: js_sys::ArrayBuffer =
        JsFuture::from(response.array_buffer()?).await?.dyn_into()?;
    let decoded = JsFuture::from(context.decode_audio_data(&array_buffer)?).await?;
    decoded.dyn_into()
}

fn play_buffer(
    core: &AudioCore,
    buffer: &AudioBuffer,
    options: &PlayerOptions,
    on_ended: impl FnOnce() + 'static,
) -> Result<Voice, JsValue> {
    let context = core.context.clone();
    let source = context.create_buffer_source()?;
    source.set_buffer(Some(buffer));

    let gain = context.create_gain()?;
    let now = context.current_time();
    gain.gain().set_value_at_time(MIN_GAIN as f32, now)?;
    gain.gain()
        .linear_ramp_to_value_at_time(1.0, now + options.attack_seconds)?;

    source.connect_with_audio_node(&gain)?;
    gain.connect_with_audio_node(&core.master)?;

    let stopped = Rc::new(Cell::new(false));
    let ended = {
        let stopped = Rc::clone(&stopped);
        let mut callback = Some(on_ended);
        Closure::wrap(Box::new(move || {
            stopped.set(true);
            if let Some(callback) = callback.take() {
                callback();
            }
        }) as Box<dyn FnMut()>)
    };
    source.set_onended(Some(ended.as_ref().unchecked_ref()));
    ended.forget();

    source.start()?;

    Ok(Voice {
        context,
        source,
        gain,
        release_seconds: options.release_seconds.max(0.05),
        stopped,
    })
}
