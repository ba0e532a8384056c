//! Game session state machine: Idle ⇄ Active, per-frame tile advancement,
//! hit/miss detection and scoring.
//!
//! The session is a plain value with no host dependencies. The rendering host
//! owns it, drives [`GameSession::tick`] once per rendered frame, and polls
//! the returned [`TickReport`] change-set — there are no callbacks out of this
//! module.

use crate::catalog::NoteCatalog;
use crate::keymap::LogicalKey;
use crate::schedule::{MelodyEvent, Schedule};

/// Presentation tag for a drawn key or tile, deliberately separate from the
/// musical note definition so styling never aliases note identity. Falling
/// tiles always carry [`TileSkin::Falling`] regardless of their note's
/// accidental flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSkin {
    Natural,
    Accidental,
    Falling,
}

/// Fixed vertical window in which a falling tile can be scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitBand {
    pub center_y: f64,
    pub height: f64,
}

impl HitBand {
    pub fn top(&self) -> f64 {
        self.center_y + self.height * 0.5
    }

    pub fn bottom(&self) -> f64 {
        self.center_y - self.height * 0.5
    }

    pub fn contains(&self, y: f64) -> bool {
        y >= self.bottom() && y <= self.top()
    }
}

/// One falling tile, owned by the session from spawn until hit or miss.
/// `def_index` points into the catalog the session was started against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTile {
    pub def_index: usize,
    pub logical_key: LogicalKey,
    pub center_y: f64,
    pub skin: TileSkin,
}

/// Change-set from one tick, polled by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub spawned: u32,
    pub missed: u32,
    pub auto_stopped: bool,
    /// Anything moved or changed this frame; the host redraws when set.
    pub dirty: bool,
}

/// Error-reporting collaborator for the per-frame path. The first failure is
/// logged; everything after stays silent and frames keep running either way.
#[derive(Debug, Default)]
pub struct ErrorLog {
    logged: bool,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, context: &str) {
        if self.logged {
            return;
        }
        self.logged = true;
        log::error!("{context}");
    }

    pub fn has_logged(&self) -> bool {
        self.logged
    }
}

/// Everything a session start needs to know about the world it runs in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionParams {
    pub bpm: f64,
    pub frame_rate: f64,
    pub travel_beats: f64,
    /// Height tiles spawn at.
    pub spawn_y: f64,
    /// Representative tile height; also the hit-band height.
    pub tile_height: f64,
}

/// The rhythm game proper. States: Idle → Active → Idle, always linear.
#[derive(Debug, Default)]
pub struct GameSession {
    active: bool,
    score: i64,
    frame: u64,
    schedule: Schedule,
    tiles: Vec<ActiveTile>,
    band: Option<HitBand>,
    fall_per_frame: f64,
    spawn_y: f64,
    tile_height: f64,
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn hit_band(&self) -> Option<HitBand> {
        self.band
    }

    pub fn tiles(&self) -> &[ActiveTile] {
        &self.tiles
    }

    pub fn fall_per_frame(&self) -> f64 {
        self.fall_per_frame
    }

    /// Idle → Active. Resets score and frame counter, computes the hit band
    /// from the tile height, builds the spawn schedule, clears leftovers.
    /// Callers toggling an already-active session stop it first.
    pub fn start(&mut self, melody: &[MelodyEvent], params: SessionParams) {
        self.active = true;
        self.score = 0;
        self.frame = 0;
        self.tiles.clear();

        // Band height matches the tile height; the band sits just below the
        // origin, lifted a third of its height above its natural seat.
        let height = params.tile_height;
        let center_y = -height * 0.5 + height / 3.0;
        let band = HitBand { center_y, height };
        self.band = Some(band);
        self.spawn_y = params.spawn_y;
        self.tile_height = params.tile_height;

        let travel_distance = (params.spawn_y - center_y).max(0.0);
        self.schedule = Schedule::build(
            melody,
            params.bpm,
            params.frame_rate,
            params.travel_beats,
            travel_distance,
        );
        self.fall_per_frame = self
            .schedule
            .timing()
            .map(|t| t.fall_per_frame)
            .unwrap_or(0.0);
    }

    /// Active → Idle. Score resets, band and tiles are removed.
    pub fn stop(&mut self) {
        self.active = false;
        self.score = 0;
        self.band = None;
        self.tiles.clear();
        self.schedule.clear();
    }

    /// One frame of an active session: spawn due tiles, advance everything,
    /// drop misses, auto-stop when the schedule is spent and the field is
    /// clear. A no-op returning an empty report while Idle.
    pub fn tick(&mut self, catalog: &NoteCatalog, errors: &mut ErrorLog) -> TickReport {
        if !self.active {
            return TickReport::default();
        }
        let mut report = TickReport {
            dirty: true,
            ..TickReport::default()
        };
        self.frame += 1;

        while let Some(entry) = self.schedule.pop_due(self.frame) {
            match catalog.find_note(entry.note) {
                Some(def_index) => {
                    self.tiles.push(ActiveTile {
                        def_index,
                        logical_key: catalog.by_index(def_index).logical_key,
                        center_y: self.spawn_y,
                        skin: TileSkin::Falling,
                    });
                    report.spawned += 1;
                }
                None => {
                    errors.report(&format!("no key owns scheduled note \"{}\"", entry.note));
                }
            }
        }

        for tile in &mut self.tiles {
            tile.center_y -= self.fall_per_frame;
        }

        if let Some(band) = self.band {
            let half_tile = self.tile_height * 0.5;
            let before = self.tiles.len();
            self.tiles
                .retain(|tile| tile.center_y - half_tile >= band.bottom());
            let missed = (before - self.tiles.len()) as u32;
            report.missed = missed;
            self.score -= missed as i64;
        }

        if self.schedule.is_empty() && self.tiles.is_empty() {
            self.stop();
            report.auto_stopped = true;
        }
        report
    }

    /// Hit resolution for one logical-key press. While Active, the matching
    /// tile whose center sits inside the band and lowest in it is removed and
    /// scored; an exact tie keeps the first found. Sounding the note is the
    /// caller's business — a press with no hittable tile scores nothing but
    /// still plays.
    ///
    /// Returns whether a tile was hit. Hit-testing is skipped entirely while
    /// Idle.
    pub fn handle_key_down(&mut self, key: LogicalKey) -> bool {
        if !self.active {
            return false;
        }
        let Some(band) = self.band else {
            return false;
        };

        let mut best: Option<usize> = None;
        let mut lowest = f64::INFINITY;
        for (index, tile) in self.tiles.iter().enumerate() {
            if tile.logical_key == key && band.contains(tile.center_y) && tile.center_y < lowest {
                lowest = tile.center_y;
                best = Some(index);
            }
        }
        match best {
            Some(index) => {
                self.score += 1;
                self.tiles.remove(index);
                true
            }
            None => false,
        }
    }
}
