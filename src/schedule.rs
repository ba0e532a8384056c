//! Melody scheduling: an ordered list of (note, beats) events becomes a
//! frame-indexed spawn schedule.
//!
//! The schedule is built once per session start and consumed destructively,
//! oldest entry first, as the frame counter advances. Tempo, frame rate and
//! the travel-beats difficulty parameter are all baked in at build time;
//! changing difficulty mid-session has no effect until the next start.

use std::collections::VecDeque;

/// One melody event: a note and how many beats it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MelodyEvent {
    pub note: &'static str,
    pub beats: u32,
}

/// One scheduled spawn: the frame at which a tile for `note` enters the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub frame: u64,
    pub note: &'static str,
}

/// Difficulty presets exposed by the control panel. Selection maps to travel
/// beats (how long a tile falls from spawn to the hit line) and is applied
/// only at the next session start.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn travel_beats(self) -> f64 {
        match self {
            Difficulty::Easy => 3.0,
            Difficulty::Medium => 2.0,
            Difficulty::Hard => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Discrete control-panel index, clamped into range.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|d| *d == self).unwrap_or(0)
    }
}

/// Frame-domain parameters derived while building a schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleTiming {
    pub frames_per_beat: u64,
    /// Frames a tile spends between spawn and the hit line.
    pub travel_frames: u64,
    /// World units a tile falls per frame.
    pub fall_per_frame: f64,
}

pub fn frames_per_beat(frame_rate: f64, bpm: f64) -> u64 {
    ((frame_rate * 60.0 / bpm).round() as i64).max(1) as u64
}

/// A session's spawn queue, sorted ascending by frame (stable for ties).
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    entries: VecDeque<ScheduleEntry>,
    timing: Option<ScheduleTiming>,
}

impl Schedule {
    /// Build the spawn queue for one session.
    ///
    /// Each event's hit frame advances by `beats * frames_per_beat`; its spawn
    /// frame sits `travel_frames` earlier. Fall speed is travel distance over
    /// travel frames, so a tile reaches the hit line exactly on its beat no
    /// matter the difficulty. If the earliest spawns land before frame 0 the
    /// whole schedule shifts forward by the deficit — first arrivals are
    /// delayed, never advanced.
    pub fn build(
        events: &[MelodyEvent],
        bpm: f64,
        frame_rate: f64,
        travel_beats: f64,
        travel_distance: f64,
    ) -> Self {
        let fpb = frames_per_beat(frame_rate, bpm);
        let (travel_frames, fall_per_frame) = if travel_distance > 0.0 {
            let frames = ((fpb as f64 * travel_beats).round() as i64).max(1) as u64;
            (frames, travel_distance / frames as f64)
        } else {
            (1, 0.0)
        };

        let mut raw: Vec<(i64, &'static str)> = Vec::with_capacity(events.len());
        let mut hit_frame: i64 = 0;
        for event in events {
            raw.push((hit_frame - travel_frames as i64, event.note));
            hit_frame += event.beats as i64 * fpb as i64;
        }

        let min_frame = raw.iter().map(|(frame, _)| *frame).min().unwrap_or(0).min(0);
        let offset = -min_frame;
        raw.sort_by_key(|(frame, _)| *frame);

        let entries = raw
            .into_iter()
            .map(|(frame, note)| ScheduleEntry {
                frame: (frame + offset) as u64,
                note,
            })
            .collect();
        Self {
            entries,
            timing: Some(ScheduleTiming {
                frames_per_beat: fpb,
                travel_frames,
                fall_per_frame,
            }),
        }
    }

    pub fn timing(&self) -> Option<ScheduleTiming> {
        self.timing
    }

    pub fn peek(&self) -> Option<&ScheduleEntry> {
        self.entries.front()
    }

    /// Pop the earliest entry if its frame has come due.
    pub fn pop_due(&mut self, frame: u64) -> Option<ScheduleEntry> {
        if self.entries.front().is_some_and(|e| e.frame <= frame) {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.timing = None;
    }
}
