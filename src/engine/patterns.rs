//! Pattern, note and sample clip operations.
//!
//! Every batch is fully validated into `Note` values before the pattern is
//! touched, so an invalid note anywhere leaves the pattern unchanged.

use std::collections::BTreeSet;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::Session;
use crate::error::{Result, StudioError};
use crate::model::pattern::validate_placement;
use crate::model::note::MIDI_MAX;
use crate::model::{ClipId, Note, Pattern, PatternId, SampleClip, TrackId, TrackKind, DEFAULT_VELOCITY};
use crate::theory::parse_pitch;

/// Most octaves a scale run may span; eleven already cover MIDI 0..=127.
pub const MAX_SCALE_OCTAVES: u32 = 11;

/// A pitch as given by a caller: a MIDI number or a note name like "F#3".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PitchSpec {
    Midi(i64),
    Name(String),
}

impl PitchSpec {
    pub fn resolve(&self) -> Result<i64> {
        match self {
            PitchSpec::Midi(pitch) => Ok(*pitch),
            PitchSpec::Name(name) => parse_pitch(name),
        }
    }

    /// Resolve a chord or scale root, which must itself be a MIDI note.
    fn resolve_root(&self) -> Result<i64> {
        let root = self.resolve()?;
        if !(0..=MIDI_MAX).contains(&root) {
            return Err(StudioError::invalid(
                "root",
                format!("{} outside MIDI range 0..=127", root),
            ));
        }
        Ok(root)
    }
}

impl From<i64> for PitchSpec {
    fn from(pitch: i64) -> Self {
        PitchSpec::Midi(pitch)
    }
}

impl From<i32> for PitchSpec {
    fn from(pitch: i32) -> Self {
        PitchSpec::Midi(pitch as i64)
    }
}

impl From<u8> for PitchSpec {
    fn from(pitch: u8) -> Self {
        PitchSpec::Midi(pitch as i64)
    }
}

impl From<&str> for PitchSpec {
    fn from(name: &str) -> Self {
        PitchSpec::Name(name.to_string())
    }
}

impl From<String> for PitchSpec {
    fn from(name: String) -> Self {
        PitchSpec::Name(name)
    }
}

/// Unvalidated note input. Velocity defaults to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSpec {
    pub pitch: PitchSpec,
    pub start: f64,
    #[serde(alias = "length")]
    pub duration: f64,
    #[serde(default)]
    pub velocity: Option<i64>,
}

impl NoteSpec {
    pub fn new(pitch: impl Into<PitchSpec>, start: f64, duration: f64) -> Self {
        NoteSpec {
            pitch: pitch.into(),
            start,
            duration,
            velocity: None,
        }
    }

    pub fn with_velocity(mut self, velocity: i64) -> Self {
        self.velocity = Some(velocity);
        self
    }

    fn to_note(&self) -> Result<Note> {
        Note::new(
            self.pitch.resolve()?,
            self.start,
            self.duration,
            self.velocity.unwrap_or(DEFAULT_VELOCITY as i64),
        )
    }
}

impl Session {
    /// Create a pattern on an instrument track, named after its id.
    pub fn create_pattern(&mut self, track_id: TrackId, start_bar: f64, length_bars: f64) -> Result<PatternId> {
        let name = format!("Pattern {}", self.project.ids.peek_pattern());
        self.create_named_pattern(track_id, &name, start_bar, length_bars)
    }

    pub fn create_named_pattern(
        &mut self,
        track_id: TrackId,
        name: &str,
        start_bar: f64,
        length_bars: f64,
    ) -> Result<PatternId> {
        let track = self.project.track(track_id)?;
        if track.kind() != TrackKind::Instrument {
            return Err(StudioError::invalid(
                "track",
                format!("patterns need an instrument track; track {} is a {} track", track_id, track.kind()),
            ));
        }
        validate_placement(start_bar, length_bars)?;
        let name = if name.trim().is_empty() { "Pattern" } else { name.trim() }.to_string();

        let project = self.edit();
        let id = project.ids.pattern();
        let pattern = Pattern::new(id, name, start_bar, length_bars);
        project
            .track_mut(track_id)?
            .patterns_mut()
            .ok_or_else(|| StudioError::invalid("track", "not an instrument track"))?
            .push(pattern);
        debug!(
            "[ENGINE] Pattern {} on track {} at bar {} ({} bars)",
            id, track_id, start_bar, length_bars
        );
        Ok(id)
    }

    pub fn remove_pattern(&mut self, pattern_id: PatternId) -> Result<Pattern> {
        let (track, _) = self.project.pattern_with_track(pattern_id)?;
        let track_id = track.id();
        let patterns = self
            .edit()
            .track_mut(track_id)?
            .patterns_mut()
            .ok_or_else(|| StudioError::not_found("pattern", pattern_id))?;
        let index = patterns
            .iter()
            .position(|p| p.id == pattern_id)
            .ok_or_else(|| StudioError::not_found("pattern", pattern_id))?;
        debug!("[ENGINE] Removed pattern {}", pattern_id);
        Ok(patterns.remove(index))
    }

    /// Add a batch of notes. Either all are added or none are.
    pub fn add_notes(&mut self, pattern_id: PatternId, notes: &[NoteSpec]) -> Result<usize> {
        self.project.pattern(pattern_id)?;
        let validated = notes
            .iter()
            .map(NoteSpec::to_note)
            .collect::<Result<Vec<_>>>()?;
        self.insert_notes(pattern_id, validated)
    }

    /// Add the notes of a chord, all at `start` with the same duration.
    pub fn add_chord(
        &mut self,
        pattern_id: PatternId,
        root: impl Into<PitchSpec>,
        chord_type: &str,
        start: f64,
        duration: f64,
    ) -> Result<Vec<u8>> {
        self.add_chord_with_velocity(pattern_id, root, chord_type, start, duration, None)
    }

    pub fn add_chord_with_velocity(
        &mut self,
        pattern_id: PatternId,
        root: impl Into<PitchSpec>,
        chord_type: &str,
        start: f64,
        duration: f64,
        velocity: Option<i64>,
    ) -> Result<Vec<u8>> {
        self.project.pattern(pattern_id)?;
        let root = root.into().resolve_root()?;
        let pitches = self.theory().chord(root, chord_type)?;
        let notes = pitches
            .into_iter()
            .map(|pitch| {
                Note::new(
                    pitch,
                    start,
                    duration,
                    velocity.unwrap_or(DEFAULT_VELOCITY as i64),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        let added: Vec<u8> = notes.iter().map(|n| n.pitch).collect();
        self.insert_notes(pattern_id, notes)?;
        Ok(added)
    }

    /// Lay out an ascending scale run, one note every `note_duration` beats.
    #[allow(clippy::too_many_arguments)]
    pub fn add_scale(
        &mut self,
        pattern_id: PatternId,
        root: impl Into<PitchSpec>,
        scale_type: &str,
        start: f64,
        note_duration: f64,
        octaves: u32,
        velocity: Option<i64>,
    ) -> Result<Vec<u8>> {
        self.project.pattern(pattern_id)?;
        let root = root.into().resolve_root()?;
        if octaves > MAX_SCALE_OCTAVES {
            return Err(StudioError::invalid(
                "octaves",
                format!("{} exceeds the maximum of {}", octaves, MAX_SCALE_OCTAVES),
            ));
        }
        let pitches = self.theory().scale(root, scale_type, octaves)?;
        let notes = pitches
            .into_iter()
            .enumerate()
            .map(|(step, pitch)| {
                Note::new(
                    pitch,
                    start + step as f64 * note_duration,
                    note_duration,
                    velocity.unwrap_or(DEFAULT_VELOCITY as i64),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        let added: Vec<u8> = notes.iter().map(|n| n.pitch).collect();
        self.insert_notes(pattern_id, notes)?;
        Ok(added)
    }

    /// Remove every note. Clearing an empty pattern is a no-op.
    pub fn clear_pattern(&mut self, pattern_id: PatternId) -> Result<usize> {
        let count = self.project.pattern(pattern_id)?.notes().len();
        if count > 0 {
            self.edit().pattern_mut(pattern_id)?.notes.clear();
            debug!("[ENGINE] Cleared {} notes from pattern {}", count, pattern_id);
        }
        Ok(count)
    }

    /// Remove notes by their index in storage order.
    ///
    /// Any out-of-range index rejects the whole call. Repeated indices count
    /// once.
    pub fn remove_notes(&mut self, pattern_id: PatternId, indices: &[usize]) -> Result<usize> {
        let len = self.project.pattern(pattern_id)?.notes().len();
        let unique: BTreeSet<usize> = indices.iter().copied().collect();
        if let Some(bad) = unique.iter().find(|&&i| i >= len) {
            return Err(StudioError::invalid(
                "indices",
                format!("index {} out of range for {} notes", bad, len),
            ));
        }
        if unique.is_empty() {
            return Ok(0);
        }
        let pattern = self.edit().pattern_mut(pattern_id)?;
        let mut index = 0;
        pattern.notes.retain(|_| {
            let keep = !unique.contains(&index);
            index += 1;
            keep
        });
        debug!("[ENGINE] Removed {} notes from pattern {}", unique.len(), pattern_id);
        Ok(unique.len())
    }

    /// Place an audio sample on a sample track.
    pub fn add_sample_clip(
        &mut self,
        track_id: TrackId,
        sample_path: &Path,
        start_bar: f64,
        length_bars: f64,
    ) -> Result<ClipId> {
        let track = self.project.track(track_id)?;
        if track.kind() != TrackKind::Sample {
            return Err(StudioError::invalid(
                "track",
                format!("sample clips need a sample track; track {} is a {} track", track_id, track.kind()),
            ));
        }
        if sample_path.as_os_str().is_empty() {
            return Err(StudioError::invalid("sample_path", "must not be empty"));
        }
        validate_placement(start_bar, length_bars)?;

        let project = self.edit();
        let id = project.ids.clip();
        project
            .track_mut(track_id)?
            .clips_mut()
            .ok_or_else(|| StudioError::invalid("track", "not a sample track"))?
            .push(SampleClip {
                id,
                sample_path: sample_path.to_path_buf(),
                start_bar,
                length_bars,
            });
        debug!("[ENGINE] Sample clip {} on track {}", id, track_id);
        Ok(id)
    }

    fn insert_notes(&mut self, pattern_id: PatternId, notes: Vec<Note>) -> Result<usize> {
        let count = notes.len();
        if count == 0 {
            return Ok(0);
        }
        self.edit().pattern_mut(pattern_id)?.insert_sorted(notes);
        debug!("[ENGINE] Added {} notes to pattern {}", count, pattern_id);
        Ok(count)
    }
}
