//! The project aggregate.
//!
//! `Project` owns every track, pattern, note and automation clip. Outside the
//! crate it is read-only: all changes go through [`crate::engine::Session`],
//! which validates before touching anything.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::automation::AutomationClip;
use super::ids::{AutomationId, IdAllocator, PatternId, TrackId};
use super::note::Note;
use super::pattern::Pattern;
use super::time::{beats_to_seconds, TimeSignature};
use super::track::Track;
use crate::error::{Result, StudioError};

/// Name given to projects created without one.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled";

/// Root of the entity model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub(crate) name: String,
    pub(crate) tempo: f64,
    pub(crate) time_signature: TimeSignature,
    #[serde(default)]
    pub(crate) tracks: Vec<Track>,
    pub(crate) ids: IdAllocator,

    /// Where the project was last saved or loaded from (not serialized).
    #[serde(skip)]
    pub(crate) path: Option<PathBuf>,
}

impl Project {
    pub(crate) fn new(tempo: f64, time_signature: TimeSignature) -> Self {
        Project {
            name: DEFAULT_PROJECT_NAME.to_string(),
            tempo,
            time_signature,
            tracks: Vec::new(),
            ids: IdAllocator::default(),
            path: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tempo in beats per minute.
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn beats_per_bar(&self) -> f64 {
        self.time_signature.beats_per_bar()
    }

    /// File path, set by the first save or by load.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Tracks in project order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Result<&Track> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| StudioError::not_found("track", id))
    }

    pub fn pattern(&self, id: PatternId) -> Result<&Pattern> {
        self.pattern_with_track(id).map(|(_, p)| p)
    }

    /// The pattern and the track that owns it.
    pub fn pattern_with_track(&self, id: PatternId) -> Result<(&Track, &Pattern)> {
        self.tracks
            .iter()
            .find_map(|t| t.patterns().iter().find(|p| p.id == id).map(|p| (t, p)))
            .ok_or_else(|| StudioError::not_found("pattern", id))
    }

    /// Notes of a pattern in storage order.
    pub fn notes(&self, pattern_id: PatternId) -> Result<&[Note]> {
        self.pattern(pattern_id).map(Pattern::notes)
    }

    pub fn automation(&self, id: AutomationId) -> Result<&AutomationClip> {
        self.tracks
            .iter()
            .find_map(|t| t.automation.iter().find(|a| a.id == id))
            .ok_or_else(|| StudioError::not_found("automation clip", id))
    }

    pub fn pattern_count(&self) -> usize {
        self.tracks.iter().map(|t| t.patterns().len()).sum()
    }

    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(Track::note_count).sum()
    }

    pub fn automation_count(&self) -> usize {
        self.tracks.iter().map(|t| t.automation.len()).sum()
    }

    /// Length of the arrangement in bars, counting notes past pattern ends.
    pub fn duration_bars(&self) -> f64 {
        let bpb = self.beats_per_bar();
        self.tracks.iter().map(|t| t.end_bar(bpb)).fold(0.0, f64::max)
    }

    pub fn duration_seconds(&self) -> f64 {
        beats_to_seconds(self.duration_bars() * self.beats_per_bar(), self.tempo)
    }

    pub(crate) fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StudioError::not_found("track", id))
    }

    pub(crate) fn pattern_mut(&mut self, id: PatternId) -> Result<&mut Pattern> {
        self.tracks
            .iter_mut()
            .filter_map(|t| t.patterns_mut())
            .flat_map(|patterns| patterns.iter_mut())
            .find(|p| p.id == id)
            .ok_or_else(|| StudioError::not_found("pattern", id))
    }

    pub(crate) fn automation_mut(&mut self, id: AutomationId) -> Result<&mut AutomationClip> {
        self.tracks
            .iter_mut()
            .flat_map(|t| t.automation.iter_mut())
            .find(|a| a.id == id)
            .ok_or_else(|| StudioError::not_found("automation clip", id))
    }

    /// Put every pattern's notes back into storage order. Files edited by
    /// hand may list them in any order.
    pub(crate) fn sort_notes(&mut self) {
        for patterns in self.tracks.iter_mut().filter_map(|t| t.patterns_mut()) {
            for pattern in patterns.iter_mut() {
                pattern.notes.sort_by(Note::storage_cmp);
            }
        }
    }

    /// Check every invariant; used on freshly loaded projects.
    pub(crate) fn validate(&self) -> Result<()> {
        check_tempo(self.tempo)?;
        self.time_signature.validate()?;

        let mut track_ids = HashSet::new();
        let mut pattern_ids = HashSet::new();
        let mut automation_ids = HashSet::new();
        let mut clip_ids = HashSet::new();

        for track in &self.tracks {
            track.validate()?;
            if !track_ids.insert(track.id) {
                return Err(StudioError::invalid("tracks", format!("duplicate track id {}", track.id)));
            }
            for pattern in track.patterns() {
                if !pattern_ids.insert(pattern.id) {
                    return Err(StudioError::invalid(
                        "patterns",
                        format!("duplicate pattern id {}", pattern.id),
                    ));
                }
            }
            for clip in track.clips() {
                if !clip_ids.insert(clip.id) {
                    return Err(StudioError::invalid("clips", format!("duplicate clip id {}", clip.id)));
                }
            }
            for clip in &track.automation {
                if !automation_ids.insert(clip.id) {
                    return Err(StudioError::invalid(
                        "automation",
                        format!("duplicate automation id {}", clip.id),
                    ));
                }
            }
        }

        let covered = self.ids.covers(
            track_ids.iter().max().copied(),
            pattern_ids.iter().max().copied(),
            automation_ids.iter().max().copied(),
            clip_ids.iter().max().copied(),
        );
        if !covered {
            return Err(StudioError::invalid(
                "ids",
                "id allocator is behind ids already in use",
            ));
        }
        Ok(())
    }
}

pub(crate) fn check_tempo(tempo: f64) -> Result<()> {
    if !tempo.is_finite() || tempo <= 0.0 {
        return Err(StudioError::invalid(
            "tempo",
            format!("{} must be a positive number of BPM", tempo),
        ));
    }
    Ok(())
}
