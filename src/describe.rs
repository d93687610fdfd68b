//! Symbolic descriptions of a project.
//!
//! Each description is a serializable struct for tool results plus a
//! compact text form (`Display`) meant to be read back by the agent.

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::model::{
    AutomationClip, Note, Pattern, PatternId, Project, Track, TrackId, TrackKind,
};
use crate::state;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteDescription {
    pub pitch: u8,
    pub name: String,
    pub start: f64,
    pub duration: f64,
    pub velocity: u8,
}

impl From<&Note> for NoteDescription {
    fn from(note: &Note) -> Self {
        NoteDescription {
            pitch: note.pitch,
            name: note.name(),
            start: note.start,
            duration: note.duration,
            velocity: note.velocity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternDescription {
    pub id: PatternId,
    pub track_id: TrackId,
    pub name: String,
    pub start_bar: f64,
    pub length_bars: f64,
    pub note_count: usize,
    pub notes: Vec<NoteDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutomationDescription {
    pub id: u32,
    pub target: String,
    pub start_bar: f64,
    pub length_bars: f64,
    pub point_count: usize,
    /// Lowest and highest point value, if there are points.
    pub value_range: Option<(f64, f64)>,
}

impl From<&AutomationClip> for AutomationDescription {
    fn from(clip: &AutomationClip) -> Self {
        let value_range = clip.points().iter().fold(None, |acc, p| match acc {
            None => Some((p.value, p.value)),
            Some((lo, hi)) => Some((f64::min(lo, p.value), f64::max(hi, p.value))),
        });
        AutomationDescription {
            id: clip.id().0,
            target: clip.target().to_string(),
            start_bar: clip.start_bar(),
            length_bars: clip.length_bars(),
            point_count: clip.points().len(),
            value_range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackDescription {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    pub volume: f64,
    pub pan: f64,
    pub muted: bool,
    pub solo: bool,
    pub pattern_count: usize,
    pub clip_count: usize,
    pub note_count: usize,
    pub automation: Vec<AutomationDescription>,
    /// Patterns without their note lists.
    pub patterns: Vec<PatternDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDescription {
    pub name: String,
    pub tempo: f64,
    pub time_signature: String,
    pub track_count: usize,
    pub pattern_count: usize,
    pub note_count: usize,
    pub automation_count: usize,
    pub duration_bars: f64,
    pub duration_seconds: f64,
    /// SHA-256 of the saved form; changes whenever the project does.
    pub fingerprint: String,
    pub tracks: Vec<TrackDescription>,
}

fn pattern_description(track: &Track, pattern: &Pattern, with_notes: bool) -> PatternDescription {
    PatternDescription {
        id: pattern.id(),
        track_id: track.id(),
        name: pattern.name().to_string(),
        start_bar: pattern.start_bar(),
        length_bars: pattern.length_bars(),
        note_count: pattern.notes().len(),
        notes: if with_notes {
            pattern.notes().iter().map(NoteDescription::from).collect()
        } else {
            Vec::new()
        },
    }
}

fn track_description(track: &Track) -> TrackDescription {
    TrackDescription {
        id: track.id(),
        name: track.name().to_string(),
        kind: track.kind(),
        instrument: track.instrument().map(str::to_string),
        volume: track.volume(),
        pan: track.pan(),
        muted: track.is_muted(),
        solo: track.is_solo(),
        pattern_count: track.patterns().len(),
        clip_count: track.clips().len(),
        note_count: track.note_count(),
        automation: track.automation().iter().map(AutomationDescription::from).collect(),
        patterns: track
            .patterns()
            .iter()
            .map(|p| pattern_description(track, p, false))
            .collect(),
    }
}

/// Summary of the whole project.
pub fn describe_project(project: &Project) -> Result<ProjectDescription> {
    Ok(ProjectDescription {
        name: project.name().to_string(),
        tempo: project.tempo(),
        time_signature: project.time_signature().to_string(),
        track_count: project.tracks().len(),
        pattern_count: project.pattern_count(),
        note_count: project.note_count(),
        automation_count: project.automation_count(),
        duration_bars: project.duration_bars(),
        duration_seconds: project.duration_seconds(),
        fingerprint: state::fingerprint(project)?,
        tracks: project.tracks().iter().map(track_description).collect(),
    })
}

pub fn describe_track(project: &Project, id: TrackId) -> Result<TrackDescription> {
    project.track(id).map(track_description)
}

/// One pattern including every note.
pub fn describe_pattern(project: &Project, id: PatternId) -> Result<PatternDescription> {
    let (track, pattern) = project.pattern_with_track(id)?;
    Ok(pattern_description(track, pattern, true))
}

impl fmt::Display for PatternDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.notes.is_empty() {
            return write!(
                f,
                "Pattern '{}' at bar {}: {} ({} bars)",
                self.name,
                self.start_bar,
                if self.note_count == 0 {
                    "empty".to_string()
                } else {
                    format!("{} notes", self.note_count)
                },
                self.length_bars
            );
        }
        write!(
            f,
            "Pattern '{}' at bar {} ({} bars, {} notes):",
            self.name, self.start_bar, self.length_bars, self.note_count
        )?;
        // Notes are sorted by start, so notes sharing a beat are adjacent.
        let mut rest = self.notes.as_slice();
        while let Some(first) = rest.first() {
            let len = rest.iter().take_while(|n| n.start == first.start).count();
            let (group, tail) = rest.split_at(len);
            rest = tail;
            if let [note] = group {
                write!(f, "\n  Beat {}: {} (len: {})", note.start, note.name, note.duration)?;
            } else if group.iter().all(|n| n.duration == first.duration) {
                let names: Vec<&str> = group.iter().map(|n| n.name.as_str()).collect();
                write!(
                    f,
                    "\n  Beat {}: [{}] (len: {})",
                    first.start,
                    names.join(", "),
                    first.duration
                )?;
            } else {
                let notes: Vec<String> = group
                    .iter()
                    .map(|n| format!("{} (len: {})", n.name, n.duration))
                    .collect();
                write!(f, "\n  Beat {}: [{}]", first.start, notes.join(", "))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for TrackDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.muted {
            flags.push("muted");
        }
        if self.solo {
            flags.push("solo");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        match &self.instrument {
            Some(instrument) => write!(
                f,
                "Instrument '{}' [{}]{}: {} patterns, {} notes",
                self.name, instrument, flags, self.pattern_count, self.note_count
            )?,
            None => write!(
                f,
                "Sample '{}'{}: {} clips",
                self.name, flags, self.clip_count
            )?,
        }
        write!(f, ", vol {}%, pan {}", self.volume, self.pan)?;
        for clip in &self.automation {
            write!(
                f,
                "\n    ~ automation {} on {} at bar {} ({} points)",
                clip.id, clip.target, clip.start_bar, clip.point_count
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ProjectDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Project: {}", self.name)?;
        writeln!(
            f,
            "Tempo: {} BPM, Time signature: {}",
            self.tempo, self.time_signature
        )?;
        writeln!(
            f,
            "Length: {:.2} bars ({:.2} s)",
            self.duration_bars, self.duration_seconds
        )?;
        write!(
            f,
            "Tracks: {}, patterns: {}, notes: {}",
            self.track_count, self.pattern_count, self.note_count
        )?;
        for track in &self.tracks {
            write!(f, "\n  [{}] {}", track.id, track)?;
            for pattern in &track.patterns {
                write!(f, "\n       - {}", pattern)?;
            }
        }
        Ok(())
    }
}
