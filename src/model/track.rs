//! Tracks: instrument tracks hold patterns, sample tracks hold clips.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::automation::AutomationClip;
use super::ids::{ClipId, TrackId};
use super::pattern::{validate_placement, Pattern};
use crate::error::{Result, StudioError};

/// Default and limits for track mixer values.
pub const DEFAULT_VOLUME: f64 = 100.0;
pub const MAX_VOLUME: f64 = 200.0;
pub const MAX_PAN: f64 = 100.0;

/// Instrument plugin used when none is named.
pub const DEFAULT_INSTRUMENT: &str = "tripleoscillator";

/// Kind of track requested at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Instrument,
    Sample,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Instrument => write!(f, "instrument"),
            TrackKind::Sample => write!(f, "sample"),
        }
    }
}

impl FromStr for TrackKind {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "instrument" => Ok(TrackKind::Instrument),
            "sample" => Ok(TrackKind::Sample),
            other => Err(StudioError::invalid(
                "kind",
                format!("unknown track kind '{}' (expected instrument or sample)", other),
            )),
        }
    }
}

/// An audio sample placed on a sample track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClip {
    pub(crate) id: ClipId,
    pub(crate) sample_path: PathBuf,
    pub(crate) start_bar: f64,
    pub(crate) length_bars: f64,
}

impl SampleClip {
    pub fn id(&self) -> ClipId {
        self.id
    }

    pub fn sample_path(&self) -> &std::path::Path {
        &self.sample_path
    }

    pub fn start_bar(&self) -> f64 {
        self.start_bar
    }

    pub fn length_bars(&self) -> f64 {
        self.length_bars
    }
}

/// What a track contains, depending on its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackContent {
    Instrument {
        instrument: String,
        #[serde(default)]
        patterns: Vec<Pattern>,
    },
    Sample {
        #[serde(default)]
        clips: Vec<SampleClip>,
    },
}

/// A track in the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub(crate) id: TrackId,
    pub(crate) name: String,
    pub(crate) volume: f64,
    pub(crate) pan: f64,
    #[serde(default)]
    pub(crate) muted: bool,
    #[serde(default)]
    pub(crate) solo: bool,
    pub(crate) content: TrackContent,
    #[serde(default)]
    pub(crate) automation: Vec<AutomationClip>,
}

impl Track {
    pub(crate) fn new(id: TrackId, kind: TrackKind, name: String) -> Self {
        let content = match kind {
            TrackKind::Instrument => TrackContent::Instrument {
                instrument: DEFAULT_INSTRUMENT.to_string(),
                patterns: Vec::new(),
            },
            TrackKind::Sample => TrackContent::Sample { clips: Vec::new() },
        };
        Track {
            id,
            name,
            volume: DEFAULT_VOLUME,
            pan: 0.0,
            muted: false,
            solo: false,
            content,
            automation: Vec::new(),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TrackKind {
        match self.content {
            TrackContent::Instrument { .. } => TrackKind::Instrument,
            TrackContent::Sample { .. } => TrackKind::Sample,
        }
    }

    /// Volume in percent (0–200).
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Pan from -100 (left) to 100 (right).
    pub fn pan(&self) -> f64 {
        self.pan
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_solo(&self) -> bool {
        self.solo
    }

    /// Instrument plugin name, for instrument tracks.
    pub fn instrument(&self) -> Option<&str> {
        match &self.content {
            TrackContent::Instrument { instrument, .. } => Some(instrument),
            TrackContent::Sample { .. } => None,
        }
    }

    /// Patterns on this track; empty for sample tracks.
    pub fn patterns(&self) -> &[Pattern] {
        match &self.content {
            TrackContent::Instrument { patterns, .. } => patterns,
            TrackContent::Sample { .. } => &[],
        }
    }

    /// Sample clips on this track; empty for instrument tracks.
    pub fn clips(&self) -> &[SampleClip] {
        match &self.content {
            TrackContent::Sample { clips } => clips,
            TrackContent::Instrument { .. } => &[],
        }
    }

    pub fn automation(&self) -> &[AutomationClip] {
        &self.automation
    }

    pub fn note_count(&self) -> usize {
        self.patterns().iter().map(|p| p.notes().len()).sum()
    }

    /// Last bar any content of this track reaches.
    pub fn end_bar(&self, beats_per_bar: f64) -> f64 {
        let patterns = self
            .patterns()
            .iter()
            .map(|p| p.start_bar() + p.span_bars(beats_per_bar));
        let clips = self.clips().iter().map(|c| c.start_bar + c.length_bars);
        let automation = self.automation.iter().map(|a| {
            let last_point = a.points.last().map_or(0.0, |p| p.time / beats_per_bar);
            a.start_bar + a.length_bars.max(last_point)
        });
        patterns.chain(clips).chain(automation).fold(0.0, f64::max)
    }

    pub(crate) fn patterns_mut(&mut self) -> Option<&mut Vec<Pattern>> {
        match &mut self.content {
            TrackContent::Instrument { patterns, .. } => Some(patterns),
            TrackContent::Sample { .. } => None,
        }
    }

    pub(crate) fn clips_mut(&mut self) -> Option<&mut Vec<SampleClip>> {
        match &mut self.content {
            TrackContent::Sample { clips } => Some(clips),
            TrackContent::Instrument { .. } => None,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_volume(self.volume)?;
        check_pan(self.pan)?;
        for pattern in self.patterns() {
            pattern.validate()?;
        }
        for clip in self.clips() {
            validate_placement(clip.start_bar, clip.length_bars)?;
        }
        for clip in &self.automation {
            clip.validate()?;
        }
        Ok(())
    }
}

pub(crate) fn check_volume(value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=MAX_VOLUME).contains(&value) {
        return Err(StudioError::invalid(
            "volume",
            format!("{} outside 0..=200 percent", value),
        ));
    }
    Ok(())
}

pub(crate) fn check_pan(value: f64) -> Result<()> {
    if !value.is_finite() || !(-MAX_PAN..=MAX_PAN).contains(&value) {
        return Err(StudioError::invalid(
            "pan",
            format!("{} outside -100..=100", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("Instrument".parse::<TrackKind>().unwrap(), TrackKind::Instrument);
        assert_eq!("sample".parse::<TrackKind>().unwrap(), TrackKind::Sample);
        assert!(matches!(
            "drumkit".parse::<TrackKind>(),
            Err(StudioError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_new_track_defaults() {
        let track = Track::new(TrackId(3), TrackKind::Instrument, "Pad".into());
        assert_eq!(track.volume(), 100.0);
        assert_eq!(track.pan(), 0.0);
        assert_eq!(track.instrument(), Some(DEFAULT_INSTRUMENT));
        assert!(track.patterns().is_empty());

        let sample = Track::new(TrackId(4), TrackKind::Sample, "Loop".into());
        assert_eq!(sample.kind(), TrackKind::Sample);
        assert_eq!(sample.instrument(), None);
    }

    #[test]
    fn test_mixer_ranges() {
        assert!(check_volume(0.0).is_ok());
        assert!(check_volume(200.0).is_ok());
        assert!(check_volume(200.5).is_err());
        assert!(check_pan(-100.0).is_ok());
        assert!(check_pan(100.1).is_err());
    }
}
