//! Notes inside a pattern.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

/// Highest MIDI pitch and velocity.
pub const MIDI_MAX: i64 = 127;

/// Velocity used when a caller does not give one.
pub const DEFAULT_VELOCITY: u8 = 100;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A single note. Times are in beats relative to the pattern start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub start: f64,
    pub duration: f64,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

impl Note {
    /// Build a note, validating every field.
    ///
    /// Pitch and velocity are taken as wide integers so out-of-range input
    /// from the tool boundary is reported rather than truncated.
    pub fn new(pitch: i64, start: f64, duration: f64, velocity: i64) -> Result<Self> {
        if !(0..=MIDI_MAX).contains(&pitch) {
            return Err(StudioError::invalid(
                "pitch",
                format!("{} outside MIDI range 0..=127", pitch),
            ));
        }
        if !(0..=MIDI_MAX).contains(&velocity) {
            return Err(StudioError::invalid(
                "velocity",
                format!("{} outside 0..=127", velocity),
            ));
        }
        if !start.is_finite() || start < 0.0 {
            return Err(StudioError::invalid(
                "start",
                format!("{} must be a non-negative beat offset", start),
            ));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(StudioError::invalid(
                "duration",
                format!("{} must be positive", duration),
            ));
        }
        Ok(Note {
            pitch: pitch as u8,
            start,
            duration,
            velocity: velocity as u8,
        })
    }

    /// Re-check a note that came from outside the engine (e.g. a loaded file).
    pub(crate) fn validate(&self) -> Result<()> {
        Note::new(
            self.pitch as i64,
            self.start,
            self.duration,
            self.velocity as i64,
        )
        .map(|_| ())
    }

    /// Beat at which the note stops sounding.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Note name like "C4" (middle C = 60).
    pub fn name(&self) -> String {
        pitch_to_name(self.pitch)
    }

    /// Canonical storage order: start, then pitch, duration, velocity.
    pub(crate) fn storage_cmp(&self, other: &Note) -> Ordering {
        self.start
            .total_cmp(&other.start)
            .then(self.pitch.cmp(&other.pitch))
            .then(self.duration.total_cmp(&other.duration))
            .then(self.velocity.cmp(&other.velocity))
    }
}

/// Convert a MIDI pitch to a note name.
pub fn pitch_to_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], octave)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_valid_note() {
        let note = Note::new(60, 0.0, 1.0, 100).unwrap();
        assert_eq!(note.name(), "C4");
        assert_eq!(note.end(), 1.0);
    }

    #[test_case(128, 0.0, 1.0, 100, "pitch" ; "pitch too high")]
    #[test_case(-1, 0.0, 1.0, 100, "pitch" ; "negative pitch")]
    #[test_case(60, -0.5, 1.0, 100, "start" ; "negative start")]
    #[test_case(60, 0.0, 0.0, 100, "duration" ; "zero duration")]
    #[test_case(60, 0.0, f64::NAN, 100, "duration" ; "nan duration")]
    #[test_case(60, 0.0, 1.0, 128, "velocity" ; "velocity too high")]
    fn test_invalid_note(pitch: i64, start: f64, duration: f64, velocity: i64, field: &str) {
        match Note::new(pitch, start, duration, velocity) {
            Err(StudioError::InvalidParameter { param, .. }) => assert_eq!(param, field),
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_pitch_names() {
        assert_eq!(pitch_to_name(0), "C-1");
        assert_eq!(pitch_to_name(69), "A4");
        assert_eq!(pitch_to_name(127), "G9");
    }

    #[test]
    fn test_storage_order() {
        let a = Note::new(64, 0.0, 1.0, 100).unwrap();
        let b = Note::new(60, 0.0, 1.0, 100).unwrap();
        let c = Note::new(48, 1.0, 1.0, 100).unwrap();
        let mut notes = vec![c, a, b];
        notes.sort_by(Note::storage_cmp);
        assert_eq!(
            notes.iter().map(|n| n.pitch).collect::<Vec<_>>(),
            vec![60, 64, 48]
        );
    }
}
