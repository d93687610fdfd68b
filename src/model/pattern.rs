//! Note patterns placed on instrument tracks.

use serde::{Deserialize, Serialize};

use super::ids::PatternId;
use super::note::Note;
use crate::error::{Result, StudioError};

/// A pattern of notes. Position and length are in bars.
///
/// `length_bars` is the loop length; notes may run past it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub(crate) id: PatternId,
    pub(crate) name: String,
    pub(crate) start_bar: f64,
    pub(crate) length_bars: f64,
    #[serde(default)]
    pub(crate) notes: Vec<Note>,
}

impl Pattern {
    pub(crate) fn new(id: PatternId, name: String, start_bar: f64, length_bars: f64) -> Self {
        Pattern {
            id,
            name,
            start_bar,
            length_bars,
            notes: Vec::new(),
        }
    }

    pub fn id(&self) -> PatternId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_bar(&self) -> f64 {
        self.start_bar
    }

    pub fn length_bars(&self) -> f64 {
        self.length_bars
    }

    /// Notes in storage order (sorted by start, then pitch).
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Last beat touched by any note, or 0 for an empty pattern.
    pub fn last_note_end(&self) -> f64 {
        self.notes.iter().map(Note::end).fold(0.0, f64::max)
    }

    /// Bars the pattern occupies, counting notes that overflow its length.
    pub fn span_bars(&self, beats_per_bar: f64) -> f64 {
        self.length_bars.max(self.last_note_end() / beats_per_bar)
    }

    /// Insert notes keeping storage order. Callers validate first.
    pub(crate) fn insert_sorted(&mut self, notes: impl IntoIterator<Item = Note>) {
        self.notes.extend(notes);
        self.notes.sort_by(Note::storage_cmp);
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_placement(self.start_bar, self.length_bars)?;
        for note in &self.notes {
            note.validate()?;
        }
        Ok(())
    }
}

/// Shared placement rule for patterns and clips.
pub(crate) fn validate_placement(start_bar: f64, length_bars: f64) -> Result<()> {
    if !start_bar.is_finite() || start_bar < 0.0 {
        return Err(StudioError::invalid(
            "start",
            format!("{} must be a non-negative bar position", start_bar),
        ));
    }
    if !length_bars.is_finite() || length_bars <= 0.0 {
        return Err(StudioError::invalid(
            "length",
            format!("{} must be a positive number of bars", length_bars),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_counts_overflowing_notes() {
        let mut pattern = Pattern::new(PatternId(0), "Lead".into(), 0.0, 1.0);
        assert_eq!(pattern.span_bars(4.0), 1.0);

        pattern.insert_sorted([Note::new(60, 3.0, 3.0, 100).unwrap()]);
        assert_eq!(pattern.last_note_end(), 6.0);
        assert_eq!(pattern.span_bars(4.0), 1.5);
    }

    #[test]
    fn test_placement_rules() {
        assert!(validate_placement(0.0, 4.0).is_ok());
        assert!(validate_placement(-1.0, 4.0).is_err());
        assert!(validate_placement(0.0, 0.0).is_err());
        assert!(validate_placement(f64::INFINITY, 1.0).is_err());
    }
}
