//! Table-backed chord and scale lookup.

use super::{normalize_name, stack_octaves, TheoryLookup};
use crate::error::{Result, StudioError};

/// Chord intervals in semitones from the root. Keys are normalized names.
const CHORDS: &[(&str, &[i64])] = &[
    ("maj", &[0, 4, 7]),
    ("major", &[0, 4, 7]),
    ("min", &[0, 3, 7]),
    ("minor", &[0, 3, 7]),
    ("dim", &[0, 3, 6]),
    ("aug", &[0, 4, 8]),
    ("sus2", &[0, 2, 7]),
    ("sus4", &[0, 5, 7]),
    ("maj7", &[0, 4, 7, 11]),
    ("min7", &[0, 3, 7, 10]),
    ("dom7", &[0, 4, 7, 10]),
    ("7", &[0, 4, 7, 10]),
    ("dim7", &[0, 3, 6, 9]),
    ("m7b5", &[0, 3, 6, 10]),
    ("maj9", &[0, 4, 7, 11, 14]),
    ("min9", &[0, 3, 7, 10, 14]),
    ("dom9", &[0, 4, 7, 10, 14]),
    ("add9", &[0, 4, 7, 14]),
    ("6", &[0, 4, 7, 9]),
    ("min6", &[0, 3, 7, 9]),
];

/// Scale intervals in semitones from the root. Keys are normalized names.
const SCALES: &[(&str, &[i64])] = &[
    ("major", &[0, 2, 4, 5, 7, 9, 11]),
    ("minor", &[0, 2, 3, 5, 7, 8, 10]),
    ("harmonicminor", &[0, 2, 3, 5, 7, 8, 11]),
    ("melodicminor", &[0, 2, 3, 5, 7, 9, 11]),
    ("dorian", &[0, 2, 3, 5, 7, 9, 10]),
    ("phrygian", &[0, 1, 3, 5, 7, 8, 10]),
    ("lydian", &[0, 2, 4, 6, 7, 9, 11]),
    ("mixolydian", &[0, 2, 4, 5, 7, 9, 10]),
    ("locrian", &[0, 1, 3, 5, 6, 8, 10]),
    ("minorpentatonic", &[0, 3, 5, 7, 10]),
    ("majorpentatonic", &[0, 2, 4, 7, 9]),
    ("blues", &[0, 3, 5, 6, 7, 10]),
    ("chromatic", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
    ("wholetone", &[0, 2, 4, 6, 8, 10]),
];

/// Lookup backed by fixed interval tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChordTable;

impl ChordTable {
    pub fn new() -> Self {
        ChordTable
    }

    /// Normalized chord names this table knows.
    pub fn chord_names() -> impl Iterator<Item = &'static str> {
        CHORDS.iter().map(|(name, _)| *name)
    }

    /// Normalized scale names this table knows.
    pub fn scale_names() -> impl Iterator<Item = &'static str> {
        SCALES.iter().map(|(name, _)| *name)
    }
}

fn lookup(table: &'static [(&'static str, &'static [i64])], name: &str) -> Option<&'static [i64]> {
    let key = normalize_name(name);
    table
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, intervals)| *intervals)
}

impl TheoryLookup for ChordTable {
    fn chord(&self, root: i64, name: &str) -> Result<Vec<i64>> {
        let intervals =
            lookup(CHORDS, name).ok_or_else(|| StudioError::not_found("chord type", name))?;
        Ok(intervals.iter().map(|i| root.saturating_add(*i)).collect())
    }

    fn scale(&self, root: i64, name: &str, octaves: u32) -> Result<Vec<i64>> {
        let intervals =
            lookup(SCALES, name).ok_or_else(|| StudioError::not_found("scale type", name))?;
        Ok(stack_octaves(root, intervals, octaves))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_major_chord() {
        assert_eq!(ChordTable.chord(60, "maj").unwrap(), vec![60, 64, 67]);
        assert_eq!(ChordTable.chord(60, "Maj-7").unwrap(), vec![60, 64, 67, 71]);
    }

    #[test]
    fn test_extreme_roots_saturate() {
        assert_eq!(ChordTable.chord(i64::MAX, "maj").unwrap(), vec![i64::MAX; 3]);
        assert!(ChordTable.scale(i64::MAX, "major", 2).unwrap().iter().all(|p| *p == i64::MAX));
    }

    #[test]
    fn test_unknown_chord_is_not_found() {
        assert!(matches!(
            ChordTable.chord(60, "mystery"),
            Err(StudioError::NotFound { entity: "chord type", .. })
        ));
    }

    #[test]
    fn test_scale_octaves() {
        let scale = ChordTable.scale(60, "major_pentatonic", 2).unwrap();
        assert_eq!(scale, vec![60, 62, 64, 67, 69, 72, 74, 76, 79, 81]);
    }

    #[test]
    fn test_unknown_scale_is_not_found() {
        assert!(ChordTable.scale(60, "klingon", 1).is_err());
    }
}
