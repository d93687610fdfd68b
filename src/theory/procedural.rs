//! Procedural chord and scale construction.
//!
//! Chords are read as `<quality><extension>`: quality is one of `maj`,
//! `min`/`m`, `dim`, `aug`, `sus2`, `sus4`, `dom` or empty (major), and the
//! extension one of empty, `6`, `7`, `9`, `add9`, optionally followed by
//! `b5`. Scales are the seven modes of the major scale plus a few
//! symmetric scales.

use super::{normalize_name, stack_octaves, TheoryLookup};
use crate::error::{Result, StudioError};

/// Step pattern of the major scale, rotated to get the modes.
const MAJOR_STEPS: [i64; 7] = [2, 2, 1, 2, 2, 2, 1];

const MODES: [&str; 7] = [
    "ionian",
    "dorian",
    "phrygian",
    "lydian",
    "mixolydian",
    "aeolian",
    "locrian",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quality {
    Major,
    ExplicitMajor,
    Dominant,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
}

/// Lookup that derives pitches instead of reading tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProceduralTheory;

impl ProceduralTheory {
    pub fn new() -> Self {
        ProceduralTheory
    }
}

fn split_quality(symbol: &str) -> (Quality, &str) {
    const PREFIXES: [(&str, Quality); 12] = [
        ("major", Quality::ExplicitMajor),
        ("minor", Quality::Minor),
        ("maj", Quality::ExplicitMajor),
        ("min", Quality::Minor),
        ("dim", Quality::Diminished),
        ("aug", Quality::Augmented),
        ("sus2", Quality::Sus2),
        ("sus4", Quality::Sus4),
        ("sus", Quality::Sus4),
        ("dom", Quality::Dominant),
        ("m", Quality::Minor),
        ("+", Quality::Augmented),
    ];
    PREFIXES
        .iter()
        .find(|(prefix, _)| symbol.starts_with(prefix))
        .map(|(prefix, quality)| (*quality, &symbol[prefix.len()..]))
        .unwrap_or((Quality::Major, symbol))
}

fn triad(quality: Quality) -> [i64; 3] {
    match quality {
        Quality::Major | Quality::ExplicitMajor | Quality::Dominant => [0, 4, 7],
        Quality::Minor => [0, 3, 7],
        Quality::Diminished => [0, 3, 6],
        Quality::Augmented => [0, 4, 8],
        Quality::Sus2 => [0, 2, 7],
        Quality::Sus4 => [0, 5, 7],
    }
}

fn seventh(quality: Quality) -> i64 {
    match quality {
        Quality::ExplicitMajor => 11,
        Quality::Diminished => 9,
        _ => 10,
    }
}

fn build_chord(symbol: &str) -> Option<Vec<i64>> {
    let (quality, rest) = split_quality(symbol);
    let (extension, flat_five) = match rest.strip_suffix("b5") {
        Some(stripped) => (stripped, true),
        None => (rest, false),
    };

    let mut intervals = triad(quality).to_vec();
    match extension {
        // A bare "dom" needs an extension to mean anything.
        "" if quality == Quality::Dominant => return None,
        "" => {}
        "6" => intervals.push(9),
        "7" => intervals.push(seventh(quality)),
        "9" => intervals.extend([seventh(quality), 14]),
        "add9" => intervals.push(14),
        _ => return None,
    }
    if flat_five {
        intervals[2] = 6;
    }
    Some(intervals)
}

fn build_scale(name: &str) -> Option<Vec<i64>> {
    let mode = match name {
        "major" => Some(0),
        "minor" | "naturalminor" => Some(5),
        other => MODES.iter().position(|m| *m == other),
    };
    if let Some(rotation) = mode {
        let mut intervals = Vec::with_capacity(MAJOR_STEPS.len());
        let mut offset = 0;
        for i in 0..MAJOR_STEPS.len() {
            intervals.push(offset);
            offset += MAJOR_STEPS[(rotation + i) % MAJOR_STEPS.len()];
        }
        return Some(intervals);
    }
    match name {
        "chromatic" => Some((0..12).collect()),
        "wholetone" => Some((0..6).map(|i| i * 2).collect()),
        _ => None,
    }
}

impl TheoryLookup for ProceduralTheory {
    fn chord(&self, root: i64, name: &str) -> Result<Vec<i64>> {
        let intervals = build_chord(&normalize_name(name))
            .ok_or_else(|| StudioError::not_found("chord type", name))?;
        Ok(intervals.into_iter().map(|i| root.saturating_add(i)).collect())
    }

    fn scale(&self, root: i64, name: &str, octaves: u32) -> Result<Vec<i64>> {
        let intervals = build_scale(&normalize_name(name))
            .ok_or_else(|| StudioError::not_found("scale type", name))?;
        Ok(stack_octaves(root, &intervals, octaves))
    }
}
