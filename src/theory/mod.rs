//! Music-theory lookup
//!
//! Chord and scale names are resolved through the [`TheoryLookup`]
//! capability so the mutation engine never depends on a particular table.
//! Two implementations ship with the crate:
//! - [`ChordTable`]: fixed interval tables
//! - [`ProceduralTheory`]: builds chords from a quality plus extensions and
//!   derives scales as modes of the major scale

pub mod pitch;
pub mod procedural;
pub mod table;

pub use pitch::parse_pitch;
pub use procedural::ProceduralTheory;
pub use table::ChordTable;

use crate::error::Result;

/// Resolves chord and scale names to pitches.
///
/// Unknown names must fail with `StudioError::NotFound`. Returned pitches
/// are not range-checked (they saturate at the `i64` bounds); the caller
/// validates them as notes.
pub trait TheoryLookup {
    /// Pitches of `name` built on `root`, lowest first.
    fn chord(&self, root: i64, name: &str) -> Result<Vec<i64>>;

    /// Pitches of the scale `name` from `root`, spanning `octaves` octaves.
    fn scale(&self, root: i64, name: &str, octaves: u32) -> Result<Vec<i64>>;
}

/// Lowercase and drop separators so "Maj-7" and "maj_7" look the same.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
        .collect()
}

/// Stack `intervals` over `octaves` octaves starting at `root`.
pub(crate) fn stack_octaves(root: i64, intervals: &[i64], octaves: u32) -> Vec<i64> {
    (0..octaves.max(1) as i64)
        .flat_map(|octave| intervals.iter().map(move |i| root.saturating_add(i + octave * 12)))
        .collect()
}
