//! Note-name parsing ("C4", "F#3", "Bb2") to MIDI numbers.

use crate::error::{Result, StudioError};

/// Octave assumed when a name has none ("C" → C4).
const DEFAULT_OCTAVE: i64 = 4;

/// Octaves that reach the MIDI range: C-1 is 0 and G9 is 127.
const OCTAVE_RANGE: std::ops::RangeInclusive<i64> = -1..=9;

/// Parse a note name into a MIDI number, with C4 = 60.
///
/// Sharps (`#`) and flats (`b`) are accepted; the octave runs from -1 to 9.
/// Names at the edges of that range can still fall outside MIDI ("B#9" is
/// 132), and the caller's note validation decides.
pub fn parse_pitch(name: &str) -> Result<i64> {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();

    let letter = chars
        .next()
        .ok_or_else(|| StudioError::invalid("pitch", "empty note name"))?;
    let base = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => {
            return Err(StudioError::invalid(
                "pitch",
                format!("'{}' is not a note name", trimmed),
            ))
        }
    };

    let rest = chars.as_str();
    let (accidental, octave_str) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };

    let octave = if octave_str.is_empty() {
        DEFAULT_OCTAVE
    } else {
        octave_str.parse::<i64>().map_err(|_| {
            StudioError::invalid("pitch", format!("bad octave in note name '{}'", trimmed))
        })?
    };
    if !OCTAVE_RANGE.contains(&octave) {
        return Err(StudioError::invalid(
            "pitch",
            format!("octave {} in '{}' is outside -1..=9", octave, trimmed),
        ));
    }

    Ok((octave + 1) * 12 + base + accidental)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("C4", 60)]
    #[test_case("c4", 60)]
    #[test_case("A4", 69)]
    #[test_case("C#4", 61)]
    #[test_case("Db4", 61)]
    #[test_case("Bb3", 58)]
    #[test_case("E", 64 ; "default octave")]
    #[test_case("C-1", 0 ; "lowest midi note")]
    #[test_case("G9", 127 ; "highest midi note")]
    fn test_parse_pitch(name: &str, expected: i64) {
        assert_eq!(parse_pitch(name).unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("H2" ; "bad letter")]
    #[test_case("C#x" ; "bad octave")]
    #[test_case("C10" ; "octave above range")]
    #[test_case("D-2" ; "octave below range")]
    #[test_case("C9223372036854775807" ; "huge octave")]
    fn test_parse_pitch_rejects(name: &str) {
        assert!(matches!(
            parse_pitch(name),
            Err(StudioError::InvalidParameter { .. })
        ));
    }
}
