//! Musical time: time signatures and bar/beat conversion.
//!
//! A beat is always a quarter note. Pattern and clip positions are measured
//! in bars, note and automation times in beats relative to their container.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

/// Denominators the renderer understands.
const VALID_DENOMINATORS: [u8; 6] = [1, 2, 4, 8, 16, 32];

/// Time signature such as 4/4 or 6/8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl TimeSignature {
    /// Create a validated time signature.
    pub fn new(numerator: u8, denominator: u8) -> Result<Self> {
        let sig = TimeSignature {
            numerator,
            denominator,
        };
        sig.validate()?;
        Ok(sig)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(1..=32).contains(&self.numerator) {
            return Err(StudioError::invalid(
                "time_signature",
                format!("numerator {} outside 1..=32", self.numerator),
            ));
        }
        if !VALID_DENOMINATORS.contains(&self.denominator) {
            return Err(StudioError::invalid(
                "time_signature",
                format!("denominator {} is not a power of two up to 32", self.denominator),
            ));
        }
        Ok(())
    }

    /// Quarter-note beats in one bar.
    pub fn beats_per_bar(&self) -> f64 {
        self.numerator as f64 * 4.0 / self.denominator as f64
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        let (num, den) = s
            .split_once('/')
            .ok_or_else(|| StudioError::invalid("time_signature", format!("expected N/D, got '{}'", s)))?;
        let parse = |part: &str| {
            part.trim().parse::<u8>().map_err(|_| {
                StudioError::invalid("time_signature", format!("'{}' is not a number", part))
            })
        };
        TimeSignature::new(parse(num)?, parse(den)?)
    }
}

/// Seconds spanned by `beats` quarter notes at `tempo` BPM.
pub fn beats_to_seconds(beats: f64, tempo: f64) -> f64 {
    beats * 60.0 / tempo
}
