//! Render-Feedback Coordinator
//!
//! Hands the in-memory project to an external renderer and turns the result
//! into feedback:
//! - `process`: bounded-time child process with output capture
//! - `analysis`: peak/RMS/clipping measurements of rendered WAV files
//! - `coordinator`: temp-file handling, invocation and the final outcome

pub mod analysis;
pub mod coordinator;
pub mod process;

pub use analysis::{analyze_wav, AcousticFeatures};
pub use coordinator::{RenderCoordinator, RenderOutcome};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StudioError;

/// Output formats the renderer is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Flac,
    Ogg,
    Mp3,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Mp3 => "mp3",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "flac" => Ok(AudioFormat::Flac),
            "ogg" => Ok(AudioFormat::Ogg),
            "mp3" => Ok(AudioFormat::Mp3),
            other => Err(StudioError::invalid(
                "format",
                format!("unsupported format '{}' (expected wav, flac, ogg or mp3)", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use test_case::test_case;

    #[test_case("wav", AudioFormat::Wav)]
    #[test_case("FLAC", AudioFormat::Flac)]
    #[test_case(" ogg ", AudioFormat::Ogg)]
    #[test_case("mp3", AudioFormat::Mp3)]
    fn test_parse_format(input: &str, expected: AudioFormat) {
        assert_eq!(input.parse::<AudioFormat>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_format_is_invalid() {
        assert!(matches!(
            "aiff".parse::<AudioFormat>(),
            Err(StudioError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(AudioFormat::from_path(Path::new("mix.WAV")), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_path(Path::new("mix")), None);
    }
}
