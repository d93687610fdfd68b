//! Acoustic measurements of rendered audio.
//!
//! Only WAV can be read back; other formats get symbolic feedback only.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use serde::Serialize;

use crate::error::{Result, StudioError};

/// Level reported for digital silence instead of -inf.
pub const SILENCE_FLOOR_DB: f64 = -120.0;

/// Absolute sample value at or above which a sample counts as clipped.
const CLIP_THRESHOLD: f64 = 0.999;

/// Convert linear amplitude to dBFS, floored at [`SILENCE_FLOOR_DB`].
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        SILENCE_FLOOR_DB
    } else {
        (20.0 * linear.log10()).max(SILENCE_FLOOR_DB)
    }
}

/// Level and format facts about one rendered file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcousticFeatures {
    pub peak_dbfs: f64,
    pub rms_dbfs: f64,
    /// Fraction of samples (all channels) at full scale.
    pub clipped_ratio: f64,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AcousticFeatures {
    pub fn is_silent(&self) -> bool {
        self.peak_dbfs <= SILENCE_FLOOR_DB
    }

    pub fn is_clipping(&self) -> bool {
        self.clipped_ratio > 0.0
    }
}

fn unreadable(path: &Path, e: hound::Error) -> StudioError {
    StudioError::RenderFailed {
        reason: format!("cannot analyse {}: {}", path.display(), e),
        exit_code: None,
        stderr: String::new(),
    }
}

/// Running totals over a stream of normalized samples.
#[derive(Debug, Default)]
struct Levels {
    peak: f64,
    sum_squares: f64,
    clipped: u64,
    count: u64,
}

impl Levels {
    fn add(&mut self, sample: f64) {
        let magnitude = sample.abs();
        self.peak = self.peak.max(magnitude);
        self.sum_squares += sample * sample;
        if magnitude >= CLIP_THRESHOLD {
            self.clipped += 1;
        }
        self.count += 1;
    }

    fn rms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum_squares / self.count as f64).sqrt()
        }
    }

    fn clipped_ratio(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.clipped as f64 / self.count as f64
        }
    }
}

/// Read a WAV file and measure it in a single streaming pass.
pub fn analyze_wav(path: &Path) -> Result<AcousticFeatures> {
    let mut reader = WavReader::open(path).map_err(|e| unreadable(path, e))?;
    let spec = reader.spec();
    let mut levels = Levels::default();

    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => {
            for sample in reader.samples::<f32>() {
                levels.add(f64::from(sample.map_err(|e| unreadable(path, e))?));
            }
        }
        (SampleFormat::Int, bits) if (1..=32).contains(&bits) => {
            let full_scale = (1i64 << (bits - 1)) as f64;
            for sample in reader.samples::<i32>() {
                levels.add(f64::from(sample.map_err(|e| unreadable(path, e))?) / full_scale);
            }
        }
        (SampleFormat::Int, bits) => {
            return Err(StudioError::RenderFailed {
                reason: format!("unsupported {}-bit integer WAV", bits),
                exit_code: None,
                stderr: String::new(),
            })
        }
    }

    let frames = levels.count / u64::from(spec.channels.max(1));

    Ok(AcousticFeatures {
        peak_dbfs: linear_to_db(levels.peak),
        rms_dbfs: linear_to_db(levels.rms()),
        clipped_ratio: levels.clipped_ratio(),
        duration_seconds: frames as f64 / spec.sample_rate as f64,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}
