//! Render configuration.
//!
//! Read from the environment with defaults, the same way the renderer
//! binary and its limits are usually supplied to a tool server.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

use crate::render::AudioFormat;

pub const ENV_RENDERER: &str = "TRACKSMITH_RENDERER";
pub const ENV_TIMEOUT_MS: &str = "TRACKSMITH_RENDER_TIMEOUT_MS";
pub const ENV_SAMPLE_RATE: &str = "TRACKSMITH_SAMPLE_RATE";
pub const ENV_BIT_DEPTH: &str = "TRACKSMITH_BIT_DEPTH";
pub const ENV_FORMAT: &str = "TRACKSMITH_RENDER_FORMAT";

const DEFAULT_RENDERER: &str = "lmms";
const DEFAULT_TIMEOUT_MS: u64 = 300_000; // 5 minutes
const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_BIT_DEPTH: u16 = 16;

/// How to invoke the external renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Renderer executable (looked up on PATH if relative).
    pub renderer: PathBuf,
    /// Hard limit on one render.
    pub timeout: Duration,
    pub sample_rate: u32,
    pub bit_depth: u16,
    /// Format used when the caller does not name one.
    pub default_format: AudioFormat,
    /// Extra arguments appended after the standard ones.
    pub extra_args: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            renderer: PathBuf::from(DEFAULT_RENDERER),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: DEFAULT_BIT_DEPTH,
            default_format: AudioFormat::Flac,
            extra_args: Vec::new(),
        }
    }
}

impl RenderConfig {
    /// Build a config from `TRACKSMITH_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = RenderConfig::default();
        RenderConfig {
            renderer: env::var(ENV_RENDERER)
                .map(PathBuf::from)
                .unwrap_or(defaults.renderer),
            timeout: env_parse(ENV_TIMEOUT_MS)
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            sample_rate: env_parse(ENV_SAMPLE_RATE).unwrap_or(defaults.sample_rate),
            bit_depth: env_parse(ENV_BIT_DEPTH).unwrap_or(defaults.bit_depth),
            default_format: env_parse(ENV_FORMAT).unwrap_or(defaults.default_format),
            extra_args: defaults.extra_args,
        }
    }

    pub fn with_renderer(mut self, renderer: impl Into<PathBuf>) -> Self {
        self.renderer = renderer.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_bit_depth(mut self, bit_depth: u16) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

/// Parse an env var, warning (not failing) on garbage.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value, using default", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.renderer, PathBuf::from("lmms"));
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.bit_depth, 16);
        assert_eq!(config.default_format, AudioFormat::Flac);
    }

    #[test]
    fn test_builders() {
        let config = RenderConfig::default()
            .with_renderer("/opt/render")
            .with_timeout(Duration::from_millis(250))
            .with_sample_rate(48000);
        assert_eq!(config.renderer, PathBuf::from("/opt/render"));
        assert_eq!(config.timeout.as_millis(), 250);
        assert_eq!(config.sample_rate, 48000);
    }
}
