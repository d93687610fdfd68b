//! One render: snapshot, invoke, verify, describe.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use super::analysis::{analyze_wav, AcousticFeatures};
use super::process::run_with_timeout;
use super::AudioFormat;
use crate::config::RenderConfig;
use crate::describe::{describe_project, ProjectDescription};
use crate::error::{Result, StudioError};
use crate::model::Project;
use crate::state;

/// Keep at most this much of the renderer's stderr in errors.
const MAX_STDERR_BYTES: usize = 8 * 1024;

/// Everything the agent gets back from a successful render.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutcome {
    pub render_id: Uuid,
    pub rendered_at: DateTime<Utc>,
    pub output_path: PathBuf,
    pub format: AudioFormat,
    pub elapsed_ms: u64,
    pub file_size: u64,
    pub description: ProjectDescription,
    /// Present when the output could be measured (WAV only).
    pub acoustics: Option<AcousticFeatures>,
    /// Why `acoustics` is missing, if it is.
    pub analysis_note: Option<String>,
}

/// Runs the external renderer on project snapshots.
#[derive(Debug, Clone, Default)]
pub struct RenderCoordinator {
    config: RenderConfig,
}

fn tail(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

impl RenderCoordinator {
    pub fn new(config: RenderConfig) -> Self {
        RenderCoordinator { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Format for a render: explicit choice, then output extension, then
    /// the configured default.
    pub fn resolve_format(&self, output: &Path, format: Option<AudioFormat>) -> AudioFormat {
        format
            .or_else(|| AudioFormat::from_path(output))
            .unwrap_or(self.config.default_format)
    }

    fn arguments(&self, input: &Path, output: &Path, format: AudioFormat) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-r".into(),
            input.into(),
            "-o".into(),
            output.into(),
            "-f".into(),
            format.extension().into(),
            "-s".into(),
            self.config.sample_rate.to_string().into(),
            "-b".into(),
            self.config.bit_depth.to_string().into(),
        ];
        args.extend(self.config.extra_args.iter().map(OsString::from));
        args
    }

    /// Render the in-memory project to `output`.
    ///
    /// The project is written to a scratch file that is removed whatever
    /// happens. The project itself is not modified.
    pub fn render(
        &self,
        project: &Project,
        output: &Path,
        format: Option<AudioFormat>,
    ) -> Result<RenderOutcome> {
        let format = self.resolve_format(output, format);
        let description = describe_project(project)?;

        let mut snapshot = tempfile::Builder::new()
            .prefix("tracksmith-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| StudioError::io(std::env::temp_dir(), e))?;
        let json = state::to_json(project)?;
        let written = snapshot.write_all(json.as_bytes());
        if let Err(e) = written.and_then(|_| snapshot.flush()) {
            return Err(StudioError::io(snapshot.path(), e));
        }

        // A leftover file from an earlier render must not pass as output.
        if output.exists() {
            fs::remove_file(output).map_err(|e| StudioError::io(output, e))?;
        }

        info!(
            "Rendering '{}' to {} ({})",
            project.name(),
            output.display(),
            format
        );
        let args = self.arguments(snapshot.path(), output, format);
        debug!("[RENDER] {} {:?}", self.config.renderer.display(), args);
        let result = run_with_timeout(self.config.renderer.as_os_str(), &args, self.config.timeout)?;

        if !result.status.success() {
            return Err(StudioError::RenderFailed {
                reason: format!("renderer exited with {}", result.status),
                exit_code: result.status.code(),
                stderr: tail(&result.stderr, MAX_STDERR_BYTES),
            });
        }

        let file_size = fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if file_size == 0 {
            return Err(StudioError::RenderFailed {
                reason: format!("renderer succeeded but {} is missing or empty", output.display()),
                exit_code: result.status.code(),
                stderr: tail(&result.stderr, MAX_STDERR_BYTES),
            });
        }

        let (acoustics, analysis_note) = match format {
            AudioFormat::Wav => match analyze_wav(output) {
                Ok(features) => (Some(features), None),
                Err(e) => {
                    warn!("Acoustic analysis of {} failed: {}", output.display(), e);
                    (None, Some(format!("acoustic analysis failed: {}", e)))
                }
            },
            other => (
                None,
                Some(format!("acoustic analysis is only available for wav, not {}", other)),
            ),
        };

        let outcome = RenderOutcome {
            render_id: Uuid::new_v4(),
            rendered_at: Utc::now(),
            output_path: output.to_path_buf(),
            format,
            elapsed_ms: result.elapsed.as_millis() as u64,
            file_size,
            description,
            acoustics,
            analysis_note,
        };
        info!(
            "Rendered {} in {} ms ({} bytes)",
            output.display(),
            outcome.elapsed_ms,
            outcome.file_size
        );
        Ok(outcome)
    }
}
