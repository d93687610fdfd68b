//! Tool-call boundary
//!
//! A tool call is a JSON object `{"tool": "<name>", "args": {...}}`.
//! [`ToolHost`] owns the session, applies calls to it and always answers
//! with a [`ToolResponse`]: either `{"ok": true, "result": ...}` or
//! `{"ok": false, "error": {...}}`. Failures never escape as panics.

use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::RenderConfig;
use crate::describe::{describe_pattern, describe_project, describe_track};
use crate::engine::{NoteSpec, PitchSpec, Session};
use crate::error::{Result, StudioError};
use crate::model::{AutomationId, ControlPoint, PatternId, TimeSignature, TrackId};
use crate::render::{AudioFormat, RenderCoordinator};

fn one() -> u32 {
    1
}

fn one_f64() -> f64 {
    1.0
}

/// Every tool the host understands, with its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "args", rename_all = "snake_case")]
pub enum ToolCall {
    CreateProject {
        tempo: f64,
        #[serde(default)]
        time_signature: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    LoadProject {
        path: PathBuf,
    },
    SaveProject {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    RenameProject {
        name: String,
    },
    SetTempo {
        bpm: f64,
    },
    SetTimeSignature {
        time_signature: String,
    },
    AddTrack {
        kind: String,
        name: String,
    },
    RemoveTrack {
        track_id: TrackId,
    },
    RenameTrack {
        track_id: TrackId,
        name: String,
    },
    SetTrackVolume {
        track_id: TrackId,
        volume: f64,
    },
    SetTrackPan {
        track_id: TrackId,
        pan: f64,
    },
    SetTrackMute {
        track_id: TrackId,
        muted: bool,
    },
    SetTrackSolo {
        track_id: TrackId,
        solo: bool,
    },
    SetInstrument {
        track_id: TrackId,
        instrument: String,
    },
    CreatePattern {
        track_id: TrackId,
        start: f64,
        length: f64,
        #[serde(default)]
        name: Option<String>,
    },
    RemovePattern {
        pattern_id: PatternId,
    },
    AddNotes {
        pattern_id: PatternId,
        notes: Vec<NoteSpec>,
    },
    AddChord {
        pattern_id: PatternId,
        root: PitchSpec,
        chord_type: String,
        start: f64,
        #[serde(alias = "length")]
        duration: f64,
        #[serde(default)]
        velocity: Option<i64>,
    },
    AddScale {
        pattern_id: PatternId,
        root: PitchSpec,
        scale_type: String,
        start: f64,
        note_duration: f64,
        #[serde(default = "one")]
        octaves: u32,
        #[serde(default)]
        velocity: Option<i64>,
    },
    ClearPattern {
        pattern_id: PatternId,
    },
    RemoveNotes {
        pattern_id: PatternId,
        indices: Vec<usize>,
    },
    AddSampleClip {
        track_id: TrackId,
        sample_path: PathBuf,
        start: f64,
        length: f64,
    },
    AddAutomationClip {
        track_id: TrackId,
        target: String,
        start: f64,
        length: f64,
        #[serde(default)]
        progression: Option<String>,
    },
    RemoveAutomationClip {
        clip_id: AutomationId,
    },
    AddAutomationPoint {
        clip_id: AutomationId,
        time: f64,
        value: f64,
    },
    SetAutomationPoints {
        clip_id: AutomationId,
        points: Vec<ControlPoint>,
    },
    CreateAutomationRamp {
        clip_id: AutomationId,
        start_value: f64,
        end_value: f64,
        #[serde(default)]
        start_time: f64,
        #[serde(default)]
        end_time: Option<f64>,
    },
    CreateAutomationLfo {
        clip_id: AutomationId,
        min: f64,
        max: f64,
        #[serde(default = "one_f64")]
        cycles_per_bar: f64,
        #[serde(default)]
        cycles: Option<u32>,
    },
    ClearAutomation {
        clip_id: AutomationId,
    },
    DescribeProject {},
    DescribeTrack {
        track_id: TrackId,
    },
    DescribePattern {
        pattern_id: PatternId,
    },
    Render {
        output: PathBuf,
        #[serde(default)]
        format: Option<String>,
    },
}

impl ToolCall {
    /// Parse a call from JSON. A missing `args` object counts as empty.
    pub fn from_value(mut value: Value) -> Result<Self> {
        if let Some(obj) = value.as_object_mut() {
            obj.entry("args").or_insert_with(|| json!({}));
        }
        serde_json::from_value(value).map_err(|e| StudioError::invalid("call", e.to_string()))
    }

    /// The tool name as it appears on the wire.
    pub fn name(&self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.get("tool").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default()
    }
}

/// Error object returned to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: String,
    pub code: String,
    pub message: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl From<&StudioError> for ToolError {
    fn from(e: &StudioError) -> Self {
        let message = match e {
            StudioError::RenderFailed { stderr, .. } if !stderr.trim().is_empty() => {
                format!("{}\nstderr:\n{}", e, stderr.trim_end())
            }
            _ => e.to_string(),
        };
        ToolError {
            kind: e.kind().to_string(),
            code: e.error_code().to_string(),
            message,
            retryable: e.is_retryable(),
            suggestion: e.recovery_suggestion().map(str::to_string),
        }
    }
}

/// Answer to one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl ToolResponse {
    pub fn success(result: Value) -> Self {
        ToolResponse {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: &StudioError) -> Self {
        ToolResponse {
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Error kind, for failed responses.
    pub fn error_kind(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.kind.as_str())
    }
}

/// Owns one session and a renderer, and executes tool calls against them.
#[derive(Debug, Default)]
pub struct ToolHost {
    session: Option<Session>,
    coordinator: RenderCoordinator,
}

impl ToolHost {
    pub fn new(config: RenderConfig) -> Self {
        ToolHost {
            session: None,
            coordinator: RenderCoordinator::new(config),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Parse and run a raw JSON call.
    pub fn dispatch_value(&mut self, value: Value) -> ToolResponse {
        match ToolCall::from_value(value) {
            Ok(call) => self.dispatch(call),
            Err(e) => ToolResponse::failure(&e),
        }
    }

    pub fn dispatch(&mut self, call: ToolCall) -> ToolResponse {
        let name = call.name();
        match self.execute(call) {
            Ok(result) => {
                debug!("[TOOL] {} ok", name);
                ToolResponse::success(result)
            }
            Err(e) => {
                debug!("[TOOL] {} failed: {}", name, e);
                ToolResponse::failure(&e)
            }
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session
            .as_mut()
            .ok_or_else(|| StudioError::not_found("project", "none open in this session"))
    }

    fn execute(&mut self, call: ToolCall) -> Result<Value> {
        match call {
            ToolCall::CreateProject {
                tempo,
                time_signature,
                name,
            } => {
                let sig = match time_signature {
                    Some(text) => text.parse::<TimeSignature>()?,
                    None => TimeSignature::default(),
                };
                let mut session = Session::create(tempo, sig)?;
                if let Some(name) = name {
                    session.rename_project(&name)?;
                }
                let description = describe_project(session.project())?;
                self.session = Some(session);
                Ok(serde_json::to_value(description)?)
            }
            ToolCall::LoadProject { path } => {
                let session = Session::load(&path)?;
                let description = describe_project(session.project())?;
                self.session = Some(session);
                Ok(serde_json::to_value(description)?)
            }
            ToolCall::SaveProject { path } => {
                let session = self.session_mut()?;
                let saved = session.save(path.as_deref())?;
                Ok(json!({
                    "path": saved,
                    "fingerprint": crate::state::fingerprint(session.project())?,
                }))
            }
            ToolCall::RenameProject { name } => {
                self.session_mut()?.rename_project(&name)?;
                Ok(json!({ "name": name.trim() }))
            }
            ToolCall::SetTempo { bpm } => {
                self.session_mut()?.set_tempo(bpm)?;
                Ok(json!({ "tempo": bpm }))
            }
            ToolCall::SetTimeSignature { time_signature } => {
                let sig: TimeSignature = time_signature.parse()?;
                self.session_mut()?.set_time_signature(sig)?;
                Ok(json!({ "time_signature": sig.to_string() }))
            }
            ToolCall::AddTrack { kind, name } => {
                let kind = kind.parse()?;
                let id = self.session_mut()?.add_track(kind, &name)?;
                Ok(json!({ "track_id": id }))
            }
            ToolCall::RemoveTrack { track_id } => {
                let removed = self.session_mut()?.remove_track(track_id)?;
                Ok(json!({ "removed": track_id, "name": removed.name() }))
            }
            ToolCall::RenameTrack { track_id, name } => {
                self.session_mut()?.rename_track(track_id, &name)?;
                Ok(json!({ "track_id": track_id }))
            }
            ToolCall::SetTrackVolume { track_id, volume } => {
                self.session_mut()?.set_track_volume(track_id, volume)?;
                Ok(json!({ "track_id": track_id, "volume": volume }))
            }
            ToolCall::SetTrackPan { track_id, pan } => {
                self.session_mut()?.set_track_pan(track_id, pan)?;
                Ok(json!({ "track_id": track_id, "pan": pan }))
            }
            ToolCall::SetTrackMute { track_id, muted } => {
                self.session_mut()?.set_track_mute(track_id, muted)?;
                Ok(json!({ "track_id": track_id, "muted": muted }))
            }
            ToolCall::SetTrackSolo { track_id, solo } => {
                self.session_mut()?.set_track_solo(track_id, solo)?;
                Ok(json!({ "track_id": track_id, "solo": solo }))
            }
            ToolCall::SetInstrument {
                track_id,
                instrument,
            } => {
                self.session_mut()?.set_instrument(track_id, &instrument)?;
                Ok(json!({ "track_id": track_id }))
            }
            ToolCall::CreatePattern {
                track_id,
                start,
                length,
                name,
            } => {
                let session = self.session_mut()?;
                let id = match name {
                    Some(name) => session.create_named_pattern(track_id, &name, start, length)?,
                    None => session.create_pattern(track_id, start, length)?,
                };
                Ok(json!({ "pattern_id": id }))
            }
            ToolCall::RemovePattern { pattern_id } => {
                let removed = self.session_mut()?.remove_pattern(pattern_id)?;
                Ok(json!({ "removed": pattern_id, "note_count": removed.notes().len() }))
            }
            ToolCall::AddNotes { pattern_id, notes } => {
                let added = self.session_mut()?.add_notes(pattern_id, &notes)?;
                Ok(json!({ "pattern_id": pattern_id, "added": added }))
            }
            ToolCall::AddChord {
                pattern_id,
                root,
                chord_type,
                start,
                duration,
                velocity,
            } => {
                let pitches = self.session_mut()?.add_chord_with_velocity(
                    pattern_id,
                    root,
                    &chord_type,
                    start,
                    duration,
                    velocity,
                )?;
                Ok(json!({ "pattern_id": pattern_id, "pitches": pitches }))
            }
            ToolCall::AddScale {
                pattern_id,
                root,
                scale_type,
                start,
                note_duration,
                octaves,
                velocity,
            } => {
                let pitches = self.session_mut()?.add_scale(
                    pattern_id,
                    root,
                    &scale_type,
                    start,
                    note_duration,
                    octaves,
                    velocity,
                )?;
                Ok(json!({ "pattern_id": pattern_id, "pitches": pitches }))
            }
            ToolCall::ClearPattern { pattern_id } => {
                let removed = self.session_mut()?.clear_pattern(pattern_id)?;
                Ok(json!({ "pattern_id": pattern_id, "removed": removed }))
            }
            ToolCall::RemoveNotes {
                pattern_id,
                indices,
            } => {
                let removed = self.session_mut()?.remove_notes(pattern_id, &indices)?;
                Ok(json!({ "pattern_id": pattern_id, "removed": removed }))
            }
            ToolCall::AddSampleClip {
                track_id,
                sample_path,
                start,
                length,
            } => {
                let id = self
                    .session_mut()?
                    .add_sample_clip(track_id, &sample_path, start, length)?;
                Ok(json!({ "clip_id": id }))
            }
            ToolCall::AddAutomationClip {
                track_id,
                target,
                start,
                length,
                progression,
            } => {
                let target = target.parse()?;
                let progression = match progression {
                    Some(text) => text.parse()?,
                    None => Default::default(),
                };
                let id = self
                    .session_mut()?
                    .add_automation_clip(track_id, target, start, length, progression)?;
                Ok(json!({ "clip_id": id }))
            }
            ToolCall::RemoveAutomationClip { clip_id } => {
                self.session_mut()?.remove_automation_clip(clip_id)?;
                Ok(json!({ "removed": clip_id }))
            }
            ToolCall::AddAutomationPoint {
                clip_id,
                time,
                value,
            } => {
                let session = self.session_mut()?;
                session.add_automation_point(clip_id, time, value)?;
                let count = session.project().automation(clip_id)?.points().len();
                Ok(json!({ "clip_id": clip_id, "point_count": count }))
            }
            ToolCall::SetAutomationPoints { clip_id, points } => {
                let count = self.session_mut()?.set_automation_points(clip_id, &points)?;
                Ok(json!({ "clip_id": clip_id, "point_count": count }))
            }
            ToolCall::CreateAutomationRamp {
                clip_id,
                start_value,
                end_value,
                start_time,
                end_time,
            } => {
                let session = self.session_mut()?;
                session.create_automation_ramp(clip_id, start_value, end_value, start_time, end_time)?;
                let points = session.project().automation(clip_id)?.points().to_vec();
                Ok(json!({ "clip_id": clip_id, "points": points }))
            }
            ToolCall::CreateAutomationLfo {
                clip_id,
                min,
                max,
                cycles_per_bar,
                cycles,
            } => {
                let count = self
                    .session_mut()?
                    .create_automation_lfo(clip_id, min, max, cycles_per_bar, cycles)?;
                Ok(json!({ "clip_id": clip_id, "point_count": count }))
            }
            ToolCall::ClearAutomation { clip_id } => {
                let removed = self.session_mut()?.clear_automation(clip_id)?;
                Ok(json!({ "clip_id": clip_id, "removed": removed }))
            }
            ToolCall::DescribeProject {} => {
                let session = self.session_mut()?;
                let description = describe_project(session.project())?;
                Ok(json!({
                    "phase": session.phase(),
                    "unsaved_changes": session.has_unsaved_changes(),
                    "summary": description.to_string(),
                    "project": description,
                }))
            }
            ToolCall::DescribeTrack { track_id } => {
                let description = describe_track(self.session_mut()?.project(), track_id)?;
                Ok(json!({ "summary": description.to_string(), "track": description }))
            }
            ToolCall::DescribePattern { pattern_id } => {
                let description = describe_pattern(self.session_mut()?.project(), pattern_id)?;
                Ok(json!({ "summary": description.to_string(), "pattern": description }))
            }
            ToolCall::Render { output, format } => {
                let format = format.map(|f| f.parse::<AudioFormat>()).transpose()?;
                let coordinator = &self.coordinator;
                let session = self
                    .session
                    .as_mut()
                    .ok_or_else(|| StudioError::not_found("project", "none open in this session"))?;
                let outcome = session.render(coordinator, &output, format)?;
                Ok(serde_json::to_value(outcome)?)
            }
        }
    }
}
