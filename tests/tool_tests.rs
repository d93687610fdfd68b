//! Tool Boundary Tests
//!
//! Drive a host the way an agent would: JSON calls in, JSON responses out.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

use tracksmith::{ProjectPhase, ToolHost, ToolResponse};

fn ok(host: &mut ToolHost, call: Value) -> Value {
    let response = host.dispatch_value(call.clone());
    assert!(response.ok, "{} failed: {:?}", call, response.error);
    response.result.unwrap()
}

fn err(host: &mut ToolHost, call: Value) -> ToolResponse {
    let response = host.dispatch_value(call.clone());
    assert!(!response.ok, "{} unexpectedly succeeded", call);
    response
}

// === Workflow Tests ===

#[test]
fn test_agent_builds_and_reloads_a_song() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("song.json");
    let mut host = ToolHost::default();

    ok(&mut host, json!({"tool": "create_project", "args": {"tempo": 90, "name": "Sketch"}}));
    let pad = ok(&mut host, json!({"tool": "add_track", "args": {"kind": "instrument", "name": "Pad"}}))["track_id"].clone();
    let bass = ok(&mut host, json!({"tool": "add_track", "args": {"kind": "instrument", "name": "Bass"}}))["track_id"].clone();
    let pattern = ok(
        &mut host,
        json!({"tool": "create_pattern", "args": {"track_id": pad, "start": 0, "length": 4}}),
    )["pattern_id"]
        .clone();

    let chord = ok(
        &mut host,
        json!({"tool": "add_chord", "args": {
            "pattern_id": pattern, "root": "C4", "chord_type": "major", "start": 0, "duration": 1
        }}),
    );
    assert_eq!(chord["pitches"], json!([60, 64, 67]));

    let added = ok(
        &mut host,
        json!({"tool": "add_notes", "args": {"pattern_id": pattern, "notes": [
            {"pitch": "G4", "start": 4, "duration": 2, "velocity": 80},
            {"pitch": 72, "start": 6, "length": 2}
        ]}}),
    );
    assert_eq!(added["added"], 2);

    ok(&mut host, json!({"tool": "remove_track", "args": {"track_id": bass}}));

    let described = ok(&mut host, json!({"tool": "describe_pattern", "args": {"pattern_id": pattern}}));
    assert_eq!(described["pattern"]["note_count"], 5);
    assert!(described["summary"]
        .as_str()
        .unwrap()
        .starts_with("Pattern 'Pattern 0' at bar 0"));

    let saved = ok(&mut host, json!({"tool": "save_project", "args": {"path": path}}));
    assert_eq!(saved["fingerprint"].as_str().unwrap().len(), 64);

    let mut fresh = ToolHost::default();
    let loaded = ok(&mut fresh, json!({"tool": "load_project", "args": {"path": path}}));
    assert_eq!(loaded["name"], "Sketch");
    assert_eq!(loaded["track_count"], 1);
    assert_eq!(loaded["note_count"], 5);
    assert_eq!(fresh.session().unwrap().phase(), ProjectPhase::Saved);

    // The removed track stays gone after reload.
    let stale = err(&mut fresh, json!({"tool": "set_track_volume", "args": {"track_id": bass, "volume": 50}}));
    assert_eq!(stale.error_kind(), Some("NotFound"));
}

#[test]
fn test_describe_project_reports_phase_and_changes() {
    let dir = TempDir::new().unwrap();
    let mut host = ToolHost::default();
    ok(&mut host, json!({"tool": "create_project", "args": {"tempo": 120, "time_signature": "3/4"}}));

    let before = ok(&mut host, json!({"tool": "describe_project"}));
    assert_eq!(before["phase"], "unsaved");
    assert_eq!(before["project"]["time_signature"], "3/4");

    ok(&mut host, json!({"tool": "save_project", "args": {"path": dir.path().join("a.json")}}));
    let after_save = ok(&mut host, json!({"tool": "describe_project", "args": {}}));
    assert_eq!(after_save["phase"], "saved");
    assert_eq!(after_save["unsaved_changes"], false);

    ok(&mut host, json!({"tool": "set_tempo", "args": {"bpm": 100}}));
    let edited = ok(&mut host, json!({"tool": "describe_project"}));
    assert_eq!(edited["unsaved_changes"], true);
    assert_eq!(edited["project"]["tempo"], 100.0);
}

#[test]
fn test_automation_through_tools() {
    let mut host = ToolHost::default();
    ok(&mut host, json!({"tool": "create_project", "args": {"tempo": 120}}));
    let track = ok(&mut host, json!({"tool": "add_track", "args": {"kind": "sample", "name": "Loop"}}))["track_id"].clone();
    let clip = ok(
        &mut host,
        json!({"tool": "add_automation_clip", "args": {"track_id": track, "target": "volume", "start": 0, "length": 2}}),
    )["clip_id"]
        .clone();

    let ramp = ok(
        &mut host,
        json!({"tool": "create_automation_ramp", "args": {"clip_id": clip, "start_value": 0, "end_value": 100}}),
    );
    assert_eq!(ramp["points"], json!([{"time": 0.0, "value": 0.0}, {"time": 8.0, "value": 100.0}]));

    let lfo = ok(
        &mut host,
        json!({"tool": "create_automation_lfo", "args": {"clip_id": clip, "min": 20, "max": 80, "cycles": 3}}),
    );
    assert_eq!(lfo["point_count"], 3 * 8 + 1);

    let out_of_range = err(
        &mut host,
        json!({"tool": "add_automation_point", "args": {"clip_id": clip, "time": 1, "value": 500}}),
    );
    assert_eq!(out_of_range.error_kind(), Some("InvalidParameter"));

    let cleared = ok(&mut host, json!({"tool": "clear_automation", "args": {"clip_id": clip}}));
    assert_eq!(cleared["removed"], 3 * 8 + 1);
}

// === Error Shape Tests ===

#[test]
fn test_errors_are_structured() {
    let mut host = ToolHost::default();

    let none_open = err(&mut host, json!({"tool": "add_track", "args": {"kind": "instrument", "name": "X"}}));
    assert_eq!(none_open.error_kind(), Some("NotFound"));

    ok(&mut host, json!({"tool": "create_project", "args": {"tempo": 120}}));

    let bad_kind = err(&mut host, json!({"tool": "add_track", "args": {"kind": "video", "name": "X"}}));
    assert_eq!(bad_kind.error_kind(), Some("InvalidParameter"));

    let missing_arg = err(&mut host, json!({"tool": "set_tempo", "args": {}}));
    assert_eq!(missing_arg.error_kind(), Some("InvalidParameter"));

    let bad_tempo = err(&mut host, json!({"tool": "set_tempo", "args": {"bpm": 0}}));
    let error = bad_tempo.error.unwrap();
    assert_eq!(error.code, "INVALID_PARAMETER");
    assert!(!error.retryable);

    let as_json = serde_json::to_value(err(&mut host, json!({"tool": "describe_track", "args": {"track_id": 42}}))).unwrap();
    assert_eq!(as_json["ok"], false);
    assert_eq!(as_json["error"]["kind"], "NotFound");
    assert!(as_json.get("result").is_none());
}

#[test]
fn test_render_without_renderer_is_retryable_failure() {
    let dir = TempDir::new().unwrap();
    let mut host = ToolHost::new(
        tracksmith::RenderConfig::default().with_renderer(dir.path().join("missing-renderer")),
    );
    ok(&mut host, json!({"tool": "create_project", "args": {"tempo": 120}}));

    let response = err(
        &mut host,
        json!({"tool": "render", "args": {"output": dir.path().join("out.wav")}}),
    );
    assert_eq!(response.error_kind(), Some("RenderFailed"));
    assert!(response.error.unwrap().retryable);
    assert_eq!(host.session().unwrap().phase(), ProjectPhase::Unsaved);
}
