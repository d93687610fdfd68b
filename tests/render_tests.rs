//! Render Pipeline Tests
//!
//! Drive the coordinator with small shell scripts standing in for the real
//! renderer, so exit codes, timeouts and output files are under test control.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use tracksmith::model::{TimeSignature, TrackKind};
use tracksmith::{AudioFormat, ProjectPhase, RenderConfig, RenderCoordinator, Session, StudioError};

/// Parses `-r`/`-o`, records what it saw and copies a fixture to the output.
const COPYING_RENDERER: &str = r#"#!/bin/sh
echo "$@" > "@ARGS@"
while [ $# -gt 0 ]; do
  case "$1" in
    -r) input="$2"; shift 2 ;;
    -o) output="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "$input" > "@INPUT@"
cp "@FIXTURE@" "$output"
"#;

/// Install a renderer script.
///
/// The executable is written by a child `cp`, so no thread of this test
/// binary ever holds it open for writing when another test spawns it.
fn install_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let source = dir.join(format!("{}.txt", name));
    let script = dir.join(name);
    fs::write(&source, body).unwrap();
    let status = Command::new("cp").arg(&source).arg(&script).status().unwrap();
    assert!(status.success());
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn coordinator(renderer: &Path, timeout: Duration) -> RenderCoordinator {
    RenderCoordinator::new(
        RenderConfig::default()
            .with_renderer(renderer)
            .with_timeout(timeout),
    )
}

fn write_half_scale_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..44100 {
        let sample: i16 = if i % 2 == 0 { 16384 } else { -16384 };
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

fn session_with_chord() -> Session {
    let mut s = Session::create(120.0, TimeSignature::default()).unwrap();
    let pad = s.add_track(TrackKind::Instrument, "Pad").unwrap();
    let p = s.create_pattern(pad, 0.0, 4.0).unwrap();
    s.add_chord(p, 60, "major", 0.0, 1.0).unwrap();
    s
}

// === Success Tests ===

#[test]
fn test_wav_render_is_measured() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("fixture.wav");
    write_half_scale_wav(&fixture);
    let args_file = dir.path().join("args.txt");
    let input_file = dir.path().join("input.txt");
    let body = COPYING_RENDERER
        .replace("@ARGS@", &args_file.to_string_lossy())
        .replace("@INPUT@", &input_file.to_string_lossy())
        .replace("@FIXTURE@", &fixture.to_string_lossy());
    let renderer = install_script(dir.path(), "render.sh", &body);

    let mut s = session_with_chord();
    let output = dir.path().join("mix.wav");
    let outcome = s
        .render(&coordinator(&renderer, Duration::from_secs(10)), &output, None)
        .unwrap();

    assert_eq!(s.phase(), ProjectPhase::Rendered);
    assert_eq!(outcome.format, AudioFormat::Wav);
    assert_eq!(outcome.output_path, output);
    assert!(outcome.file_size > 0);
    assert_eq!(outcome.description.tracks.len(), 1);

    let acoustics = outcome.acoustics.expect("wav output is analysed");
    assert_abs_diff_eq!(acoustics.peak_dbfs, -6.0206, epsilon = 1e-3);
    assert_abs_diff_eq!(acoustics.rms_dbfs, -6.0206, epsilon = 1e-3);
    assert_abs_diff_eq!(acoustics.duration_seconds, 1.0, epsilon = 1e-9);
    assert!(!acoustics.is_clipping());
    assert!(outcome.analysis_note.is_none());

    let args = fs::read_to_string(&args_file).unwrap();
    assert!(args.contains("-f wav -s 44100 -b 16"), "args: {}", args);

    // The project snapshot handed to the renderer is cleaned up.
    let input = fs::read_to_string(&input_file).unwrap();
    let input = input.trim();
    assert!(input.ends_with(".json"));
    assert!(!Path::new(input).exists());
}

#[test]
fn test_non_wav_render_has_note_instead_of_acoustics() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("fixture.flac");
    fs::write(&fixture, b"fLaC not really").unwrap();
    let body = COPYING_RENDERER
        .replace("@ARGS@", &dir.path().join("args.txt").to_string_lossy())
        .replace("@INPUT@", &dir.path().join("input.txt").to_string_lossy())
        .replace("@FIXTURE@", &fixture.to_string_lossy());
    let renderer = install_script(dir.path(), "render.sh", &body);

    let output = dir.path().join("mix.flac");
    let outcome = coordinator(&renderer, Duration::from_secs(10))
        .render(session_with_chord().project(), &output, None)
        .unwrap();

    assert_eq!(outcome.format, AudioFormat::Flac);
    assert!(outcome.acoustics.is_none());
    assert!(outcome.analysis_note.unwrap().contains("flac"));
}

#[test]
fn test_unreadable_wav_degrades_to_note() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("broken.wav");
    fs::write(&fixture, b"RIFF????WAVEjunk").unwrap();
    let body = COPYING_RENDERER
        .replace("@ARGS@", &dir.path().join("args.txt").to_string_lossy())
        .replace("@INPUT@", &dir.path().join("input.txt").to_string_lossy())
        .replace("@FIXTURE@", &fixture.to_string_lossy());
    let renderer = install_script(dir.path(), "render.sh", &body);

    let output = dir.path().join("mix.wav");
    let outcome = coordinator(&renderer, Duration::from_secs(10))
        .render(session_with_chord().project(), &output, None)
        .unwrap();
    assert!(outcome.acoustics.is_none());
    assert!(outcome.analysis_note.is_some());
}

// === Failure Tests ===

#[test]
fn test_non_zero_exit_reports_code_and_stderr() {
    let dir = TempDir::new().unwrap();
    let renderer = install_script(
        dir.path(),
        "fail.sh",
        "#!/bin/sh\necho 'plugin zynaddsubfx not found' >&2\nexit 3\n",
    );

    let mut s = session_with_chord();
    let err = s
        .render(
            &coordinator(&renderer, Duration::from_secs(10)),
            &dir.path().join("mix.wav"),
            None,
        )
        .unwrap_err();

    match err {
        StudioError::RenderFailed {
            exit_code, stderr, ..
        } => {
            assert_eq!(exit_code, Some(3));
            assert!(stderr.contains("zynaddsubfx"));
        }
        other => panic!("expected RenderFailed, got {:?}", other),
    }
    assert_eq!(s.phase(), ProjectPhase::Unsaved);
}

#[test]
fn test_success_without_output_is_failure() {
    let dir = TempDir::new().unwrap();
    let renderer = install_script(dir.path(), "noop.sh", "#!/bin/sh\nexit 0\n");

    let output = dir.path().join("mix.wav");
    let err = coordinator(&renderer, Duration::from_secs(10))
        .render(session_with_chord().project(), &output, None)
        .unwrap_err();
    assert!(matches!(
        err,
        StudioError::RenderFailed {
            exit_code: Some(0),
            ..
        }
    ));
}

#[test]
fn test_stale_output_is_not_mistaken_for_a_render() {
    let dir = TempDir::new().unwrap();
    let renderer = install_script(dir.path(), "noop.sh", "#!/bin/sh\nexit 0\n");

    let output = dir.path().join("mix.wav");
    write_half_scale_wav(&output);
    let result = coordinator(&renderer, Duration::from_secs(10)).render(
        session_with_chord().project(),
        &output,
        None,
    );
    assert!(matches!(result, Err(StudioError::RenderFailed { .. })));
    assert!(!output.exists());
}

#[test]
fn test_missing_renderer() {
    let dir = TempDir::new().unwrap();
    let err = coordinator(&dir.path().join("no-such-renderer"), Duration::from_secs(10))
        .render(
            session_with_chord().project(),
            &dir.path().join("mix.wav"),
            None,
        )
        .unwrap_err();
    assert_eq!(err.kind(), "RenderFailed");
}

// === Timeout Tests ===

#[cfg(target_os = "linux")]
fn is_running(pid: u32) -> bool {
    match fs::read_to_string(format!("/proc/{}/stat", pid)) {
        // State follows the parenthesised command name; zombies count as gone.
        Ok(stat) => stat
            .rsplit_once(") ")
            .map_or(false, |(_, rest)| !rest.starts_with('Z') && !rest.starts_with('X')),
        Err(_) => false,
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_hung_renderer_is_killed_with_its_children() {
    let dir = TempDir::new().unwrap();
    let pids = dir.path().join("pids.txt");
    let body = format!(
        "#!/bin/sh\necho $$ > \"{pids}\"\nsleep 30 &\necho $! >> \"{pids}\"\nwait\n",
        pids = pids.display()
    );
    let renderer = install_script(dir.path(), "hang.sh", &body);

    let mut s = session_with_chord();
    let started = Instant::now();
    let err = s
        .render(
            &coordinator(&renderer, Duration::from_millis(1000)),
            &dir.path().join("mix.wav"),
            None,
        )
        .unwrap_err();

    assert!(matches!(err, StudioError::RenderTimeout { timeout_ms: 1000 }));
    assert!(err.is_retryable());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(s.phase(), ProjectPhase::Unsaved);

    let recorded: Vec<u32> = fs::read_to_string(&pids)
        .unwrap()
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect();
    assert!(!recorded.is_empty());

    let deadline = Instant::now() + Duration::from_secs(5);
    while recorded.iter().any(|pid| is_running(*pid)) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    for pid in recorded {
        assert!(!is_running(pid), "process {} outlived the render", pid);
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_background_child_is_reaped_after_success() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("fixture.wav");
    write_half_scale_wav(&fixture);
    let pids = dir.path().join("pids.txt");
    let body = COPYING_RENDERER
        .replace("@ARGS@", &dir.path().join("args.txt").to_string_lossy())
        .replace("@INPUT@", &dir.path().join("input.txt").to_string_lossy())
        .replace("@FIXTURE@", &fixture.to_string_lossy())
        + &format!("sleep 30 &\necho $! > \"{}\"\nexit 0\n", pids.display());
    let renderer = install_script(dir.path(), "render.sh", &body);

    let started = Instant::now();
    let outcome = coordinator(&renderer, Duration::from_secs(5))
        .render(session_with_chord().project(), &dir.path().join("mix.wav"), None)
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(outcome.acoustics.is_some());

    let sleeper: u32 = fs::read_to_string(&pids).unwrap().trim().parse().unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while is_running(sleeper) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(!is_running(sleeper), "process {} outlived the render", sleeper);
}
