//! Running the external renderer with a time limit.
//!
//! stdout and stderr are drained on helper threads so a chatty renderer can
//! never block on a full pipe. On Unix the child is started in its own
//! process group, so a timeout kills everything it spawned.

use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{Result, StudioError};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Minimum wait for captured output once the renderer has exited.
const PIPE_GRACE: Duration = Duration::from_millis(100);

/// Captured result of a finished process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

fn drain<R: Read + Send + 'static>(source: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut source) = source {
            let _ = source.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Take a drained stream, waiting no later than `deadline` (plus a short
/// grace) for its writers to close it.
fn collect(output: &Receiver<String>, deadline: Instant, stream: &str) -> String {
    let wait = deadline.saturating_duration_since(Instant::now()).max(PIPE_GRACE);
    output.recv_timeout(wait).unwrap_or_else(|_| {
        warn!("[RENDER] {} still open after the renderer exited; dropped", stream);
        String::new()
    })
}

/// Spawn `program args...` and wait at most `timeout` for it.
///
/// Fails with `RenderTimeout` after killing and reaping the process, or with
/// `RenderFailed` if it cannot be started. A non-zero exit is not an error
/// here; the caller inspects `status`.
pub fn run_with_timeout<I, S>(program: &OsStr, args: I, timeout: Duration) -> Result<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let started = Instant::now();
    let mut child = command.spawn().map_err(|e| StudioError::RenderFailed {
        reason: format!("could not start {}: {}", program.to_string_lossy(), e),
        exit_code: None,
        stderr: String::new(),
    })?;
    debug!("[RENDER] Started pid {} ({})", child.id(), program.to_string_lossy());

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let elapsed = started.elapsed();
                // Whatever the renderer left behind in its group goes too.
                if kill_group(&child) {
                    debug!("[RENDER] Killed leftover processes of pid {}", child.id());
                }
                let deadline = started + timeout;
                return Ok(ProcessOutput {
                    status,
                    stdout: collect(&stdout, deadline, "stdout"),
                    stderr: collect(&stderr, deadline, "stderr"),
                    elapsed,
                });
            }
            Ok(None) if started.elapsed() >= timeout => {
                warn!(
                    "[RENDER] pid {} exceeded {} ms, killing",
                    child.id(),
                    timeout.as_millis()
                );
                kill_process_tree(&mut child);
                let _ = child.wait();
                // Reader threads finish once the pipes close; not joined so a
                // stray holder of the pipe cannot stall us.
                return Err(StudioError::RenderTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                kill_process_tree(&mut child);
                let _ = child.wait();
                return Err(StudioError::RenderFailed {
                    reason: format!("lost track of renderer process: {}", e),
                    exit_code: None,
                    stderr: String::new(),
                });
            }
        }
    }
}

/// SIGKILL the child's process group. False if nothing was signalled,
/// including when the group is already empty.
#[cfg(unix)]
fn kill_group(child: &Child) -> bool {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: kill(2) only sends a signal. The group was created for this
    // child by `process_group(0)`, and its id stays reserved while any
    // member is alive.
    unsafe { libc::kill(-pgid, libc::SIGKILL) == 0 }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) -> bool {
    false
}

fn kill_process_tree(child: &mut Child) {
    if !kill_group(child) {
        let _ = child.kill();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_output_and_status() {
        let out = run_with_timeout(
            OsStr::new("sh"),
            ["-c", "echo hello; echo oops >&2; exit 3"],
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn test_timeout_kills() {
        let started = Instant::now();
        let result = run_with_timeout(
            OsStr::new("sh"),
            ["-c", "sleep 30"],
            Duration::from_millis(200),
        );
        assert!(matches!(result, Err(StudioError::RenderTimeout { timeout_ms: 200 })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_background_child_does_not_hold_the_result() {
        // The sleeper inherits stdout; returning must not wait for it.
        let started = Instant::now();
        let out = run_with_timeout(
            OsStr::new("sh"),
            ["-c", "echo done; sleep 30 & exit 0"],
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(out.status.success());
        assert_eq!(out.stdout.trim(), "done");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_missing_program() {
        let result = run_with_timeout(
            OsStr::new("/nonexistent/renderer"),
            Vec::<&str>::new(),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(StudioError::RenderFailed { exit_code: None, .. })));
    }

    #[test]
    fn test_large_output_does_not_block() {
        // 1 MiB on stdout would fill a pipe if nobody drained it.
        let out = run_with_timeout(
            OsStr::new("sh"),
            ["-c", "head -c 1048576 /dev/zero"],
            Duration::from_secs(20),
        )
        .unwrap();
        assert!(out.status.success());
        assert_eq!(out.stdout.len(), 1_048_576);
    }
}
