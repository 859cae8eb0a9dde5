//! Shell command execution.
//!
//! Spawns the rendered command in the platform shell, captures output, and
//! enforces an optional caller-imposed deadline.

use std::io::Read;
use std::process::{Child, Command as ProcessCommand, Stdio};
use std::time::{Duration, Instant};

use crate::exec::error::FailureCause;
use crate::exec::outcome::CommandOutcome;

/// Poll interval while waiting on a child process with a deadline.
const WAIT_POLL: Duration = Duration::from_millis(20);

/// Execute a rendered shell command.
///
/// Streams are captured; the invoking environment is inherited. A nonzero
/// exit reports `FailureCause::Process` carrying the exit code and captured
/// output. With a timeout, the child is killed once the deadline elapses and
/// the call fails with `FailureCause::Timeout`.
pub fn execute(command: &str, timeout: Option<Duration>) -> Result<CommandOutcome, FailureCause> {
    let start = Instant::now();

    let (shell, shell_arg) = get_shell();

    let mut cmd = ProcessCommand::new(shell);
    cmd.arg(shell_arg);
    cmd.arg(command);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!(command, "spawning shell command");

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return Err(FailureCause::Process {
                code: None,
                stdout: String::new(),
                stderr: e.to_string(),
            })
        }
    };

    // Drain the pipes on threads so a chatty child cannot deadlock against
    // a full pipe buffer while we wait on it.
    let stdout_handle = drain(child.stdout.take());
    let stderr_handle = drain(child.stderr.take());

    let status = match wait_with_deadline(&mut child, timeout) {
        Ok(status) => status,
        Err(cause) => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(cause);
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    let duration_ms = start.elapsed().as_millis() as u64;
    let code = status.code().unwrap_or(-1);

    if status.success() {
        Ok(CommandOutcome { exit_code: code, stdout, stderr, duration_ms })
    } else {
        Err(FailureCause::Process { code: status.code(), stdout, stderr })
    }
}

/// Read a child stream to completion on a background thread.
fn drain<R: Read + Send + 'static>(stream: Option<R>) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).to_string()
    })
}

/// Wait for the child, polling against the deadline when one is set.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<std::process::ExitStatus, FailureCause> {
    let wait_failure = |e: std::io::Error| FailureCause::Process {
        code: None,
        stdout: String::new(),
        stderr: e.to_string(),
    };

    let Some(timeout) = timeout else {
        return child.wait().map_err(wait_failure);
    };

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    return Err(FailureCause::Timeout(timeout));
                }
                std::thread::sleep(WAIT_POLL);
            }
            Err(e) => return Err(wait_failure(e)),
        }
    }
}

/// Get the shell and argument for the current platform.
fn get_shell() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_captures_output() {
        let outcome = execute("echo hi", None).unwrap();
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.contains("hi"));
        assert!(outcome.stderr.is_empty());
    }

    #[test]
    fn test_execute_captures_stderr() {
        let outcome = execute("echo oops >&2", None).unwrap();
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stderr.contains("oops"));
    }

    #[test]
    fn test_nonzero_exit_is_failure() {
        let err = execute("echo partial && exit 3", None).unwrap_err();
        match err {
            FailureCause::Process { code, stdout, .. } => {
                assert_eq!(code, Some(3));
                assert!(stdout.contains("partial"));
            }
            other => panic!("expected process failure, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let err = execute("sleep 5", Some(Duration::from_millis(100))).unwrap_err();
        assert!(matches!(err, FailureCause::Timeout(_)));
        // The child was killed rather than awaited to completion.
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_timeout_not_triggered_for_fast_command() {
        let outcome = execute("echo quick", Some(Duration::from_secs(10))).unwrap();
        assert_eq!(outcome.exit_code, 0);
    }
}
