use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("executable not found or failed to start: {0}")]
    Spawn(std::io::Error),

    #[error("process exceeded the {0:?} time limit")]
    Timeout(Duration),

    #[error("I/O error while running process: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured result of a bounded external-process invocation.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status_success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// stdout and stderr concatenated; the Vina family splits its report
    /// between the two streams depending on version.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }
}

/// Runs a command to completion with a wall-clock bound.
///
/// Output pipes are drained on dedicated threads so a chatty child can never
/// deadlock against a full pipe buffer. On timeout the child is killed and
/// reaped before returning, so no zombie or open handle survives any exit path.
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<ProcessOutput, ProcessError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(ProcessError::Spawn)?;

    let stdout_handle = drain_pipe(child.stdout.take());
    let stderr_handle = drain_pipe(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                kill_and_reap(&mut child);
                join_pipe(stdout_handle);
                join_pipe(stderr_handle);
                return Err(ProcessError::Timeout(timeout));
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    Ok(ProcessOutput {
        status_success: status.success(),
        stdout: join_pipe(stdout_handle),
        stderr: join_pipe(stderr_handle),
    })
}

fn drain_pipe<R: Read + Send + 'static>(pipe: Option<R>) -> Option<thread::JoinHandle<String>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = String::new();
            let _ = reader.read_to_string(&mut buffer);
            buffer
        })
    })
}

fn join_pipe(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_status() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo hello; echo oops >&2"]);
        let output = run_with_timeout(&mut command, Duration::from_secs(5)).unwrap();
        assert!(output.status_success);
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
        assert!(output.combined().contains("hello"));
        assert!(output.combined().contains("oops"));
    }

    #[test]
    fn nonzero_exit_is_reported_not_an_error() {
        let mut command = Command::new("sh");
        command.args(["-c", "exit 3"]);
        let output = run_with_timeout(&mut command, Duration::from_secs(5)).unwrap();
        assert!(!output.status_success);
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let mut command = Command::new("definitely-not-a-real-binary-mutadock");
        let result = run_with_timeout(&mut command, Duration::from_secs(1));
        assert!(matches!(result, Err(ProcessError::Spawn(_))));
    }

    #[test]
    fn slow_process_is_killed_at_the_deadline() {
        let mut command = Command::new("sleep");
        command.arg("30");
        let start = Instant::now();
        let result = run_with_timeout(&mut command, Duration::from_millis(200));
        assert!(matches!(result, Err(ProcessError::Timeout(_))));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
