//! Child-process execution with a wall-clock timeout and bounded capture.

use std::io::{ErrorKind, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Bounded stream capture: kept bytes plus the count that was discarded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Captured {
    pub bytes: Vec<u8>,
    pub dropped: usize,
}

impl Captured {
    pub fn lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Result of a finished (or killed) child process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Captured,
    pub stderr: Captured,
    pub timed_out: bool,
}

impl ProcessOutput {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.status.success()
    }

    /// Human-readable transcript of both streams for call logs.
    pub fn transcript(&self) -> String {
        let mut buf = String::from("=== stdout ===\n");
        buf.push_str(&self.stdout.lossy());
        if self.stdout.dropped > 0 {
            buf.push_str(&format!("\n[stdout truncated {} bytes]\n", self.stdout.dropped));
        }
        buf.push_str("\n=== stderr ===\n");
        buf.push_str(&self.stderr.lossy());
        if self.stderr.dropped > 0 {
            buf.push_str(&format!("\n[stderr truncated {} bytes]\n", self.stderr.dropped));
        }
        if self.timed_out {
            buf.push_str("\n[process timed out]\n");
        }
        buf
    }
}

/// Run `cmd`, feeding `stdin` if given, and kill it once `timeout` elapses.
///
/// Both pipes are drained on reader threads while the child runs so a chatty
/// child cannot deadlock on a full pipe. At most `output_limit_bytes` per
/// stream are kept in memory.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<ProcessOutput> {
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = cmd
        .spawn()
        .inspect_err(|err| error!(err = %err, "failed to spawn command"))
        .context("spawn command")?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;
    let stdout_reader = thread::spawn(move || capture(stdout, output_limit_bytes));
    let stderr_reader = thread::spawn(move || capture(stderr, output_limit_bytes));

    if let Some(input) = stdin {
        let mut pipe = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("stdin was not piped"))?;
        match pipe.write_all(input) {
            // The child exited without reading; its status reports the failure.
            Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                debug!("child closed stdin early");
            }
            result => result.context("write stdin")?,
        }
        // Dropping the handle closes stdin so the child sees EOF.
    }

    let (status, timed_out) = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => (status, false),
        None => {
            warn!(timeout_secs = timeout.as_secs(), "command timed out, killing");
            child.kill().context("kill command")?;
            (child.wait().context("wait command after kill")?, true)
        }
    };

    let stdout = join(stdout_reader).context("join stdout")?;
    let stderr = join(stderr_reader).context("join stderr")?;
    if stdout.dropped > 0 || stderr.dropped > 0 {
        warn!(
            stdout_dropped = stdout.dropped,
            stderr_dropped = stderr.dropped,
            "output truncated"
        );
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
        timed_out,
    })
}

fn join(handle: JoinHandle<Result<Captured>>) -> Result<Captured> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))?
}

fn capture<R: Read>(mut reader: R, limit: usize) -> Result<Captured> {
    let mut captured = Captured::default();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            return Ok(captured);
        }
        let keep = n.min(limit.saturating_sub(captured.bytes.len()));
        captured.bytes.extend_from_slice(&chunk[..keep]);
        captured.dropped += n - keep;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_stdin_echo() {
        let output = run_with_timeout(sh("cat"), Some(b"hello"), Duration::from_secs(10), 1024)
            .expect("run");
        assert!(output.succeeded());
        assert_eq!(output.stdout.lossy(), "hello");
    }

    #[test]
    fn truncates_beyond_limit() {
        let output = run_with_timeout(sh("printf 0123456789"), None, Duration::from_secs(10), 4)
            .expect("run");
        assert_eq!(output.stdout.lossy(), "0123");
        assert_eq!(output.stdout.dropped, 6);
        assert!(output.transcript().contains("[stdout truncated 6 bytes]"));
    }

    #[test]
    fn kills_on_timeout() {
        let output = run_with_timeout(sh("sleep 5"), None, Duration::from_millis(100), 1024)
            .expect("run");
        assert!(output.timed_out);
        assert!(!output.succeeded());
    }

    #[test]
    fn large_output_before_reading_stdin_does_not_block() {
        let input = vec![b'x'; 256 * 1024];
        let output = run_with_timeout(
            sh("head -c 262144 /dev/zero; cat > /dev/null"),
            Some(&input),
            Duration::from_secs(10),
            1024,
        )
        .expect("run");
        assert!(!output.timed_out);
        assert!(output.succeeded());
        assert_eq!(output.stdout.bytes.len(), 1024);
        assert_eq!(output.stdout.dropped, 262144 - 1024);
    }

    #[test]
    fn nonzero_exit_is_not_success() {
        let output = run_with_timeout(
            sh("echo oops >&2; exit 3"),
            None,
            Duration::from_secs(10),
            1024,
        )
        .expect("run");
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stderr.lossy(), "oops\n");
    }
}
