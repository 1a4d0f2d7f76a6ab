use log::{debug, warn};
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::utils::error::{AppError, AppResult};

/// Fields requested per packet, in output column order
pub const FIELDS: [&str; 6] = [
    "_ws.col.Protocol",
    "frame.len",
    "ip.src",
    "ip.dst",
    "tcp.srcport",
    "tcp.dstport",
];

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything a finished decoder run left behind
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Invokes the external decoder
#[derive(Debug, Clone)]
pub struct TsharkCommand {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl TsharkCommand {
    /// Create a runner for `program`; `timeout` of `None` waits forever
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Confirm the decoder runs at all and return its version banner
    pub fn version(&self) -> AppResult<String> {
        let output = match self.run(["-v"]) {
            Ok(output) => output,
            Err(AppError::IoError(e)) => {
                warn!("Could not launch {}: {}", self.program.display(), e);
                return Err(AppError::ToolUnavailable);
            }
            Err(e) => return Err(e),
        };

        if !output.status.success() {
            warn!(
                "{} -v exited with {}",
                self.program.display(),
                output.status
            );
            return Err(AppError::ToolUnavailable);
        }

        let banner = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        debug!("Decoder version: {}", banner);
        Ok(banner)
    }

    /// Decode `capture` into one tab-separated line per packet.
    ///
    /// Returns the raw stdout; a non-zero exit becomes
    /// [`AppError::ToolFailed`] carrying the decoder's stderr.
    pub fn decode_fields(&self, capture: &Path) -> AppResult<Vec<u8>> {
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("-r"),
            capture.as_os_str(),
            OsStr::new("-T"),
            OsStr::new("fields"),
        ];
        for field in FIELDS.iter() {
            args.push(OsStr::new("-e"));
            args.push(OsStr::new(field));
        }

        debug!("Running {} {:?}", self.program.display(), args);
        let output = self.run(args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AppError::ToolFailed(stderr));
        }

        Ok(output.stdout)
    }

    /// Run the decoder to completion, capturing both streams in full
    pub fn run<I, S>(&self, args: I) -> AppResult<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a deadline kill reaches anything the decoder forks
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn()?;

        // Both pipes are drained concurrently so a chatty child never blocks on a full pipe
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(limit) => match wait_with_deadline(&mut child, limit)? {
                Some(status) => status,
                // Readers are left detached; an escaped grandchild may still hold the pipes
                None => return Err(AppError::ToolTimeout(limit)),
            },
            None => child.wait()?,
        };

        Ok(ToolOutput {
            status,
            stdout: join(stdout)?,
            stderr: join(stderr)?,
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> AppResult<Vec<u8>> {
    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::Unknown),
    }
}

/// Poll until the child exits; kill it once `limit` has elapsed.
/// `None` means the deadline hit.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> AppResult<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            warn!("Decoder exceeded {:?}, killing pid {}", limit, child.id());
            kill_process_group(child);
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
        warn!("Failed to kill decoder process group: {}", e);
        if let Err(e) = child.kill() {
            warn!("Failed to kill decoder: {}", e);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("Failed to kill decoder: {}", e);
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_program_is_reported_as_unavailable() {
        let dir = TempDir::new().unwrap();
        let tshark = TsharkCommand::new(dir.path().join("no-such-tshark"), None);
        assert!(matches!(tshark.version(), Err(AppError::ToolUnavailable)));
    }

    #[test]
    fn failing_version_probe_is_reported_as_unavailable() {
        let tshark = TsharkCommand::new("false", None);
        assert!(matches!(tshark.version(), Err(AppError::ToolUnavailable)));
    }

    #[test]
    fn version_returns_first_banner_line() {
        let dir = TempDir::new().unwrap();
        let tshark = TsharkCommand::new(fake::script(dir.path(), "exit 0"), None);
        assert_eq!(tshark.version().unwrap(), "TShark (Wireshark) 4.2.2.");
    }

    #[test]
    fn decode_passes_capture_path_and_field_arguments() {
        let dir = TempDir::new().unwrap();
        let capture = dir.path().join("trace.pcap");
        std::fs::write(&capture, b"not really a pcap").unwrap();
        let program = fake::script(dir.path(), "echo \"$@\"");

        let tshark = TsharkCommand::new(program, None);
        let stdout = tshark.decode_fields(&capture).unwrap();
        let echoed = String::from_utf8(stdout).unwrap();

        let expected = format!(
            "-r {} -T fields -e _ws.col.Protocol -e frame.len -e ip.src -e ip.dst -e tcp.srcport -e tcp.dstport",
            capture.display()
        );
        assert_eq!(echoed.trim(), expected);
    }

    #[test]
    fn non_zero_exit_carries_trimmed_stderr() {
        let dir = TempDir::new().unwrap();
        let program = fake::script(
            dir.path(),
            "echo '  tshark: The file \"x\" appears to be damaged or corrupt.  ' >&2\nexit 2",
        );
        let tshark = TsharkCommand::new(program, None);

        match tshark.decode_fields(Path::new("/nonexistent.pcap")) {
            Err(AppError::ToolFailed(stderr)) => {
                assert_eq!(stderr, "tshark: The file \"x\" appears to be damaged or corrupt.");
            }
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }

    #[test]
    fn deadline_kills_a_hung_decoder() {
        let dir = TempDir::new().unwrap();
        let program = fake::script(dir.path(), "exec sleep 10");
        let tshark = TsharkCommand::new(program, Some(Duration::from_millis(200)));

        let started = Instant::now();
        let result = tshark.decode_fields(Path::new("/nonexistent.pcap"));
        assert!(matches!(result, Err(AppError::ToolTimeout(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn deadline_also_kills_forked_helpers() {
        let dir = TempDir::new().unwrap();
        let program = fake::script(dir.path(), "sleep 6\necho done");
        let tshark = TsharkCommand::new(program, Some(Duration::from_millis(200)));

        let started = Instant::now();
        let result = tshark.decode_fields(Path::new("/nonexistent.pcap"));
        assert!(matches!(result, Err(AppError::ToolTimeout(limit)) if limit == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn large_output_does_not_stall() {
        let dir = TempDir::new().unwrap();
        let program = fake::script(
            dir.path(),
            "i=0\nwhile [ $i -lt 20000 ]; do echo 'UDP\t60\t10.0.0.1\t10.0.0.2\t\t'; i=$((i+1)); done",
        );
        let tshark = TsharkCommand::new(program, Some(Duration::from_secs(30)));
        let stdout = tshark.decode_fields(Path::new("/nonexistent.pcap")).unwrap();
        assert_eq!(stdout.iter().filter(|b| **b == b'\n').count(), 20000);
    }
}
